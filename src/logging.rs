/// Logging setup using tracing
///
/// Library code only emits `tracing` events; the binary installs the
/// subscriber once at startup. `RUST_LOG` takes precedence over the
/// verbosity flags.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "warn,art_catalogue=info";

/// Map `-v`/`-q` counts to a filter directive
pub fn filter_for_verbosity(verbose: u8, quiet: u8) -> String {
    let level = match (verbose as i16) - (quiet as i16) {
        i16::MIN..=-2 => "off",
        -1 => "error",
        0 => return DEFAULT_FILTER.to_string(),
        1 => "debug",
        _ => "trace",
    };
    format!("warn,art_catalogue={}", level)
}

/// Install the global subscriber writing to stderr.
/// Calling it a second time is a no-op.
pub fn init_logging(verbose: u8, quiet: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_for_verbosity(verbose, quiet)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
