/// Runtime configuration
///
/// Settings come from defaults, then the environment (optionally seeded
/// from a `.env` file), then command-line overrides.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{CatalogueError, Result};
use crate::state::remote::{RemoteSource, SupabaseSource, Unconfigured};
use crate::state::storage::SqliteStore;

pub const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
pub const ENV_SUPABASE_KEY: &str = "SUPABASE_KEY";
pub const ENV_DATA_DIR: &str = "ART_CATALOGUE_DATA_DIR";

const APP_DIR: &str = "art-catalogue";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Project URL of the hosted backend
    pub supabase_url: Option<String>,
    /// Anon key for the hosted backend
    pub supabase_key: Option<String>,
    /// Directory holding the local store
    pub data_dir: PathBuf,
}

impl Config {
    /// Read configuration from the process environment and `.env`
    pub fn from_env() -> Result<Self> {
        // a missing .env file is fine
        let _ = dotenv::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let data_dir = match non_empty(ENV_DATA_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        Ok(Config {
            supabase_url: non_empty(ENV_SUPABASE_URL),
            supabase_key: non_empty(ENV_SUPABASE_KEY),
            data_dir,
        })
    }

    /// Apply command-line overrides on top
    pub fn with_overrides(
        mut self,
        supabase_url: Option<String>,
        supabase_key: Option<String>,
        data_dir: Option<PathBuf>,
    ) -> Self {
        if supabase_url.is_some() {
            self.supabase_url = supabase_url;
        }
        if supabase_key.is_some() {
            self.supabase_key = supabase_key;
        }
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        self
    }

    /// Open the local store in the configured data directory
    pub fn open_store(&self) -> Result<SqliteStore> {
        SqliteStore::open_in(&self.data_dir)
    }

    /// Backend client, or a stand-in that always fails when credentials
    /// are missing (cached collections still work).
    pub fn remote(&self) -> Result<Arc<dyn RemoteSource>> {
        match (&self.supabase_url, &self.supabase_key) {
            (Some(url), Some(key)) => Ok(Arc::new(SupabaseSource::new(url, key)?)),
            (url, key) => {
                if url.is_none() {
                    tracing::warn!("{} is not defined, only cached data is available", ENV_SUPABASE_URL);
                }
                if key.is_none() {
                    tracing::warn!("{} is not defined, only cached data is available", ENV_SUPABASE_KEY);
                }
                Ok(Arc::new(Unconfigured))
            }
        }
    }
}

/// Default data directory:
/// - Linux: ~/.local/share/art-catalogue
/// - macOS: ~/Library/Application Support/art-catalogue
/// - Windows: %APPDATA%\art-catalogue
pub fn default_data_dir() -> Result<PathBuf> {
    let mut path = dirs::data_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| CatalogueError::Config("could not determine user data directory".into()))?;
    path.push(APP_DIR);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_reads_variables() {
        let config = Config::from_lookup(lookup(&[
            (ENV_SUPABASE_URL, "https://demo.supabase.co"),
            (ENV_SUPABASE_KEY, "anon"),
            (ENV_DATA_DIR, "/tmp/catalogue"),
        ]))
        .unwrap();

        assert_eq!(config.supabase_url.as_deref(), Some("https://demo.supabase.co"));
        assert_eq!(config.supabase_key.as_deref(), Some("anon"));
        assert_eq!(config.data_dir, PathBuf::from("/tmp/catalogue"));
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let config = Config::from_lookup(lookup(&[
            (ENV_SUPABASE_KEY, "  "),
            (ENV_DATA_DIR, "/tmp/catalogue"),
        ]))
        .unwrap();

        assert!(config.supabase_key.is_none());
    }

    #[test]
    fn test_overrides_win() {
        let config = Config::from_lookup(lookup(&[
            (ENV_SUPABASE_URL, "https://env.supabase.co"),
            (ENV_DATA_DIR, "/tmp/env"),
        ]))
        .unwrap()
        .with_overrides(
            Some("https://flag.supabase.co".into()),
            None,
            Some(PathBuf::from("/tmp/flag")),
        );

        assert_eq!(config.supabase_url.as_deref(), Some("https://flag.supabase.co"));
        assert!(config.supabase_key.is_none());
        assert_eq!(config.data_dir, PathBuf::from("/tmp/flag"));
    }

    #[tokio::test]
    async fn test_missing_credentials_fall_back_to_cache_only() {
        let config = Config::from_lookup(lookup(&[(ENV_DATA_DIR, "/tmp/x")])).unwrap();
        let remote = config.remote().unwrap();
        assert!(remote.list_artists().await.is_err());
    }
}
