use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use art_catalogue::{
    logging, Catalogue, Config, FavoriteKind, ImageSize, Painting, PaintingFilter, Selection, Toggle,
    View,
};

#[derive(Parser)]
#[command(
    name = "art-catalogue",
    version,
    about = "Browse galleries, paintings, artists and genres, and keep favorites"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Less log output (-q errors only, -qq silent)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    quiet: u8,

    /// Backend project URL (overrides SUPABASE_URL)
    #[arg(long, global = true, value_name = "URL")]
    supabase_url: Option<String>,

    /// Backend anon key (overrides SUPABASE_KEY)
    #[arg(long, global = true, value_name = "KEY")]
    supabase_key: Option<String>,

    /// Directory for the local store (overrides ART_CATALOGUE_DATA_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// List galleries
    Galleries,
    /// List artists by last name
    Artists,
    /// List genres by name
    Genres,
    /// List the paintings for a selection or filter
    Paintings(PaintingsArgs),
    /// Show one painting in detail
    Painting {
        id: i64,
    },
    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Manage the local collection cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Args)]
struct PaintingsArgs {
    /// Paintings in this gallery
    #[arg(long, value_name = "ID", group = "axis")]
    gallery: Option<i64>,

    /// Paintings in this genre
    #[arg(long, value_name = "ID", group = "axis")]
    genre: Option<i64>,

    /// Paintings by this artist
    #[arg(long, value_name = "ID", group = "axis")]
    artist: Option<i64>,

    /// Filter: title contains TEXT (case-insensitive)
    #[arg(long, value_name = "TEXT", group = "axis")]
    title: Option<String>,

    /// Filter: artist ID
    #[arg(long, value_name = "ID", group = "axis")]
    painter: Option<i64>,

    /// Filter: gallery ID
    #[arg(long, value_name = "ID", group = "axis")]
    museum: Option<i64>,

    /// Filter: painted in or after YEAR
    #[arg(long, value_name = "YEAR", conflicts_with = "axis")]
    from: Option<i32>,

    /// Filter: painted in or before YEAR
    #[arg(long, value_name = "YEAR", conflicts_with = "axis")]
    to: Option<i32>,

    /// Sort key: title, year or lastName
    #[arg(long, default_value = "title")]
    sort: String,
}

impl PaintingsArgs {
    fn selection(&self) -> Selection {
        if let Some(id) = self.gallery {
            Selection::ByGallery(id)
        } else if let Some(id) = self.genre {
            Selection::ByGenre(id)
        } else if let Some(id) = self.artist {
            Selection::ByArtist(id)
        } else if let Some(text) = &self.title {
            Selection::Filtered(PaintingFilter::Title(text.clone()))
        } else if let Some(id) = self.painter {
            Selection::Filtered(PaintingFilter::Artist(id))
        } else if let Some(id) = self.museum {
            Selection::Filtered(PaintingFilter::Gallery(id))
        } else if self.from.is_some() || self.to.is_some() {
            Selection::Filtered(PaintingFilter::Years {
                min: self.from,
                max: self.to,
            })
        } else {
            Selection::None
        }
    }
}

#[derive(Subcommand)]
enum FavoritesAction {
    /// Show all favorites
    List,
    /// Show the combined favorites count
    Count,
    /// Remove every favorite
    Clear,
    /// Add or remove one favorite
    Toggle {
        kind: KindArg,
        id: i64,
    },
    /// Favorite every painting in a gallery
    AddGalleryPaintings {
        gallery_id: i64,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Forget cached collections so they are fetched again
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Gallery,
    Painting,
    Artist,
}

impl From<KindArg> for FavoriteKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Gallery => FavoriteKind::Gallery,
            KindArg::Painting => FavoriteKind::Painting,
            KindArg::Artist => FavoriteKind::Artist,
        }
    }
}

/// Main application state
struct App {
    catalogue: Catalogue,
}

impl App {
    /// Open the local store and backend and restore favorites
    fn new(config: &Config) -> anyhow::Result<Self> {
        let store = config
            .open_store()
            .with_context(|| format!("failed to open local store in {}", config.data_dir.display()))?;
        tracing::debug!(path = %store.path().display(), "local store ready");

        let remote = config.remote()?;
        let catalogue = Catalogue::new(Arc::new(store), remote);

        Ok(App { catalogue })
    }

    async fn run(&mut self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Cache {
                action: CacheAction::Clear,
            } => {
                self.catalogue.clear_cache()?;
                println!("Cache cleared.");
                return Ok(());
            }
            Command::Favorites {
                action: FavoritesAction::Count,
            } => {
                println!("{}", self.catalogue.combined_favorites_count());
                return Ok(());
            }
            _ => {}
        }

        self.catalogue.load_all().await;

        match command {
            Command::Galleries => self.list_galleries(),
            Command::Artists => self.list_artists(),
            Command::Genres => self.list_genres(),
            Command::Paintings(args) => self.list_paintings(&args),
            Command::Painting { id } => self.show_painting(id)?,
            Command::Favorites { action } => self.favorites(action)?,
            Command::Cache { .. } => {}
        }
        Ok(())
    }

    fn list_galleries(&mut self) {
        self.catalogue.navigate(View::Galleries);
        for gallery in self.catalogue.galleries() {
            println!(
                "{:>5} {} {} ({})",
                gallery.gallery_id,
                heart(self.catalogue.is_favorite(gallery)),
                gallery.display_name(),
                gallery.gallery_city.as_deref().unwrap_or("-")
            );
        }
    }

    fn list_artists(&mut self) {
        self.catalogue.navigate(View::Artists);
        for artist in self.catalogue.artists_by_last_name() {
            println!(
                "{:>5} {} {} ({})",
                artist.artist_id,
                heart(self.catalogue.is_favorite(&artist)),
                artist.full_name(),
                artist.nationality.as_deref().unwrap_or("-")
            );
        }
    }

    fn list_genres(&mut self) {
        self.catalogue.navigate(View::Genres);
        for genre in self.catalogue.genres_by_name() {
            println!(
                "{:>5}   {} ({} paintings)",
                genre.genre_id,
                genre.genre_name.as_deref().unwrap_or("Untitled"),
                genre.painting_genres.len()
            );
        }
    }

    fn list_paintings(&mut self, args: &PaintingsArgs) {
        self.catalogue.navigate(View::Paintings);
        match args.selection() {
            Selection::ByGallery(id) => {
                let gallery = self.catalogue.gallery(id).cloned();
                self.catalogue.select_gallery(gallery.as_ref());
            }
            Selection::ByGenre(id) => {
                let genre = self.catalogue.genre(id).cloned();
                self.catalogue.select_genre(genre.as_ref());
            }
            Selection::ByArtist(id) => {
                let artist = self.catalogue.artist(id).cloned();
                self.catalogue.select_artist(artist.as_ref());
            }
            Selection::Filtered(filter) => self.catalogue.apply_filter(filter),
            Selection::None => {}
        }
        self.catalogue.set_sort_by(&args.sort);

        let visible = self.catalogue.visible_paintings();
        if visible.is_empty() {
            println!("No paintings to show.");
            return;
        }
        for painting in &visible {
            print_painting_row(painting, self.catalogue.is_favorite(painting));
        }
    }

    fn show_painting(&mut self, id: i64) -> anyhow::Result<()> {
        let painting = self
            .catalogue
            .painting(id)
            .cloned()
            .ok_or_else(|| anyhow!("no painting with id {}", id))?;
        self.catalogue.select_painting(Some(&painting));

        println!("{}", painting.title_or_untitled());
        if let Some(artist) = &painting.artists {
            println!("  Artist:   {}", artist.full_name());
        }
        if let Some(year) = painting.year_of_work {
            println!("  Year:     {}", year);
        }
        if let Some(medium) = &painting.medium {
            println!("  Medium:   {}", medium);
        }
        if let (Some(w), Some(h)) = (painting.width, painting.height) {
            println!("  Size:     {} x {}", w, h);
        }
        if let Some(gallery) = &painting.galleries {
            println!(
                "  Gallery:  {}, {}",
                gallery.display_name(),
                gallery.gallery_city.as_deref().unwrap_or("-")
            );
        }
        if let Some(path) = painting.image_path(ImageSize::Full) {
            println!("  Image:    {}", path);
        }
        if let Some(annotations) = painting.annotations() {
            let colors: Vec<String> = annotations
                .dominant_colors
                .iter()
                .map(|c| {
                    format!(
                        "{} {}",
                        c.web.as_deref().unwrap_or("?"),
                        c.name.as_deref().unwrap_or("")
                    )
                })
                .collect();
            println!("  Colours:  {}", colors.join(", "));
        }
        if let Some(link) = &painting.wiki_link {
            println!("  Wiki:     {}", link);
        }
        println!("  Favorite: {}", if self.catalogue.is_favorite(&painting) { "yes" } else { "no" });
        Ok(())
    }

    fn favorites(&mut self, action: FavoritesAction) -> anyhow::Result<()> {
        match action {
            FavoritesAction::List => {
                self.catalogue.navigate(View::Favorites);
                let favorites = self.catalogue.favorites();
                println!("Galleries:");
                for g in favorites.galleries() {
                    println!("  {:>5} {}", g.gallery_id, g.display_name());
                }
                println!("Artists:");
                for a in favorites.artists() {
                    println!("  {:>5} {}", a.artist_id, a.full_name());
                }
                println!("Paintings:");
                for p in favorites.paintings() {
                    println!("  {:>5} {}", p.painting_id, p.title_or_untitled());
                }
            }
            FavoritesAction::Count => println!("{}", self.catalogue.combined_favorites_count()),
            FavoritesAction::Clear => {
                self.catalogue.clear_favorites()?;
                println!("Favorites emptied.");
            }
            FavoritesAction::Toggle { kind, id } => {
                let kind = FavoriteKind::from(kind);
                let outcome = match kind {
                    FavoriteKind::Gallery => {
                        let gallery = self.catalogue.gallery(id).cloned().ok_or_else(|| not_found(kind, id))?;
                        self.catalogue.toggle_favorite(&gallery)?
                    }
                    FavoriteKind::Painting => {
                        let painting = self.catalogue.painting(id).cloned().ok_or_else(|| not_found(kind, id))?;
                        self.catalogue.toggle_favorite(&painting)?
                    }
                    FavoriteKind::Artist => {
                        let artist = self.catalogue.artist(id).cloned().ok_or_else(|| not_found(kind, id))?;
                        self.catalogue.toggle_favorite(&artist)?
                    }
                };
                match outcome {
                    Toggle::Added => println!("Added {} to favorites!", kind.label()),
                    Toggle::Removed => println!("Removed {} from favorites", kind.label()),
                }
            }
            FavoritesAction::AddGalleryPaintings { gallery_id } => {
                let added = self.catalogue.favorite_gallery_paintings(gallery_id)?;
                println!("Added {} paintings to favorites.", added);
            }
        }
        Ok(())
    }
}

fn not_found(kind: FavoriteKind, id: i64) -> anyhow::Error {
    anyhow!("no {} with id {}", kind.label(), id)
}

fn heart(favorite: bool) -> &'static str {
    if favorite {
        "♥"
    } else {
        " "
    }
}

fn print_painting_row(painting: &Painting, favorite: bool) {
    let year = painting
        .year_of_work
        .map(|y| y.to_string())
        .unwrap_or_else(|| "----".to_string());
    let artist = painting
        .artists
        .as_ref()
        .map(|a| a.full_name())
        .unwrap_or_default();
    println!(
        "{:>5} {} {} {} {}",
        painting.painting_id,
        heart(favorite),
        year,
        painting.title_or_untitled(),
        if artist.is_empty() { String::new() } else { format!("- {}", artist) }
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::from_env()?.with_overrides(cli.supabase_url, cli.supabase_key, cli.data_dir);
    let mut app = App::new(&config)?;
    app.run(cli.command).await
}
