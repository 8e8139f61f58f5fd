pub mod config;
pub mod error;
pub mod logging;
pub mod state;

pub use config::Config;
pub use error::{CatalogueError, Result};
pub use state::catalogue::{Catalogue, View};
pub use state::data::{Annotations, Artist, DominantColor, Gallery, Genre, ImageSize, Painting, PaintingGenre};
pub use state::favorites::{Favorite, FavoriteKind, Favorites, Toggle};
pub use state::filter::{PaintingFilter, Selection, SortKey};
pub use state::loader::{CachePolicy, Collection, CollectionKey, CollectionLoader};
pub use state::remote::{RemoteSource, SupabaseSource};
pub use state::storage::{KeyValueStore, MemoryStore, SqliteStore};
