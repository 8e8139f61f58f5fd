/// Favorites: three identity-keyed sets persisted in the local store
///
/// Membership is decided by the entity's ID field only. Every mutation
/// writes the affected set back to the store before returning.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::data::{Artist, Gallery, Painting};
use super::storage::KeyValueStore;
use crate::error::Result;

/// Which favorites set an entity belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FavoriteKind {
    Gallery,
    Painting,
    Artist,
}

impl FavoriteKind {
    pub const ALL: [FavoriteKind; 3] = [
        FavoriteKind::Gallery,
        FavoriteKind::Painting,
        FavoriteKind::Artist,
    ];

    /// Key under which the set is persisted
    pub fn storage_key(self) -> &'static str {
        match self {
            FavoriteKind::Gallery => "galleryFavorites",
            FavoriteKind::Painting => "paintingFavorites",
            FavoriteKind::Artist => "artistFavorites",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FavoriteKind::Gallery => "gallery",
            FavoriteKind::Painting => "painting",
            FavoriteKind::Artist => "artist",
        }
    }
}

/// An entity that can be favorited
pub trait Favorite: Clone + Serialize + DeserializeOwned {
    const KIND: FavoriteKind;

    /// The identity field used for membership
    fn favorite_id(&self) -> i64;

    fn set(favorites: &Favorites) -> &Vec<Self>;

    fn set_mut(favorites: &mut Favorites) -> &mut Vec<Self>;
}

impl Favorite for Gallery {
    const KIND: FavoriteKind = FavoriteKind::Gallery;

    fn favorite_id(&self) -> i64 {
        self.gallery_id
    }

    fn set(favorites: &Favorites) -> &Vec<Self> {
        &favorites.galleries
    }

    fn set_mut(favorites: &mut Favorites) -> &mut Vec<Self> {
        &mut favorites.galleries
    }
}

impl Favorite for Painting {
    const KIND: FavoriteKind = FavoriteKind::Painting;

    fn favorite_id(&self) -> i64 {
        self.painting_id
    }

    fn set(favorites: &Favorites) -> &Vec<Self> {
        &favorites.paintings
    }

    fn set_mut(favorites: &mut Favorites) -> &mut Vec<Self> {
        &mut favorites.paintings
    }
}

impl Favorite for Artist {
    const KIND: FavoriteKind = FavoriteKind::Artist;

    fn favorite_id(&self) -> i64 {
        self.artist_id
    }

    fn set(favorites: &Favorites) -> &Vec<Self> {
        &favorites.artists
    }

    fn set_mut(favorites: &mut Favorites) -> &mut Vec<Self> {
        &mut favorites.artists
    }
}

/// Outcome of a toggle, for "Added/Removed ... from favorites" notices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Added,
    Removed,
}

/// The three favorites sets, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Favorites {
    galleries: Vec<Gallery>,
    paintings: Vec<Painting>,
    artists: Vec<Artist>,
}

impl Favorites {
    /// Rehydrate all three sets from the store.
    /// A missing, unreadable or undecodable entry starts that set empty.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        Favorites {
            galleries: load_set(store, FavoriteKind::Gallery),
            paintings: load_set(store, FavoriteKind::Painting),
            artists: load_set(store, FavoriteKind::Artist),
        }
    }

    pub fn galleries(&self) -> &[Gallery] {
        &self.galleries
    }

    pub fn paintings(&self) -> &[Painting] {
        &self.paintings
    }

    pub fn artists(&self) -> &[Artist] {
        &self.artists
    }

    /// Number of favorites in one set
    pub fn count(&self, kind: FavoriteKind) -> usize {
        match kind {
            FavoriteKind::Gallery => self.galleries.len(),
            FavoriteKind::Painting => self.paintings.len(),
            FavoriteKind::Artist => self.artists.len(),
        }
    }

    /// Total across all three sets
    pub fn combined_count(&self) -> usize {
        FavoriteKind::ALL.iter().map(|k| self.count(*k)).sum()
    }

    pub fn contains<T: Favorite>(&self, item: &T) -> bool {
        let id = item.favorite_id();
        T::set(self).iter().any(|f| f.favorite_id() == id)
    }

    /// Remove the entity if a favorite with its ID exists, otherwise
    /// append it; then persist the set.
    ///
    /// If persisting fails the in-memory change is kept and the error
    /// returned.
    pub fn toggle<T: Favorite>(&mut self, store: &dyn KeyValueStore, item: &T) -> Result<Toggle> {
        let id = item.favorite_id();
        let set = T::set_mut(self);

        let outcome = if let Some(pos) = set.iter().position(|f| f.favorite_id() == id) {
            set.remove(pos);
            Toggle::Removed
        } else {
            set.push(item.clone());
            Toggle::Added
        };

        tracing::debug!(kind = T::KIND.label(), id, ?outcome, "toggled favorite");
        self.persist::<T>(store)?;
        Ok(outcome)
    }

    /// Append every entity not already a favorite. Returns how many were
    /// added; persists once.
    pub fn add_all<'a, T, I>(&mut self, store: &dyn KeyValueStore, items: I) -> Result<usize>
    where
        T: Favorite + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let set = T::set_mut(self);
        let before = set.len();
        for item in items {
            let id = item.favorite_id();
            if !set.iter().any(|f| f.favorite_id() == id) {
                set.push(item.clone());
            }
        }
        let added = set.len() - before;

        if added > 0 {
            self.persist::<T>(store)?;
        }
        Ok(added)
    }

    /// Empty all three sets and persist each empty set
    pub fn clear_all(&mut self, store: &dyn KeyValueStore) -> Result<()> {
        self.galleries.clear();
        self.paintings.clear();
        self.artists.clear();

        self.persist::<Gallery>(store)?;
        self.persist::<Painting>(store)?;
        self.persist::<Artist>(store)?;
        tracing::info!("cleared all favorites");
        Ok(())
    }

    fn persist<T: Favorite>(&self, store: &dyn KeyValueStore) -> Result<()> {
        let json = serde_json::to_string(T::set(self))?;
        store.set(T::KIND.storage_key(), &json)
    }
}

fn load_set<T: Favorite>(store: &dyn KeyValueStore, kind: FavoriteKind) -> Vec<T> {
    let raw = match store.get(kind.storage_key()) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(key = kind.storage_key(), error = %e, "could not read favorites");
            return Vec::new();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(key = kind.storage_key(), error = %e, "discarding malformed favorites");
        Vec::new()
    })
}
