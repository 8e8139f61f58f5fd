/// The catalogue state store

use std::sync::Arc;

use super::data::{Artist, Gallery, Genre, Painting};
use super::favorites::{Favorite, Favorites, Toggle};
use super::filter::{self, locale_compare, PaintingFilter, Selection, SortKey};
use super::loader::{CollectionKey, CollectionLoader};
use super::remote::RemoteSource;
use super::storage::KeyValueStore;
use crate::error::Result;

/// Top-level views. Navigating between them resets selection and sort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Home,
    Galleries,
    Paintings,
    Artists,
    Genres,
    Favorites,
    About,
}

/// The catalogue state store.
///
/// Owns the collections, the active selection, the sort key and the
/// favorites. Constructed once at startup with its store and backend and
/// passed explicitly to whatever presents it.
pub struct Catalogue {
    store: Arc<dyn KeyValueStore>,
    loader: CollectionLoader,
    galleries: Vec<Gallery>,
    paintings: Vec<Painting>,
    artists: Vec<Artist>,
    genres: Vec<Genre>,
    view: View,
    selection: Selection,
    selected_painting: Option<Painting>,
    sort: Option<SortKey>,
    favorites: Favorites,
}

impl Catalogue {
    /// Create the store. Favorites are rehydrated immediately; collections
    /// are empty until [`Catalogue::load_all`] or [`Catalogue::ensure_loaded`].
    pub fn new(store: Arc<dyn KeyValueStore>, remote: Arc<dyn RemoteSource>) -> Self {
        let favorites = Favorites::load(store.as_ref());
        tracing::debug!(count = favorites.combined_count(), "restored favorites");

        Catalogue {
            loader: CollectionLoader::new(store.clone(), remote),
            store,
            galleries: Vec::new(),
            paintings: Vec::new(),
            artists: Vec::new(),
            genres: Vec::new(),
            view: View::default(),
            selection: Selection::None,
            selected_painting: None,
            sort: Some(SortKey::default()),
            favorites,
        }
    }

    /// Load all four collections concurrently
    pub async fn load_all(&mut self) {
        let (galleries, paintings, artists, genres) = tokio::join!(
            self.loader.galleries(),
            self.loader.paintings(),
            self.loader.artists(),
            self.loader.genres(),
        );
        self.galleries = galleries;
        self.paintings = paintings;
        self.artists = artists;
        self.genres = genres;
    }

    /// Load a single collection
    pub async fn ensure_loaded(&mut self, key: CollectionKey) {
        match key {
            CollectionKey::Galleries => self.galleries = self.loader.galleries().await,
            CollectionKey::Paintings => self.paintings = self.loader.paintings().await,
            CollectionKey::Artists => self.artists = self.loader.artists().await,
            CollectionKey::Genres => self.genres = self.loader.genres().await,
        }
    }

    /// Drop cached collections from the store and from memory
    pub fn clear_cache(&mut self) -> Result<()> {
        self.loader.clear_cache()?;
        self.galleries.clear();
        self.paintings.clear();
        self.artists.clear();
        self.genres.clear();
        self.selection = Selection::None;
        self.selected_painting = None;
        Ok(())
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    pub fn galleries(&self) -> &[Gallery] {
        &self.galleries
    }

    /// Every painting, regardless of selection
    pub fn all_paintings(&self) -> &[Painting] {
        &self.paintings
    }

    pub fn artists(&self) -> &[Artist] {
        &self.artists
    }

    pub fn genres(&self) -> &[Genre] {
        &self.genres
    }

    /// Artists ordered by last name, as the artist list shows them
    pub fn artists_by_last_name(&self) -> Vec<Artist> {
        let mut artists = self.artists.clone();
        artists.sort_by(|a, b| locale_compare(a.last_name.as_deref(), b.last_name.as_deref()));
        artists
    }

    /// Genres ordered by name, as the genre list shows them
    pub fn genres_by_name(&self) -> Vec<Genre> {
        let mut genres = self.genres.clone();
        genres.sort_by(|a, b| locale_compare(a.genre_name.as_deref(), b.genre_name.as_deref()));
        genres
    }

    pub fn gallery(&self, id: i64) -> Option<&Gallery> {
        self.galleries.iter().find(|g| g.gallery_id == id)
    }

    pub fn painting(&self, id: i64) -> Option<&Painting> {
        self.paintings.iter().find(|p| p.painting_id == id)
    }

    pub fn artist(&self, id: i64) -> Option<&Artist> {
        self.artists.iter().find(|a| a.artist_id == id)
    }

    pub fn genre(&self, id: i64) -> Option<&Genre> {
        self.genres.iter().find(|g| g.genre_id == id)
    }

    // ========== Navigation & selection ==========

    pub fn view(&self) -> View {
        self.view
    }

    /// Switch top-level view; selection, selected painting and sort reset
    pub fn navigate(&mut self, view: View) {
        self.view = view;
        self.selection = Selection::None;
        self.selected_painting = None;
        self.sort = Some(SortKey::default());
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selected_gallery(&self) -> Option<&Gallery> {
        match self.selection {
            Selection::ByGallery(id) => self.gallery(id),
            _ => None,
        }
    }

    pub fn selected_genre(&self) -> Option<&Genre> {
        match self.selection {
            Selection::ByGenre(id) => self.genre(id),
            _ => None,
        }
    }

    pub fn selected_artist(&self) -> Option<&Artist> {
        match self.selection {
            Selection::ByArtist(id) => self.artist(id),
            _ => None,
        }
    }

    /// Selecting a gallery clears any genre, artist or filter selection.
    /// `None` clears the gallery selection only.
    pub fn select_gallery(&mut self, gallery: Option<&Gallery>) {
        match gallery {
            Some(g) => self.selection = Selection::ByGallery(g.gallery_id),
            None if matches!(self.selection, Selection::ByGallery(_)) => self.selection = Selection::None,
            None => {}
        }
    }

    pub fn select_genre(&mut self, genre: Option<&Genre>) {
        match genre {
            Some(g) => self.selection = Selection::ByGenre(g.genre_id),
            None if matches!(self.selection, Selection::ByGenre(_)) => self.selection = Selection::None,
            None => {}
        }
    }

    pub fn select_artist(&mut self, artist: Option<&Artist>) {
        match artist {
            Some(a) => self.selection = Selection::ByArtist(a.artist_id),
            None if matches!(self.selection, Selection::ByArtist(_)) => self.selection = Selection::None,
            None => {}
        }
    }

    /// Enter the painting-filter view's mode with one active axis
    pub fn apply_filter(&mut self, filter: PaintingFilter) {
        tracing::debug!(axis = filter.axis(), "applying painting filter");
        self.selection = Selection::Filtered(filter);
    }

    pub fn clear_filter(&mut self) {
        if matches!(self.selection, Selection::Filtered(_)) {
            self.selection = Selection::None;
        }
    }

    /// Painting shown in the detail view
    pub fn selected_painting(&self) -> Option<&Painting> {
        self.selected_painting.as_ref()
    }

    pub fn select_painting(&mut self, painting: Option<&Painting>) {
        self.selected_painting = painting.cloned();
    }

    // ========== Sorting & derived list ==========

    /// Active sort key; `None` means the list keeps backend order
    pub fn sort_key(&self) -> Option<SortKey> {
        self.sort
    }

    pub fn set_sort(&mut self, key: SortKey) {
        self.sort = Some(key);
    }

    /// Set the sort from text. Unrecognized keys disable reordering.
    pub fn set_sort_by(&mut self, key: &str) {
        self.sort = key.parse().ok();
        if self.sort.is_none() {
            tracing::debug!(key, "unrecognized sort key, keeping backend order");
        }
    }

    /// The paintings for the current selection, in the current sort order
    pub fn visible_paintings(&self) -> Vec<Painting> {
        let mut visible = filter::derive_visible_paintings(&self.paintings, &self.genres, &self.selection);
        filter::sort_paintings(&mut visible, self.sort);
        visible
    }

    // ========== Favorites ==========

    pub fn favorites(&self) -> &Favorites {
        &self.favorites
    }

    pub fn is_favorite<T: Favorite>(&self, item: &T) -> bool {
        self.favorites.contains(item)
    }

    /// Add or remove a favorite and persist that set
    pub fn toggle_favorite<T: Favorite>(&mut self, item: &T) -> Result<Toggle> {
        self.favorites.toggle(self.store.as_ref(), item)
    }

    pub fn combined_favorites_count(&self) -> usize {
        self.favorites.combined_count()
    }

    pub fn clear_favorites(&mut self) -> Result<()> {
        self.favorites.clear_all(self.store.as_ref())
    }

    /// Favorite every painting hanging in a gallery. Returns how many were new.
    pub fn favorite_gallery_paintings(&mut self, gallery_id: i64) -> Result<usize> {
        let in_gallery = self
            .paintings
            .iter()
            .filter(|p| p.gallery_id == Some(gallery_id));
        self.favorites.add_all(self.store.as_ref(), in_gallery)
    }
}

impl std::fmt::Debug for Catalogue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalogue")
            .field("galleries", &self.galleries.len())
            .field("paintings", &self.paintings.len())
            .field("artists", &self.artists.len())
            .field("genres", &self.genres.len())
            .field("view", &self.view)
            .field("selection", &self.selection)
            .field("sort", &self.sort)
            .field("favorites", &self.favorites.combined_count())
            .finish()
    }
}
