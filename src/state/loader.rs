/// Fetch-once collection loading
///
/// Each primary collection is served from the local store when a cached
/// copy exists, and fetched from the backend exactly once otherwise.
/// Failures never escape: the caller gets an empty collection and the
/// error goes to the log. Whatever the first load produced is kept in
/// memory for the rest of the session.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::OnceCell;

use super::data::{Artist, Gallery, Genre, Painting};
use super::remote::RemoteSource;
use super::storage::KeyValueStore;
use crate::error::{CatalogueError, Result};

/// The four primary collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKey {
    Galleries,
    Paintings,
    Artists,
    Genres,
}

impl CollectionKey {
    pub const ALL: [CollectionKey; 4] = [
        CollectionKey::Galleries,
        CollectionKey::Paintings,
        CollectionKey::Artists,
        CollectionKey::Genres,
    ];

    /// Key under which the collection is cached in the local store
    pub fn cache_key(self) -> &'static str {
        match self {
            CollectionKey::Galleries => "galleries",
            CollectionKey::Paintings => "all_paintings",
            CollectionKey::Artists => "artists",
            CollectionKey::Genres => "genres",
        }
    }
}

/// How cached collections are treated.
///
/// `FetchOnce`: a stored snapshot is served indefinitely; the backend is
/// only asked when the store has nothing (or nothing decodable) for the
/// key. Nothing expires and there is no versioning, so a backend schema
/// change is only picked up after the cache is cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CachePolicy {
    #[default]
    FetchOnce,
}

/// A loaded collection of one entity type
#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    Galleries(Vec<Gallery>),
    Paintings(Vec<Painting>),
    Artists(Vec<Artist>),
    Genres(Vec<Genre>),
}

impl Collection {
    pub fn len(&self) -> usize {
        match self {
            Collection::Galleries(v) => v.len(),
            Collection::Paintings(v) => v.len(),
            Collection::Artists(v) => v.len(),
            Collection::Genres(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Serves collections from the local store, falling back to one remote read
pub struct CollectionLoader {
    store: Arc<dyn KeyValueStore>,
    remote: Arc<dyn RemoteSource>,
    policy: CachePolicy,
    /// Session snapshots. A cell is set once per session, by the first
    /// load of its collection; concurrent loads wait on that one.
    galleries: OnceCell<Vec<Gallery>>,
    paintings: OnceCell<Vec<Painting>>,
    artists: OnceCell<Vec<Artist>>,
    genres: OnceCell<Vec<Genre>>,
    in_flight: AtomicUsize,
}

impl CollectionLoader {
    pub fn new(store: Arc<dyn KeyValueStore>, remote: Arc<dyn RemoteSource>) -> Self {
        CollectionLoader {
            store,
            remote,
            policy: CachePolicy::default(),
            galleries: OnceCell::new(),
            paintings: OnceCell::new(),
            artists: OnceCell::new(),
            genres: OnceCell::new(),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// True while any remote read is outstanding. Advisory only.
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Load one collection by key
    pub async fn ensure_loaded(&self, key: CollectionKey) -> Collection {
        match key {
            CollectionKey::Galleries => Collection::Galleries(self.galleries().await),
            CollectionKey::Paintings => Collection::Paintings(self.paintings().await),
            CollectionKey::Artists => Collection::Artists(self.artists().await),
            CollectionKey::Genres => Collection::Genres(self.genres().await),
        }
    }

    pub async fn galleries(&self) -> Vec<Gallery> {
        self.galleries
            .get_or_init(|| self.load(CollectionKey::Galleries, || self.remote.list_galleries()))
            .await
            .clone()
    }

    /// Paintings embed their artist and gallery
    pub async fn paintings(&self) -> Vec<Painting> {
        self.paintings
            .get_or_init(|| self.load(CollectionKey::Paintings, || self.remote.list_paintings(true)))
            .await
            .clone()
    }

    pub async fn artists(&self) -> Vec<Artist> {
        self.artists
            .get_or_init(|| self.load(CollectionKey::Artists, || self.remote.list_artists()))
            .await
            .clone()
    }

    /// Genres embed their painting-genre join rows
    pub async fn genres(&self) -> Vec<Genre> {
        self.genres
            .get_or_init(|| self.load(CollectionKey::Genres, || self.remote.list_genres(true)))
            .await
            .clone()
    }

    /// Drop every cached collection and session snapshot so the next load
    /// refetches. Favorites are left alone.
    pub fn clear_cache(&mut self) -> Result<()> {
        for key in CollectionKey::ALL {
            self.store.remove(key.cache_key())?;
        }
        self.galleries.take();
        self.paintings.take();
        self.artists.take();
        self.genres.take();
        tracing::info!("cleared cached collections");
        Ok(())
    }

    /// Runs at most once per collection per session, inside its cell.
    /// A failed fetch is remembered as an empty snapshot; there is no retry.
    async fn load<T, F, Fut>(&self, key: CollectionKey, fetch: F) -> Vec<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        let cache_key = key.cache_key();

        if let Some(cached) = self.read_cached(cache_key) {
            return cached;
        }

        tracing::info!(collection = cache_key, "fetching from backend");
        let result = {
            let _loading = LoadingGuard::new(&self.in_flight);
            fetch().await
        };

        match result {
            Ok(items) => {
                self.write_cached(cache_key, &items);
                tracing::info!(collection = cache_key, count = items.len(), "loaded from backend");
                items
            }
            Err(e) => {
                tracing::error!(collection = cache_key, error = %e, "error fetching collection");
                Vec::new()
            }
        }
    }

    /// Cached snapshot, or None on a miss. Undecodable or unreadable
    /// entries count as a miss.
    fn read_cached<T: DeserializeOwned>(&self, cache_key: &str) -> Option<Vec<T>> {
        let raw = match self.store.get(cache_key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(collection = cache_key, error = %e, "cache read failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(items) => {
                tracing::debug!(collection = cache_key, "serving from cache");
                Some(items)
            }
            Err(e) => {
                tracing::warn!(collection = cache_key, error = %e, "discarding malformed cache entry");
                None
            }
        }
    }

    fn write_cached<T: Serialize>(&self, cache_key: &str, items: &[T]) {
        let written = serde_json::to_string(items)
            .map_err(CatalogueError::from)
            .and_then(|json| self.store.set(cache_key, &json));
        if let Err(e) = written {
            tracing::error!(collection = cache_key, error = %e, "failed to cache collection");
        }
    }
}

impl std::fmt::Debug for CollectionLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionLoader")
            .field("policy", &self.policy)
            .field("in_flight", &self.in_flight.load(Ordering::SeqCst))
            .finish()
    }
}

/// Keeps the in-flight counter raised for the duration of a fetch
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        LoadingGuard(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::state::storage::MemoryStore;
    use async_trait::async_trait;

    /// Remote source returning canned data and counting calls
    #[derive(Default)]
    pub(crate) struct MockRemote {
        pub galleries: Vec<Gallery>,
        pub paintings: Vec<Painting>,
        pub artists: Vec<Artist>,
        pub genres: Vec<Genre>,
        pub fail: bool,
        pub calls: AtomicUsize,
    }

    impl MockRemote {
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn answer<T: Clone>(&self, items: &[T]) -> Result<Vec<T>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CatalogueError::Status {
                    table: "mock".into(),
                    status: 503,
                    body: "unavailable".into(),
                });
            }
            Ok(items.to_vec())
        }
    }

    #[async_trait]
    impl RemoteSource for MockRemote {
        async fn list_galleries(&self) -> Result<Vec<Gallery>> {
            self.answer(&self.galleries)
        }

        async fn list_paintings(&self, _with_joins: bool) -> Result<Vec<Painting>> {
            self.answer(&self.paintings)
        }

        async fn list_artists(&self) -> Result<Vec<Artist>> {
            self.answer(&self.artists)
        }

        async fn list_genres(&self, _with_joins: bool) -> Result<Vec<Genre>> {
            self.answer(&self.genres)
        }
    }

    fn gallery(id: i64) -> Gallery {
        Gallery {
            gallery_id: id,
            gallery_name: Some(format!("Gallery {}", id)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_second_load_uses_cache() {
        let remote = Arc::new(MockRemote {
            galleries: vec![gallery(1), gallery(2)],
            ..Default::default()
        });
        let store = Arc::new(MemoryStore::new());
        let loader = CollectionLoader::new(store.clone(), remote.clone());

        let first = loader.galleries().await;
        let second = loader.galleries().await;

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        assert_eq!(remote.calls(), 1);
        assert!(store.get("galleries").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cache_survives_new_loader() {
        let store = Arc::new(MemoryStore::new());
        let remote = Arc::new(MockRemote {
            galleries: vec![gallery(1)],
            ..Default::default()
        });
        CollectionLoader::new(store.clone(), remote.clone()).galleries().await;

        let fresh_remote = Arc::new(MockRemote::default());
        let loader = CollectionLoader::new(store, fresh_remote.clone());
        let galleries = loader.galleries().await;

        assert_eq!(galleries, vec![gallery(1)]);
        assert_eq!(fresh_remote.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_fetch_degrades_to_empty_without_retry() {
        let remote = Arc::new(MockRemote {
            galleries: vec![gallery(1)],
            fail: true,
            ..Default::default()
        });
        let store = Arc::new(MemoryStore::new());
        let loader = CollectionLoader::new(store.clone(), remote.clone());

        assert!(loader.galleries().await.is_empty());
        assert!(loader.galleries().await.is_empty());
        assert_eq!(remote.calls(), 1);
        assert!(store.get("galleries").unwrap().is_none());
        assert!(!loader.is_loading());
    }

    #[tokio::test]
    async fn test_malformed_cache_is_refetched() {
        let store = Arc::new(MemoryStore::new());
        store.set("galleries", "{broken").unwrap();
        let remote = Arc::new(MockRemote {
            galleries: vec![gallery(3)],
            ..Default::default()
        });
        let loader = CollectionLoader::new(store.clone(), remote.clone());

        assert_eq!(loader.galleries().await, vec![gallery(3)]);
        assert_eq!(remote.calls(), 1);

        let repaired: Vec<Gallery> =
            serde_json::from_str(&store.get("galleries").unwrap().unwrap()).unwrap();
        assert_eq!(repaired, vec![gallery(3)]);
    }

    #[tokio::test]
    async fn test_concurrent_loads_fetch_each_collection_once() {
        let remote = Arc::new(MockRemote {
            galleries: vec![gallery(1)],
            paintings: vec![Painting {
                painting_id: 1,
                ..Default::default()
            }],
            ..Default::default()
        });
        let loader = CollectionLoader::new(Arc::new(MemoryStore::new()), remote.clone());

        let (a, b, c, d) = tokio::join!(
            loader.ensure_loaded(CollectionKey::Galleries),
            loader.ensure_loaded(CollectionKey::Paintings),
            loader.ensure_loaded(CollectionKey::Artists),
            loader.ensure_loaded(CollectionKey::Genres),
        );

        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert!(c.is_empty());
        assert!(d.is_empty());
        assert_eq!(remote.calls(), 4);
    }

    #[tokio::test]
    async fn test_clear_cache_allows_refetch() {
        let remote = Arc::new(MockRemote {
            galleries: vec![gallery(1)],
            ..Default::default()
        });
        let store = Arc::new(MemoryStore::new());
        store.set("galleryFavorites", "[]").unwrap();
        let mut loader = CollectionLoader::new(store.clone(), remote.clone());

        loader.galleries().await;
        loader.clear_cache().unwrap();
        loader.galleries().await;

        assert_eq!(remote.calls(), 2);
        assert!(store.get("galleryFavorites").unwrap().is_some());
    }

    /// Remote whose gallery read stays pending until the gate opens
    #[derive(Default)]
    struct GatedRemote {
        galleries: Vec<Gallery>,
        gate: tokio::sync::Notify,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RemoteSource for GatedRemote {
        async fn list_galleries(&self) -> Result<Vec<Gallery>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.gate.notified().await;
            Ok(self.galleries.clone())
        }

        async fn list_paintings(&self, _with_joins: bool) -> Result<Vec<Painting>> {
            Ok(Vec::new())
        }

        async fn list_artists(&self) -> Result<Vec<Artist>> {
            Ok(Vec::new())
        }

        async fn list_genres(&self, _with_joins: bool) -> Result<Vec<Genre>> {
            Ok(Vec::new())
        }
    }

    /// Store that reads nothing and refuses every write
    pub(crate) struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(CatalogueError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only store",
            )))
        }

        fn remove(&self, _key: &str) -> Result<bool> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_is_loading_while_fetch_outstanding() {
        let remote = Arc::new(GatedRemote {
            galleries: vec![gallery(1)],
            ..Default::default()
        });
        let loader = CollectionLoader::new(Arc::new(MemoryStore::new()), remote.clone());

        let (galleries, loading_mid_fetch) = tokio::join!(loader.galleries(), async {
            tokio::task::yield_now().await;
            let loading = loader.is_loading();
            remote.gate.notify_one();
            loading
        });

        assert!(loading_mid_fetch);
        assert_eq!(galleries, vec![gallery(1)]);
        assert!(!loader.is_loading());
    }

    #[tokio::test]
    async fn test_concurrent_loads_of_one_collection_share_the_fetch() {
        let remote = Arc::new(GatedRemote {
            galleries: vec![gallery(1)],
            ..Default::default()
        });
        let loader = CollectionLoader::new(Arc::new(MemoryStore::new()), remote.clone());

        let (first, second, _) = tokio::join!(loader.galleries(), loader.galleries(), async {
            tokio::task::yield_now().await;
            remote.gate.notify_one();
        });

        assert_eq!(first, vec![gallery(1)]);
        assert_eq!(second, vec![gallery(1)]);
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_snapshot_kept_when_cache_write_fails() {
        let remote = Arc::new(MockRemote {
            galleries: vec![gallery(1)],
            ..Default::default()
        });
        let loader = CollectionLoader::new(Arc::new(ReadOnlyStore), remote.clone());

        let first = loader.galleries().await;
        let second = loader.galleries().await;

        assert_eq!(first, vec![gallery(1)]);
        assert_eq!(first, second);
        assert_eq!(remote.calls(), 1);
    }
}
