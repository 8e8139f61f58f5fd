/// State management module
///
/// This module owns all catalogue state, including:
/// - The persistent key-value store (storage.rs)
/// - The hosted backend client (remote.rs)
/// - Fetch-once collection loading (loader.rs)
/// - Shared data structures (data.rs)
/// - Selection, filtering and sorting (filter.rs)
/// - Favorites (favorites.rs)
/// - The composed store handed to views (catalogue.rs)

pub mod catalogue;
pub mod data;
pub mod favorites;
pub mod filter;
pub mod loader;
pub mod remote;
pub mod storage;
