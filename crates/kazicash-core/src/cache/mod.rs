//! Versioned response cache for offline access.
//!
//! This module provides `CacheStorage`, the set of named cache stores that
//! the cache manager reads and writes. Each store belongs to one cache
//! manager version (for example `kazi-cash-v1`) and maps a request identity
//! to the stored response.
//!
//! Stores live in memory and, when opened on a directory, are mirrored to
//! one JSON file per store so a restarted process keeps its offline data.

pub mod entry;
pub mod error;
pub mod storage;
pub mod store;

pub use entry::{CachedData, StoredResponse};
pub use error::CacheError;
pub use storage::{CacheStorage, StoreSummary};
pub use store::{CacheStore, RetentionPolicy};
