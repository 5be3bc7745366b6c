use std::collections::BTreeMap;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::http::Response;

use super::entry::{CachedData, StoredResponse};

/// Default bound on entries per store.
/// Shell assets plus a few hundred API responses fit comfortably on low-end phones.
const DEFAULT_MAX_ENTRIES: usize = 500;

/// Bounds applied to lazily cached responses. Precached (manifest) entries
/// are never expired or evicted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub max_entries: Option<usize>,
    pub max_age: Option<Duration>,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            max_entries: Some(DEFAULT_MAX_ENTRIES),
            max_age: None,
        }
    }
}

impl RetentionPolicy {
    /// No bounds at all
    pub fn unbounded() -> Self {
        Self {
            max_entries: None,
            max_age: None,
        }
    }

    fn is_expired(&self, entry: &CachedData<StoredResponse>) -> bool {
        if entry.data.precached {
            return false;
        }
        self.max_age
            .map(|max_age| entry.is_older_than(max_age))
            .unwrap_or(false)
    }
}

/// One named cache store: request identity -> stored response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStore {
    name: String,
    #[serde(default)]
    entries: BTreeMap<String, CachedData<StoredResponse>>,
}

impl CacheStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&CachedData<StoredResponse>> {
        self.entries.get(key)
    }

    /// Look up a response, skipping entries the policy considers expired
    pub fn lookup(&self, key: &str, policy: &RetentionPolicy) -> Option<&Response> {
        self.entries
            .get(key)
            .filter(|entry| !policy.is_expired(entry))
            .map(|entry| &entry.data.response)
    }

    /// Insert or overwrite the entry for `key`
    pub fn insert(&mut self, key: String, entry: StoredResponse) {
        self.entries.insert(key, CachedData::new(entry));
    }

    pub fn precached_count(&self) -> usize {
        self.entries.values().filter(|e| e.data.precached).count()
    }

    /// Age of the most recently written entry
    pub fn last_updated(&self) -> Option<String> {
        self.entries
            .values()
            .max_by_key(|e| e.cached_at)
            .map(|e| e.age_display())
    }

    /// Drop expired entries, then evict the oldest lazily cached entries
    /// until the store fits `max_entries`. Returns how many were removed.
    pub fn prune(&mut self, policy: &RetentionPolicy) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !policy.is_expired(entry));

        if let Some(max_entries) = policy.max_entries {
            if self.entries.len() > max_entries {
                let mut evictable: Vec<_> = self
                    .entries
                    .iter()
                    .filter(|(_, e)| !e.data.precached)
                    .map(|(k, e)| (e.cached_at, k.clone()))
                    .collect();
                evictable.sort();

                let excess = self.entries.len() - max_entries;
                for (_, key) in evictable.into_iter().take(excess) {
                    self.entries.remove(&key);
                }
            }
        }

        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn stored(url: &str, precached: bool) -> StoredResponse {
        StoredResponse {
            url: url.to_string(),
            response: Response::ok(url.as_bytes().to_vec()),
            precached,
        }
    }

    fn backdate(store: &mut CacheStore, key: &str, minutes: i64) {
        let entry = store.entries.get_mut(key).unwrap();
        entry.cached_at = Utc::now() - Duration::minutes(minutes);
    }

    #[test]
    fn test_insert_overwrites_same_key() {
        let mut store = CacheStore::new("kazi-cash-v1");
        store.insert("GET /".to_string(), stored("/", true));
        store.insert("GET /".to_string(), stored("/", true));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_prune_evicts_oldest_lazy_entries_first() {
        let mut store = CacheStore::new("kazi-cash-v1");
        store.insert("GET /".to_string(), stored("/", true));
        store.insert("GET /a".to_string(), stored("/a", false));
        store.insert("GET /b".to_string(), stored("/b", false));
        store.insert("GET /c".to_string(), stored("/c", false));
        backdate(&mut store, "GET /", 90);
        backdate(&mut store, "GET /a", 30);
        backdate(&mut store, "GET /b", 20);
        backdate(&mut store, "GET /c", 10);

        let policy = RetentionPolicy {
            max_entries: Some(2),
            max_age: None,
        };
        assert_eq!(store.prune(&policy), 2);

        // The precached shell survives even though it is the oldest
        assert!(store.get("GET /").is_some());
        assert!(store.get("GET /c").is_some());
        assert!(store.get("GET /a").is_none());
        assert!(store.get("GET /b").is_none());
    }

    #[test]
    fn test_prune_never_evicts_precached() {
        let mut store = CacheStore::new("kazi-cash-v1");
        store.insert("GET /".to_string(), stored("/", true));
        store.insert("GET /index.html".to_string(), stored("/index.html", true));

        let policy = RetentionPolicy {
            max_entries: Some(1),
            max_age: None,
        };
        assert_eq!(store.prune(&policy), 0);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_expired_entries_are_hidden_and_pruned() {
        let mut store = CacheStore::new("kazi-cash-v1");
        store.insert("GET /".to_string(), stored("/", true));
        store.insert("GET /api/jobs".to_string(), stored("/api/jobs", false));
        backdate(&mut store, "GET /", 120);
        backdate(&mut store, "GET /api/jobs", 120);

        let policy = RetentionPolicy {
            max_entries: None,
            max_age: Some(Duration::minutes(60)),
        };
        assert!(store.lookup("GET /api/jobs", &policy).is_none());
        assert!(store.lookup("GET /", &policy).is_some());

        assert_eq!(store.prune(&policy), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_unbounded_policy_keeps_everything() {
        let mut store = CacheStore::new("kazi-cash-v1");
        for i in 0..10 {
            store.insert(format!("GET /{}", i), stored("/", false));
        }
        assert_eq!(store.prune(&RetentionPolicy::unbounded()), 0);
        assert_eq!(store.len(), 10);
        assert_eq!(store.last_updated().as_deref(), Some("just now"));
    }
}
