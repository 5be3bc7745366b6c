use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::http::{Request, Response};

use super::entry::StoredResponse;
use super::error::CacheError;
use super::store::{CacheStore, RetentionPolicy};

/// Overview of one store, for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSummary {
    pub name: String,
    pub entries: usize,
    pub precached: usize,
    pub last_updated: Option<String>,
}

/// The set of named cache stores.
///
/// Puts are atomic per key. Whole stores are only deleted during
/// activation of a newer cache manager version.
pub struct CacheStorage {
    root: Option<PathBuf>,
    policy: RetentionPolicy,
    stores: RwLock<BTreeMap<String, CacheStore>>,
    // Serializes file writes so the newest snapshot is always the last one written
    io: Mutex<()>,
}

impl CacheStorage {
    /// Storage that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            root: None,
            policy: RetentionPolicy::default(),
            stores: RwLock::new(BTreeMap::new()),
            io: Mutex::new(()),
        }
    }

    /// Storage mirrored to `dir`, one JSON file per store. Existing store
    /// files are loaded; unreadable ones are skipped with a warning.
    pub fn open_dir(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| CacheError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut stores = BTreeMap::new();
        let listing = std::fs::read_dir(&dir).map_err(|source| CacheError::Io {
            path: dir.clone(),
            source,
        })?;
        for entry in listing.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match load_store(&path) {
                Ok(store) if store_path(&dir, store.name()) != path => {
                    warn!(path = %path.display(), store = store.name(), "Skipping cache file stored under another name");
                }
                Ok(store) => {
                    debug!(store = store.name(), entries = store.len(), "Loaded cache store");
                    stores.insert(store.name().to_string(), store);
                }
                Err(e) => warn!(error = %e, "Skipping unreadable cache store"),
            }
        }

        Ok(Self {
            root: Some(dir),
            policy: RetentionPolicy::default(),
            stores: RwLock::new(stores),
            io: Mutex::new(()),
        })
    }

    pub fn with_policy(mut self, policy: RetentionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Open the named store, creating it if needed
    pub async fn open(&self, name: &str) -> Result<(), CacheError> {
        validate_name(name)?;
        let created = {
            let mut stores = self.stores.write().await;
            if stores.contains_key(name) {
                false
            } else {
                stores.insert(name.to_string(), CacheStore::new(name));
                true
            }
        };
        if created {
            debug!(store = name, "Created cache store");
            self.persist(name).await?;
        }
        Ok(())
    }

    /// Names of all existing stores
    pub async fn keys(&self) -> Vec<String> {
        self.stores.read().await.keys().cloned().collect()
    }

    pub async fn has(&self, name: &str) -> bool {
        self.stores.read().await.contains_key(name)
    }

    /// Delete a whole store. Returns whether it existed.
    pub async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        let existed = self.stores.write().await.remove(name).is_some();
        if existed {
            self.persist(name).await?;
        }
        Ok(existed)
    }

    /// Lazily cache a response, then apply the retention policy.
    ///
    /// Only writes into an existing store: a store deleted by activation is
    /// never brought back by a late write. Returns whether anything was
    /// written.
    pub async fn put(
        &self,
        name: &str,
        request: &Request,
        response: &Response,
    ) -> Result<bool, CacheError> {
        {
            let mut stores = self.stores.write().await;
            let Some(store) = stores.get_mut(name) else {
                debug!(store = name, "Store no longer exists, skipping write");
                return Ok(false);
            };
            let key = request.cache_key();
            // A live refresh of a manifest asset stays part of the shell
            let precached = store.get(&key).is_some_and(|e| e.data.precached);
            store.insert(
                key,
                StoredResponse {
                    url: request.url.to_string(),
                    response: response.clone(),
                    precached,
                },
            );
            let evicted = store.prune(&self.policy);
            if evicted > 0 {
                debug!(store = name, evicted, "Pruned cache store");
            }
        }
        self.persist(name).await?;
        Ok(true)
    }

    /// Write a batch of manifest responses in one step
    pub async fn put_precached(
        &self,
        name: &str,
        entries: Vec<(Request, Response)>,
    ) -> Result<(), CacheError> {
        validate_name(name)?;
        {
            let mut stores = self.stores.write().await;
            let store = stores
                .entry(name.to_string())
                .or_insert_with(|| CacheStore::new(name));
            for (request, response) in entries {
                store.insert(
                    request.cache_key(),
                    StoredResponse {
                        url: request.url.to_string(),
                        response,
                        precached: true,
                    },
                );
            }
        }
        self.persist(name).await
    }

    /// Find the stored response for `request` in the named store
    pub async fn lookup(&self, name: &str, request: &Request) -> Option<Response> {
        self.lookup_key(name, &request.cache_key()).await
    }

    pub async fn lookup_key(&self, name: &str, key: &str) -> Option<Response> {
        let stores = self.stores.read().await;
        stores
            .get(name)
            .and_then(|store| store.lookup(key, &self.policy))
            .cloned()
    }

    pub async fn entry_count(&self, name: &str) -> usize {
        self.stores
            .read()
            .await
            .get(name)
            .map(CacheStore::len)
            .unwrap_or(0)
    }

    /// Keys stored in the named store
    pub async fn entry_keys(&self, name: &str) -> Vec<String> {
        self.stores
            .read()
            .await
            .get(name)
            .map(|store| store.keys().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub async fn summaries(&self) -> Vec<StoreSummary> {
        self.stores
            .read()
            .await
            .values()
            .map(|store| StoreSummary {
                name: store.name().to_string(),
                entries: store.len(),
                precached: store.precached_count(),
                last_updated: store.last_updated(),
            })
            .collect()
    }

    /// Mirror the named store to disk, or remove its file if it is gone
    async fn persist(&self, name: &str) -> Result<(), CacheError> {
        let Some(root) = &self.root else {
            return Ok(());
        };
        let _io = self.io.lock().await;

        let snapshot = {
            let stores = self.stores.read().await;
            match stores.get(name) {
                Some(store) => Some(serde_json::to_vec(store).map_err(|source| {
                    CacheError::Serialize {
                        name: name.to_string(),
                        source,
                    }
                })?),
                None => None,
            }
        };

        let path = store_path(root, name);
        match snapshot {
            Some(contents) => tokio::fs::write(&path, contents)
                .await
                .map_err(|source| CacheError::Io { path, source }),
            None => match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(source) => Err(CacheError::Io { path, source }),
            },
        }
    }
}

fn load_store(path: &Path) -> Result<CacheStore, CacheError> {
    let contents = std::fs::read_to_string(path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| CacheError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Store names double as file names, so they are limited to ASCII
/// letters, digits, `-`, `_` and `.`, and may not start with a dot.
fn validate_name(name: &str) -> Result<(), CacheError> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(CacheError::InvalidName(name.to_string()))
    }
}

fn store_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{}.json", name))
}
