//! Page cache storage.
//!
//! Holds rendered public responses keyed by path and query. Entries are
//! dropped by tag through the [`TagRegistry`](super::TagRegistry).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::RwLock;

use bytes::Bytes;
use lru::LruCache;

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

/// Key of a cached page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub path: String,
    pub query_hash: u64,
}

impl PageKey {
    pub fn new(path: impl Into<String>, query: &str) -> Self {
        Self {
            path: path.into(),
            query_hash: hash_query(query),
        }
    }
}

/// Hash a query string for page key generation.
pub fn hash_query(query: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    query.hash(&mut hasher);
    hasher.finish()
}

/// Cached HTTP response.
#[derive(Debug, Clone)]
pub struct CachedPage {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// LRU store of rendered pages.
pub struct PageStore {
    pages: RwLock<LruCache<PageKey, CachedPage>>,
}

impl PageStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            pages: RwLock::new(LruCache::new(config.response_limit_non_zero())),
        }
    }

    pub fn get(&self, key: &PageKey) -> Option<CachedPage> {
        rw_write(&self.pages, SOURCE, "get").get(key).cloned()
    }

    /// Store a page, returning the key evicted to make room, if any.
    pub fn set(&self, key: PageKey, page: CachedPage) -> Option<PageKey> {
        rw_write(&self.pages, SOURCE, "set")
            .push(key.clone(), page)
            .and_then(|(evicted, _)| (evicted != key).then_some(evicted))
    }

    pub fn invalidate(&self, key: &PageKey) -> bool {
        rw_write(&self.pages, SOURCE, "invalidate")
            .pop(key)
            .is_some()
    }

    pub fn invalidate_all(&self) {
        rw_write(&self.pages, SOURCE, "invalidate_all").clear();
    }

    pub fn contains(&self, key: &PageKey) -> bool {
        rw_read(&self.pages, SOURCE, "contains").contains(key)
    }

    pub fn len(&self) -> usize {
        rw_read(&self.pages, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
