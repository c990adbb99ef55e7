//! Shared "last updated" stamp.
//!
//! The stamp lives in a key-value store shared by every frontend instance.
//! It is written by the revalidation endpoint and read by the polling
//! endpoint. Writes are last-writer-wins: a slow revalidation can overwrite a
//! newer stamp written by a faster concurrent one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;

use crate::util::clock::now_millis;

/// Key under which the home/hub staleness stamp is stored.
pub const HOME_STAMP_KEY: &str = "unevent:home:last-update";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("stored value for `{key}` is not a timestamp: {value}")]
    Corrupt { key: String, value: String },
}

/// Key-value capability backing the stamp.
#[async_trait]
pub trait SharedStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Write `value` and apply `ttl` as two separate operations.
    async fn set_with_expiry(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        self.set(key, value).await?;
        self.expire(key, ttl).await
    }
}

/// Reads and writes the home stamp through a [`SharedStore`].
#[derive(Clone)]
pub struct HomeStamp {
    store: Arc<dyn SharedStore>,
    ttl: Duration,
}

impl HomeStamp {
    pub fn new(store: Arc<dyn SharedStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Stamp the current time and return it.
    pub async fn touch(&self) -> Result<i64, StoreError> {
        let now = now_millis();
        self.store
            .set_with_expiry(HOME_STAMP_KEY, now.to_string(), self.ttl)
            .await?;
        Ok(now)
    }

    /// Read the stamp; `None` when it was never written or has expired.
    pub async fn read(&self) -> Result<Option<i64>, StoreError> {
        let Some(raw) = self.store.get(HOME_STAMP_KEY).await? else {
            return Ok(None);
        };
        raw.trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| StoreError::Corrupt {
                key: HOME_STAMP_KEY.to_string(),
                value: raw,
            })
    }
}

struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

/// Process-local [`SharedStore`] used when no Redis URL is configured and in tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, MemoryEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SharedStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let expired = match self.entries.get(key) {
            None => return Ok(None),
            Some(entry) => match entry.expires_at {
                Some(deadline) if deadline <= Instant::now() => true,
                _ => return Ok(Some(entry.value.clone())),
            },
        };
        if expired {
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(
            key.to_string(),
            MemoryEntry {
                value,
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        if let Some(mut entry) = self.entries.get_mut(key) {
            // Past the clock's range the entry simply never expires.
            entry.expires_at = Instant::now().checked_add(ttl);
        }
        Ok(())
    }
}
