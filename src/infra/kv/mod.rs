//! Shared key-value store adapters.

mod redis_store;

use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::{MemoryStore, SharedStore};
use crate::config::StoreSettings;

pub use redis_store::RedisStore;

/// Connect the configured shared store.
///
/// Without a Redis URL, or when Redis cannot be reached at startup, the stamp
/// lives in process memory and is not shared between instances.
pub async fn connect(settings: &StoreSettings) -> Arc<dyn SharedStore> {
    let Some(url) = settings.redis_url.as_deref() else {
        info!(
            target = "unevent::infra::kv",
            backend = "memory",
            "no redis url configured; using in-process store"
        );
        return Arc::new(MemoryStore::new());
    };

    match RedisStore::connect(url, settings.connect_timeout).await {
        Ok(store) => {
            info!(target = "unevent::infra::kv", backend = "redis", "shared store connected");
            Arc::new(store)
        }
        Err(err) => {
            warn!(
                target = "unevent::infra::kv",
                backend = "memory",
                error = %err,
                "redis unavailable; falling back to in-process store"
            );
            Arc::new(MemoryStore::new())
        }
    }
}
