//! Page cache configuration.
//!
//! Controls the tag-indexed response cache via the `[page_cache]` section.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_RESPONSE_LIMIT: usize = 500;
const DEFAULT_RESPONSE_BODY_LIMIT_BYTES: usize = 1024 * 1024;
const DEFAULT_STAMP_TTL_SECS: u64 = 60 * 60;

/// Page cache configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the response cache for public listing pages.
    pub enabled: bool,
    /// Maximum cached responses before LRU eviction.
    pub response_limit: usize,
    /// Responses with larger bodies are served but never cached.
    pub response_body_limit_bytes: usize,
    /// Expiry applied to the shared "last updated" stamp.
    pub stamp_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            response_limit: DEFAULT_RESPONSE_LIMIT,
            response_body_limit_bytes: DEFAULT_RESPONSE_BODY_LIMIT_BYTES,
            stamp_ttl_seconds: DEFAULT_STAMP_TTL_SECS,
        }
    }
}

impl CacheConfig {
    pub fn from_settings(
        page_cache: &crate::config::PageCacheSettings,
        store: &crate::config::StoreSettings,
    ) -> Self {
        Self {
            enabled: page_cache.enabled,
            response_limit: page_cache.response_limit,
            response_body_limit_bytes: page_cache.response_body_limit_bytes,
            stamp_ttl_seconds: store.stamp_ttl.as_secs(),
        }
    }

    /// Returns the response limit as NonZeroUsize, clamping to 1 if zero.
    pub fn response_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.response_limit).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn stamp_ttl(&self) -> Duration {
        Duration::from_secs(self.stamp_ttl_seconds)
    }
}
