//! UN:EVENT cache plumbing.
//!
//! - **Tags**: the shared vocabulary of invalidation scopes
//! - **Page cache**: rendered public responses indexed by the tags they were
//!   built from, dropped per tag on revalidation
//! - **Stamp**: the shared "last updated" timestamp polled by clients
//!
//! ```toml
//! [page_cache]
//! enabled = true
//! response_limit = 500
//!
//! [store]
//! stamp_ttl_seconds = 3600
//! ```

mod config;
pub mod deps;
mod lock;
mod middleware;
mod registry;
pub mod stamp;
mod store;
pub mod tags;

pub use config::CacheConfig;
pub use middleware::{PageCache, describe_metrics, response_cache_layer};
pub use registry::TagRegistry;
pub use stamp::{HOME_STAMP_KEY, HomeStamp, MemoryStore, SharedStore, StoreError};
pub use store::{CachedPage, PageKey, PageStore, hash_query};
pub use tags::ListingCollection;
