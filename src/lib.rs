//! UN:EVENT cache-tag invalidation: content hooks, revalidation, and the shared
//! "last updated" stamp.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod util;
