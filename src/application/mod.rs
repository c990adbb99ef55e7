//! Application services layer.

pub mod content;
pub mod effect;
pub mod error;
pub mod hooks;
pub mod notify;
pub mod repos;
pub mod revalidation;
