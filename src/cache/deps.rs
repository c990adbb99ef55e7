//! Per-request tag collector.
//!
//! Public handlers call [`record`] with every tag their output depends on. The
//! response cache middleware runs the handler inside [`with_collector`] and
//! registers the cached page under the collected tags.

use std::cell::RefCell;
use std::collections::HashSet;

tokio::task_local! {
    static TAGS: RefCell<HashSet<String>>;
}

/// Record a tag the current response depends on.
///
/// Outside a collector scope the call is ignored.
pub fn record(tag: impl Into<String>) {
    let tag = tag.into();
    let _ = TAGS.try_with(|tags| {
        tags.borrow_mut().insert(tag);
    });
}

/// Record several tags at once.
pub fn record_all<I, T>(tags: I)
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    for tag in tags {
        record(tag);
    }
}

/// Tags recorded so far in the current scope; empty outside a scope.
pub fn collect() -> HashSet<String> {
    TAGS.try_with(|tags| tags.borrow().clone())
        .unwrap_or_default()
}

/// Run `f` with a fresh collector and return its output with the recorded tags.
pub async fn with_collector<F, R>(f: F) -> (R, HashSet<String>)
where
    F: std::future::Future<Output = R>,
{
    TAGS.scope(RefCell::new(HashSet::new()), async move {
        let result = f.await;
        (result, collect())
    })
    .await
}
