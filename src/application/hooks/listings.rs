use std::collections::HashSet;

use tracing::info;

use crate::application::notify::{Delivery, TagFanout};
use crate::cache::tags;
use crate::domain::entities::ListingRecord;

/// Taxonomy kind assumed for entries written without a `kind:` prefix.
const DEFAULT_TAXONOMY_KIND: &str = "category";

/// Compose the cache tags affected by writing `current` over `previous`.
///
/// Order is stable and duplicates are removed.
pub fn listing_tags(current: &ListingRecord, previous: Option<&ListingRecord>) -> Vec<String> {
    let collection = current.collection;
    let mut out = TagList::default();

    out.push(tags::tenant(&current.tenant));
    if let Some(prev) = previous {
        out.push(tags::tenant(&prev.tenant));
    }
    out.push(tags::collection(collection));
    if let Some(prev) = previous.filter(|prev| prev.collection != collection) {
        out.push(tags::collection(prev.collection));
    }

    out.push(tags::listing(collection, &current.slug));
    if let Some(prev) = previous {
        out.push(tags::listing(prev.collection, &prev.slug));
    }

    out.push(tags::city(&current.city));
    if let Some(prev) = previous {
        out.push(tags::city(&prev.city));
    }

    for entry in current
        .taxonomies
        .iter()
        .chain(previous.into_iter().flat_map(|prev| prev.taxonomies.iter()))
    {
        let (kind, slug) = split_taxonomy(entry);
        if !slug.trim().is_empty() {
            out.push(tags::taxonomy(kind, slug));
        }
    }

    out.push(tags::top(collection, tags::DEFAULT_TOP_N));
    if let Some(prev) = previous {
        out.push(tags::top(prev.collection, tags::DEFAULT_TOP_N));
    }
    out.push(tags::similar(collection, &current.slug));
    if let Some(prev) = previous {
        out.push(tags::similar(prev.collection, &prev.slug));
    }

    out.push(tags::hub_snapshot(&current.city, collection));
    if let Some(prev) = previous {
        out.push(tags::hub_snapshot(&prev.city, prev.collection));
    }
    out.push(tags::hub_any());

    let was_featured = previous.is_some_and(|prev| prev.featured);
    if current.featured || was_featured {
        out.push(tags::featured(collection));
        if let Some(prev) = previous.filter(|prev| prev.featured) {
            out.push(tags::featured(prev.collection));
        }
        out.push(tags::home_snapshot());
        out.push(tags::home_legacy());
    }

    out.into_vec()
}

/// Send a listing write's tags to every notifier.
pub async fn after_listing_change(fanout: &TagFanout, tags: &[String]) -> Vec<Delivery> {
    if fanout.is_empty() {
        return Vec::new();
    }
    info!(
        target = "unevent::hooks::listings",
        tag_count = tags.len(),
        "fanning out listing tags"
    );
    fanout.fan_out(tags).await
}

fn split_taxonomy(entry: &str) -> (&str, &str) {
    match entry.split_once(':') {
        Some((kind, slug)) if !kind.trim().is_empty() => (kind, slug),
        Some((_, slug)) => (DEFAULT_TAXONOMY_KIND, slug),
        None => (DEFAULT_TAXONOMY_KIND, entry),
    }
}

#[derive(Default)]
struct TagList {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl TagList {
    fn push(&mut self, tag: String) {
        if self.seen.insert(tag.clone()) {
            self.ordered.push(tag);
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.ordered
    }
}
