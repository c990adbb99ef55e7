//! Cache tag vocabulary.
//!
//! Producers (mutation hooks) and consumers (the revalidation endpoint and the
//! public page handlers) must build tags through these constructors so the
//! strings line up exactly on both sides.

use std::fmt;

/// Tag that marks the legacy home page.
pub const HOME_LEGACY: &str = "home";
/// Tag that marks the home page snapshot.
pub const HOME_SNAPSHOT: &str = "home-snapshot";
/// Prefix shared by every hub snapshot tag.
pub const HUB_SNAPSHOT_PREFIX: &str = "hub-snapshot:";

/// Default size of the per-collection "top" list.
pub const DEFAULT_TOP_N: u32 = 10;

/// Listing collections tracked by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingCollection {
    Events,
    Venues,
    Services,
}

impl ListingCollection {
    pub const ALL: [ListingCollection; 3] = [
        ListingCollection::Events,
        ListingCollection::Venues,
        ListingCollection::Services,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingCollection::Events => "events",
            ListingCollection::Venues => "venues",
            ListingCollection::Services => "services",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = normalize_key(value);
        Self::ALL
            .into_iter()
            .find(|collection| collection.as_str() == normalized)
    }
}

impl fmt::Display for ListingCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalise an identifier before it is embedded in a tag.
///
/// Trims, lowercases, and slugifies so `" Cluj-Napoca "` and `"cluj napoca"`
/// both map to `cluj-napoca`.
pub fn normalize_key(value: &str) -> String {
    slug::slugify(value.trim())
}

pub fn tenant(tenant: &str) -> String {
    format!("tenant:{}", normalize_key(tenant))
}

pub fn collection(collection: ListingCollection) -> String {
    format!("collection:{collection}")
}

/// Tag for a single listing page, e.g. `events:jazz-night`.
pub fn listing(collection: ListingCollection, slug: &str) -> String {
    format!("{collection}:{}", normalize_key(slug))
}

pub fn city(city: &str) -> String {
    format!("city:{}", normalize_key(city))
}

pub fn taxonomy(kind: &str, slug: &str) -> String {
    format!("taxonomy:{}:{}", normalize_key(kind), normalize_key(slug))
}

pub fn top(collection: ListingCollection, n: u32) -> String {
    format!("top:{collection}:{n}")
}

pub fn featured(collection: ListingCollection) -> String {
    format!("featured:{collection}")
}

pub fn similar(collection: ListingCollection, slug: &str) -> String {
    format!("similar:{collection}:{}", normalize_key(slug))
}

pub fn hub_snapshot(city: &str, collection: ListingCollection) -> String {
    format!("{HUB_SNAPSHOT_PREFIX}{}:{collection}", normalize_key(city))
}

/// Hub snapshot tag that covers every hub regardless of city.
pub fn hub_any() -> String {
    format!("{HUB_SNAPSHOT_PREFIX}any")
}

pub fn home_snapshot() -> String {
    HOME_SNAPSHOT.to_string()
}

pub fn home_legacy() -> String {
    HOME_LEGACY.to_string()
}

/// Whether revalidating `tag` must also bump the shared "last updated" stamp.
pub fn is_stamp_tag(tag: &str) -> bool {
    tag == HOME_LEGACY || tag == HOME_SNAPSHOT || tag.starts_with(HUB_SNAPSHOT_PREFIX)
}
