//! Bidirectional tag registry.
//!
//! Tracks which cached pages were rendered from which tags so a revalidated
//! tag can drop exactly the pages that depend on it.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use super::lock::{rw_read, rw_write};
use super::store::PageKey;

const SOURCE: &str = "cache::registry";

#[derive(Default)]
struct Mappings {
    tag_to_pages: HashMap<String, HashSet<PageKey>>,
    page_to_tags: HashMap<PageKey, HashSet<String>>,
    /// Bumped by every `take_tag` and `clear`.
    generation: u64,
}

/// Tracks tag → pages and page → tags.
pub struct TagRegistry {
    inner: RwLock<Mappings>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Mappings::default()),
        }
    }

    /// Register a cached page with the tags it was rendered from.
    ///
    /// Re-registering a page replaces its previous tag set.
    pub fn register(&self, page: PageKey, tags: HashSet<String>) {
        let mut inner = rw_write(&self.inner, SOURCE, "register");
        attach(&mut inner, page, tags);
    }

    /// Current revalidation generation; pass it to [`Self::register_since`].
    pub fn generation(&self) -> u64 {
        rw_read(&self.inner, SOURCE, "generation").generation
    }

    /// Register `page` only if nothing was revalidated after `generation` was read.
    ///
    /// Returns `false` and leaves the mappings untouched otherwise.
    pub fn register_since(&self, page: PageKey, tags: HashSet<String>, generation: u64) -> bool {
        let mut inner = rw_write(&self.inner, SOURCE, "register_since");
        if inner.generation != generation {
            return false;
        }
        attach(&mut inner, page, tags);
        true
    }

    pub fn pages_for_tag(&self, tag: &str) -> HashSet<PageKey> {
        rw_read(&self.inner, SOURCE, "pages_for_tag")
            .tag_to_pages
            .get(tag)
            .cloned()
            .unwrap_or_default()
    }

    pub fn tags_for_page(&self, page: &PageKey) -> HashSet<String> {
        rw_read(&self.inner, SOURCE, "tags_for_page")
            .page_to_tags
            .get(page)
            .cloned()
            .unwrap_or_default()
    }

    /// Remove a page and clean up its tag mappings.
    pub fn unregister(&self, page: &PageKey) {
        let mut inner = rw_write(&self.inner, SOURCE, "unregister");
        detach(&mut inner, page);
    }

    /// Remove every page registered under `tag`, returning the removed pages.
    pub fn take_tag(&self, tag: &str) -> HashSet<PageKey> {
        let mut inner = rw_write(&self.inner, SOURCE, "take_tag");
        inner.generation = inner.generation.wrapping_add(1);
        let pages = inner.tag_to_pages.get(tag).cloned().unwrap_or_default();
        for page in &pages {
            detach(&mut inner, page);
        }
        pages
    }

    pub fn clear(&self) {
        let mut inner = rw_write(&self.inner, SOURCE, "clear");
        inner.generation = inner.generation.wrapping_add(1);
        inner.tag_to_pages.clear();
        inner.page_to_tags.clear();
    }

    pub fn tag_count(&self) -> usize {
        rw_read(&self.inner, SOURCE, "tag_count").tag_to_pages.len()
    }

    pub fn page_count(&self) -> usize {
        rw_read(&self.inner, SOURCE, "page_count").page_to_tags.len()
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn attach(inner: &mut Mappings, page: PageKey, tags: HashSet<String>) {
    detach(inner, &page);
    for tag in &tags {
        inner
            .tag_to_pages
            .entry(tag.clone())
            .or_default()
            .insert(page.clone());
    }
    inner.page_to_tags.insert(page, tags);
}

fn detach(inner: &mut Mappings, page: &PageKey) {
    let Some(tags) = inner.page_to_tags.remove(page) else {
        return;
    };
    for tag in tags {
        if let Some(pages) = inner.tag_to_pages.get_mut(&tag) {
            pages.remove(page);
            if pages.is_empty() {
                inner.tag_to_pages.remove(&tag);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> HashSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn register_and_lookup() {
        let registry = TagRegistry::new();
        let page = PageKey::new("/listings/events/jazz-night", "");

        registry.register(page.clone(), tags(&["events:jazz-night", "city:cluj"]));

        assert!(registry.pages_for_tag("city:cluj").contains(&page));
        assert!(registry.tags_for_page(&page).contains("events:jazz-night"));
    }

    #[test]
    fn unregister_cleans_up_mappings() {
        let registry = TagRegistry::new();
        let page = PageKey::new("/listings/events", "");

        registry.register(page.clone(), tags(&["collection:events"]));
        assert_eq!(registry.page_count(), 1);
        assert_eq!(registry.tag_count(), 1);

        registry.unregister(&page);
        assert_eq!(registry.page_count(), 0);
        assert_eq!(registry.tag_count(), 0);
    }

    #[test]
    fn take_tag_detaches_pages_from_other_tags() {
        let registry = TagRegistry::new();
        let detail = PageKey::new("/listings/events/jazz-night", "");
        let index = PageKey::new("/listings/events", "");

        registry.register(detail.clone(), tags(&["events:jazz-night", "city:cluj"]));
        registry.register(index.clone(), tags(&["collection:events", "city:cluj"]));

        let taken = registry.take_tag("events:jazz-night");
        assert_eq!(taken.len(), 1);
        assert!(taken.contains(&detail));

        let remaining = registry.pages_for_tag("city:cluj");
        assert_eq!(remaining.len(), 1);
        assert!(remaining.contains(&index));
        assert!(registry.take_tag("unknown").is_empty());
    }

    #[test]
    fn reregistering_replaces_tags() {
        let registry = TagRegistry::new();
        let page = PageKey::new("/listings/venues", "");

        registry.register(page.clone(), tags(&["collection:venues"]));
        registry.register(page.clone(), tags(&["city:iasi"]));

        assert!(registry.pages_for_tag("collection:venues").is_empty());
        assert!(registry.pages_for_tag("city:iasi").contains(&page));
    }

    #[test]
    fn register_since_refuses_after_revalidation() {
        let registry = TagRegistry::new();
        let page = PageKey::new("/listings/events", "");

        let started = registry.generation();
        registry.take_tag("city:iasi");
        assert!(!registry.register_since(page.clone(), tags(&["collection:events"]), started));
        assert_eq!(registry.page_count(), 0);

        let started = registry.generation();
        assert!(registry.register_since(page.clone(), tags(&["collection:events"]), started));
        assert!(registry.pages_for_tag("collection:events").contains(&page));
    }

    #[test]
    fn clear_removes_all_mappings() {
        let registry = TagRegistry::new();
        registry.register(PageKey::new("/", ""), tags(&["home"]));
        registry.clear();
        assert_eq!(registry.page_count(), 0);
        assert_eq!(registry.tag_count(), 0);
    }
}
