//! Paginated list merging
//!
//! Pages are appended to one growing list. An ID set keeps the list free
//! of duplicates when pages overlap (new items shifted the server-side
//! window) or when real-time pushes already delivered an item.

use std::collections::HashSet;

use crate::types::{Identified, Page};

/// Growing list of items loaded page by page, de-duplicated by ID
#[derive(Debug, Clone)]
pub struct PagedList<T> {
    items: Vec<T>,
    seen: HashSet<String>,
    next_page: u32,
    has_more: bool,
}

impl<T> Default for PagedList<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            next_page: 1,
            has_more: true,
        }
    }
}

impl<T: Identified> PagedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a fetched page. Returns how many items were new.
    pub fn append_page(&mut self, page: Page<T>) -> usize {
        self.has_more = page.has_more;
        self.next_page = self.next_page.max(page.page.saturating_add(1));
        self.append(page.items)
    }

    /// Append items at the end, skipping IDs already present
    pub fn append(&mut self, items: impl IntoIterator<Item = T>) -> usize {
        let before = self.items.len();
        for item in items {
            if self.seen.insert(item.id().to_string()) {
                self.items.push(item);
            }
        }
        self.items.len() - before
    }

    /// Insert at the front (newest first). Returns false for a known ID.
    pub fn prepend(&mut self, item: T) -> bool {
        if !self.seen.insert(item.id().to_string()) {
            return false;
        }
        self.items.insert(0, item);
        true
    }

    /// Replace an item in place, or append it when unknown.
    ///
    /// Returns true when an existing item was replaced.
    pub fn upsert(&mut self, item: T) -> bool {
        match self.position(item.id()) {
            Some(index) => {
                self.items[index] = item;
                true
            }
            None => {
                self.seen.insert(item.id().to_string());
                self.items.push(item);
                false
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        let index = self.position(id)?;
        self.seen.remove(id);
        Some(self.items.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.position(id).map(|i| &self.items[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut T> {
        let index = self.position(id)?;
        Some(&mut self.items[index])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        if !self.seen.contains(id) {
            return None;
        }
        self.items.iter().position(|item| item.id() == id)
    }
}

impl<T> PagedList<T> {
    /// Whether another page should be requested
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// 1-based number of the page to fetch next
    pub fn next_page(&self) -> u32 {
        self.next_page
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Stable re-order, keeping equal keys in arrival order
    pub fn sort_by_key<K: Ord>(&mut self, key: impl FnMut(&T) -> K) {
        self.items.sort_by_key(key);
    }

    /// Forget everything, as on pull-to-refresh
    pub fn reset(&mut self) {
        self.items.clear();
        self.seen.clear();
        self.next_page = 1;
        self.has_more = true;
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: String,
        label: &'static str,
    }

    impl Identified for Item {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn item(id: &str) -> Item {
        Item {
            id: id.to_string(),
            label: "v1",
        }
    }

    fn ids(list: &PagedList<Item>) -> Vec<&str> {
        list.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_overlapping_pages_do_not_duplicate() {
        let mut list = PagedList::new();
        list.append_page(Page::new(vec![item("a"), item("b"), item("c")], 1, true));
        let added = list.append_page(Page::new(vec![item("c"), item("d")], 2, false));

        assert_eq!(added, 1);
        assert_eq!(ids(&list), vec!["a", "b", "c", "d"]);
        assert!(!list.has_more());
        assert_eq!(list.next_page(), 3);
    }

    #[test]
    fn test_first_seen_order_kept() {
        let mut list = PagedList::new();
        list.append(vec![item("x"), item("y")]);
        let mut newer = item("x");
        newer.label = "v2";
        list.append(vec![newer]);
        assert_eq!(list.get("x").unwrap().label, "v1");
    }

    #[test]
    fn test_prepend_dedupes() {
        let mut list = PagedList::new();
        list.append(vec![item("a")]);
        assert!(list.prepend(item("z")));
        assert!(!list.prepend(item("a")));
        assert_eq!(ids(&list), vec!["z", "a"]);
    }

    #[test]
    fn test_upsert_replaces_in_place() {
        let mut list = PagedList::new();
        list.append(vec![item("a"), item("b")]);
        let mut updated = item("a");
        updated.label = "v2";
        assert!(list.upsert(updated));
        assert!(!list.upsert(item("c")));
        assert_eq!(ids(&list), vec!["a", "b", "c"]);
        assert_eq!(list.get("a").unwrap().label, "v2");
    }

    #[test]
    fn test_remove_allows_readding() {
        let mut list = PagedList::new();
        list.append(vec![item("a"), item("b")]);
        assert_eq!(list.remove("a").unwrap().id, "a");
        assert!(list.remove("a").is_none());
        assert!(!list.contains("a"));
        assert_eq!(list.append(vec![item("a")]), 1);
        assert_eq!(ids(&list), vec!["b", "a"]);
    }

    #[test]
    fn test_reset() {
        let mut list = PagedList::new();
        list.append_page(Page::new(vec![item("a")], 1, false));
        list.reset();
        assert!(list.is_empty());
        assert!(list.has_more());
        assert_eq!(list.next_page(), 1);
    }

    #[test]
    fn test_stale_page_does_not_rewind_cursor() {
        let mut list: PagedList<Item> = PagedList::new();
        list.append_page(Page::new(vec![], 3, true));
        list.append_page(Page::new(vec![], 1, true));
        assert_eq!(list.next_page(), 4);
    }
}
