use crate::listing::{FeedMetadata, ListingId, ListingItem};
use std::collections::HashMap;

/// Result of [`ListingStore::append`].
#[derive(Debug, Default, PartialEq)]
pub struct AppendOutcome {
    pub appended: usize,
    /// Ids that were already materialized and got dropped.
    pub duplicates: Vec<ListingId>,
}

/// Ordered collection of materialized listings plus the identity index used
/// to keep it duplicate-free.
///
/// `items` holds values in rendering order, `index` maps each id to its slot
/// in `items`. Both are only touched through [`reset`](Self::reset) and
/// [`append`](Self::append) so they can never disagree.
#[derive(Debug, Default)]
pub struct ListingStore {
    items: Vec<ListingItem>,
    index: HashMap<ListingId, usize>,
    metadata: Option<FeedMetadata>,
}

impl ListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all contents with `items`, rebuilding the index from scratch.
    ///
    /// A duplicate id inside the batch keeps the slot of its first occurrence
    /// and takes the payload of its last one.
    pub fn reset(&mut self, items: Vec<ListingItem>) {
        self.items = Vec::with_capacity(items.len());
        self.index = HashMap::with_capacity(items.len());
        self.metadata = None;

        for item in items {
            match self.index.get(&item.id) {
                Some(&slot) => {
                    tracing::warn!(id = %item.id, "Duplicate listing id in reset batch, keeping last payload");
                    self.items[slot] = item;
                }
                None => {
                    self.index.insert(item.id.clone(), self.items.len());
                    self.items.push(item);
                }
            }
        }
        self.debug_check();
    }

    /// Append the listings whose ids are not materialized yet, in input order.
    ///
    /// Duplicates are dropped and reported back, never an error.
    pub fn append(&mut self, items: Vec<ListingItem>) -> AppendOutcome {
        let mut outcome = AppendOutcome::default();

        for item in items {
            if self.index.contains_key(&item.id) {
                outcome.duplicates.push(item.id);
                continue;
            }
            self.index.insert(item.id.clone(), self.items.len());
            self.items.push(item);
            outcome.appended += 1;
        }

        self.debug_check();
        outcome
    }

    /// Empty the store. Equivalent to `reset(Vec::new())`.
    pub fn clear(&mut self) {
        self.reset(Vec::new());
    }

    /// Materialized listings in accumulation order.
    pub fn items(&self) -> &[ListingItem] {
        &self.items
    }

    pub fn get(&self, id: &ListingId) -> Option<&ListingItem> {
        self.index.get(id).map(|&slot| &self.items[slot])
    }

    pub fn contains(&self, id: &ListingId) -> bool {
        self.index.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn metadata(&self) -> Option<&FeedMetadata> {
        self.metadata.as_ref()
    }

    pub fn set_metadata(&mut self, metadata: FeedMetadata) {
        self.metadata = Some(metadata);
    }

    /// True when the index covers exactly the stored listings.
    pub fn check_invariant(&self) -> bool {
        self.index.len() == self.items.len()
            && self
                .items
                .iter()
                .enumerate()
                .all(|(slot, item)| self.index.get(&item.id) == Some(&slot))
    }

    fn debug_check(&self) {
        debug_assert!(
            self.check_invariant(),
            "identity index out of sync with listing store"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ids(store: &ListingStore) -> Vec<String> {
        store.items().iter().map(|i| i.id.to_string()).collect()
    }

    fn batch(ids: &[&str]) -> Vec<ListingItem> {
        ids.iter().map(|id| ListingItem::new(*id)).collect()
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = ListingStore::new();
        assert!(store.is_empty());
        assert!(store.metadata().is_none());
        assert!(store.check_invariant());
    }

    #[test]
    fn test_reset_replaces_contents() {
        let mut store = ListingStore::new();
        store.reset(batch(&["a", "b"]));
        store.reset(batch(&["c"]));
        assert_eq!(ids(&store), vec!["c"]);
        assert!(!store.contains(&ListingId::from("a")));
        assert!(store.check_invariant());
    }

    #[test]
    fn test_reset_duplicate_keeps_first_slot_last_payload() {
        let mut store = ListingStore::new();
        store.reset(vec![
            ListingItem::new("a").with_attr("price", 1),
            ListingItem::new("b"),
            ListingItem::new("a").with_attr("price", 2),
        ]);
        assert_eq!(ids(&store), vec!["a", "b"]);
        let a = store.get(&ListingId::from("a")).unwrap();
        assert_eq!(a.attr("price"), Some(&serde_json::json!(2)));
        assert!(store.check_invariant());
    }

    #[test]
    fn test_append_drops_known_ids_and_preserves_order() {
        let mut store = ListingStore::new();
        store.reset(batch(&["a", "b"]));
        let outcome = store.append(batch(&["c", "a", "d", "b"]));
        assert_eq!(outcome.appended, 2);
        assert_eq!(
            outcome.duplicates,
            vec![ListingId::from("a"), ListingId::from("b")]
        );
        assert_eq!(ids(&store), vec!["a", "b", "c", "d"]);
        assert!(store.check_invariant());
    }

    #[test]
    fn test_append_drops_in_batch_duplicates() {
        let mut store = ListingStore::new();
        let outcome = store.append(batch(&["x", "y", "x"]));
        assert_eq!(outcome.appended, 2);
        assert_eq!(outcome.duplicates, vec![ListingId::from("x")]);
        assert_eq!(ids(&store), vec!["x", "y"]);
    }

    #[test]
    fn test_int_and_string_ids_are_distinct() {
        let mut store = ListingStore::new();
        store.reset(vec![ListingItem::new(42), ListingItem::new("42")]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_clear_drops_metadata() {
        let mut store = ListingStore::new();
        store.reset(batch(&["a"]));
        store.set_metadata(FeedMetadata {
            source: crate::listing::FeedSource::Search,
            total_count: 1,
            has_next_page: false,
            current_page: None,
            total_pages: None,
        });
        store.clear();
        assert!(store.is_empty());
        assert!(store.metadata().is_none());
    }
}
