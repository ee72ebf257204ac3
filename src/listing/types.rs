use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

// ============================================================================
// Identity
// ============================================================================

/// Listing identifier as sent by the backend.
///
/// The backend is inconsistent about id types across endpoints, so both
/// integer and string ids are accepted. They are never coerced into each
/// other: `42` and `"42"` are different listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListingId {
    Int(i64),
    Str(String),
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListingId::Int(id) => write!(f, "{}", id),
            ListingId::Str(id) => f.write_str(id),
        }
    }
}

impl From<i64> for ListingId {
    fn from(id: i64) -> Self {
        ListingId::Int(id)
    }
}

impl From<&str> for ListingId {
    fn from(id: &str) -> Self {
        ListingId::Str(id.to_string())
    }
}

impl From<String> for ListingId {
    fn from(id: String) -> Self {
        ListingId::Str(id)
    }
}

// ============================================================================
// Listing Items
// ============================================================================

/// One listing as rendered by the feed.
///
/// Only `id` carries meaning for the engine. Everything else (title, price,
/// photos, coordinates...) is kept verbatim for the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingItem {
    pub id: ListingId,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl ListingItem {
    pub fn new(id: impl Into<ListingId>) -> Self {
        Self {
            id: id.into(),
            attributes: Map::new(),
        }
    }

    /// Builder-style attribute setter, mostly used by fixtures.
    pub fn with_attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn title(&self) -> Option<&str> {
        self.attr("title").and_then(Value::as_str)
    }
}

// ============================================================================
// Paging Metadata
// ============================================================================

/// Pagination block of `GET /listings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub current_page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u32,
    pub has_next_page: bool,
}

impl PageMetadata {
    /// Continuation as derived from the page counters.
    ///
    /// The counters win over the `hasNextPage` flag when the two disagree.
    pub fn derived_has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// Response body of `GET /listings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingPage {
    pub data: Vec<ListingItem>,
    pub pagination: PageMetadata,
}

/// Metadata block of `POST /search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMetadata {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_filters: Option<Value>,
}

/// Response body of `POST /search`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(rename = "posts")]
    pub items: Vec<ListingItem>,
    pub metadata: SearchMetadata,
}

/// Which endpoint the current store contents came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    Plain,
    Search,
}

/// Paging and search metadata folded into one continuation signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedMetadata {
    pub source: FeedSource,
    pub total_count: u64,
    pub has_next_page: bool,
    pub current_page: Option<u32>,
    pub total_pages: Option<u32>,
}

impl From<&PageMetadata> for FeedMetadata {
    fn from(meta: &PageMetadata) -> Self {
        let derived = meta.derived_has_next();
        if derived != meta.has_next_page {
            tracing::warn!(
                current_page = meta.current_page,
                total_pages = meta.total_pages,
                reported = meta.has_next_page,
                derived,
                "Server hasNextPage disagrees with page counters, using counters"
            );
        }
        Self {
            source: FeedSource::Plain,
            total_count: meta.total_count,
            has_next_page: derived,
            current_page: Some(meta.current_page),
            total_pages: Some(meta.total_pages),
        }
    }
}

impl From<&SearchMetadata> for FeedMetadata {
    fn from(meta: &SearchMetadata) -> Self {
        Self {
            source: FeedSource::Search,
            total_count: meta.total_count,
            has_next_page: meta.has_next_page,
            current_page: None,
            total_pages: None,
        }
    }
}

// ============================================================================
// Favorites
// ============================================================================

/// Canonical favorite record returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRecord {
    pub id: String,
    pub target_id: ListingId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Requested favorite mutation. Serialized as the backend's `actionType` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteAction {
    Add,
    Remove,
}

impl FavoriteAction {
    pub fn code(self) -> u8 {
        match self {
            FavoriteAction::Add => 0,
            FavoriteAction::Remove => 1,
        }
    }

    /// The action that flips the given membership state.
    pub fn from_membership(is_member: bool) -> Self {
        if is_member {
            FavoriteAction::Remove
        } else {
            FavoriteAction::Add
        }
    }
}

impl Serialize for FavoriteAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// Body of `POST /favorites/toggle`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteToggleRequest {
    pub user_id: String,
    pub target_id: ListingId,
    pub action_type: FavoriteAction,
}

/// Error payload of a rejected mutation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listing_id_accepts_int_and_string() {
        let int: ListingId = serde_json::from_value(json!(42)).unwrap();
        let string: ListingId = serde_json::from_value(json!("42")).unwrap();
        assert_eq!(int, ListingId::Int(42));
        assert_eq!(string, ListingId::Str("42".to_string()));
        assert_ne!(int, string);
        assert_eq!(int.to_string(), string.to_string());
    }

    #[test]
    fn test_listing_item_keeps_unknown_attributes() {
        let item: ListingItem = serde_json::from_value(json!({
            "id": 7,
            "title": "2+1 near the ferry",
            "price": 18500,
            "photos": ["a.jpg"]
        }))
        .unwrap();
        assert_eq!(item.id, ListingId::Int(7));
        assert_eq!(item.title(), Some("2+1 near the ferry"));
        assert_eq!(item.attr("price"), Some(&json!(18500)));
        assert!(item.attr("id").is_none());
    }

    #[test]
    fn test_page_metadata_counters_override_flag() {
        let meta = PageMetadata {
            current_page: 3,
            page_size: 10,
            total_count: 30,
            total_pages: 3,
            has_next_page: true,
        };
        let feed = FeedMetadata::from(&meta);
        assert!(!feed.has_next_page);
        assert_eq!(feed.source, FeedSource::Plain);
        assert_eq!(feed.current_page, Some(3));
    }

    #[test]
    fn test_search_result_wire_shape() {
        let result: SearchResult = serde_json::from_value(json!({
            "posts": [{"id": "a"}, {"id": "b"}],
            "metadata": {"totalCount": 2, "hasNextPage": true}
        }))
        .unwrap();
        assert_eq!(result.items.len(), 2);
        let feed = FeedMetadata::from(&result.metadata);
        assert_eq!(feed.source, FeedSource::Search);
        assert!(feed.has_next_page);
        assert_eq!(feed.total_pages, None);
    }

    #[test]
    fn test_toggle_request_serializes_action_code() {
        let request = FavoriteToggleRequest {
            user_id: "u-1".to_string(),
            target_id: ListingId::from("42"),
            action_type: FavoriteAction::Remove,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"userId": "u-1", "targetId": "42", "actionType": 1})
        );
    }

    #[test]
    fn test_action_from_membership() {
        assert_eq!(FavoriteAction::from_membership(false), FavoriteAction::Add);
        assert_eq!(FavoriteAction::from_membership(true), FavoriteAction::Remove);
        assert_eq!(FavoriteAction::Add.code(), 0);
    }
}
