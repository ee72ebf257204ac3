//! Listing domain types shared by the engine and the remote service.
//!
//! - [`types`] - listings, paging/search metadata and favorite wire records
//! - [`filter`] - the structured search query and its validation rules

mod filter;
mod types;

pub use filter::{
    Feature, FilterQuery, ListingStatus, PriceBucket, PropertyCategory, RoomCount, SortKey,
    ValidationError, MAX_LOCATION_LENGTH,
};
pub use types::{
    ErrorInfo, FavoriteAction, FavoriteRecord, FavoriteToggleRequest, FeedMetadata, FeedSource,
    ListingId, ListingItem, ListingPage, PageMetadata, SearchMetadata, SearchResult,
};
