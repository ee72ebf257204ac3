use crate::listing::{FavoriteRecord, FavoriteToggleRequest, FilterQuery, ListingPage, SearchResult};
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while talking to the listing backend.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    /// Body was not the JSON shape the endpoint documents
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    /// Request body could not be serialized
    #[error("Failed to encode request: {0}")]
    Encode(serde_json::Error),
    /// Backend answered `isSuccess: false`
    #[error("Request rejected: {0}")]
    Rejected(String),
    #[error("Invalid endpoint URL: {0}")]
    Endpoint(#[from] url::ParseError),
    /// The task running the request panicked.
    #[error("Request task panicked: {0}")]
    TaskPanicked(String),
}

/// The remote side of the feed: paged listings, search, favorite toggles.
#[async_trait]
pub trait ListingService: Send + Sync {
    /// `GET /listings?page={page}&pageSize={page_size}`
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<ListingPage, ServiceError>;

    /// `POST /search` with the full query as body.
    async fn search(&self, query: &FilterQuery) -> Result<SearchResult, ServiceError>;

    /// `POST /favorites/toggle`.
    ///
    /// `Ok(None)` means the backend confirmed without returning a record,
    /// which is normal for removals.
    async fn toggle_favorite(
        &self,
        request: &FavoriteToggleRequest,
    ) -> Result<Option<FavoriteRecord>, ServiceError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}
