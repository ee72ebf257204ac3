use super::service::{ListingService, ServiceError};
use crate::config::Config;
use crate::listing::{
    ErrorInfo, FavoriteRecord, FavoriteToggleRequest, FilterQuery, ListingPage, SearchResult,
};
use crate::util::{validate_base_url, UrlValidationError};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::redirect::Policy;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_MAX_RESPONSE_BYTES: usize = 5 * 1024 * 1024; // 5MB

/// Envelope of `POST /favorites/toggle`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToggleResponse {
    is_success: bool,
    #[serde(default)]
    result: Value,
}

/// Create a redirect policy with loop detection and limited hops.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        for prev in attempt.previous() {
            if prev.as_str() == url.as_str() {
                return attempt.error("Redirect loop detected");
            }
        }

        tracing::debug!(
            from = %attempt.previous().last().map(|u| u.as_str()).unwrap_or("initial"),
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

/// [`ListingService`] over the mobile backend's JSON API.
pub struct HttpListingService {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    max_response_bytes: usize,
    token: Option<SecretString>,
}

impl std::fmt::Debug for HttpListingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpListingService")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("max_response_bytes", &self.max_response_bytes)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl HttpListingService {
    /// Build a service for `base_url` with default limits and no token.
    pub fn new(base_url: &str) -> Result<Self, UrlValidationError> {
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: validate_base_url(base_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            token: None,
        })
    }

    /// Build a service from the loaded configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(create_redirect_policy())
            .user_agent(concat!("listing-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: validate_base_url(&config.api_base_url)?,
            timeout: Duration::from_secs(config.request_timeout_secs),
            max_response_bytes: config.max_response_bytes,
            token: config.api_token(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }

    pub fn with_token(mut self, token: SecretString) -> Self {
        self.token = Some(token);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        Ok(self.base_url.join(path)?)
    }

    /// Send `request` and decode the JSON body into `T`.
    async fn execute<T: DeserializeOwned>(
        &self,
        mut request: reqwest::RequestBuilder,
    ) -> Result<T, ServiceError> {
        request = request.header(ACCEPT, "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| ServiceError::Timeout(self.timeout.as_secs()))?
            .map_err(ServiceError::Network)?;

        if !response.status().is_success() {
            return Err(ServiceError::HttpStatus(response.status().as_u16()));
        }

        let body = read_limited_bytes(response, self.max_response_bytes).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn post_json(&self, url: Url, body: Vec<u8>) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
    }
}

#[async_trait]
impl ListingService for HttpListingService {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<ListingPage, ServiceError> {
        let mut url = self.endpoint("listings")?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("pageSize", &page_size.to_string());

        tracing::debug!(page, page_size, "GET /listings");
        self.execute(self.client.get(url)).await
    }

    async fn search(&self, query: &FilterQuery) -> Result<SearchResult, ServiceError> {
        let url = self.endpoint("search")?;
        let body = serde_json::to_vec(query).map_err(ServiceError::Encode)?;

        tracing::debug!(location = ?query.location, "POST /search");
        self.execute(self.post_json(url, body)).await
    }

    async fn toggle_favorite(
        &self,
        request: &FavoriteToggleRequest,
    ) -> Result<Option<FavoriteRecord>, ServiceError> {
        let url = self.endpoint("favorites/toggle")?;
        let body = serde_json::to_vec(request).map_err(ServiceError::Encode)?;

        tracing::debug!(
            target = %request.target_id,
            action = request.action_type.code(),
            "POST /favorites/toggle"
        );
        let response: ToggleResponse = self.execute(self.post_json(url, body)).await?;

        if !response.is_success {
            let message = serde_json::from_value::<ErrorInfo>(response.result)
                .ok()
                .map(|info| info.message)
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(ServiceError::Rejected(message));
        }

        if response.result.is_null() {
            return Ok(None);
        }
        match serde_json::from_value::<FavoriteRecord>(response.result) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::debug!(error = %e, "Toggle succeeded without a favorite record");
                Ok(None)
            }
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, ServiceError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ServiceError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ServiceError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ServiceError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
