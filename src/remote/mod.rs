//! Remote listing backend.
//!
//! - [`service`] - the [`ListingService`] trait the engine's driver talks to,
//!   and its error type
//! - [`http`] - `reqwest` implementation against the mobile JSON API
//!
//! # Endpoints
//!
//! | Operation       | Request                                   |
//! |-----------------|-------------------------------------------|
//! | plain feed page | `GET /listings?page={p}&pageSize={n}`     |
//! | search          | `POST /search` (body: filter query)       |
//! | favorite toggle | `POST /favorites/toggle`                  |

mod http;
mod service;

pub use http::HttpListingService;
pub use service::{ListingService, ServiceError};
