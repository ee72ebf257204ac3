//! Utility functions shared by the config layer and the HTTP service.
//!
//! - **URL validation**: base URL policy for the listing API (HTTPS except
//!   loopback, no embedded credentials, normalized trailing slash)

mod url_validator;

pub use url_validator::{is_loopback_host, validate_base_url, UrlValidationError};
