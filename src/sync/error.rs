use crate::listing::{ListingId, ValidationError};
use crate::remote::ServiceError;
use thiserror::Error;

/// Errors surfaced by the feed engine. None of them is fatal; each one is
/// recoverable by a user action (retry, refresh, fix the filter).
#[derive(Debug, Error)]
pub enum SyncError {
    /// Page or search fetch failed.
    #[error("Network error: {0}")]
    Network(#[from] ServiceError),

    #[error("Invalid filter: {0}")]
    Validation(#[from] ValidationError),

    /// A listing id showed up twice where it was expected to be unique.
    /// Resolved by dropping the duplicate; only ever logged.
    #[error("Duplicate listing id {0}")]
    Conflict(ListingId),

    /// Favorite toggle rejected or errored. State has already been rolled back.
    #[error("Favorite update for listing {target} failed: {reason}")]
    MutationFailure { target: ListingId, reason: String },
}
