//! Feed synchronization.
//!
//! - [`store`] - ordered, id-deduplicated listing collection
//! - [`pagination`] - page cursor state machine with epoch-based staleness
//! - [`overlay`] - search-mode filter state
//! - [`mutation`] - per-id locked optimistic mutations with rollback
//! - [`favorites`] - the favorites collection and its toggle patches
//! - [`engine`] - the reducer tying the above together
//! - [`session`] - async driver executing engine commands against a
//!   [`ListingService`](crate::remote::ListingService)
//!
//! # Staleness
//!
//! Every request carries the epoch it was issued under. Refresh, filter
//! apply and filter clear bump the epoch, so a response that arrives after
//! one of those is dropped instead of being mixed into the new feed.

mod engine;
mod error;
mod favorites;
mod mutation;
mod overlay;
mod pagination;
mod session;
mod store;

pub use engine::{Command, FavoriteIntent, FeedView, ListingEngine};
pub use error::SyncError;
pub use favorites::{FavoriteEntry, FavoritePatch, Favorites, MembershipSnapshot};
pub use mutation::{MutationCoordinator, MutationIntent};
pub use overlay::{FilterOverlay, SearchOrigin, SearchTicket};
pub use pagination::{PageKind, PageState, PageTicket, PaginationController};
pub use session::{FeedSession, SyncEvent};
pub use store::{AppendOutcome, ListingStore};
