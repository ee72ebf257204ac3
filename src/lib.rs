//! Listing feed synchronization engine.
//!
//! Keeps a paged listing feed consistent while the user scrolls, filters,
//! refreshes and favorites listings concurrently:
//!
//! - [`listing`] - domain and wire types, filter queries
//! - [`sync`] - the store, pagination, filter overlay and optimistic
//!   favorites, plus the reducer and async session that combine them
//! - [`remote`] - the backend trait and its `reqwest` implementation
//! - [`config`] - TOML configuration
//! - [`util`] - base URL validation

pub mod config;
pub mod listing;
pub mod remote;
pub mod sync;
pub mod util;
