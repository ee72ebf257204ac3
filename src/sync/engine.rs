//! The feed reducer.
//!
//! [`ListingEngine`] owns every piece of feed state and exposes two kinds of
//! entry points:
//!
//! - user transitions (`load_next_page`, `apply_filter`, `refresh`, ...) that
//!   update state synchronously and return the [`Command`] to run remotely
//! - completion handlers (`on_page_loaded`, ...) that fold a remote response
//!   back in, discarding it if it was superseded in the meantime
//!
//! The engine performs no I/O itself; see [`FeedSession`](super::FeedSession)
//! for the driver that executes commands.

use super::error::SyncError;
use super::favorites::{FavoriteEntry, FavoritePatch, Favorites, MembershipSnapshot};
use super::mutation::{MutationCoordinator, MutationIntent};
use super::overlay::{FilterOverlay, SearchOrigin, SearchTicket};
use super::pagination::{PageKind, PageState, PageTicket, PaginationController};
use super::store::ListingStore;
use crate::listing::{
    FavoriteAction, FavoriteRecord, FavoriteToggleRequest, FeedMetadata, FilterQuery, ListingId,
    ListingItem, ListingPage, SearchResult,
};
use crate::remote::ServiceError;

/// Pending optimistic favorite toggle.
pub type FavoriteIntent = MutationIntent<ListingId, FavoritePatch, MembershipSnapshot>;

impl FavoriteIntent {
    /// Wire request for this toggle. The action is derived from the
    /// membership state *before* the optimistic patch.
    pub fn to_request(&self, user_id: &str) -> FavoriteToggleRequest {
        FavoriteToggleRequest {
            user_id: user_id.to_string(),
            target_id: self.target_id.clone(),
            action_type: self.action.action,
        }
    }
}

/// Remote work requested by a transition.
#[derive(Debug, PartialEq)]
pub enum Command {
    FetchPage(PageTicket),
    Search(SearchTicket),
    ToggleFavorite(FavoriteIntent),
}

/// Read-only snapshot handed to the renderer.
#[derive(Debug)]
pub struct FeedView<'a> {
    pub items: &'a [ListingItem],
    pub is_loading: bool,
    pub is_exhausted: bool,
    pub can_load_more: bool,
    pub filter_active: bool,
    pub error: Option<&'a str>,
    /// Total reported by the backend for the current mode.
    pub total_count: u64,
    pub shown: usize,
}

#[derive(Debug)]
pub struct ListingEngine {
    store: ListingStore,
    pagination: PaginationController,
    overlay: FilterOverlay,
    favorites: Favorites,
    mutations: MutationCoordinator<ListingId>,
    last_error: Option<String>,
}

impl ListingEngine {
    pub fn new(page_size: u32) -> Self {
        Self {
            store: ListingStore::new(),
            pagination: PaginationController::new(page_size),
            overlay: FilterOverlay::new(),
            favorites: Favorites::new(),
            mutations: MutationCoordinator::new(),
            last_error: None,
        }
    }

    // ========================================================================
    // Read side
    // ========================================================================

    pub fn items(&self) -> &[ListingItem] {
        self.store.items()
    }

    pub fn store(&self) -> &ListingStore {
        &self.store
    }

    pub fn page_state(&self) -> PageState {
        self.pagination.state()
    }

    pub fn epoch(&self) -> u64 {
        self.pagination.epoch()
    }

    pub fn is_filter_active(&self) -> bool {
        self.overlay.is_active()
    }

    pub fn active_filter(&self) -> Option<&FilterQuery> {
        self.overlay.active_query()
    }

    pub fn favorites(&self) -> &[FavoriteEntry] {
        self.favorites.entries()
    }

    pub fn is_favorite(&self, target_id: &ListingId) -> bool {
        self.favorites.contains(target_id)
    }

    pub fn is_toggle_pending(&self, target_id: &ListingId) -> bool {
        self.mutations.is_in_flight(target_id)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn can_load_more(&self) -> bool {
        !self.overlay.is_active() && !self.overlay.is_pending() && self.pagination.can_load_more()
    }

    pub fn total_count(&self) -> u64 {
        self.store.metadata().map_or(0, |m| m.total_count)
    }

    pub fn view(&self) -> FeedView<'_> {
        FeedView {
            items: self.store.items(),
            is_loading: self.pagination.is_fetching() || self.overlay.is_pending(),
            is_exhausted: !self.overlay.is_active()
                && self.pagination.state() == PageState::Exhausted,
            can_load_more: self.can_load_more(),
            filter_active: self.overlay.is_active(),
            error: self.last_error.as_deref(),
            total_count: self.total_count(),
            shown: self.store.len(),
        }
    }

    // ========================================================================
    // Paging
    // ========================================================================

    /// Load page 1 of the plain feed. Used on mount and after resets.
    pub fn load_first_page(&mut self) -> Option<Command> {
        if self.overlay.is_active() || self.overlay.is_pending() {
            tracing::debug!("Ignoring first-page load while a filter is in use");
            return None;
        }
        self.pagination.begin_first_page().map(Command::FetchPage)
    }

    /// Load the next plain page. Silently ignored unless paging can continue.
    pub fn load_next_page(&mut self) -> Option<Command> {
        if self.overlay.is_active() || self.overlay.is_pending() {
            tracing::debug!("Next page suspended while a filter is in use");
            return None;
        }
        self.pagination.begin_next_page().map(Command::FetchPage)
    }

    pub fn on_page_loaded(
        &mut self,
        ticket: PageTicket,
        result: Result<ListingPage, ServiceError>,
    ) -> Result<(), SyncError> {
        if !self.pagination.is_current(&ticket) {
            tracing::debug!(
                epoch = ticket.epoch(),
                current = self.pagination.epoch(),
                page = ticket.page(),
                "Discarding stale page response"
            );
            return Ok(());
        }

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                self.pagination.fail(&ticket);
                tracing::warn!(page = ticket.page(), error = %e, "Page fetch failed");
                return Err(self.record_error(SyncError::Network(e)));
            }
        };

        let metadata = FeedMetadata::from(&page.pagination);
        match ticket.kind() {
            PageKind::First => self.store.reset(page.data),
            PageKind::Next => {
                let outcome = self.store.append(page.data);
                for id in outcome.duplicates {
                    tracing::warn!(error = %SyncError::Conflict(id), "Dropped listing already in feed");
                }
            }
        }
        self.store.set_metadata(metadata);
        self.pagination.complete(&ticket, metadata.has_next_page);
        self.last_error = None;

        tracing::debug!(
            page = ticket.page(),
            shown = self.store.len(),
            total = metadata.total_count,
            has_next = metadata.has_next_page,
            "Page applied"
        );
        Ok(())
    }

    // ========================================================================
    // Filter overlay
    // ========================================================================

    /// Validate `query` and start a search for it.
    ///
    /// Any in-flight page fetch is superseded. Current contents stay visible
    /// until the search succeeds.
    pub fn apply_filter(&mut self, query: FilterQuery) -> Result<Command, SyncError> {
        query.validate()?;
        let epoch = self.pagination.invalidate();
        tracing::info!(location = ?query.location, epoch, "Applying filter");
        Ok(Command::Search(
            self.overlay.begin(query, epoch, SearchOrigin::Apply),
        ))
    }

    /// Leave search mode, drop the search results and reload the plain feed
    /// from page 1.
    pub fn clear_filter(&mut self) -> Option<Command> {
        let was_pending = self.overlay.is_pending();
        let previous = self.overlay.clear();
        if previous.is_none() && !was_pending {
            tracing::debug!("No filter to clear");
            return None;
        }

        tracing::info!("Filter cleared, returning to plain feed");
        self.store.clear();
        self.pagination.reset();
        self.last_error = None;
        self.pagination.begin_first_page().map(Command::FetchPage)
    }

    /// Fold a search response in.
    ///
    /// Returns a follow-up command when a search failed with nothing left on
    /// screen (a filtered refresh, or an apply after a refresh or clear) and
    /// the engine fell back to the plain feed.
    pub fn on_search_completed(
        &mut self,
        ticket: SearchTicket,
        result: Result<SearchResult, ServiceError>,
    ) -> Result<Option<Command>, SyncError> {
        if !self.overlay.is_current(&ticket) || ticket.epoch() != self.pagination.epoch() {
            tracing::debug!(
                epoch = ticket.epoch(),
                current = self.pagination.epoch(),
                "Discarding stale search result"
            );
            return Ok(None);
        }

        match result {
            Ok(result) => {
                let metadata = FeedMetadata::from(&result.metadata);
                self.store.reset(result.items);
                self.store.set_metadata(metadata);
                self.overlay.activate(&ticket, result.metadata);
                self.pagination.reset();
                self.last_error = None;

                if metadata.has_next_page {
                    tracing::debug!("Search reports more results; search paging is not supported");
                }
                tracing::info!(
                    shown = self.store.len(),
                    total = metadata.total_count,
                    "Filter applied"
                );
                Ok(None)
            }
            Err(e) => {
                self.overlay.fail(&ticket);
                // Nothing left on screen to keep: a refresh or a clear already
                // emptied the store, so reload the plain feed instead.
                if ticket.origin() == SearchOrigin::Apply && !self.store.is_empty() {
                    tracing::warn!(error = %e, "Search failed, keeping current feed");
                    return Err(self.record_error(SyncError::Network(e)));
                }

                tracing::warn!(
                    error = %e,
                    origin = ?ticket.origin(),
                    "Search failed with an empty feed, falling back to plain feed"
                );
                self.record_error(SyncError::Network(e));
                self.overlay.clear();
                self.pagination.reset();
                Ok(self.pagination.begin_first_page().map(Command::FetchPage))
            }
        }
    }

    // ========================================================================
    // Refresh
    // ========================================================================

    /// Pull-to-refresh: empty the feed and reload it in its current mode.
    pub fn refresh(&mut self) -> Option<Command> {
        self.store.clear();
        let epoch = self.pagination.reset();
        self.last_error = None;

        match self.overlay.last_query().cloned() {
            Some(query) => {
                tracing::info!(epoch, "Refreshing filtered feed");
                Some(Command::Search(
                    self.overlay.begin(query, epoch, SearchOrigin::Refresh),
                ))
            }
            None => {
                tracing::info!(epoch, "Refreshing plain feed");
                self.pagination.begin_first_page().map(Command::FetchPage)
            }
        }
    }

    // ========================================================================
    // Favorites
    // ========================================================================

    /// Replace the favorites collection with confirmed records.
    pub fn seed_favorites(&mut self, records: Vec<FavoriteRecord>) {
        self.favorites.replace_all(records);
    }

    /// Optimistically flip favorite membership of `target_id`.
    ///
    /// Returns `None` if a toggle for the same listing is still in flight.
    pub fn toggle_favorite(&mut self, target_id: ListingId) -> Option<Command> {
        let intent = self.mutations.begin(
            target_id,
            &mut self.favorites,
            |favorites, id| favorites.snapshot(id),
            |favorites, id, before| favorites.apply_toggle(id, before),
        )?;

        tracing::debug!(
            target = %intent.target_id,
            action = ?intent.action.action,
            "Favorite toggled optimistically"
        );
        Some(Command::ToggleFavorite(intent))
    }

    pub fn on_favorite_settled(
        &mut self,
        intent: FavoriteIntent,
        result: Result<Option<FavoriteRecord>, ServiceError>,
    ) -> Result<(), SyncError> {
        let target = intent.target_id.clone();
        let result = result.map_err(|e| e.to_string());

        let outcome = self.mutations.settle(
            intent,
            result,
            &mut self.favorites,
            |favorites, id, patch: &FavoritePatch, record: Option<FavoriteRecord>| {
                if patch.action == FavoriteAction::Remove {
                    return Ok(());
                }
                let record =
                    record.ok_or_else(|| "backend returned no favorite record".to_string())?;
                let provisional = patch.provisional_id.as_deref().unwrap_or_default();
                if !favorites.reconcile(provisional, record) {
                    tracing::debug!(target = %id, "Provisional favorite gone before confirmation");
                }
                Ok(())
            },
            |favorites, id, snapshot| favorites.restore(id, snapshot),
        );

        match outcome {
            Ok(()) => {
                tracing::debug!(target = %target, "Favorite toggle confirmed");
                Ok(())
            }
            Err(reason) => Err(self.record_error(SyncError::MutationFailure { target, reason })),
        }
    }

    fn record_error(&mut self, error: SyncError) -> SyncError {
        self.last_error = Some(error.to_string());
        error
    }
}
