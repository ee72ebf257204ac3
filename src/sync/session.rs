//! Async driver around [`ListingEngine`].
//!
//! Commands returned by engine transitions are executed as spawned tasks
//! against a [`ListingService`]. Each task reports back through one
//! [`SyncEvent`] on an mpsc channel, which the owner drains with
//! [`FeedSession::next_event`] and folds in with [`FeedSession::handle_event`].
//! Engine state is only ever touched from the owning task.

use super::engine::{Command, FavoriteIntent, FeedView, ListingEngine};
use super::error::SyncError;
use super::overlay::SearchTicket;
use super::pagination::PageTicket;
use crate::listing::{FavoriteRecord, FilterQuery, ListingId, ListingPage, SearchResult};
use crate::remote::{ListingService, ServiceError};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Completion of one remote request.
#[derive(Debug)]
pub enum SyncEvent {
    PageLoaded {
        ticket: PageTicket,
        result: Result<ListingPage, ServiceError>,
    },
    SearchCompleted {
        ticket: SearchTicket,
        result: Result<SearchResult, ServiceError>,
    },
    FavoriteSettled {
        intent: FavoriteIntent,
        result: Result<Option<FavoriteRecord>, ServiceError>,
    },
}

pub struct FeedSession<S> {
    engine: ListingEngine,
    service: Arc<S>,
    user_id: String,
    event_tx: mpsc::Sender<SyncEvent>,
    event_rx: mpsc::Receiver<SyncEvent>,
    /// Spawned tasks whose event has not been handled yet.
    in_flight: usize,
}

impl<S: ListingService + 'static> FeedSession<S> {
    pub fn new(service: Arc<S>, page_size: u32, user_id: impl Into<String>) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            engine: ListingEngine::new(page_size),
            service,
            user_id: user_id.into(),
            event_tx,
            event_rx,
            in_flight: 0,
        }
    }

    pub fn engine(&self) -> &ListingEngine {
        &self.engine
    }

    pub fn view(&self) -> FeedView<'_> {
        self.engine.view()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Start loading page 1 of the plain feed.
    pub fn mount(&mut self) -> bool {
        tracing::info!(service = self.service.name(), "Mounting feed");
        let command = self.engine.load_first_page();
        self.dispatch(command)
    }

    pub fn load_next_page(&mut self) -> bool {
        let command = self.engine.load_next_page();
        self.dispatch(command)
    }

    pub fn apply_filter(&mut self, query: FilterQuery) -> Result<(), SyncError> {
        let command = self.engine.apply_filter(query)?;
        self.dispatch(Some(command));
        Ok(())
    }

    pub fn clear_filter(&mut self) -> bool {
        let command = self.engine.clear_filter();
        self.dispatch(command)
    }

    pub fn refresh(&mut self) -> bool {
        let command = self.engine.refresh();
        self.dispatch(command)
    }

    pub fn toggle_favorite(&mut self, target_id: impl Into<ListingId>) -> bool {
        let command = self.engine.toggle_favorite(target_id.into());
        self.dispatch(command)
    }

    pub fn seed_favorites(&mut self, records: Vec<FavoriteRecord>) {
        self.engine.seed_favorites(records);
    }

    /// Wait for the next completion. Returns `None` once nothing is in flight.
    pub async fn next_event(&mut self) -> Option<SyncEvent> {
        if self.in_flight == 0 {
            return None;
        }
        self.event_rx.recv().await
    }

    /// Fold one completion into the engine, dispatching any follow-up request.
    pub fn handle_event(&mut self, event: SyncEvent) -> Result<(), SyncError> {
        self.in_flight = self.in_flight.saturating_sub(1);
        match event {
            SyncEvent::PageLoaded { ticket, result } => self.engine.on_page_loaded(ticket, result),
            SyncEvent::SearchCompleted { ticket, result } => {
                let follow_up = self.engine.on_search_completed(ticket, result)?;
                self.dispatch(follow_up);
                Ok(())
            }
            SyncEvent::FavoriteSettled { intent, result } => {
                self.engine.on_favorite_settled(intent, result)
            }
        }
    }

    /// Handle events until every spawned request has reported back.
    pub async fn settle(&mut self) -> Vec<SyncError> {
        let mut errors = Vec::new();
        while let Some(event) = self.next_event().await {
            if let Err(e) = self.handle_event(event) {
                errors.push(e);
            }
        }
        errors
    }

    fn dispatch(&mut self, command: Option<Command>) -> bool {
        let Some(command) = command else {
            return false;
        };

        self.in_flight += 1;
        let service = Arc::clone(&self.service);
        let tx = self.event_tx.clone();

        match command {
            Command::FetchPage(ticket) => {
                tokio::spawn(async move {
                    let result =
                        guarded(service.fetch_page(ticket.page(), ticket.page_size())).await;
                    deliver(&tx, SyncEvent::PageLoaded { ticket, result }).await;
                });
            }
            Command::Search(ticket) => {
                tokio::spawn(async move {
                    let result = guarded(service.search(ticket.query())).await;
                    deliver(&tx, SyncEvent::SearchCompleted { ticket, result }).await;
                });
            }
            Command::ToggleFavorite(intent) => {
                let request = intent.to_request(&self.user_id);
                tokio::spawn(async move {
                    let result = guarded(service.toggle_favorite(&request)).await;
                    deliver(&tx, SyncEvent::FavoriteSettled { intent, result }).await;
                });
            }
        }
        true
    }
}

/// Run a request, turning a panic into a `ServiceError` so the engine
/// still gets its completion.
async fn guarded<T, F>(future: F) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            let message = if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            tracing::error!(error = %message, "Request task panicked");
            Err(ServiceError::TaskPanicked(message))
        })
}

async fn deliver(tx: &mpsc::Sender<SyncEvent>, event: SyncEvent) {
    if tx.send(event).await.is_err() {
        tracing::warn!("Feed session dropped before request completed");
    }
}
