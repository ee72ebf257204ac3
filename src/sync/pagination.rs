//! Page cursor state machine for the plain (unfiltered) feed.
//!
//! ```text
//! Idle ──► FetchingFirstPage ──► Accumulating ⇄ FetchingNextPage ──► Exhausted
//!                 │                                   │
//!                 └──────────────► Error ◄────────────┘
//! ```
//!
//! The controller never performs I/O. `begin_*` hands out a [`PageTicket`]
//! describing the request to issue; the response is fed back through
//! [`complete`](PaginationController::complete) or
//! [`fail`](PaginationController::fail), and only if the ticket is still the
//! current one. Every reset bumps the epoch, which turns any outstanding
//! ticket stale.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Idle,
    FetchingFirstPage,
    Accumulating,
    FetchingNextPage,
    Exhausted,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    First,
    Next,
}

/// Handle for one outstanding page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    epoch: u64,
    page: u32,
    page_size: u32,
    kind: PageKind,
}

impl PageTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn kind(&self) -> PageKind {
        self.kind
    }
}

#[derive(Debug)]
pub struct PaginationController {
    state: PageState,
    epoch: u64,
    /// Last page successfully loaded in the current epoch, 0 before page 1.
    cursor: u32,
    page_size: u32,
    has_next: bool,
    in_flight: Option<PageTicket>,
    /// Kind of the fetch that put the controller into `Error`.
    failed: Option<PageKind>,
}

impl PaginationController {
    pub fn new(page_size: u32) -> Self {
        Self {
            state: PageState::Idle,
            epoch: 0,
            cursor: 0,
            page_size: page_size.max(1),
            has_next: false,
            in_flight: None,
            failed: None,
        }
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn has_next(&self) -> bool {
        self.has_next
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Which fetch failed, while in `Error`.
    pub fn failed_kind(&self) -> Option<PageKind> {
        self.failed
    }

    /// Whether a next-page request would currently be accepted.
    pub fn can_load_more(&self) -> bool {
        self.in_flight.is_none()
            && self.has_next
            && match self.state {
                PageState::Accumulating => true,
                PageState::Error => self.failed == Some(PageKind::Next),
                _ => false,
            }
    }

    /// Start loading page 1. Accepted from `Idle`, `Error` and `Exhausted`.
    pub fn begin_first_page(&mut self) -> Option<PageTicket> {
        match self.state {
            PageState::Idle | PageState::Error | PageState::Exhausted => {}
            state => {
                tracing::debug!(?state, "Ignoring first-page load outside a reset state");
                return None;
            }
        }

        self.epoch += 1;
        let ticket = PageTicket {
            epoch: self.epoch,
            page: 1,
            page_size: self.page_size,
            kind: PageKind::First,
        };
        self.in_flight = Some(ticket);
        self.state = PageState::FetchingFirstPage;
        tracing::debug!(epoch = self.epoch, "Loading first page");
        Some(ticket)
    }

    /// Start loading the page after the cursor.
    ///
    /// Silently ignored while another fetch is in flight, once the feed is
    /// exhausted, or before page 1 has loaded. A failed next page can be
    /// retried from `Error`.
    pub fn begin_next_page(&mut self) -> Option<PageTicket> {
        if let Some(in_flight) = &self.in_flight {
            tracing::debug!(page = in_flight.page, "Page fetch already in flight, dropping request");
            return None;
        }
        if !self.can_load_more() {
            tracing::debug!(
                state = ?self.state,
                has_next = self.has_next,
                cursor = self.cursor,
                "Next page not available"
            );
            return None;
        }

        let ticket = PageTicket {
            epoch: self.epoch,
            page: self.cursor + 1,
            page_size: self.page_size,
            kind: PageKind::Next,
        };
        self.in_flight = Some(ticket);
        self.state = PageState::FetchingNextPage;
        tracing::debug!(epoch = self.epoch, page = ticket.page, "Loading next page");
        Some(ticket)
    }

    /// True if `ticket` is the request this controller is waiting for.
    pub fn is_current(&self, ticket: &PageTicket) -> bool {
        ticket.epoch == self.epoch && self.in_flight.as_ref() == Some(ticket)
    }

    /// Record a successful response for the current ticket.
    pub fn complete(&mut self, ticket: &PageTicket, has_next: bool) {
        if !self.is_current(ticket) {
            return;
        }
        self.in_flight = None;
        self.failed = None;
        self.cursor = ticket.page;
        self.has_next = has_next;
        self.state = if has_next {
            PageState::Accumulating
        } else {
            PageState::Exhausted
        };
    }

    /// Record a failed response for the current ticket. The cursor is kept.
    pub fn fail(&mut self, ticket: &PageTicket) {
        if !self.is_current(ticket) {
            return;
        }
        self.in_flight = None;
        self.failed = Some(ticket.kind);
        self.state = PageState::Error;
    }

    /// Bump the epoch and drop any in-flight request, keeping the cursor.
    ///
    /// An interrupted next-page fetch falls back to `Accumulating`, an
    /// interrupted first-page fetch to `Idle`.
    pub fn invalidate(&mut self) -> u64 {
        self.epoch += 1;
        if let Some(ticket) = self.in_flight.take() {
            tracing::debug!(page = ticket.page, "Superseding in-flight page fetch");
            self.state = match ticket.kind {
                PageKind::Next => PageState::Accumulating,
                PageKind::First => PageState::Idle,
            };
        }
        self.epoch
    }

    /// Back to `Idle` with an empty cursor, invalidating anything in flight.
    pub fn reset(&mut self) -> u64 {
        self.invalidate();
        self.state = PageState::Idle;
        self.cursor = 0;
        self.has_next = false;
        self.failed = None;
        self.epoch
    }
}
