use crate::listing::{FilterQuery, SearchMetadata};

/// Why a search request was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOrigin {
    /// User applied a (possibly new) filter.
    Apply,
    /// Pull-to-refresh reissued the active filter.
    Refresh,
}

/// Handle for one outstanding search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchTicket {
    epoch: u64,
    query: FilterQuery,
    origin: SearchOrigin,
}

impl SearchTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn query(&self) -> &FilterQuery {
        &self.query
    }

    pub fn origin(&self) -> SearchOrigin {
        self.origin
    }
}

/// Search mode state: the filter currently shown, and the one being fetched.
///
/// The overlay only becomes active once a search succeeds. A failed search
/// leaves whatever was shown before (plain pages or an older filter) alone.
#[derive(Debug, Default)]
pub struct FilterOverlay {
    active: Option<FilterQuery>,
    metadata: Option<SearchMetadata>,
    pending: Option<SearchTicket>,
}

impl FilterOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The filter whose results are currently materialized.
    pub fn active_query(&self) -> Option<&FilterQuery> {
        self.active.as_ref()
    }

    /// Most recent query the user asked for: pending first, then active.
    pub fn last_query(&self) -> Option<&FilterQuery> {
        self.pending
            .as_ref()
            .map(|ticket| &ticket.query)
            .or(self.active.as_ref())
    }

    pub fn metadata(&self) -> Option<&SearchMetadata> {
        self.metadata.as_ref()
    }

    /// Register a new search, superseding any pending one.
    pub fn begin(&mut self, query: FilterQuery, epoch: u64, origin: SearchOrigin) -> SearchTicket {
        if let Some(previous) = self.pending.take() {
            tracing::debug!(epoch = previous.epoch, "Superseding pending search");
        }
        let ticket = SearchTicket {
            epoch,
            query,
            origin,
        };
        self.pending = Some(ticket.clone());
        ticket
    }

    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        self.pending.as_ref() == Some(ticket)
    }

    /// Make the ticket's query the active filter.
    pub fn activate(&mut self, ticket: &SearchTicket, metadata: SearchMetadata) {
        if !self.is_current(ticket) {
            return;
        }
        self.pending = None;
        self.active = Some(ticket.query.clone());
        self.metadata = Some(metadata);
    }

    /// Forget a failed search. The active filter, if any, stays.
    pub fn fail(&mut self, ticket: &SearchTicket) {
        if self.is_current(ticket) {
            self.pending = None;
        }
    }

    /// Leave search mode entirely, returning the filter that was active.
    pub fn clear(&mut self) -> Option<FilterQuery> {
        self.pending = None;
        self.metadata = None;
        self.active.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(total: u64) -> SearchMetadata {
        SearchMetadata {
            total_count: total,
            has_next_page: false,
            applied_filters: None,
        }
    }

    #[test]
    fn test_activation_requires_current_ticket() {
        let mut overlay = FilterOverlay::new();
        let old = overlay.begin(FilterQuery::new().location("Moda"), 1, SearchOrigin::Apply);
        let new = overlay.begin(FilterQuery::new().location("Kadıköy"), 2, SearchOrigin::Apply);

        overlay.activate(&old, meta(1));
        assert!(!overlay.is_active());

        overlay.activate(&new, meta(4));
        assert!(overlay.is_active());
        assert!(!overlay.is_pending());
        assert_eq!(
            overlay.active_query().and_then(|q| q.location.as_deref()),
            Some("Kadıköy")
        );
        assert_eq!(overlay.metadata().map(|m| m.total_count), Some(4));
    }

    #[test]
    fn test_failure_keeps_previous_filter() {
        let mut overlay = FilterOverlay::new();
        let first = overlay.begin(FilterQuery::new().location("Moda"), 1, SearchOrigin::Apply);
        overlay.activate(&first, meta(2));

        let second = overlay.begin(FilterQuery::new().location("Üsküdar"), 2, SearchOrigin::Apply);
        assert_eq!(
            overlay.last_query().and_then(|q| q.location.as_deref()),
            Some("Üsküdar")
        );
        overlay.fail(&second);

        assert!(!overlay.is_pending());
        assert_eq!(
            overlay.active_query().and_then(|q| q.location.as_deref()),
            Some("Moda")
        );
    }

    #[test]
    fn test_clear_returns_active_query() {
        let mut overlay = FilterOverlay::new();
        let ticket = overlay.begin(FilterQuery::new(), 1, SearchOrigin::Apply);
        overlay.activate(&ticket, meta(0));
        assert_eq!(overlay.clear(), Some(FilterQuery::new()));
        assert!(!overlay.is_active());
        assert!(overlay.metadata().is_none());
        assert_eq!(overlay.clear(), None);
    }
}
