//! In-memory `ListingService` shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use listing_sync::listing::{
    FavoriteRecord, FavoriteToggleRequest, FilterQuery, ListingItem, ListingPage, PageMetadata,
    SearchMetadata, SearchResult,
};
use listing_sync::remote::{ListingService, ServiceError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Plain feed of `total` listings with integer ids starting at
/// `id_offset + 1`. Consecutive pages share `overlap` ids.
pub struct MockService {
    pub total: i64,
    pub overlap: i64,
    pub id_offset: AtomicI64,
    pub page_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
    pub toggle_calls: AtomicUsize,
    pub page_delays: Mutex<HashMap<u32, Duration>>,
    pub failing_pages: Mutex<HashSet<u32>>,
    pub search_ids: Mutex<Vec<&'static str>>,
    pub fail_search: AtomicBool,
    pub fail_toggle: AtomicBool,
    pub requests: Mutex<Vec<FavoriteToggleRequest>>,
}

impl MockService {
    pub fn new(total: i64) -> Self {
        Self {
            total,
            overlap: 0,
            id_offset: AtomicI64::new(0),
            page_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
            toggle_calls: AtomicUsize::new(0),
            page_delays: Mutex::new(HashMap::new()),
            failing_pages: Mutex::new(HashSet::new()),
            search_ids: Mutex::new(vec!["k1", "k2", "k3", "k4"]),
            fail_search: AtomicBool::new(false),
            fail_toggle: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_overlap(mut self, overlap: i64) -> Self {
        self.overlap = overlap;
        self
    }

    pub fn delay_page(&self, page: u32, delay: Duration) {
        self.page_delays.lock().unwrap().insert(page, delay);
    }

    pub fn fail_page(&self, page: u32, fail: bool) {
        let mut failing = self.failing_pages.lock().unwrap();
        if fail {
            failing.insert(page);
        } else {
            failing.remove(&page);
        }
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ListingService for MockService {
    async fn fetch_page(&self, page: u32, page_size: u32) -> Result<ListingPage, ServiceError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.page_delays.lock().unwrap().get(&page).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing_pages.lock().unwrap().contains(&page) {
            return Err(ServiceError::HttpStatus(503));
        }

        let size = i64::from(page_size);
        let stride = (size - self.overlap).max(1);
        let offset = self.id_offset.load(Ordering::SeqCst);
        let start = i64::from(page - 1) * stride + 1;
        let end = (start + size - 1).min(self.total);
        let total_pages = if self.total <= size {
            1
        } else {
            1 + ((self.total - size + stride - 1) / stride) as u32
        };

        Ok(ListingPage {
            data: (start..=end)
                .map(|id| ListingItem::new(id + offset).with_attr("title", format!("Listing {id}")))
                .collect(),
            pagination: PageMetadata {
                current_page: page,
                page_size,
                total_count: self.total as u64,
                total_pages,
                has_next_page: page < total_pages,
            },
        })
    }

    async fn search(&self, _query: &FilterQuery) -> Result<SearchResult, ServiceError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(ServiceError::HttpStatus(500));
        }
        let ids = self.search_ids.lock().unwrap().clone();
        let total_count = ids.len() as u64;
        Ok(SearchResult {
            items: ids.into_iter().map(ListingItem::new).collect(),
            metadata: SearchMetadata {
                total_count,
                has_next_page: false,
                applied_filters: None,
            },
        })
    }

    async fn toggle_favorite(
        &self,
        request: &FavoriteToggleRequest,
    ) -> Result<Option<FavoriteRecord>, ServiceError> {
        self.toggle_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if self.fail_toggle.load(Ordering::SeqCst) {
            return Err(ServiceError::Rejected("favorite limit reached".to_string()));
        }
        Ok(Some(FavoriteRecord {
            id: format!("fav-{}", request.target_id),
            target_id: request.target_id.clone(),
            created_at: None,
        }))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
