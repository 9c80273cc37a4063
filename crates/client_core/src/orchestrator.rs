use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use shared::domain::ContentKind;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, warn};

use crate::{
    debounce::Debouncer,
    error::ClientError,
    page::{PageCache, PageResult},
    query::{QueryChange, QueryState},
    transport::ContentTransport,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingEvent {
    LoadingChanged(bool),
    PageLoaded(PageResult),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied(PageResult),
    /// A newer request was issued while this one was in flight; its
    /// response was dropped.
    Stale,
    Failed(ClientError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchStatus {
    pub page: PageResult,
    pub loading: bool,
    pub last_error: Option<String>,
}

struct FetchState {
    cache: PageCache,
    loading: bool,
    last_error: Option<String>,
}

/// Issues searches for one listing view and keeps its page cache.
///
/// Only the most recently issued request may touch the cache, the loading
/// flag or the error slot. Responses of superseded requests are ignored
/// rather than aborted.
pub struct FetchOrchestrator {
    transport: Arc<dyn ContentTransport>,
    kind: Option<ContentKind>,
    debouncer: Debouncer,
    issued: AtomicU64,
    state: Mutex<FetchState>,
    events: broadcast::Sender<ListingEvent>,
}

impl FetchOrchestrator {
    pub fn new(
        transport: Arc<dyn ContentTransport>,
        kind: Option<ContentKind>,
        page_size: u32,
        search_debounce: Duration,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            transport,
            kind,
            debouncer: Debouncer::new(search_debounce),
            issued: AtomicU64::new(0),
            state: Mutex::new(FetchState {
                cache: PageCache::new(page_size),
                loading: false,
                last_error: None,
            }),
            events,
        })
    }

    pub fn kind(&self) -> Option<ContentKind> {
        self.kind
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ListingEvent> {
        self.events.subscribe()
    }

    /// Sequence number of the latest issued search, 0 before the first one.
    pub fn latest_issued(&self) -> u64 {
        self.issued.load(Ordering::SeqCst)
    }

    pub fn has_pending_search(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub async fn current_page(&self) -> PageResult {
        self.state.lock().await.cache.current().clone()
    }

    pub async fn status(&self) -> FetchStatus {
        let guard = self.state.lock().await;
        FetchStatus {
            page: guard.cache.current().clone(),
            loading: guard.loading,
            last_error: guard.last_error.clone(),
        }
    }

    /// Debounces text edits and fetches everything else immediately.
    /// Returns `None` when the search was deferred.
    pub async fn request_search(
        self: &Arc<Self>,
        query: QueryState,
        change: QueryChange,
    ) -> Option<FetchOutcome> {
        if change.is_debounced() {
            self.schedule_debounced(query);
            None
        } else {
            Some(self.search_now(query).await)
        }
    }

    /// Replaces any waiting debounced search with this one.
    pub fn schedule_debounced(self: &Arc<Self>, query: QueryState) {
        debug!(
            delay_ms = self.debouncer.delay().as_millis() as u64,
            "fetch: debouncing search"
        );
        // Weak so a pending timer does not keep a dropped listing alive.
        let orchestrator = Arc::downgrade(self);
        self.debouncer.schedule(async move {
            match orchestrator.upgrade() {
                Some(orchestrator) => {
                    orchestrator.run_search(query).await;
                }
                None => debug!("fetch: listing dropped before debounced search fired"),
            }
        });
    }

    /// Issues a search right away, dropping any debounced one still waiting.
    pub async fn search_now(&self, query: QueryState) -> FetchOutcome {
        if self.debouncer.cancel() {
            debug!("fetch: cancelled pending debounced search");
        }
        self.run_search(query).await
    }

    async fn run_search(&self, query: QueryState) -> FetchOutcome {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let params = query.to_search_params(self.kind);

        {
            let mut guard = self.state.lock().await;
            guard.last_error = None;
            if !guard.loading {
                guard.loading = true;
                let _ = self.events.send(ListingEvent::LoadingChanged(true));
            }
        }

        debug!(
            seq,
            page = params.page,
            size = params.size,
            sort = %params.sort,
            "fetch: search issued"
        );
        let response = self.transport.search(&params).await;

        let mut guard = self.state.lock().await;
        let latest = self.issued.load(Ordering::SeqCst);
        if seq != latest {
            debug!(seq, latest, "fetch: dropping stale search response");
            return FetchOutcome::Stale;
        }

        guard.loading = false;
        let _ = self.events.send(ListingEvent::LoadingChanged(false));

        match response {
            Ok(page) => {
                let page = PageResult::from_wire(page, &query);
                debug!(
                    seq,
                    items = page.items.len(),
                    total_items = page.total_items,
                    "fetch: page applied"
                );
                guard.cache.replace(page.clone());
                let _ = self.events.send(ListingEvent::PageLoaded(page.clone()));
                FetchOutcome::Applied(page)
            }
            Err(err) => {
                warn!(seq, "fetch: search failed: {err:#}");
                let err = ClientError::transport(&err);
                guard.last_error = Some(err.to_string());
                let _ = self.events.send(ListingEvent::Failed(err.to_string()));
                FetchOutcome::Failed(err)
            }
        }
    }

    /// Error slot shared with mutations; cleared again by the next attempt.
    pub async fn record_error(&self, err: &ClientError) {
        self.state.lock().await.last_error = Some(err.to_string());
        let _ = self.events.send(ListingEvent::Failed(err.to_string()));
    }

    pub async fn clear_error(&self) {
        self.state.lock().await.last_error = None;
    }
}

#[cfg(test)]
#[path = "tests/orchestrator_tests.rs"]
mod tests;
