//! Paginated listing of monitoring streams.
//!
//! Each fetch replaces the cached page wholesale. Responses to fetches that
//! have since been superseded by a newer one are dropped rather than applied.

pub mod models;

use crate::http::{ApiClient, ApiResponse};
use crate::notice::Notice;
pub use models::{Pagination, Stream, StreamPage, StreamState, StreamStatus};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, warn};

const STREAMING_PATH: &str = "/streaming";
const FETCH_FALLBACK: &str = "Failed to fetch streams";

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Applied,
    /// The previous page is kept and the error recorded in the state.
    Failed { notice: Notice },
    /// A newer fetch started while this one was in flight.
    Superseded,
}

#[derive(Clone)]
pub struct StreamFetcher {
    api: ApiClient,
    state: Arc<RwLock<StreamState>>,
    generation: Arc<AtomicU64>,
}

impl StreamFetcher {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: Arc::new(RwLock::new(StreamState::default())),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Fetches one page and, unless superseded, makes it the cached page.
    pub async fn fetch(&self, page: u32, limit: u32) -> FetchOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.write().await.loading = true;

        let query = [("page", page.to_string()), ("limit", limit.to_string())];
        let result = self
            .api
            .get::<ApiResponse<StreamPage>>(STREAMING_PATH, &query)
            .await;

        let mut state = self.state.write().await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, page, "Discarding stale stream response");
            return FetchOutcome::Superseded;
        }

        state.loading = false;

        match result {
            Ok(response) => {
                let data = response.data.unwrap_or_default();
                state.pagination = data.pagination.unwrap_or(Pagination {
                    page,
                    limit,
                    ..Pagination::default()
                });
                state.streams = data.streams;
                state.error = None;
                debug!(count = state.streams.len(), page, "Streams loaded");
                FetchOutcome::Applied
            }
            Err(e) => {
                let message = e.user_message(FETCH_FALLBACK);
                warn!(page, "Stream fetch failed: {}", e);
                state.error = Some(message.clone());
                FetchOutcome::Failed {
                    notice: Notice::error(message),
                }
            }
        }
    }

    /// Re-fetches the currently cached page.
    pub async fn refresh(&self) -> FetchOutcome {
        let pagination = self.state.read().await.pagination;
        let limit = if pagination.limit == 0 {
            DEFAULT_LIMIT
        } else {
            pagination.limit
        };
        self.fetch(pagination.page.max(DEFAULT_PAGE), limit).await
    }

    pub async fn snapshot(&self) -> StreamState {
        self.state.read().await.clone()
    }

    pub async fn active_streams(&self) -> Vec<Stream> {
        filter_by_status(&self.state.read().await.streams, StreamStatus::Active)
    }

    pub async fn streams_with_status(&self, status: StreamStatus) -> Vec<Stream> {
        filter_by_status(&self.state.read().await.streams, status)
    }
}

pub fn filter_by_status(streams: &[Stream], status: StreamStatus) -> Vec<Stream> {
    streams
        .iter()
        .filter(|s| s.status == status)
        .cloned()
        .collect()
}
