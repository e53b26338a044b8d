use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use super::RequestSequencer;
use crate::core::error::AppError;
use crate::features::checkpoints::dtos::CheckpointFilters;
use crate::features::checkpoints::models::Checkpoint;
use crate::features::checkpoints::services::CheckpointService;

/// What a list view renders. `checkpoints` and `error` are never both populated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckpointListSnapshot {
    pub checkpoints: Vec<Checkpoint>,
    pub count: usize,
    pub loading: bool,
    pub error: Option<AppError>,
}

/// Keeps a filtered checkpoint list in sync with its filters
pub struct CheckpointListState {
    service: Arc<CheckpointService>,
    filters: Mutex<CheckpointFilters>,
    auto_fetch: bool,
    sender: watch::Sender<CheckpointListSnapshot>,
    sequencer: RequestSequencer,
}

impl CheckpointListState {
    /// Create the state; with `auto_fetch` the first fetch runs before this returns
    pub async fn new(
        service: Arc<CheckpointService>,
        filters: CheckpointFilters,
        auto_fetch: bool,
    ) -> Self {
        let (sender, _) = watch::channel(CheckpointListSnapshot {
            loading: auto_fetch,
            ..Default::default()
        });

        let state = Self {
            service,
            filters: Mutex::new(filters),
            auto_fetch,
            sender,
            sequencer: RequestSequencer::default(),
        };

        if auto_fetch {
            state.refetch().await;
        }
        state
    }

    pub fn subscribe(&self) -> watch::Receiver<CheckpointListSnapshot> {
        self.sender.subscribe()
    }

    pub fn snapshot(&self) -> CheckpointListSnapshot {
        self.sender.borrow().clone()
    }

    pub fn filters(&self) -> CheckpointFilters {
        self.filters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the filters. Refetches only when a filter value actually
    /// changed and auto-fetch is on; returns whether a fetch ran.
    pub async fn set_filters(&self, filters: CheckpointFilters) -> bool {
        let changed = {
            let mut current = self.filters.lock().unwrap_or_else(PoisonError::into_inner);
            if *current == filters {
                false
            } else {
                *current = filters.clone();
                true
            }
        };

        if changed && self.auto_fetch {
            self.fetch(filters).await;
            return true;
        }
        false
    }

    /// Re-issue the current query regardless of auto-fetch
    pub async fn refetch(&self) {
        let filters = self.filters();
        self.fetch(filters).await;
    }

    async fn fetch(&self, filters: CheckpointFilters) {
        let ticket = self.sequencer.issue();
        self.sender.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let result = self.service.list_checkpoints(&filters).await;

        let applied = self.sender.send_if_modified(|s| {
            if !self.sequencer.is_current(ticket) {
                return false;
            }
            match result {
                Ok(list) => {
                    s.count = list.count;
                    s.checkpoints = list.checkpoints;
                    s.error = None;
                }
                Err(e) => {
                    s.checkpoints.clear();
                    s.count = 0;
                    s.error = Some(e);
                }
            }
            s.loading = false;
            true
        });

        if !applied {
            tracing::debug!("Discarding stale checkpoint list response (ticket {})", ticket);
        }
    }
}
