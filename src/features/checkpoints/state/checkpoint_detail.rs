use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;

use super::RequestSequencer;
use crate::core::error::AppError;
use crate::features::checkpoints::models::Checkpoint;
use crate::features::checkpoints::services::CheckpointService;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckpointDetailSnapshot {
    pub checkpoint: Option<Checkpoint>,
    pub loading: bool,
    pub error: Option<AppError>,
}

/// Tracks a single checkpoint by id
pub struct CheckpointDetailState {
    service: Arc<CheckpointService>,
    id: Mutex<Option<i64>>,
    auto_fetch: bool,
    sender: watch::Sender<CheckpointDetailSnapshot>,
    sequencer: RequestSequencer,
}

impl CheckpointDetailState {
    pub async fn new(service: Arc<CheckpointService>, id: Option<i64>, auto_fetch: bool) -> Self {
        let (sender, _) = watch::channel(CheckpointDetailSnapshot {
            loading: auto_fetch && id.is_some(),
            ..Default::default()
        });

        let state = Self {
            service,
            id: Mutex::new(id),
            auto_fetch,
            sender,
            sequencer: RequestSequencer::default(),
        };

        if auto_fetch {
            state.refetch().await;
        }
        state
    }

    pub fn subscribe(&self) -> watch::Receiver<CheckpointDetailSnapshot> {
        self.sender.subscribe()
    }

    pub fn snapshot(&self) -> CheckpointDetailSnapshot {
        self.sender.borrow().clone()
    }

    pub fn id(&self) -> Option<i64> {
        *self.id.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Switch to another id. `None` clears the state immediately without I/O.
    pub async fn set_id(&self, id: Option<i64>) -> bool {
        let changed = {
            let mut current = self.id.lock().unwrap_or_else(PoisonError::into_inner);
            let changed = *current != id;
            *current = id;
            changed
        };

        match id {
            None => {
                self.clear();
                false
            }
            Some(id) if changed && self.auto_fetch => {
                self.fetch(id).await;
                true
            }
            Some(_) => false,
        }
    }

    /// Fetch the current id again; a no-op while no id is set
    pub async fn refetch(&self) {
        match self.id() {
            Some(id) => self.fetch(id).await,
            None => self.clear(),
        }
    }

    fn clear(&self) {
        self.sequencer.invalidate();
        self.sender.send_replace(CheckpointDetailSnapshot::default());
    }

    async fn fetch(&self, id: i64) {
        let ticket = self.sequencer.issue();
        self.sender.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });

        let result = self.service.get_checkpoint_by_id(id).await;

        let applied = self.sender.send_if_modified(|s| {
            if !self.sequencer.is_current(ticket) {
                return false;
            }
            match result {
                Ok(checkpoint) => {
                    s.checkpoint = Some(checkpoint);
                    s.error = None;
                }
                Err(e) => {
                    s.checkpoint = None;
                    s.error = Some(e);
                }
            }
            s.loading = false;
            true
        });

        if !applied {
            tracing::debug!("Discarding stale response for checkpoint {}", id);
        }
    }
}
