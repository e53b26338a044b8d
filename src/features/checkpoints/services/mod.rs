mod checkpoint_service;
mod list_helpers;

pub use checkpoint_service::{CheckpointService, Clock};
pub use list_helpers::{partition_by_status, search_checkpoints};
