//! Checkpoint records: query service, storage backends and fetch state.
//!
//! ## Operations
//!
//! | Operation | Not found | Failure message |
//! |-----------|-----------|-----------------|
//! | `list_checkpoints(filters)` | n/a (empty list) | Failed to fetch checkpoints |
//! | `get_checkpoint_by_id(id)` | `AppError::NotFound` | Failed to fetch checkpoint |
//! | `create_checkpoint(dto)` | n/a | Failed to create checkpoint |
//! | `update_checkpoint(id, dto)` | `AppError::NotFound` | Failed to update checkpoint |
//! | `delete_checkpoint(id)` | `AppError::NotFound` | Failed to delete checkpoint |

pub mod dtos;
pub mod models;
pub mod services;
pub mod state;
pub mod stores;

pub use services::CheckpointService;
pub use state::{CheckpointDetailState, CheckpointListState};
pub use stores::{CheckpointStore, PgCheckpointStore, PostgrestStore};
