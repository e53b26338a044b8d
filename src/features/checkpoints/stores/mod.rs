//! Backends that hold checkpoint rows.
//!
//! The query service only talks to [`CheckpointStore`]; which backend sits
//! behind it is decided once at startup.

mod postgres_store;
mod postgrest_store;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::error::{AppError, Operation};
use crate::features::checkpoints::dtos::{
    CheckpointQuery, CreateCheckpointDto, UpdateCheckpointDto,
};
use crate::features::checkpoints::models::Checkpoint;

pub use postgres_store::PgCheckpointStore;
pub use postgrest_store::PostgrestStore;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("No matching checkpoint row")]
    NotFound,

    #[error("{0}")]
    Transport(String),

    #[error("Malformed store response: {0}")]
    Decode(String),
}

impl StoreError {
    /// Attribute a backend failure to the service operation that hit it
    pub fn into_app_error(self, operation: Operation) -> AppError {
        match self {
            StoreError::NotFound => AppError::NotFound,
            StoreError::Transport(details) => AppError::Transport { operation, details },
            StoreError::Decode(details) => AppError::Internal(details),
        }
    }
}

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Rows matching every set filter, ordered by date ascending
    async fn select(&self, query: &CheckpointQuery) -> Result<Vec<Checkpoint>, StoreError>;

    async fn select_by_id(&self, id: i64) -> Result<Checkpoint, StoreError>;

    async fn insert(&self, checkpoint: &CreateCheckpointDto) -> Result<Checkpoint, StoreError>;

    async fn update(
        &self,
        id: i64,
        changes: &UpdateCheckpointDto,
    ) -> Result<Checkpoint, StoreError>;

    /// Removes the row and returns it as it was
    async fn delete(&self, id: i64) -> Result<Checkpoint, StoreError>;
}

/// Escape LIKE metacharacters so user text only ever matches literally
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
