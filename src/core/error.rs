use std::fmt;

use thiserror::Error;

/// The remote operation a failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Operation {
    /// Caller-facing message used when the store reports a failure
    pub fn failure_message(self) -> &'static str {
        match self {
            Operation::List => "Failed to fetch checkpoints",
            Operation::Get => "Failed to fetch checkpoint",
            Operation::Create => "Failed to create checkpoint",
            Operation::Update => "Failed to update checkpoint",
            Operation::Delete => "Failed to delete checkpoint",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.failure_message())
    }
}

/// Errors surfaced by the checkpoint query service.
///
/// Every variant carries a stable caller-facing message (see [`AppError::message`])
/// so UIs can render it directly; `NotFound` is kept apart from transport
/// failures so callers can branch on absence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AppError {
    #[error("Checkpoint not found")]
    NotFound,

    #[error("{operation}: {details}")]
    Transport {
        operation: Operation,
        details: String,
    },

    #[error("{message}: {details}")]
    InvalidInput {
        message: &'static str,
        details: String,
    },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub const NOT_FOUND_MESSAGE: &'static str = "Checkpoint not found";
    pub const INTERNAL_MESSAGE: &'static str = "Internal server error";

    /// Short message, without details
    pub fn message(&self) -> &str {
        match self {
            AppError::NotFound => Self::NOT_FOUND_MESSAGE,
            AppError::Transport { operation, .. } => operation.failure_message(),
            AppError::InvalidInput { message, .. } => message,
            AppError::Internal(_) => Self::INTERNAL_MESSAGE,
        }
    }

    pub fn details(&self) -> Option<&str> {
        match self {
            AppError::NotFound => None,
            AppError::Transport { details, .. }
            | AppError::InvalidInput { details, .. }
            | AppError::Internal(details) => Some(details),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound)
    }

    pub fn invalid_input(details: impl Into<String>) -> Self {
        AppError::InvalidInput {
            message: "Missing or invalid fields",
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
