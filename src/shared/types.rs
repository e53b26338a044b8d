use serde::Serialize;

use crate::core::error::{AppError, Result};

/// Wire shape of a service result.
///
/// Success flattens the payload next to `"success": true`; failures carry
/// `error` (stable message) and `details`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Envelope<T> {
    Success {
        success: bool,
        #[serde(flatten)]
        data: T,
    },
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
}

impl<T> Envelope<T> {
    pub fn success(data: T) -> Self {
        Envelope::Success {
            success: true,
            data,
        }
    }

    pub fn error(err: &AppError) -> Self {
        Envelope::Error {
            error: err.message().to_string(),
            details: err.details().map(str::to_string),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Envelope::Success { .. })
    }
}

impl<T> From<Result<T>> for Envelope<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Envelope::success(data),
            Err(e) => Envelope::error(&e),
        }
    }
}
