use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::features::checkpoints::models::Checkpoint;

/// Caller-facing filters for listing checkpoints. All set filters must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointFilters {
    /// Exact state match, case-insensitive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Substring of the city, case-insensitive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// Substring of the county, case-insensitive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    /// Only checkpoints dated today or later
    #[serde(default)]
    pub upcoming: bool,
}

impl CheckpointFilters {
    pub fn upcoming() -> Self {
        Self {
            upcoming: true,
            ..Default::default()
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_county(mut self, county: impl Into<String>) -> Self {
        self.county = Some(county.into());
        self
    }
}

/// Filters resolved against a concrete "today", ready for a backend to execute.
///
/// Blank text filters are dropped here so backends never see them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckpointQuery {
    pub state: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub date_from: Option<NaiveDate>,
}

impl CheckpointQuery {
    pub fn from_filters(filters: &CheckpointFilters, today: NaiveDate) -> Self {
        fn present(value: &Option<String>) -> Option<String> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        }

        Self {
            state: present(&filters.state),
            city: present(&filters.city),
            county: present(&filters.county),
            date_from: filters.upcoming.then_some(today),
        }
    }
}

/// Successful list result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckpointListResponse {
    pub count: usize,
    pub checkpoints: Vec<Checkpoint>,
}

impl From<Vec<Checkpoint>> for CheckpointListResponse {
    fn from(checkpoints: Vec<Checkpoint>) -> Self {
        Self {
            count: checkpoints.len(),
            checkpoints,
        }
    }
}

/// Successful single-record result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckpointResponse {
    pub checkpoint: Checkpoint,
}

/// Request DTO for creating a checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CreateCheckpointDto {
    pub date: NaiveDate,

    #[validate(length(min = 1, max = 64, message = "State must be 1-64 characters"))]
    pub state: String,

    #[validate(length(min = 1, max = 128, message = "City must be 1-128 characters"))]
    pub city: String,

    #[validate(length(min = 1, max = 128, message = "County must be 1-128 characters"))]
    pub county: String,

    #[validate(length(max = 255, message = "Location must not exceed 255 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[validate(length(max = 64, message = "Time must not exceed 64 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    #[validate(length(max = 2000, message = "Notes must not exceed 2000 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180"
    ))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

/// Request DTO for updating a checkpoint; only set fields are written
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct UpdateCheckpointDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    #[validate(length(min = 1, max = 64, message = "State must be 1-64 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[validate(length(min = 1, max = 128, message = "City must be 1-128 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[validate(length(min = 1, max = 128, message = "County must be 1-128 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,

    #[validate(length(max = 255, message = "Location must not exceed 255 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[validate(length(max = 64, message = "Time must not exceed 64 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    #[validate(length(max = 2000, message = "Notes must not exceed 2000 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[validate(range(min = -90.0, max = 90.0, message = "Latitude must be between -90 and 90"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    #[validate(range(
        min = -180.0,
        max = 180.0,
        message = "Longitude must be between -180 and 180"
    ))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl UpdateCheckpointDto {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
