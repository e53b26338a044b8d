use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::features::checkpoints::models::Checkpoint;
use crate::shared::dates::DateStatus;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Marker category; the map layer picks the actual color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerColor {
    #[serde(rename = "upcoming-color")]
    Upcoming,
    #[serde(rename = "past-color")]
    Past,
}

impl MarkerColor {
    pub fn for_checkpoint(checkpoint: &Checkpoint, today: NaiveDate) -> Self {
        match checkpoint.status_on(today) {
            DateStatus::Upcoming => MarkerColor::Upcoming,
            DateStatus::Past => MarkerColor::Past,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerColor::Upcoming => "upcoming-color",
            MarkerColor::Past => "past-color",
        }
    }
}

/// A checkpoint placed on the map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub checkpoint_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub color: MarkerColor,
    pub title: String,
    pub subtitle: String,
    /// True when the position came from a place-name lookup rather than the record
    pub geocoded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{checkpoint, date};

    #[test]
    fn test_marker_color_for_checkpoint() {
        let cp = checkpoint(1, "2024-12-25", "CA", "Fresno", "Fresno");
        assert_eq!(
            MarkerColor::for_checkpoint(&cp, date("2024-12-25")),
            MarkerColor::Upcoming
        );
        assert_eq!(
            MarkerColor::for_checkpoint(&cp, date("2024-12-26")),
            MarkerColor::Past
        );
    }

    #[test]
    fn test_marker_color_serializes_as_tag() {
        assert_eq!(
            serde_json::to_string(&MarkerColor::Upcoming).unwrap(),
            "\"upcoming-color\""
        );
        assert_eq!(MarkerColor::Past.as_str(), "past-color");
    }
}
