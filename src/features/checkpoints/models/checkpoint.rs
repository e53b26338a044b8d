use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::shared::dates::{classify, DateStatus};

/// One announced DUI enforcement checkpoint, as stored in the `checkpoints` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Checkpoint {
    pub id: i64,
    /// Local calendar day of the checkpoint; never time-zone shifted
    pub date: NaiveDate,
    pub state: String,
    pub city: String,
    pub county: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Checkpoint {
    pub fn status_on(&self, today: NaiveDate) -> DateStatus {
        classify(self.date, today)
    }

    pub fn is_upcoming_on(&self, today: NaiveDate) -> bool {
        self.status_on(today) == DateStatus::Upcoming
    }

    /// Stored coordinates, only when both halves are present
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    /// "City, ST" label used for map titles and geocoding
    pub fn place_name(&self) -> String {
        format!("{}, {}", self.city.trim(), self.state.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_store_row() {
        let row = json!({
            "id": 7,
            "date": "2024-12-25",
            "state": "CA",
            "city": "Los Angeles",
            "county": "Los Angeles",
            "location": "Sunset Blvd & Vine St",
            "time": "8 PM - 2 AM",
            "notes": null,
            "latitude": 34.0983,
            "longitude": -118.3267,
            "created_at": "2024-12-01T10:00:00.123456+00:00",
            "updated_at": "2024-12-01T10:00:00+00:00"
        });

        let checkpoint: Checkpoint = serde_json::from_value(row).unwrap();
        assert_eq!(checkpoint.id, 7);
        assert_eq!(checkpoint.date, NaiveDate::from_ymd_opt(2024, 12, 25).unwrap());
        assert_eq!(checkpoint.notes, None);
        assert_eq!(checkpoint.coordinates(), Some((34.0983, -118.3267)));
        assert!(checkpoint.created_at.is_some());
    }

    #[test]
    fn test_optional_columns_may_be_missing() {
        let row = json!({
            "id": 1,
            "date": "2025-01-01",
            "state": "TX",
            "city": "Austin",
            "county": "Travis"
        });

        let checkpoint: Checkpoint = serde_json::from_value(row).unwrap();
        assert_eq!(checkpoint.location, None);
        assert_eq!(checkpoint.coordinates(), None);
        assert_eq!(checkpoint.place_name(), "Austin, TX");
    }

    #[test]
    fn test_partial_coordinates_are_ignored() {
        let checkpoint: Checkpoint = serde_json::from_value(json!({
            "id": 2,
            "date": "2025-01-01",
            "state": "TX",
            "city": "Austin",
            "county": "Travis",
            "latitude": 30.27
        }))
        .unwrap();
        assert_eq!(checkpoint.coordinates(), None);
    }

    #[test]
    fn test_status_on() {
        let checkpoint: Checkpoint = serde_json::from_value(json!({
            "id": 3,
            "date": "2025-03-10",
            "state": "NV",
            "city": "Reno",
            "county": "Washoe"
        }))
        .unwrap();

        let day = |d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap();
        assert_eq!(checkpoint.status_on(day(9)), DateStatus::Upcoming);
        assert_eq!(checkpoint.status_on(day(10)), DateStatus::Upcoming);
        assert_eq!(checkpoint.status_on(day(11)), DateStatus::Past);
    }
}
