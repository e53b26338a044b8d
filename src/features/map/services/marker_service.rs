use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;

use crate::features::checkpoints::models::Checkpoint;
use crate::features::map::models::{Coordinates, Marker, MarkerColor};
use crate::features::map::services::{GeocodingError, GeocodingService};
use crate::shared::dates::format_date;

type Lookup = Result<Option<Coordinates>, GeocodingError>;

/// Turns checkpoint records into map markers
pub struct MarkerService {
    geocoder: Arc<GeocodingService>,
}

impl MarkerService {
    pub fn new(geocoder: Arc<GeocodingService>) -> Self {
        Self { geocoder }
    }

    /// Place every checkpoint that can be placed.
    ///
    /// Stored coordinates win; otherwise the city/state pair is geocoded,
    /// once per distinct place. Checkpoints that cannot be located are left
    /// out. Output keeps input order.
    pub async fn resolve_markers(&self, checkpoints: &[Checkpoint], today: NaiveDate) -> Vec<Marker> {
        let mut places: HashMap<String, (&str, &str)> = HashMap::new();
        for checkpoint in checkpoints.iter().filter(|c| c.coordinates().is_none()) {
            places
                .entry(GeocodingService::cache_key(&checkpoint.city, &checkpoint.state))
                .or_insert((checkpoint.city.as_str(), checkpoint.state.as_str()));
        }

        let lookups = places.into_iter().map(|(key, (city, state))| async move {
            (key, self.geocoder.geocode_city(city, state).await)
        });
        let resolved: HashMap<String, Lookup> = join_all(lookups).await.into_iter().collect();

        checkpoints
            .iter()
            .filter_map(|checkpoint| Self::place(checkpoint, &resolved, today))
            .collect()
    }

    fn place(
        checkpoint: &Checkpoint,
        resolved: &HashMap<String, Lookup>,
        today: NaiveDate,
    ) -> Option<Marker> {
        let key = GeocodingService::cache_key(&checkpoint.city, &checkpoint.state);
        let (latitude, longitude, geocoded) = match checkpoint.coordinates() {
            Some((lat, lon)) => (lat, lon, false),
            None => match resolved.get(&key) {
                Some(Ok(Some(coords))) => (coords.latitude, coords.longitude, true),
                Some(Err(e)) => {
                    tracing::warn!(
                        "Geocoding failed for checkpoint {} ({}): {}",
                        checkpoint.id,
                        checkpoint.place_name(),
                        e
                    );
                    return None;
                }
                _ => {
                    tracing::warn!(
                        "No location found for checkpoint {} ({}), skipping marker",
                        checkpoint.id,
                        checkpoint.place_name()
                    );
                    return None;
                }
            },
        };

        Some(Marker {
            checkpoint_id: checkpoint.id,
            latitude,
            longitude,
            color: MarkerColor::for_checkpoint(checkpoint, today),
            title: checkpoint
                .location
                .clone()
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| checkpoint.place_name()),
            subtitle: subtitle(checkpoint),
            geocoded,
        })
    }
}

fn subtitle(checkpoint: &Checkpoint) -> String {
    let day = checkpoint.date.format("%Y-%m-%d").to_string();
    let date = format_date(Some(day.as_str()));
    match checkpoint.time.as_deref().map(str::trim) {
        Some(time) if !time.is_empty() => format!("{} at {}", date, time),
        _ => date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GeocodingConfig;
    use crate::shared::test_helpers::{checkpoint, date, spawn_http};
    use axum::extract::{Query, State};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    async fn fake_nominatim(
        State(hits): State<Arc<AtomicUsize>>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        hits.fetch_add(1, Ordering::SeqCst);
        match params.get("city").map(String::as_str) {
            Some("Reno") => Json(json!([{
                "lat": "39.5296",
                "lon": "-119.8138",
                "display_name": "Reno, Washoe County, Nevada, United States"
            }])),
            _ => Json(json!([])),
        }
    }

    async fn service_with_hits() -> (MarkerService, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/search", get(fake_nominatim))
            .with_state(Arc::clone(&hits));
        let config = GeocodingConfig {
            base_url: spawn_http(app).await,
            min_interval: Duration::ZERO,
            ..Default::default()
        };
        let service = MarkerService::new(Arc::new(GeocodingService::new(&config).unwrap()));
        (service, hits)
    }

    #[tokio::test]
    async fn test_resolve_markers() {
        let mut stored = checkpoint(1, "2024-12-31", "CA", "Fresno", "Fresno");
        stored.latitude = Some(36.7378);
        stored.longitude = Some(-119.7871);
        stored.location = Some("Blackstone Ave & Shields Ave".to_string());
        stored.time = Some("9 PM - 3 AM".to_string());

        let lookup = checkpoint(2, "2024-12-01", "NV", "Reno", "Washoe");
        let unknown = checkpoint(3, "2025-01-01", "ZZ", "Atlantis", "Nowhere");

        let (service, _) = service_with_hits().await;
        let markers = service
            .resolve_markers(&[stored, lookup, unknown], date("2024-12-25"))
            .await;

        assert_eq!(markers.len(), 2);

        assert_eq!(markers[0].checkpoint_id, 1);
        assert!(!markers[0].geocoded);
        assert_eq!(markers[0].latitude, 36.7378);
        assert_eq!(markers[0].color, MarkerColor::Upcoming);
        assert_eq!(markers[0].title, "Blackstone Ave & Shields Ave");
        assert_eq!(markers[0].subtitle, "2024-12-31 at 9 PM - 3 AM");

        assert_eq!(markers[1].checkpoint_id, 2);
        assert!(markers[1].geocoded);
        assert_eq!(markers[1].longitude, -119.8138);
        assert_eq!(markers[1].color, MarkerColor::Past);
        assert_eq!(markers[1].title, "Reno, NV");
        assert_eq!(markers[1].subtitle, "2024-12-01");
    }

    #[tokio::test]
    async fn test_repeated_places_are_geocoded_once() {
        let checkpoints: Vec<Checkpoint> = (1..=5)
            .map(|id| {
                let city = if id % 2 == 0 { "reno" } else { "Reno" };
                checkpoint(id, "2024-12-31", "NV", city, "Washoe")
            })
            .chain([
                checkpoint(6, "2024-12-31", "ZZ", "Atlantis", "Nowhere"),
                checkpoint(7, "2024-12-31", "zz", "atlantis", "Nowhere"),
            ])
            .collect();

        let (service, hits) = service_with_hits().await;
        let markers = service
            .resolve_markers(&checkpoints, date("2024-12-25"))
            .await;

        assert_eq!(markers.len(), 5);
        assert!(markers.iter().all(|m| m.geocoded));
        // Reno once, Atlantis structured + free-form once
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }
}
