use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tokio::time::Instant;

use crate::core::config::GeocodingConfig;
use crate::features::map::models::Coordinates;

/// Nominatim API response structure
#[derive(Debug, Deserialize)]
pub struct NominatimResponse {
    pub lat: String,
    pub lon: String,
    pub display_name: String,
}

impl NominatimResponse {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates {
            latitude: self.lat.trim().parse().ok()?,
            longitude: self.lon.trim().parse().ok()?,
        })
    }
}

#[derive(Debug, Error)]
pub enum GeocodingError {
    #[error("Failed to build geocoding client: {0}")]
    Client(String),

    #[error("Geocoding request failed: {0}")]
    Request(String),

    #[error("Failed to parse geocoding response: {0}")]
    Parse(String),
}

/// Resolves "city, state" pairs to coordinates using Nominatim.
///
/// Successful lookups are cached for the lifetime of the service; nothing
/// is written back to the checkpoint store. Concurrent lookups of the same
/// place share one request, and requests are spaced at least
/// `min_interval` apart.
pub struct GeocodingService {
    client: reqwest::Client,
    base_url: String,
    country: String,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
    cache: RwLock<HashMap<String, Arc<OnceCell<Coordinates>>>>,
}

/// Why a lookup left its cache slot empty
enum Unresolved {
    NotFound,
    Failed(GeocodingError),
}

impl GeocodingService {
    pub fn new(config: &GeocodingConfig) -> Result<Self, GeocodingError> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| GeocodingError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            country: config.country.clone(),
            min_interval: config.min_interval,
            last_request: Mutex::new(None),
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Cache key for a city/state pair
    pub fn cache_key(city: &str, state: &str) -> String {
        format!(
            "{}, {}",
            city.trim().to_lowercase(),
            state.trim().to_lowercase()
        )
    }

    pub async fn cached_len(&self) -> usize {
        self.cache
            .read()
            .await
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    async fn slot(&self, key: &str) -> Arc<OnceCell<Coordinates>> {
        if let Some(slot) = self.cache.read().await.get(key) {
            return Arc::clone(slot);
        }
        Arc::clone(self.cache.write().await.entry(key.to_string()).or_default())
    }

    /// Coordinates for a city in a state, from cache when seen before
    pub async fn geocode_city(
        &self,
        city: &str,
        state: &str,
    ) -> Result<Option<Coordinates>, GeocodingError> {
        let key = Self::cache_key(city, state);
        let slot = self.slot(&key).await;

        if let Some(hit) = slot.get() {
            tracing::debug!("Geocoding cache hit: {}", key);
            return Ok(Some(*hit));
        }

        // Callers waiting on the same slot reuse the first success; a miss
        // leaves the slot empty for the next caller to retry.
        let resolved = slot
            .get_or_try_init(|| async {
                match self.geocode_structured(city, state).await {
                    Ok(Some(result)) => {
                        tracing::debug!("Geocoded {} to {}", key, result.display_name);
                        result.coordinates().ok_or(Unresolved::NotFound)
                    }
                    Ok(None) => Err(Unresolved::NotFound),
                    Err(e) => Err(Unresolved::Failed(e)),
                }
            })
            .await;

        match resolved {
            Ok(coords) => Ok(Some(*coords)),
            Err(Unresolved::NotFound) => Ok(None),
            Err(Unresolved::Failed(e)) => Err(e),
        }
    }

    /// Structured city/state search, falling back to a free-form "city, state" query
    async fn geocode_structured(
        &self,
        city: &str,
        state: &str,
    ) -> Result<Option<NominatimResponse>, GeocodingError> {
        let params = [
            ("format", "json"),
            ("limit", "1"),
            ("city", city.trim()),
            ("state", state.trim()),
            ("country", self.country.as_str()),
        ];

        let query_string = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let url = format!("{}/search?{}", self.base_url, query_string);
        tracing::debug!("Geocoding (structured): {}/{} -> {}", city, state, url);

        if let Some(result) = self.execute_request(&url).await? {
            return Ok(Some(result));
        }

        tracing::debug!("Structured search returned no results, trying free-form query");

        let q = format!("{}, {}, {}", city.trim(), state.trim(), self.country);
        let url = format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url,
            urlencoding::encode(&q)
        );
        tracing::debug!("Geocoding (free-form fallback): {} -> {}", q, url);
        self.execute_request(&url).await
    }

    /// Wait until `min_interval` has passed since the previous request
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// Execute HTTP request to Nominatim and parse response
    async fn execute_request(&self, url: &str) -> Result<Option<NominatimResponse>, GeocodingError> {
        self.throttle().await;
        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::error!("Nominatim request failed: {:?}", e);
            GeocodingError::Request(e.to_string())
        })?;

        if !response.status().is_success() {
            tracing::warn!("Nominatim returned status: {}", response.status());
            return Ok(None);
        }

        let results: Vec<NominatimResponse> = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse Nominatim response: {:?}", e);
            GeocodingError::Parse(e.to_string())
        })?;

        Ok(results.into_iter().next())
    }
}
