#[cfg(test)]
use crate::features::checkpoints::dtos::{
    CheckpointQuery, CreateCheckpointDto, UpdateCheckpointDto,
};
#[cfg(test)]
use crate::features::checkpoints::models::Checkpoint;
#[cfg(test)]
use crate::features::checkpoints::stores::{CheckpointStore, StoreError};

#[cfg(test)]
use async_trait::async_trait;
#[cfg(test)]
use chrono::NaiveDate;
#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use std::sync::{Arc, Mutex};
#[cfg(test)]
use tokio::sync::Notify;

#[cfg(test)]
pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[cfg(test)]
pub fn checkpoint(id: i64, day: &str, state: &str, city: &str, county: &str) -> Checkpoint {
    Checkpoint {
        id,
        date: date(day),
        state: state.to_string(),
        city: city.to_string(),
        county: county.to_string(),
        location: None,
        time: None,
        notes: None,
        latitude: None,
        longitude: None,
        created_at: None,
        updated_at: None,
    }
}

/// Serve `router` on an ephemeral local port and return its base URL
#[cfg(test)]
pub async fn spawn_http(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Same matching rules the remote backends apply in SQL
#[cfg(test)]
fn matches(query: &CheckpointQuery, checkpoint: &Checkpoint) -> bool {
    let contains = |haystack: &str, needle: &str| {
        haystack.to_lowercase().contains(&needle.to_lowercase())
    };

    query
        .state
        .as_ref()
        .is_none_or(|s| checkpoint.state.eq_ignore_ascii_case(s))
        && query.city.as_ref().is_none_or(|c| contains(&checkpoint.city, c))
        && query
            .county
            .as_ref()
            .is_none_or(|c| contains(&checkpoint.county, c))
        && query.date_from.is_none_or(|d| checkpoint.date >= d)
}

/// In-memory checkpoint table for service and state tests
#[cfg(test)]
#[derive(Default)]
pub struct InMemoryStore {
    rows: Mutex<Vec<Checkpoint>>,
    failure: Mutex<Option<StoreError>>,
    calls: Mutex<usize>,
}

#[cfg(test)]
impl InMemoryStore {
    pub fn with_rows(rows: Vec<Checkpoint>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Default::default()
        }
    }

    /// Make every following call fail with `error`
    pub fn fail_with(&self, error: StoreError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    pub fn rows(&self) -> Vec<Checkpoint> {
        self.rows.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), StoreError> {
        *self.calls.lock().unwrap() += 1;
        match self.failure.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl CheckpointStore for InMemoryStore {
    async fn select(&self, query: &CheckpointQuery) -> Result<Vec<Checkpoint>, StoreError> {
        self.check()?;
        let mut rows: Vec<Checkpoint> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches(query, c))
            .cloned()
            .collect();
        rows.sort_by_key(|c| (c.date, c.id));
        Ok(rows)
    }

    async fn select_by_id(&self, id: i64) -> Result<Checkpoint, StoreError> {
        self.check()?;
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert(&self, dto: &CreateCheckpointDto) -> Result<Checkpoint, StoreError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let id = rows.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let created = Checkpoint {
            id,
            date: dto.date,
            state: dto.state.clone(),
            city: dto.city.clone(),
            county: dto.county.clone(),
            location: dto.location.clone(),
            time: dto.time.clone(),
            notes: dto.notes.clone(),
            latitude: dto.latitude,
            longitude: dto.longitude,
            created_at: None,
            updated_at: None,
        };
        rows.push(created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        id: i64,
        changes: &UpdateCheckpointDto,
    ) -> Result<Checkpoint, StoreError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound)?;

        if let Some(d) = changes.date {
            row.date = d;
        }
        if let Some(v) = &changes.state {
            row.state = v.clone();
        }
        if let Some(v) = &changes.city {
            row.city = v.clone();
        }
        if let Some(v) = &changes.county {
            row.county = v.clone();
        }
        if changes.location.is_some() {
            row.location = changes.location.clone();
        }
        if changes.time.is_some() {
            row.time = changes.time.clone();
        }
        if changes.notes.is_some() {
            row.notes = changes.notes.clone();
        }
        if changes.latitude.is_some() {
            row.latitude = changes.latitude;
        }
        if changes.longitude.is_some() {
            row.longitude = changes.longitude;
        }
        Ok(row.clone())
    }

    async fn delete(&self, id: i64) -> Result<Checkpoint, StoreError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        let index = rows
            .iter()
            .position(|c| c.id == id)
            .ok_or(StoreError::NotFound)?;
        Ok(rows.remove(index))
    }
}

/// Wraps [`InMemoryStore`] and parks chosen requests until released.
///
/// Listings are keyed by their city filter, single-row reads by id.
#[cfg(test)]
pub struct GatedStore {
    pub inner: InMemoryStore,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

#[cfg(test)]
impl GatedStore {
    pub fn with_rows(rows: Vec<Checkpoint>) -> Self {
        Self {
            inner: InMemoryStore::with_rows(rows),
            gates: Mutex::new(HashMap::new()),
        }
    }

    /// Park every later request for `key` until [`GatedStore::release`]
    pub fn hold(&self, key: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert(key.to_string(), Arc::new(Notify::new()));
    }

    pub fn release(&self, key: &str) {
        if let Some(gate) = self.gates.lock().unwrap().get(key) {
            gate.notify_one();
        }
    }

    async fn pass(&self, key: &str) {
        let gate = self.gates.lock().unwrap().get(key).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

#[cfg(test)]
#[async_trait]
impl CheckpointStore for GatedStore {
    async fn select(&self, query: &CheckpointQuery) -> Result<Vec<Checkpoint>, StoreError> {
        if let Some(city) = &query.city {
            self.pass(city).await;
        }
        self.inner.select(query).await
    }

    async fn select_by_id(&self, id: i64) -> Result<Checkpoint, StoreError> {
        self.pass(&id.to_string()).await;
        self.inner.select_by_id(id).await
    }

    async fn insert(&self, dto: &CreateCheckpointDto) -> Result<Checkpoint, StoreError> {
        self.inner.insert(dto).await
    }

    async fn update(
        &self,
        id: i64,
        changes: &UpdateCheckpointDto,
    ) -> Result<Checkpoint, StoreError> {
        self.inner.update(id, changes).await
    }

    async fn delete(&self, id: i64) -> Result<Checkpoint, StoreError> {
        self.inner.delete(id).await
    }
}
