use std::sync::Arc;

use chrono::NaiveDate;
use validator::Validate;

use crate::core::error::{AppError, Operation, Result};
use crate::features::checkpoints::dtos::{
    CheckpointFilters, CheckpointListResponse, CheckpointQuery, CreateCheckpointDto,
    UpdateCheckpointDto,
};
use crate::features::checkpoints::models::Checkpoint;
use crate::features::checkpoints::stores::CheckpointStore;
use crate::shared::dates;

/// Source of "today" for the upcoming filter
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Query service over a checkpoint store.
///
/// Every operation returns `Result<_, AppError>`; store failures are mapped
/// to the operation that hit them and never escape as panics.
pub struct CheckpointService {
    store: Arc<dyn CheckpointStore>,
    clock: Clock,
}

impl CheckpointService {
    pub fn new(store: Arc<dyn CheckpointStore>) -> Self {
        Self::with_clock(store, Arc::new(dates::today))
    }

    pub fn with_clock(store: Arc<dyn CheckpointStore>, clock: Clock) -> Self {
        Self { store, clock }
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    /// List checkpoints matching all given filters, ordered by date ascending
    pub async fn list_checkpoints(
        &self,
        filters: &CheckpointFilters,
    ) -> Result<CheckpointListResponse> {
        let query = CheckpointQuery::from_filters(filters, self.today());

        let checkpoints = self.store.select(&query).await.map_err(|e| {
            tracing::error!("Failed to fetch checkpoints with {:?}: {}", query, e);
            e.into_app_error(Operation::List)
        })?;

        tracing::debug!("Fetched {} checkpoints", checkpoints.len());
        Ok(checkpoints.into())
    }

    pub async fn get_checkpoint_by_id(&self, id: i64) -> Result<Checkpoint> {
        self.store.select_by_id(id).await.map_err(|e| {
            tracing::warn!("Failed to fetch checkpoint {}: {}", id, e);
            e.into_app_error(Operation::Get)
        })
    }

    pub async fn create_checkpoint(&self, dto: CreateCheckpointDto) -> Result<Checkpoint> {
        dto.validate()
            .map_err(|e| AppError::invalid_input(e.to_string()))?;

        let checkpoint = self.store.insert(&dto).await.map_err(|e| {
            tracing::error!("Failed to create checkpoint: {}", e);
            e.into_app_error(Operation::Create)
        })?;

        tracing::info!(
            "Checkpoint created: id={}, date={}, city={}",
            checkpoint.id,
            checkpoint.date,
            checkpoint.city
        );
        Ok(checkpoint)
    }

    pub async fn update_checkpoint(&self, id: i64, dto: UpdateCheckpointDto) -> Result<Checkpoint> {
        if dto.is_empty() {
            return Err(AppError::InvalidInput {
                message: "No fields to update",
                details: format!("update for checkpoint {} sets no fields", id),
            });
        }
        dto.validate()
            .map_err(|e| AppError::invalid_input(e.to_string()))?;

        let checkpoint = self.store.update(id, &dto).await.map_err(|e| {
            tracing::warn!("Failed to update checkpoint {}: {}", id, e);
            e.into_app_error(Operation::Update)
        })?;

        tracing::info!("Checkpoint updated: id={}", checkpoint.id);
        Ok(checkpoint)
    }

    /// Delete a checkpoint, returning the removed row
    pub async fn delete_checkpoint(&self, id: i64) -> Result<Checkpoint> {
        let checkpoint = self.store.delete(id).await.map_err(|e| {
            tracing::warn!("Failed to delete checkpoint {}: {}", id, e);
            e.into_app_error(Operation::Delete)
        })?;

        tracing::info!("Checkpoint deleted: id={}", checkpoint.id);
        Ok(checkpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::checkpoints::stores::StoreError;
    use crate::shared::test_helpers::{checkpoint, date, InMemoryStore};

    const TODAY: &str = "2024-12-25";

    fn seeded() -> Arc<InMemoryStore> {
        Arc::new(InMemoryStore::with_rows(vec![
            checkpoint(1, "2024-12-31", "CA", "Los Angeles", "Los Angeles"),
            checkpoint(2, "2024-12-20", "CA", "San Diego", "San Diego"),
            checkpoint(3, "2024-12-25", "CA", "Anaheim", "Orange"),
            checkpoint(4, "2025-01-04", "TX", "Dallas", "Dallas"),
            checkpoint(5, "2024-11-30", "tx", "El Paso", "El Paso"),
        ]))
    }

    fn service(store: Arc<InMemoryStore>) -> CheckpointService {
        CheckpointService::with_clock(store, Arc::new(|| date(TODAY)))
    }

    fn ids(list: &CheckpointListResponse) -> Vec<i64> {
        list.checkpoints.iter().map(|c| c.id).collect()
    }

    #[tokio::test]
    async fn test_list_without_filters_returns_everything_by_date() {
        let svc = service(seeded());
        let list = svc
            .list_checkpoints(&CheckpointFilters::default())
            .await
            .unwrap();

        assert_eq!(list.count, 5);
        assert_eq!(ids(&list), vec![5, 2, 3, 1, 4]);
    }

    #[tokio::test]
    async fn test_state_filter_is_case_insensitive_exact() {
        let svc = service(seeded());
        let lower = svc
            .list_checkpoints(&CheckpointFilters::default().with_state("ca"))
            .await
            .unwrap();
        let upper = svc
            .list_checkpoints(&CheckpointFilters::default().with_state("CA"))
            .await
            .unwrap();

        assert_eq!(lower, upper);
        assert_eq!(lower.count, 3);

        // "C" is not a substring match for "CA"
        let partial = svc
            .list_checkpoints(&CheckpointFilters::default().with_state("C"))
            .await
            .unwrap();
        assert_eq!(partial.count, 0);
    }

    #[tokio::test]
    async fn test_city_filter_is_substring() {
        let svc = service(seeded());
        let list = svc
            .list_checkpoints(&CheckpointFilters::default().with_city("los"))
            .await
            .unwrap();
        assert_eq!(ids(&list), vec![1]);
    }

    #[tokio::test]
    async fn test_county_filter_is_substring() {
        let svc = service(seeded());
        let list = svc
            .list_checkpoints(&CheckpointFilters::default().with_county("ORAN"))
            .await
            .unwrap();
        assert_eq!(ids(&list), vec![3]);
    }

    #[tokio::test]
    async fn test_upcoming_includes_today_and_excludes_past() {
        let svc = service(seeded());
        let list = svc
            .list_checkpoints(&CheckpointFilters::upcoming())
            .await
            .unwrap();

        assert_eq!(ids(&list), vec![3, 1, 4]);
        assert!(list
            .checkpoints
            .iter()
            .all(|c| c.date >= date(TODAY)));
    }

    #[tokio::test]
    async fn test_state_and_upcoming_are_conjunctive() {
        let svc = service(seeded());
        let list = svc
            .list_checkpoints(&CheckpointFilters::upcoming().with_state("CA"))
            .await
            .unwrap();

        // 2 is in CA but already past
        assert_eq!(ids(&list), vec![3, 1]);
    }

    #[tokio::test]
    async fn test_no_match_is_empty_not_error() {
        let svc = service(seeded());
        let list = svc
            .list_checkpoints(&CheckpointFilters::default().with_state("NV"))
            .await
            .unwrap();
        assert_eq!(list.count, 0);
        assert!(list.checkpoints.is_empty());
    }

    #[tokio::test]
    async fn test_list_transport_failure() {
        let store = seeded();
        store.fail_with(StoreError::Transport("connection refused".to_string()));
        let svc = service(store);

        let err = svc
            .list_checkpoints(&CheckpointFilters::default())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Failed to fetch checkpoints");
        assert_eq!(err.details(), Some("connection refused"));
    }

    #[tokio::test]
    async fn test_list_decode_failure_is_internal() {
        let store = seeded();
        store.fail_with(StoreError::Decode("invalid type".to_string()));
        let svc = service(store);

        let err = svc
            .list_checkpoints(&CheckpointFilters::default())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Internal server error");
    }

    #[tokio::test]
    async fn test_get_by_id_distinguishes_not_found_from_outage() {
        let store = seeded();
        let svc = service(Arc::clone(&store));

        let found = svc.get_checkpoint_by_id(4).await.unwrap();
        assert_eq!(found.city, "Dallas");

        let missing = svc.get_checkpoint_by_id(9999).await.unwrap_err();
        assert_eq!(missing, AppError::NotFound);
        assert_eq!(missing.message(), "Checkpoint not found");

        store.fail_with(StoreError::Transport("network unreachable".to_string()));
        let outage = svc.get_checkpoint_by_id(4).await.unwrap_err();
        assert!(!outage.is_not_found());
        assert_eq!(outage.message(), "Failed to fetch checkpoint");
    }

    #[tokio::test]
    async fn test_create_validates_before_writing() {
        let store = seeded();
        let svc = service(Arc::clone(&store));

        let dto = CreateCheckpointDto {
            date: date("2025-02-14"),
            state: "NV".to_string(),
            city: String::new(),
            county: "Clark".to_string(),
            location: None,
            time: None,
            notes: None,
            latitude: None,
            longitude: None,
        };
        let err = svc.create_checkpoint(dto.clone()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput { .. }));
        assert_eq!(store.calls(), 0);

        let created = svc
            .create_checkpoint(CreateCheckpointDto {
                city: "Las Vegas".to_string(),
                ..dto
            })
            .await
            .unwrap();
        assert_eq!(created.id, 6);
        assert_eq!(store.rows().len(), 6);
    }

    #[tokio::test]
    async fn test_update_and_delete_surface_not_found() {
        let store = seeded();
        let svc = service(Arc::clone(&store));

        let update = UpdateCheckpointDto {
            notes: Some("cancelled".to_string()),
            ..Default::default()
        };
        let updated = svc.update_checkpoint(1, update.clone()).await.unwrap();
        assert_eq!(updated.notes.as_deref(), Some("cancelled"));

        assert_eq!(
            svc.update_checkpoint(42, update).await.unwrap_err(),
            AppError::NotFound
        );

        let deleted = svc.delete_checkpoint(1).await.unwrap();
        assert_eq!(deleted.id, 1);
        assert_eq!(
            svc.delete_checkpoint(1).await.unwrap_err(),
            AppError::NotFound
        );
    }

    #[tokio::test]
    async fn test_empty_update_is_rejected_without_io() {
        let store = seeded();
        let svc = service(Arc::clone(&store));

        let err = svc
            .update_checkpoint(1, UpdateCheckpointDto::default())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "No fields to update");
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_mutation_transport_failures_name_the_operation() {
        let store = seeded();
        store.fail_with(StoreError::Transport("permission denied".to_string()));
        let svc = service(Arc::clone(&store));

        let err = svc.delete_checkpoint(1).await.unwrap_err();
        assert_eq!(err.message(), "Failed to delete checkpoint");

        store.recover();
        assert!(svc.delete_checkpoint(1).await.is_ok());
    }
}
