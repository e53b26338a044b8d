use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{escape_like, CheckpointStore, StoreError};
use crate::features::checkpoints::dtos::{
    CheckpointQuery, CreateCheckpointDto, UpdateCheckpointDto,
};
use crate::features::checkpoints::models::Checkpoint;
use crate::shared::constants::CHECKPOINT_COLUMNS;

/// Checkpoint store talking to Postgres directly
pub struct PgCheckpointStore {
    pool: PgPool,
    table: String,
}

impl PgCheckpointStore {
    pub fn new(pool: PgPool, table: &str) -> Self {
        Self {
            pool,
            table: quote_ident(table),
        }
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn map_sqlx_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            tracing::error!("Failed to decode checkpoint row: {:?}", e);
            StoreError::Decode(e.to_string())
        }
        other => {
            tracing::error!("Checkpoint query failed: {:?}", other);
            StoreError::Transport(other.to_string())
        }
    }
}

fn build_select(table: &str, query: &CheckpointQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {} FROM {} WHERE TRUE",
        CHECKPOINT_COLUMNS, table
    ));

    if let Some(state) = &query.state {
        qb.push(" AND state ILIKE ").push_bind(escape_like(state));
    }
    if let Some(city) = &query.city {
        qb.push(" AND city ILIKE ")
            .push_bind(format!("%{}%", escape_like(city)));
    }
    if let Some(county) = &query.county {
        qb.push(" AND county ILIKE ")
            .push_bind(format!("%{}%", escape_like(county)));
    }
    if let Some(date_from) = query.date_from {
        qb.push(" AND date >= ").push_bind(date_from);
    }

    qb.push(" ORDER BY date ASC, id ASC");
    qb
}

fn build_insert(table: &str, dto: &CreateCheckpointDto) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "INSERT INTO {} (date, state, city, county, location, time, notes, latitude, longitude) VALUES (",
        table
    ));
    {
        let mut values = qb.separated(", ");
        values.push_bind(dto.date);
        values.push_bind(dto.state.clone());
        values.push_bind(dto.city.clone());
        values.push_bind(dto.county.clone());
        values.push_bind(dto.location.clone());
        values.push_bind(dto.time.clone());
        values.push_bind(dto.notes.clone());
        values.push_bind(dto.latitude);
        values.push_bind(dto.longitude);
    }
    qb.push(format!(") RETURNING {}", CHECKPOINT_COLUMNS));
    qb
}

/// `None` when the update carries no fields
fn build_update(
    table: &str,
    id: i64,
    dto: &UpdateCheckpointDto,
) -> Option<QueryBuilder<'static, Postgres>> {
    if dto.is_empty() {
        return None;
    }

    let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", table));
    {
        let mut sets = qb.separated(", ");
        if let Some(date) = dto.date {
            sets.push("date = ").push_bind_unseparated(date);
        }
        if let Some(state) = &dto.state {
            sets.push("state = ").push_bind_unseparated(state.clone());
        }
        if let Some(city) = &dto.city {
            sets.push("city = ").push_bind_unseparated(city.clone());
        }
        if let Some(county) = &dto.county {
            sets.push("county = ").push_bind_unseparated(county.clone());
        }
        if let Some(location) = &dto.location {
            sets.push("location = ").push_bind_unseparated(location.clone());
        }
        if let Some(time) = &dto.time {
            sets.push("time = ").push_bind_unseparated(time.clone());
        }
        if let Some(notes) = &dto.notes {
            sets.push("notes = ").push_bind_unseparated(notes.clone());
        }
        if let Some(latitude) = dto.latitude {
            sets.push("latitude = ").push_bind_unseparated(latitude);
        }
        if let Some(longitude) = dto.longitude {
            sets.push("longitude = ").push_bind_unseparated(longitude);
        }
    }
    qb.push(" WHERE id = ")
        .push_bind(id)
        .push(format!(" RETURNING {}", CHECKPOINT_COLUMNS));
    Some(qb)
}

#[async_trait]
impl CheckpointStore for PgCheckpointStore {
    async fn select(&self, query: &CheckpointQuery) -> Result<Vec<Checkpoint>, StoreError> {
        let mut qb = build_select(&self.table, query);
        let rows = qb
            .build_query_as::<Checkpoint>()
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        tracing::debug!("Fetched {} checkpoints from Postgres", rows.len());
        Ok(rows)
    }

    async fn select_by_id(&self, id: i64) -> Result<Checkpoint, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM {} WHERE id = ",
            CHECKPOINT_COLUMNS, self.table
        ));
        qb.push_bind(id);

        let row = qb
            .build_query_as::<Checkpoint>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.ok_or(StoreError::NotFound)
    }

    async fn insert(&self, checkpoint: &CreateCheckpointDto) -> Result<Checkpoint, StoreError> {
        let mut qb = build_insert(&self.table, checkpoint);
        let created = qb
            .build_query_as::<Checkpoint>()
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        tracing::info!("Checkpoint created: id={}, date={}", created.id, created.date);
        Ok(created)
    }

    async fn update(
        &self,
        id: i64,
        changes: &UpdateCheckpointDto,
    ) -> Result<Checkpoint, StoreError> {
        let Some(mut qb) = build_update(&self.table, id, changes) else {
            return self.select_by_id(id).await;
        };

        let row = qb
            .build_query_as::<Checkpoint>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: i64) -> Result<Checkpoint, StoreError> {
        let mut qb =
            QueryBuilder::<Postgres>::new(format!("DELETE FROM {} WHERE id = ", self.table));
        qb.push_bind(id)
            .push(format!(" RETURNING {}", CHECKPOINT_COLUMNS));

        let deleted = qb
            .build_query_as::<Checkpoint>()
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?
            .ok_or(StoreError::NotFound)?;

        tracing::info!("Checkpoint deleted: id={}", deleted.id);
        Ok(deleted)
    }
}
