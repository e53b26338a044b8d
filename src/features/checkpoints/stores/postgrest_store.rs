use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{CheckpointStore, StoreError};
use crate::core::config::StoreConfig;
use crate::features::checkpoints::dtos::{
    CheckpointQuery, CreateCheckpointDto, UpdateCheckpointDto,
};
use crate::features::checkpoints::models::Checkpoint;
use crate::shared::constants::{PGRST_NO_ROWS_CODE, PGRST_OBJECT_MEDIA_TYPE};

/// Error body returned by PostgREST on non-2xx responses
#[derive(Debug, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
}

/// Checkpoint store backed by the hosted PostgREST interface (`/rest/v1/<table>`)
pub struct PostgrestStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl PostgrestStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/rest/v1/{}", config.url, config.table),
            api_key: config.anon_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, &self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// Request for exactly one row, returned as a bare JSON object
    fn single_row_request(&self, method: Method, id: i64) -> RequestBuilder {
        self.request(method)
            .query(&[("id", format!("eq.{}", id))])
            .header(reqwest::header::ACCEPT, PGRST_OBJECT_MEDIA_TYPE)
    }

    /// Query-string pairs for a filtered listing.
    ///
    /// Text filters use `imatch` (case-insensitive regex) with the user text
    /// escaped. PostgREST rewrites `*` to `%` inside `ilike` patterns, so
    /// `ilike` cannot keep a literal `*` from acting as a wildcard.
    pub(crate) fn list_params(query: &CheckpointQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("select", "*".to_string()),
            ("order", "date.asc,id.asc".to_string()),
        ];

        if let Some(state) = &query.state {
            params.push(("state", format!("imatch.^{}$", regex::escape(state))));
        }
        if let Some(city) = &query.city {
            params.push(("city", format!("imatch.{}", regex::escape(city))));
        }
        if let Some(county) = &query.county {
            params.push(("county", format!("imatch.{}", regex::escape(county))));
        }
        if let Some(date_from) = query.date_from {
            params.push(("date", format!("gte.{}", date_from.format("%Y-%m-%d"))));
        }

        params
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, StoreError> {
        let response = request.send().await.map_err(|e| {
            tracing::error!("Checkpoint store request failed: {:?}", e);
            StoreError::Transport(format!("Request failed: {}", e))
        })?;

        Self::read_json(response).await
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
        let status = response.status();

        if status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| StoreError::Transport(format!("Failed to read response: {}", e)))?;
            return serde_json::from_str(&body).map_err(|e| {
                tracing::error!("Failed to parse checkpoint store response: {:?}", e);
                StoreError::Decode(e.to_string())
            });
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(
                    "Checkpoint store returned {} with unreadable body: {:?}",
                    status,
                    e
                );
                return Err(StoreError::Transport(format!(
                    "HTTP {} - failed to read response body: {}",
                    status, e
                )));
            }
        };
        let error = serde_json::from_str::<PostgrestError>(&body).ok();

        if status == StatusCode::NOT_ACCEPTABLE
            && error
                .as_ref()
                .and_then(|e| e.code.as_deref())
                .is_some_and(|code| code == PGRST_NO_ROWS_CODE)
        {
            return Err(StoreError::NotFound);
        }

        let message = match error {
            Some(PostgrestError {
                message: Some(message),
                details,
                ..
            }) => match details {
                Some(details) => format!("{} ({})", message, details),
                None => message,
            },
            _ => format!("HTTP {} - {}", status, body),
        };

        tracing::warn!("Checkpoint store returned {}: {}", status, message);
        Err(StoreError::Transport(message))
    }
}

#[async_trait]
impl CheckpointStore for PostgrestStore {
    async fn select(&self, query: &CheckpointQuery) -> Result<Vec<Checkpoint>, StoreError> {
        let params = Self::list_params(query);
        tracing::debug!("Listing checkpoints: {} {:?}", self.endpoint, params);

        Self::send(self.request(Method::GET).query(&params)).await
    }

    async fn select_by_id(&self, id: i64) -> Result<Checkpoint, StoreError> {
        tracing::debug!("Fetching checkpoint {} from {}", id, self.endpoint);

        Self::send(
            self.single_row_request(Method::GET, id)
                .query(&[("select", "*")]),
        )
        .await
    }

    async fn insert(&self, checkpoint: &CreateCheckpointDto) -> Result<Checkpoint, StoreError> {
        Self::send(
            self.request(Method::POST)
                .header(reqwest::header::ACCEPT, PGRST_OBJECT_MEDIA_TYPE)
                .header("Prefer", "return=representation")
                .json(checkpoint),
        )
        .await
    }

    async fn update(
        &self,
        id: i64,
        changes: &UpdateCheckpointDto,
    ) -> Result<Checkpoint, StoreError> {
        Self::send(
            self.single_row_request(Method::PATCH, id)
                .header("Prefer", "return=representation")
                .json(changes),
        )
        .await
    }

    async fn delete(&self, id: i64) -> Result<Checkpoint, StoreError> {
        Self::send(
            self.single_row_request(Method::DELETE, id)
                .header("Prefer", "return=representation"),
        )
        .await
    }
}
