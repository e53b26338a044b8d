use std::sync::Arc;

use checkpoint_map_core::core::config::{Config, StoreBackend};
use checkpoint_map_core::core::database;
use checkpoint_map_core::features::checkpoints::dtos::CheckpointListResponse;
use checkpoint_map_core::features::checkpoints::{
    CheckpointListState, CheckpointService, CheckpointStore, PgCheckpointStore, PostgrestStore,
};
use checkpoint_map_core::features::map::{GeocodingService, MarkerService};
use checkpoint_map_core::shared::types::Envelope;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let dotenv = dotenvy::dotenv();

    // Logs go to stderr; stdout carries the JSON result only
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!("Error loading .env file: {}", e);
        }
    }

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!("Configuration loaded successfully");

    let store: Arc<dyn CheckpointStore> = match config.store.backend {
        StoreBackend::Rest => {
            let store = PostgrestStore::new(&config.store)
                .map_err(|e| anyhow::anyhow!("Failed to initialize checkpoint store: {}", e))?;
            tracing::info!("Checkpoint store: {}", store.endpoint());
            Arc::new(store)
        }
        StoreBackend::Postgres => {
            let db = config
                .database
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("Database configuration missing"))?;
            let pool = database::create_pool(db).await?;
            tracing::info!("Database connection pool created");
            Arc::new(PgCheckpointStore::new(pool, &config.store.table))
        }
    };

    let service = Arc::new(CheckpointService::new(store));
    let today = service.today();

    let filters = config.filters.to_filters();
    tracing::info!("Fetching checkpoints with {:?}", filters);
    let list = CheckpointListState::new(Arc::clone(&service), filters, true).await;
    let snapshot = list.snapshot();

    if let Some(err) = snapshot.error {
        tracing::error!("{}", err);
        let envelope = Envelope::<CheckpointListResponse>::error(&err);
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        return Ok(());
    }

    let geocoder = Arc::new(
        GeocodingService::new(&config.geocoding)
            .map_err(|e| anyhow::anyhow!("Failed to initialize geocoding: {}", e))?,
    );
    let markers = MarkerService::new(Arc::clone(&geocoder))
        .resolve_markers(&snapshot.checkpoints, today)
        .await;
    tracing::info!(
        "Placed {} of {} checkpoints ({} places geocoded)",
        markers.len(),
        snapshot.count,
        geocoder.cached_len().await
    );

    let output = serde_json::json!({
        "checkpoints": Envelope::success(CheckpointListResponse::from(snapshot.checkpoints)),
        "markers": markers,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
