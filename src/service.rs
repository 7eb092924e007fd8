//! Service start-up: ingest, merge, transform, publish, serve.

use crate::api;
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::importer::{Importer, weather::WeatherMerger, weather::WeatherOutcome};
use crate::pipeline::{self, HttpTransformer, Transformer};
use crate::query::QueryEngine;
use crate::store::{BuildingStore, SharedStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task;
use tracing::info;

/// Ingest the data root and merge the weather file
pub async fn ingest(config: &ServiceConfig) -> Result<BuildingStore> {
    let importer = Importer::new(config);
    let merger = WeatherMerger::new(&config.data_dir, config.weather_extension.clone())
        .with_separator(config.weather_separator_byte()?)
        .with_missing_policy(config.missing_weather);

    task::spawn_blocking(move || -> Result<BuildingStore> {
        let (mut store, _) = importer.import()?;
        if let WeatherOutcome::Merged { source, buildings, .. } = merger.merge(&mut store)? {
            info!(
                "Temperature from {} added to {} buildings",
                source.display(),
                buildings
            );
        }
        Ok(store)
    })
    .await?
}

/// Build the store that will be served.
///
/// Runs the ingestion, then the collaborator chain unless it is disabled.
pub async fn bootstrap(config: &ServiceConfig) -> Result<Arc<SharedStore>> {
    config.validate()?;
    let store = ingest(config).await?;

    let store = if config.collaborators.enabled {
        let transformer = HttpTransformer::new(config.collaborators.clone())?;
        transform(&store, &transformer).await?
    } else {
        info!("Transformation services disabled, serving ingested data");
        store
    };

    Ok(Arc::new(SharedStore::new(store)))
}

pub async fn transform(store: &BuildingStore, transformer: &dyn Transformer) -> Result<BuildingStore> {
    info!("Sending {} buildings through the transformation services", store.len());
    pipeline::run_transforms(store, transformer).await
}

/// Bind the listener and serve queries until the process stops
pub async fn serve(config: &ServiceConfig, store: Arc<SharedStore>) -> Result<()> {
    let listener = TcpListener::bind(config.socket_addr()?).await?;
    info!("Listening on {}", listener.local_addr()?);

    let app = api::router(QueryEngine::new(store));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received CTRL+C, shutting down");
    }
}
