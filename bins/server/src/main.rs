//! Firecert API Server
//!
//! Main entry point for the fire-safety permitting backend.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use firecert_api::{AppState, create_router};
use firecert_core::storage::{StorageConfig, StorageService};
use firecert_db::connect_with;
use firecert_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "firecert=debug,firecert_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect_with(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    let jwt_service = JwtService::new(JwtConfig::from(&config.jwt));

    let storage = match &config.storage {
        Some(settings) => {
            let storage = StorageService::from_config(StorageConfig::from_settings(settings)?)?;
            info!(
                provider = storage.provider_name(),
                bucket = storage.bucket(),
                "Storage configured"
            );
            Some(Arc::new(storage))
        }
        None => {
            warn!("No storage configured; document and photo uploads are disabled");
            None
        }
    };

    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        storage,
    };

    let app = create_router(state, config.server.body_limit_bytes);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
