// src/main.rs

use std::{net::SocketAddr, sync::Arc, time::Duration};

use dotenvy::dotenv;
use photos_api::{
    blob::{BlobStore, LocalBlobStore, S3BlobStore},
    config::{BlobStoreConfig, Config, DocumentStoreConfig},
    routes,
    state::AppState,
    store::{DocumentStore, MemoryDocumentStore, PgDocumentStore},
};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DB_CONNECT_ATTEMPTS: u32 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "api.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let documents: Arc<dyn DocumentStore> = match &config.document_store {
        DocumentStoreConfig::Postgres {
            database_url,
            max_connections,
        } => {
            let pool = connect_with_retry(database_url, *max_connections).await?;
            tracing::info!("Database connected...");

            let store = PgDocumentStore::new(pool);
            tracing::info!("Running migrations...");
            store.migrate().await?;
            tracing::info!("Migrations applied successfully.");

            Arc::new(store)
        }
        DocumentStoreConfig::Memory => {
            tracing::warn!("Using the in-memory document store; data is lost on exit");
            Arc::new(MemoryDocumentStore::new())
        }
    };

    let blobs: Arc<dyn BlobStore> = match &config.blob_store {
        BlobStoreConfig::S3(s3) => Arc::new(S3BlobStore::new(s3).await?),
        BlobStoreConfig::Local {
            dir,
            public_base_url,
        } => {
            tokio::fs::create_dir_all(dir).await?;
            tracing::info!("Storing uploads in {}", dir.display());
            Arc::new(LocalBlobStore::new(dir, public_base_url.clone()))
        }
    };

    tracing::info!(
        "Rating consistency mode: {:?}",
        config.rating_consistency
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(config, documents, blobs);

    // Create the Axum application router
    let app = routes::create_router(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Start the server
    axum::serve(listener, app).await?;
    Ok(())
}

/// Connects to Postgres, retrying while the database comes up.
async fn connect_with_retry(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let mut attempt = 0;
    loop {
        match PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
        {
            Ok(pool) => return Ok(pool),
            Err(e) => {
                attempt += 1;
                if attempt >= DB_CONNECT_ATTEMPTS {
                    tracing::error!("Failed to connect to database after {} attempts", attempt);
                    return Err(e);
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", attempt);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }
}
