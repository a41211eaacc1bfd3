// Shardpool API server
// Decision: Postgres when DATABASE_URL is set, in-memory store otherwise (dev mode)

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum_server::tls_rustls::RustlsConfig;
use shardpool_api::shutdown::shutdown_signal;
use shardpool_api::{create_app, AppState, ServerConfig};
use shardpool_core::{EventStore, InMemoryEventStore, PoolConfig, ShardPool};
use shardpool_storage::DbEventStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Grace period for in-flight HTTPS requests once a signal arrives
const HTTPS_GRACE_PERIOD: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "shardpool_api=debug,shardpool_core=info,shardpool_storage=info,tower_http=debug"
                .into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("shardpool-api starting...");

    let server_config = ServerConfig::from_env()?;
    let pool_config = PoolConfig::from_env();

    // Initialize storage
    let (store, storage): (Arc<dyn EventStore>, &'static str) = match &server_config.database_url
    {
        Some(url) => {
            let store = DbEventStore::connect(url).await?;
            tracing::info!("Connected to database");
            (Arc::new(store), "postgres")
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store (data is lost on exit)");
            (Arc::new(InMemoryEventStore::new()), "memory")
        }
    };

    let pool = Arc::new(ShardPool::start(pool_config, store.clone()));

    if !server_config.api_prefix.is_empty() {
        tracing::info!(prefix = %server_config.api_prefix, "API prefix configured");
    }
    if server_config.cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?server_config.cors_origins, "CORS origins configured");
    }

    let app = create_app(
        AppState::new(pool.clone(), store, storage),
        &server_config.api_prefix,
        &server_config.cors_origins,
    );

    let addr = server_config.bind_addr;
    match &server_config.tls {
        Some(tls) => {
            tracing::info!(cert = ?tls.cert_path, key = ?tls.key_path, "TLS enabled");
            let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
                .await
                .context("Failed to load TLS certificate")?;

            let handle = axum_server::Handle::new();
            let signal_handle = handle.clone();
            tokio::spawn(async move {
                shutdown_signal().await;
                signal_handle.graceful_shutdown(Some(HTTPS_GRACE_PERIOD));
            });

            tracing::info!("Listening on https://{}", addr);
            axum_server::bind_rustls(addr, rustls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("Server error")?;
        }
        None => {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .context("Failed to bind to address")?;
            tracing::info!("Listening on http://{}", addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await
                .context("Server error")?;
        }
    }

    // Server no longer accepts requests; drain every shard
    let summaries = pool.shutdown().await?;
    for summary in &summaries {
        tracing::info!(
            shard_id = summary.shard_id,
            workers_spawned = summary.workers_spawned,
            respawns = summary.respawns,
            "Shard summary"
        );
    }
    tracing::info!("shardpool-api stopped");

    Ok(())
}
