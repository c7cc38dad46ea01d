use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use pvz_api::app::{build_app, AppServices};
use pvz_api::config::Config;
use pvz_auth::Hs256Jwt;
use pvz_infra::store::{connect_with_retry, ConnectOptions, InMemoryStore, PostgresStore};
use pvz_observability::Metrics;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().context("invalid configuration")?;
    pvz_observability::init(config.log_format);

    if config.jwt_secret_is_default {
        warn!("JWT_SECRET not set; using insecure dev default");
    }

    let jwt = Hs256Jwt::new(config.jwt_secret.as_bytes());
    let metrics = Metrics::new().context("failed to register metrics")?;

    let services = match &config.database_url {
        Some(url) => {
            let opts = ConnectOptions {
                attempts: config.db_connect_attempts,
                backoff: config.db_connect_backoff,
                ..ConnectOptions::new(url.as_str())
            };
            let pool = connect_with_retry(&opts).await.context("failed to connect to postgres")?;
            let store = PostgresStore::new(pool);
            store.migrate().await.context("failed to run migrations")?;
            AppServices::new(store, jwt.clone(), metrics)
        }
        None => {
            warn!("DATABASE_URL not set; using in-memory storage");
            AppServices::new(InMemoryStore::new(), jwt.clone(), metrics)
        }
    };

    let app = build_app(Arc::new(services), Arc::new(jwt));

    let listener = tokio::net::TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.http_addr))?;

    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shut down");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
