use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};

use super::StoreError;

/// Connection settings for [`connect_with_retry`].
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub attempts: u32,
    pub backoff: Duration,
}

impl ConnectOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
            attempts: 3,
            backoff: Duration::from_secs(3),
        }
    }
}

/// Open a pool, retrying a bounded number of times with a fixed backoff.
pub async fn connect_with_retry(opts: &ConnectOptions) -> Result<PgPool, StoreError> {
    let attempts = opts.attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match PgPoolOptions::new()
            .max_connections(opts.max_connections)
            .acquire_timeout(opts.acquire_timeout)
            .connect(&opts.url)
            .await
        {
            Ok(pool) => {
                info!(attempt, "connected to postgres");
                return Ok(pool);
            }
            Err(e) => {
                warn!(attempt, attempts, error = %e, "postgres connection failed");
                last_error = e.to_string();
                if attempt < attempts {
                    tokio::time::sleep(opts.backoff).await;
                }
            }
        }
    }

    Err(StoreError::Backend(format!(
        "could not connect to postgres after {attempts} attempts: {last_error}"
    )))
}
