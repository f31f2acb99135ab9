//! # Database Connection Pool Management
//!
//! Opens the PostgreSQL pool used by the vault store. A first connection is
//! established directly, without the pool's retry loop, and pinged; both steps
//! are bounded and the error returned says which of the two failed or stalled.

use super::connection::{build_connection_string, redacted_connection_string};
use crate::config::ProviderConfig;
use crate::errors::{ConnectStage, ProviderError, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, PgConnection, Pool, Postgres};
use std::future::Future;
use std::{str::FromStr, time::Duration};

/// Type alias for the database connection pool
pub type DbPool = Pool<Postgres>;

/// Upper bound for opening the pool
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound for the liveness ping
pub const PING_TIMEOUT: Duration = Duration::from_secs(10);

/// Open a pool for the given configuration and verify the database answers.
pub async fn open_pool(config: &ProviderConfig) -> Result<DbPool> {
    config.validate_config()?;

    let target = redacted_connection_string(config);
    let connect_options = PgConnectOptions::from_str(&build_connection_string(config))
        .map_err(|e| {
            ProviderError::config(format!("Invalid connection settings for {}: {}", target, e))
        })?;

    let mut conn = bounded(
        ConnectStage::CreatePool,
        CONNECT_TIMEOUT,
        PgConnection::connect_with(&connect_options),
    )
    .await
    .inspect_err(|e| {
        tracing::error!(error = %e, url = %target, "Failed to connect to database");
    })?;

    bounded(ConnectStage::Ping, PING_TIMEOUT, conn.ping()).await.inspect_err(|e| {
        tracing::error!(error = %e, url = %target, "Database ping failed");
    })?;

    if let Err(e) = conn.close().await {
        tracing::debug!(error = %e, "Closing initial connection failed");
    }

    // Later connections are opened on demand, bounded by the acquire timeout
    let pool = PgPoolOptions::new()
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect_lazy_with(connect_options);

    tracing::info!(
        url = %target,
        connect_timeout_ms = CONNECT_TIMEOUT.as_millis(),
        pool_size = pool.size(),
        "Database connection pool created"
    );

    Ok(pool)
}

/// Run one connection stage under a deadline.
///
/// Only an elapsed deadline maps to [`ProviderError::ConnectionTimeout`];
/// every driver error, refused connections included, maps to
/// [`ProviderError::Connection`].
pub(crate) async fn bounded<T, F>(stage: ConnectStage, timeout: Duration, future: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(Ok(value)) => Ok(value),
        Err(_) => Err(ProviderError::ConnectionTimeout { stage, timeout }),
        Ok(Err(source)) => Err(ProviderError::Connection { stage, source }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::pending;

    #[tokio::test(start_paused = true)]
    async fn test_stalled_pool_creation_times_out() {
        let started = tokio::time::Instant::now();
        let result = bounded(
            ConnectStage::CreatePool,
            CONNECT_TIMEOUT,
            pending::<std::result::Result<(), sqlx::Error>>(),
        )
        .await;

        let error = result.unwrap_err();
        assert!(error.is_timeout());
        assert!(error.to_string().contains("unable to create connection pool within 10 seconds"));
        assert_eq!(started.elapsed(), CONNECT_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_ping_times_out() {
        let result =
            bounded(ConnectStage::Ping, PING_TIMEOUT, pending::<std::result::Result<(), sqlx::Error>>())
                .await;

        match result {
            Err(ProviderError::ConnectionTimeout { stage, timeout }) => {
                assert_eq!(stage, ConnectStage::Ping);
                assert_eq!(timeout, Duration::from_secs(10));
            }
            other => panic!("expected ping timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refused_connection_fails_fast_without_timeout() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = ProviderConfig::new(format!("127.0.0.1:{}", port), "pw");

        let started = std::time::Instant::now();
        let error = open_pool(&config).await.unwrap_err();

        assert!(!error.is_timeout(), "refused connection reported as timeout: {}", error);
        assert!(matches!(error, ProviderError::Connection { stage: ConnectStage::CreatePool, .. }));
        assert!(started.elapsed() < CONNECT_TIMEOUT);
        assert!(!error.to_string().contains("pw@"));
    }

    #[tokio::test]
    async fn test_driver_error_is_not_timeout() {
        let result = bounded(ConnectStage::CreatePool, CONNECT_TIMEOUT, async {
            Err::<(), _>(sqlx::Error::Protocol("password authentication failed".into()))
        })
        .await;

        let error = result.unwrap_err();
        assert!(!error.is_timeout());
        assert!(matches!(error, ProviderError::Connection { stage: ConnectStage::CreatePool, .. }));
        assert!(error.to_string().contains("password authentication failed"));
    }

    #[tokio::test]
    async fn test_completed_stage_passes_value_through() {
        let value = bounded(ConnectStage::Ping, PING_TIMEOUT, async { Ok::<_, sqlx::Error>(42) })
            .await
            .unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_open_pool_rejects_invalid_config() {
        let config = ProviderConfig::new("", "secret");
        let error = open_pool(&config).await.unwrap_err();
        assert!(matches!(error, ProviderError::Config { .. }));
        assert_eq!(error.attribute(), Some("host"));
    }

    #[tokio::test]
    async fn test_open_pool_rejects_unknown_sslmode() {
        let mut config = ProviderConfig::new("localhost", "hunter2");
        config.sslmode = Some("sometimes".to_string());

        let error = open_pool(&config).await.unwrap_err();
        assert!(matches!(error, ProviderError::Config { .. }));
        assert!(!error.to_string().contains("hunter2"));
    }
}
