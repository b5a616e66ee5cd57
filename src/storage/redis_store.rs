use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use redis::{
    aio::{ConnectionManager, ConnectionManagerConfig},
    AsyncCommands, Client,
};
use std::future::Future;
use std::time::Duration;
use tracing::{error, info};
use url::Url;

use crate::config::RedisConfig;
use crate::storage::{CounterStore, StoreResult};

/// Counter store backed by a shared Redis connection manager.
///
/// The manager multiplexes one connection and reconnects on its own, so a
/// single instance is built at startup and cloned into every call.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Connect once and verify the server answers PING
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let manager_config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(Some(Duration::from_secs(5)))
            .set_response_timeout(Some(Duration::from_millis(config.response_timeout_ms)));

        let client = Client::open(connection_url(config)?.as_str())
            .context("invalid redis connection info")?;
        let connection = client
            .get_connection_manager_with_config(manager_config)
            .await
            .with_context(|| format!("failed to connect to redis at {}", config.addr))?;

        let store = Self { connection };
        store.ping().await?;
        Ok(store)
    }
}

/// Build the `redis://` URL for the configured address, credentials and db index
pub fn connection_url(config: &RedisConfig) -> Result<Url> {
    let base = if config.addr.contains("://") {
        config.addr.clone()
    } else {
        format!("redis://{}", config.addr)
    };

    let mut url = Url::parse(&base).with_context(|| format!("invalid redis addr {}", config.addr))?;
    url.set_path(&format!("/{}", config.db));
    if !config.password.is_empty() {
        url.set_password(Some(&config.password))
            .map_err(|_| anyhow!("redis addr {} cannot carry a password", config.addr))?;
    }

    Ok(url)
}

/// Run `op` up to `attempts` times, sleeping `delay` between failures.
///
/// Returns the last error once every attempt has failed.
pub async fn with_retry<T, F, Fut>(attempts: u32, delay: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                error!(
                    error = %e,
                    remaining = attempts - attempt,
                    "store connection failed, retrying in {}s",
                    delay.as_secs()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(e.context(format!("store unavailable after {} attempts", attempts)))
            }
        }
    }
}

/// Connect to Redis with the configured bounded retry
pub async fn connect_with_retry(config: &RedisConfig) -> Result<RedisStore> {
    let store = with_retry(
        config.connect_retries,
        Duration::from_secs(config.retry_delay_secs),
        || RedisStore::connect(config),
    )
    .await?;
    info!("Connected to redis at {} (db {})", config.addr, config.db);
    Ok(store)
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn set_add(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut conn = self.connection.clone();
        let _: i64 = conn.sadd(key, member).await?;
        Ok(())
    }

    async fn set_card(&self, key: &str) -> StoreResult<i64> {
        let mut conn = self.connection.clone();
        Ok(conn.scard(key).await?)
    }

    async fn hash_incr(&self, key: &str, field: &str, delta: i64) -> StoreResult<i64> {
        let mut conn = self.connection.clone();
        Ok(conn.hincr(key, field, delta).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn redis_config(addr: &str, password: &str, db: i64) -> RedisConfig {
        RedisConfig {
            addr: addr.to_string(),
            password: password.to_string(),
            db,
            prefix: String::new(),
            connect_retries: 3,
            retry_delay_secs: 0,
            response_timeout_ms: 1000,
        }
    }

    #[test]
    fn test_connection_url_plain() {
        let url = connection_url(&redis_config("127.0.0.1:6379", "", 0)).unwrap();
        assert_eq!(url.as_str(), "redis://127.0.0.1:6379/0");
    }

    #[test]
    fn test_connection_url_with_password_and_db() {
        let url = connection_url(&redis_config("cache.internal:6380", "s3cr#t", 4)).unwrap();
        assert_eq!(url.host_str(), Some("cache.internal"));
        assert_eq!(url.port(), Some(6380));
        assert_eq!(url.path(), "/4");
        assert_eq!(url.password(), Some("s3cr%23t"));
    }

    #[test]
    fn test_connection_url_keeps_scheme() {
        let url = connection_url(&redis_config("rediss://cache.internal:6380", "", 1)).unwrap();
        assert_eq!(url.scheme(), "rediss");
        assert_eq!(url.path(), "/1");
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry(3, Duration::ZERO, || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(anyhow!("refused"))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhausted_is_error() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retry(3, Duration::ZERO, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(anyhow!("refused")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
