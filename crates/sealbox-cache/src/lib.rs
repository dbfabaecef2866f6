//! sealbox-cache
//!
//! The ephemeral store (component C2): short-TTL keyed values in Redis.
//! Holds exactly two kinds of state — auth challenge nonces and rate-limit
//! counters — and offers the one primitive the auth protocol cannot live
//! without: an atomic get-and-delete, so a challenge can be consumed at
//! most once no matter how many verifiers race for it.

use redis::aio::ConnectionManager;
use sealbox_core::error::SealboxError;

/// Connection parameters for the ephemeral store.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 6379,
            password: None,
        }
    }
}

impl CacheConfig {
    fn url(&self) -> String {
        match &self.password {
            Some(password) => format!("redis://:{}@{}:{}/", password, self.host, self.port),
            None => format!("redis://{}:{}/", self.host, self.port),
        }
    }
}

/// Handle over a multiplexed Redis connection with automatic reconnect.
/// Cheap to clone; one instance is shared across all handlers.
#[derive(Clone)]
pub struct Cache {
    conn: ConnectionManager,
}

fn cache_err(e: redis::RedisError) -> SealboxError {
    SealboxError::Cache(e.to_string())
}

impl Cache {
    pub async fn connect(config: &CacheConfig) -> Result<Self, SealboxError> {
        let client = redis::Client::open(config.url()).map_err(cache_err)?;
        let conn = ConnectionManager::new(client).await.map_err(cache_err)?;
        Ok(Self { conn })
    }

    /// Store `value` under `key`, expiring after `ttl_secs`.
    pub async fn set_with_ttl(
        &self,
        key: &str,
        value: &[u8],
        ttl_secs: u64,
    ) -> Result<(), SealboxError> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_secs)
            .query_async::<()>(&mut conn)
            .await
            .map_err(cache_err)
    }

    /// Fetch and remove `key` in one server-side operation (GETDEL).
    ///
    /// Atomicity here is the single-use guarantee for challenge nonces: of
    /// any number of concurrent readers, exactly one observes the value.
    pub async fn get_and_delete(&self, key: &str) -> Result<Option<Vec<u8>>, SealboxError> {
        let mut conn = self.conn.clone();
        redis::cmd("GETDEL")
            .arg(key)
            .query_async::<Option<Vec<u8>>>(&mut conn)
            .await
            .map_err(cache_err)
    }

    /// Bump the counter under `key`, starting a fresh `window_secs` window
    /// when the key is new. Returns the count within the current window.
    pub async fn incr_with_window(
        &self,
        key: &str,
        window_secs: u64,
    ) -> Result<u64, SealboxError> {
        let mut conn = self.conn.clone();
        let count: u64 = redis::cmd("INCR")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(cache_err)?;
        if count == 1 {
            redis::cmd("EXPIRE")
                .arg(key)
                .arg(window_secs)
                .query_async::<i64>(&mut conn)
                .await
                .map_err(cache_err)?;
        }
        Ok(count)
    }
}
