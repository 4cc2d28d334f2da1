//! Redis-backed implementation of the key-value/pub-sub contract.
//!
//! Note: Redis pub/sub is not durable (messages are dropped if subscribers
//! are offline), which matches the best-effort notification contract of the
//! saga layer.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::backend::{KeyTtl, KvBackend};
use crate::error::{Result, StoreError};

/// Redis key-value backend over a multiplexed connection manager.
///
/// The connection manager reconnects transparently; individual command
/// failures surface as [`StoreError`].
#[derive(Clone)]
pub struct RedisKvBackend {
    conn: ConnectionManager,
}

impl RedisKvBackend {
    /// Connects to Redis using a `redis://` URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_err)?;
        let conn = client.get_connection_manager().await.map_err(map_err)?;
        tracing::info!(url, "connected to redis");
        Ok(Self { conn })
    }

    /// Verifies the connection is alive.
    pub async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(map_err)?;
        Ok(())
    }
}

fn map_err(err: redis::RedisError) -> StoreError {
    if err.is_io_error() {
        StoreError::Unavailable(err.to_string())
    } else {
        StoreError::Backend(err.to_string())
    }
}

#[async_trait]
impl KvBackend for RedisKvBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(map_err)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.conn.clone();
        match ttl {
            // SETEX rejects a zero expiry; clamp sub-second TTLs up to 1s.
            Some(d) => conn
                .set_ex(key, value, d.as_secs().max(1))
                .await
                .map_err(map_err),
            None => conn.set(key, value).await.map_err(map_err),
        }
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await.map_err(map_err)?;
        Ok(removed > 0)
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        let mut conn = self.conn.clone();
        let secs: i64 = conn.ttl(key).await.map_err(map_err)?;
        Ok(match secs {
            -2 => KeyTtl::Missing,
            -1 => KeyTtl::Persistent,
            s => KeyTtl::Expires(Duration::from_secs(s.max(0) as u64)),
        })
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn.clone();
        conn.keys(pattern).await.map_err(map_err)
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<u32> {
        let mut conn = self.conn.clone();
        let recipients: i64 = conn.publish(channel, payload).await.map_err(map_err)?;
        Ok(recipients.max(0) as u32)
    }
}
