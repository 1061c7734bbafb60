//! Distributed lease and result cache
//!
//! A single external key-value server backs two concerns: a per-key exclusive
//! lease (`SET … EX … NX`) that serializes transfer attempts across
//! processes, and a TTL'd result cache that replays completed transfers.
//! The cache is an accelerator and a mutex, never authoritative state.
//!
//! The coordinator depends on the [`Cache`] trait; production wires
//! [`RedisCache`], tests wire [`MemoryCache`].

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        CacheError::Backend(e.to_string())
    }
}

/// Key-value operations the transfer coordinator needs.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Atomic set-if-absent with TTL. Returns whether this caller now owns
    /// the key. The lease is advisory: it expires on its own after `ttl`.
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError>;

    /// Unconditional delete. No fencing token: a holder that stalled past
    /// the TTL has silently lost the lease.
    async fn release(&self, key: &str) -> Result<(), CacheError>;

    /// Store a serialized value, replacing any prior one.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Fetch a previously stored value, or None on miss/expiry.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
}

/// Redis-backed cache used in production.
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connect with a bounded retry loop so a cache that is still starting
    /// up does not kill the service.
    pub async fn connect(url: &str, retry_backoff: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;

        let mut last_err = None;
        for attempt in 0..3 {
            match ConnectionManager::new(client.clone()).await {
                Ok(conn) => {
                    tracing::info!("Redis connection established");
                    return Ok(Self { conn });
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Redis connect failed, retrying");
                    last_err = Some(e);
                    tokio::time::sleep(retry_backoff).await;
                }
            }
        }
        Err(last_err.expect("retry loop ran at least once").into())
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        // SET key 1 EX <ttl> NX -> "OK" when acquired, nil when held
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(1)
            .arg("EX")
            .arg(ttl.as_secs())
            .arg("NX")
            .query_async(&mut self.conn.clone())
            .await?;
        Ok(reply.is_some())
    }

    async fn release(&self, key: &str) -> Result<(), CacheError> {
        let _: () = self.conn.clone().del(key).await?;
        Ok(())
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let _: () = self
            .conn
            .clone()
            .set_ex(key, value, ttl.as_secs())
            .await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.conn.clone().get(key).await?)
    }
}

/// In-process cache with the same contract, for tests.
///
/// TTLs are honored lazily: an expired entry is dropped on next access.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn live_value(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((value, expires)) if *expires > Instant::now() => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<bool, CacheError> {
        if self.live_value(key).is_some() {
            return Ok(false);
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), ("1".to_string(), Instant::now() + ttl));
        Ok(true)
    }

    async fn release(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.live_value(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_lease_is_exclusive_until_released() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(30);

        assert!(cache.try_acquire("lock:t1", ttl).await.unwrap());
        assert!(!cache.try_acquire("lock:t1", ttl).await.unwrap());

        cache.release("lock:t1").await.unwrap();
        assert!(cache.try_acquire("lock:t1", ttl).await.unwrap());
    }

    #[tokio::test]
    async fn memory_lease_expires() {
        let cache = MemoryCache::new();

        assert!(
            cache
                .try_acquire("lock:t2", Duration::from_millis(10))
                .await
                .unwrap()
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(
            cache
                .try_acquire("lock:t2", Duration::from_secs(30))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn memory_put_replaces_and_get_misses_after_expiry() {
        let cache = MemoryCache::new();
        let long = Duration::from_secs(60);

        cache.put("idempotency:t3", "first", long).await.unwrap();
        cache.put("idempotency:t3", "second", long).await.unwrap();
        assert_eq!(
            cache.get("idempotency:t3").await.unwrap().as_deref(),
            Some("second")
        );

        cache
            .put("idempotency:t4", "v", Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get("idempotency:t4").await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_release_is_idempotent() {
        let cache = MemoryCache::new();
        cache.release("lock:never-held").await.unwrap();
    }
}
