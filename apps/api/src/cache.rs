//! Cache capability — get / set-with-TTL / atomic increments.
#![allow(dead_code)]
//!
//! The gateway (LLM response cache, cost counters), rate limiter (window
//! counters) and meter (monthly counts) all speak this trait. Production
//! wires `RedisCache`; tests use `InMemoryCache`. Process-wide clients live
//! only in the composition root.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use redis::AsyncCommands;

#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;

    /// Atomic integer increment. The TTL is applied when the key is created.
    async fn incr(&self, key: &str, by: i64, ttl_secs: u64) -> Result<i64>;

    /// Atomic float increment (cost counters). TTL applied on creation.
    async fn incr_by_float(&self, key: &str, by: f64, ttl_secs: u64) -> Result<f64>;
}

// ────────────────────────────────────────────────────────────────────────────
// Redis implementation
// ────────────────────────────────────────────────────────────────────────────

pub struct RedisCache {
    conn: redis::aio::ConnectionManager,
}

impl RedisCache {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn incr(&self, key: &str, by: i64, ttl_secs: u64) -> Result<i64> {
        let mut conn = self.conn.clone();
        let value: i64 = conn.incr(key, by).await?;
        if value == by {
            // First write created the key — arm its expiry.
            conn.expire::<_, ()>(key, ttl_secs as i64).await?;
        }
        Ok(value)
    }

    async fn incr_by_float(&self, key: &str, by: f64, ttl_secs: u64) -> Result<f64> {
        let mut conn = self.conn.clone();
        let value: f64 = conn.incr(key, by).await?;
        if (value - by).abs() < f64::EPSILON {
            conn.expire::<_, ()>(key, ttl_secs as i64).await?;
        }
        Ok(value)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// In-memory implementation (tests, local development)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, (String, Option<Instant>)>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn live_value(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((value, expires)) => {
                if expires.map(|at| Instant::now() >= at).unwrap_or(false) {
                    entries.remove(key);
                    None
                } else {
                    Some(value.clone())
                }
            }
            None => None,
        }
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.live_value(key))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        let expires = Instant::now() + Duration::from_secs(ttl_secs);
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), Some(expires)));
        Ok(())
    }

    async fn incr(&self, key: &str, by: i64, ttl_secs: u64) -> Result<i64> {
        let current: i64 = self
            .live_value(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let next = current + by;
        let mut entries = self.entries.lock().unwrap();
        let expires = entries
            .get(key)
            .and_then(|(_, at)| *at)
            .unwrap_or_else(|| Instant::now() + Duration::from_secs(ttl_secs));
        entries.insert(key.to_string(), (next.to_string(), Some(expires)));
        Ok(next)
    }

    async fn incr_by_float(&self, key: &str, by: f64, ttl_secs: u64) -> Result<f64> {
        let current: f64 = self
            .live_value(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0);
        let next = current + by;
        let mut entries = self.entries.lock().unwrap();
        let expires = entries
            .get(key)
            .and_then(|(_, at)| *at)
            .unwrap_or_else(|| Instant::now() + Duration::from_secs(ttl_secs));
        entries.insert(key.to_string(), (next.to_string(), Some(expires)));
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_round_trip() {
        let cache = InMemoryCache::new();
        cache.set_with_ttl("k", "v", 60).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(cache.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_incr_accumulates() {
        let cache = InMemoryCache::new();
        assert_eq!(cache.incr("n", 1, 60).await.unwrap(), 1);
        assert_eq!(cache.incr("n", 1, 60).await.unwrap(), 2);
        assert_eq!(cache.incr("n", 5, 60).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_incr_by_float_accumulates() {
        let cache = InMemoryCache::new();
        let a = cache.incr_by_float("cost", 0.25, 60).await.unwrap();
        let b = cache.incr_by_float("cost", 0.50, 60).await.unwrap();
        assert!((a - 0.25).abs() < 1e-9);
        assert!((b - 0.75).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_expired_entry_is_gone() {
        let cache = InMemoryCache::new();
        cache.set_with_ttl("k", "v", 0).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }
}
