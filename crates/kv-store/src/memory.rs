//! In-memory backend implementation for testing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::backend::{KeyTtl, KvBackend};
use crate::error::{Result, StoreError};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<String, Entry>,
    subscribers: HashMap<String, u32>,
    published: Vec<(String, String)>,
    fail_all: bool,
}

/// In-memory key-value backend for tests and local development.
///
/// Honors per-key expiry (expired keys vanish from `get`, `keys` and `ttl`)
/// and records every publish so tests can assert on notification traffic.
#[derive(Clone, Default)]
pub struct InMemoryKvBackend {
    state: Arc<RwLock<State>>,
}

impl InMemoryKvBackend {
    /// Creates a new empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures every subsequent operation to fail, simulating an
    /// unreachable backend.
    pub async fn set_fail_all(&self, fail: bool) {
        self.state.write().await.fail_all = fail;
    }

    /// Registers `count` subscribers on a channel, so that `publish`
    /// reports them as recipients.
    pub async fn add_subscribers(&self, channel: &str, count: u32) {
        *self
            .state
            .write()
            .await
            .subscribers
            .entry(channel.to_string())
            .or_insert(0) += count;
    }

    /// Returns the payloads published on a channel, in publish order.
    pub async fn published(&self, channel: &str) -> Vec<String> {
        self.state
            .read()
            .await
            .published
            .iter()
            .filter(|(c, _)| c == channel)
            .map(|(_, p)| p.clone())
            .collect()
    }

    /// Returns the number of live (non-expired) keys.
    pub async fn key_count(&self) -> usize {
        let now = Instant::now();
        self.state
            .read()
            .await
            .entries
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    async fn check_available(&self) -> Result<()> {
        if self.state.read().await.fail_all {
            return Err(StoreError::Unavailable("simulated backend failure".into()));
        }
        Ok(())
    }
}

fn pattern_matches(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

#[async_trait]
impl KvBackend for InMemoryKvBackend {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check_available().await?;
        let now = Instant::now();
        let mut state = self.state.write().await;
        match state.entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                state.entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.check_available().await?;
        let entry = Entry {
            value: value.to_string(),
            expires_at: ttl.map(|d| Instant::now() + d),
        };
        self.state.write().await.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.check_available().await?;
        let now = Instant::now();
        let mut state = self.state.write().await;
        match state.entries.remove(key) {
            Some(entry) => Ok(!entry.is_expired(now)),
            None => Ok(false),
        }
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        self.check_available().await?;
        let now = Instant::now();
        let state = self.state.read().await;
        match state.entries.get(key) {
            None => Ok(KeyTtl::Missing),
            Some(entry) if entry.is_expired(now) => Ok(KeyTtl::Missing),
            Some(entry) => match entry.expires_at {
                Some(deadline) => Ok(KeyTtl::Expires(deadline - now)),
                None => Ok(KeyTtl::Persistent),
            },
        }
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.check_available().await?;
        let now = Instant::now();
        let state = self.state.read().await;
        Ok(state
            .entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired(now) && pattern_matches(pattern, key))
            .map(|(key, _)| key.clone())
            .collect())
    }

    async fn publish(&self, channel: &str, payload: &str) -> Result<u32> {
        self.check_available().await?;
        let mut state = self.state.write().await;
        state
            .published
            .push((channel.to_string(), payload.to_string()));
        Ok(state.subscribers.get(channel).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_and_get_roundtrip() {
        let backend = InMemoryKvBackend::new();
        backend.set("k", "v", None).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some("v".to_string()));
        assert_eq!(backend.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let backend = InMemoryKvBackend::new();
        backend.set("k", "v", None).await.unwrap();
        assert!(backend.delete("k").await.unwrap());
        assert!(!backend.delete("k").await.unwrap());
    }

    #[tokio::test]
    async fn expired_keys_vanish() {
        let backend = InMemoryKvBackend::new();
        backend
            .set("k", "v", Some(Duration::from_millis(20)))
            .await
            .unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some("v".to_string()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(backend.get("k").await.unwrap(), None);
        assert_eq!(backend.ttl("k").await.unwrap(), KeyTtl::Missing);
        assert!(backend.keys("k*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ttl_distinguishes_persistent_and_expiring_keys() {
        let backend = InMemoryKvBackend::new();
        backend.set("forever", "v", None).await.unwrap();
        backend
            .set("bounded", "v", Some(Duration::from_secs(60)))
            .await
            .unwrap();

        assert_eq!(backend.ttl("forever").await.unwrap(), KeyTtl::Persistent);
        assert_eq!(backend.ttl("absent").await.unwrap(), KeyTtl::Missing);

        let remaining = backend
            .ttl("bounded")
            .await
            .unwrap()
            .remaining()
            .expect("bounded key should expire");
        assert!(remaining <= Duration::from_secs(60));
        assert!(remaining > Duration::from_secs(58));
    }

    #[tokio::test]
    async fn keys_matches_prefix_patterns() {
        let backend = InMemoryKvBackend::new();
        backend.set("saga:transaction:a", "1", None).await.unwrap();
        backend.set("saga:transaction:b", "2", None).await.unwrap();
        backend.set("cache:alumno:1", "3", None).await.unwrap();

        let mut keys = backend.keys("saga:transaction:*").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["saga:transaction:a", "saga:transaction:b"]);

        assert_eq!(
            backend.keys("cache:alumno:1").await.unwrap(),
            vec!["cache:alumno:1"]
        );
    }

    #[tokio::test]
    async fn publish_counts_subscribers_and_records_payloads() {
        let backend = InMemoryKvBackend::new();
        assert_eq!(backend.publish("events", "one").await.unwrap(), 0);

        backend.add_subscribers("events", 2).await;
        assert_eq!(backend.publish("events", "two").await.unwrap(), 2);

        assert_eq!(backend.published("events").await, vec!["one", "two"]);
        assert!(backend.published("other").await.is_empty());
    }

    #[tokio::test]
    async fn fail_all_simulates_outage() {
        let backend = InMemoryKvBackend::new();
        backend.set_fail_all(true).await;
        assert!(matches!(
            backend.get("k").await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            backend.set("k", "v", None).await,
            Err(StoreError::Unavailable(_))
        ));

        backend.set_fail_all(false).await;
        backend.set("k", "v", None).await.unwrap();
        assert_eq!(backend.get("k").await.unwrap(), Some("v".to_string()));
    }
}
