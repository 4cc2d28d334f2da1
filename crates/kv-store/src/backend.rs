//! The key-value/pub-sub contract the saga layer builds on.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// Remaining lifetime of a key, mirroring Redis TTL semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// The key does not exist.
    Missing,
    /// The key exists and never expires.
    Persistent,
    /// The key exists and expires after the given duration.
    Expires(Duration),
}

impl KeyTtl {
    /// Returns the remaining duration, if the key carries an expiry.
    pub fn remaining(&self) -> Option<Duration> {
        match self {
            KeyTtl::Expires(d) => Some(*d),
            KeyTtl::Missing | KeyTtl::Persistent => None,
        }
    }
}

/// Operations the saga layer requires from the key-value transport.
///
/// All implementations must be safe for concurrent use by multiple sagas
/// (`Send + Sync`). No record-level locking is layered on top: each saga
/// record is only ever read-modify-written by the single task driving that
/// transaction.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Reads a key. Returns `None` for a missing or expired key.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Creates or overwrites a key, optionally with an expiry.
    /// `ttl: None` persists the key indefinitely.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Deletes a key. Returns whether a key was actually removed;
    /// deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Reports the remaining lifetime of a key.
    async fn ttl(&self, key: &str) -> Result<KeyTtl>;

    /// Enumerates keys matching a glob-style pattern (`prefix*`).
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Publishes a payload on a channel. Returns the number of subscribers
    /// that received it; 0 means no one was listening.
    async fn publish(&self, channel: &str, payload: &str) -> Result<u32>;
}
