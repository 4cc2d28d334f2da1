//! Persistence glue for saga records over a key-value backend.

use std::time::Duration;

use common::TransactionId;
use kv_store::KvBackend;

use crate::error::Result;
use crate::state::SagaState;
use crate::transaction::SagaTransaction;

const KEY_PREFIX: &str = "saga:transaction:";

/// Stores saga records as JSON under `saga:transaction:{id}`.
///
/// Records are created with a bounded TTL and never deleted by the
/// orchestrator; expiry is the store's responsibility, so completed sagas
/// stay readable for audit until the TTL reclaims them.
#[derive(Clone)]
pub struct SagaStore<B> {
    backend: B,
}

impl<B: KvBackend> SagaStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    fn key_for(transaction_id: TransactionId) -> String {
        format!("{KEY_PREFIX}{transaction_id}")
    }

    /// Creates or overwrites a record with an expiry.
    pub async fn save(&self, saga: &SagaTransaction, ttl: Duration) -> Result<()> {
        let payload = serde_json::to_string(saga)?;
        self.backend
            .set(&Self::key_for(saga.transaction_id()), &payload, Some(ttl))
            .await?;
        Ok(())
    }

    /// Reads a record by id.
    pub async fn get(&self, transaction_id: TransactionId) -> Result<Option<SagaTransaction>> {
        match self.backend.get(&Self::key_for(transaction_id)).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Overwrites a record, preserving the remaining TTL of the existing
    /// key. A key persisted without expiry stays without expiry.
    pub async fn update(&self, saga: &SagaTransaction) -> Result<()> {
        let key = Self::key_for(saga.transaction_id());
        let ttl = self.backend.ttl(&key).await?.remaining();
        let payload = serde_json::to_string(saga)?;
        self.backend.set(&key, &payload, ttl).await?;
        Ok(())
    }

    /// Enumerates ids of records whose persisted state is in `states`.
    pub async fn list(&self, states: &[SagaState]) -> Result<Vec<TransactionId>> {
        let keys = self.backend.keys(&format!("{KEY_PREFIX}*")).await?;
        let mut ids = Vec::new();
        for key in keys {
            // A key can expire between the enumeration and the read.
            let Some(json) = self.backend.get(&key).await? else {
                continue;
            };
            let saga: SagaTransaction = match serde_json::from_str(&json) {
                Ok(saga) => saga,
                Err(err) => {
                    tracing::warn!(key, error = %err, "skipping undecodable saga record");
                    continue;
                }
            };
            if states.contains(&saga.state()) {
                ids.push(saga.transaction_id());
            }
        }
        Ok(ids)
    }
}
