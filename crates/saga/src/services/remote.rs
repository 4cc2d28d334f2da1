//! Remote record service contract and implementations.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

/// Outcome of a single remote read.
///
/// Transport-level failures are folded into `Unavailable` by the client, so
/// the orchestrator can switch on the three business-relevant cases without
/// inspecting exception hierarchies.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The record exists; payload as returned by the service.
    Found(Value),
    /// The id does not exist (404-class).
    NotFound,
    /// The service could not be reached or answered abnormally.
    Unavailable(String),
}

/// A remote dependency answering reads by numeric id.
#[async_trait]
pub trait RemoteDataClient: Send + Sync {
    async fn fetch(&self, id: u64) -> FetchOutcome;
}

/// HTTP client for a remote record service.
///
/// Issues `GET {base_url}/{resource}/{id}` with an enforced timeout and maps
/// the response: 200 → `Found`, 404 → `NotFound`, anything else (including
/// timeouts and connection failures) → `Unavailable`. Retry policy, if any,
/// belongs here and not in the orchestrator.
pub struct HttpRemoteDataClient {
    http: reqwest::Client,
    base_url: String,
    resource: String,
}

impl HttpRemoteDataClient {
    pub fn new(
        base_url: impl Into<String>,
        resource: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            resource: resource.into(),
        })
    }
}

#[async_trait]
impl RemoteDataClient for HttpRemoteDataClient {
    async fn fetch(&self, id: u64) -> FetchOutcome {
        let url = format!("{}/{}/{}", self.base_url, self.resource, id);

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() => {
                tracing::warn!(url, "timeout reaching remote service");
                return FetchOutcome::Unavailable(format!(
                    "timeout al conectar con el servicio de {}",
                    self.resource
                ));
            }
            Err(err) => {
                tracing::warn!(url, error = %err, "failed to reach remote service");
                return FetchOutcome::Unavailable(format!(
                    "no se pudo conectar con el servicio de {}: {err}",
                    self.resource
                ));
            }
        };

        match response.status() {
            StatusCode::OK => match response.json::<Value>().await {
                Ok(payload) => FetchOutcome::Found(payload),
                Err(err) => FetchOutcome::Unavailable(format!("respuesta inválida: {err}")),
            },
            StatusCode::NOT_FOUND => FetchOutcome::NotFound,
            status => FetchOutcome::Unavailable(format!("HTTP {status}")),
        }
    }
}

#[derive(Debug, Default)]
struct RemoteState {
    records: HashMap<u64, Value>,
    unavailable_reason: Option<String>,
    fetch_count: u32,
}

/// In-memory remote service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRemoteService {
    state: Arc<RwLock<RemoteState>>,
}

impl InMemoryRemoteService {
    /// Creates an empty in-memory service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a record the service will answer with.
    pub fn insert(&self, id: u64, payload: Value) {
        self.state.write().unwrap().records.insert(id, payload);
    }

    /// Makes every subsequent fetch answer `Unavailable(reason)`.
    pub fn set_unavailable(&self, reason: &str) {
        self.state.write().unwrap().unavailable_reason = Some(reason.to_string());
    }

    /// Restores normal behavior after `set_unavailable`.
    pub fn set_available(&self) {
        self.state.write().unwrap().unavailable_reason = None;
    }

    /// Returns how many fetches were issued.
    pub fn fetch_count(&self) -> u32 {
        self.state.read().unwrap().fetch_count
    }
}

#[async_trait]
impl RemoteDataClient for InMemoryRemoteService {
    async fn fetch(&self, id: u64) -> FetchOutcome {
        let mut state = self.state.write().unwrap();
        state.fetch_count += 1;

        if let Some(reason) = &state.unavailable_reason {
            return FetchOutcome::Unavailable(reason.clone());
        }
        match state.records.get(&id) {
            Some(payload) => FetchOutcome::Found(payload.clone()),
            None => FetchOutcome::NotFound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_in_memory_service_answers_registered_records() {
        let service = InMemoryRemoteService::new();
        service.insert(1, json!({"nombre": "MARIANO", "apellido": "SOSA"}));

        assert_eq!(
            service.fetch(1).await,
            FetchOutcome::Found(json!({"nombre": "MARIANO", "apellido": "SOSA"}))
        );
        assert_eq!(service.fetch(99).await, FetchOutcome::NotFound);
        assert_eq!(service.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_in_memory_service_simulates_outage() {
        let service = InMemoryRemoteService::new();
        service.insert(1, json!({}));
        service.set_unavailable("timeout");

        assert_eq!(
            service.fetch(1).await,
            FetchOutcome::Unavailable("timeout".to_string())
        );

        service.set_available();
        assert_eq!(service.fetch(1).await, FetchOutcome::Found(json!({})));
    }
}
