//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use kv_store::KvBackend;
use saga::{DocumentRenderer, RemoteDataClient};
use serde::Serialize;

use crate::routes::documentos::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
}

/// GET /health — liveness plus a store reachability probe.
pub async fn check<B, A, E, R>(
    State(state): State<Arc<AppState<B, A, E, R>>>,
) -> Json<HealthResponse>
where
    B: KvBackend + Clone + 'static,
    A: RemoteDataClient + 'static,
    E: RemoteDataClient + 'static,
    R: DocumentRenderer + 'static,
{
    let store = match state.backend.get("health:probe").await {
        Ok(_) => "ok",
        Err(_) => "unreachable",
    };
    Json(HealthResponse {
        status: "ok",
        store,
    })
}
