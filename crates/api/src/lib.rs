//! HTTP API server with observability for the document-generation system.
//!
//! Provides REST endpoints for certificate generation and saga inspection,
//! with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use kv_store::{InMemoryKvBackend, KvBackend};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{
    DocumentRenderer, InMemoryRemoteService, InMemoryRenderer, RemoteDataClient, SagaOrchestrator,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::documentos::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<B, A, E, R>(
    state: Arc<AppState<B, A, E, R>>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    B: KvBackend + Clone + 'static,
    A: RemoteDataClient + 'static,
    E: RemoteDataClient + 'static,
    R: DocumentRenderer + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<B, A, E, R>))
        .route(
            "/documentacion/certificados",
            post(routes::documentos::generar::<B, A, E, R>),
        )
        .route(
            "/documentacion/transacciones",
            get(routes::documentos::listar::<B, A, E, R>),
        )
        .route(
            "/documentacion/transacciones/{id}",
            get(routes::documentos::estado::<B, A, E, R>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Application state wired entirely with in-memory collaborators, for tests
/// and local development.
pub type InMemoryAppState =
    AppState<InMemoryKvBackend, InMemoryRemoteService, InMemoryRemoteService, InMemoryRenderer>;

/// Builds in-memory application state from the given collaborators.
pub fn create_in_memory_state(
    backend: InMemoryKvBackend,
    alumnos: InMemoryRemoteService,
    especialidades: InMemoryRemoteService,
    renderer: InMemoryRenderer,
) -> Arc<InMemoryAppState> {
    let orchestrator = SagaOrchestrator::new(backend.clone(), alumnos, especialidades, renderer);
    Arc::new(AppState {
        orchestrator,
        backend,
    })
}
