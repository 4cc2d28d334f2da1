//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use api::routes::documentos::AppState;
use kv_store::{InMemoryKvBackend, KvBackend, RedisKvBackend};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{HttpRemoteDataClient, InMemoryRenderer, SagaOrchestrator};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

async fn serve<B>(backend: B, config: Config, metrics_handle: PrometheusHandle)
where
    B: KvBackend + Clone + 'static,
{
    let alumnos = HttpRemoteDataClient::new(
        &config.alumno_service_url,
        "alumnos",
        config.request_timeout,
    )
    .expect("failed to build student service client");
    let especialidades = HttpRemoteDataClient::new(
        &config.especialidad_service_url,
        "especialidades",
        config.request_timeout,
    )
    .expect("failed to build specialty service client");

    // Concrete rendering engines plug in here; the in-memory renderer
    // stands in until one is configured.
    let renderer = InMemoryRenderer::new();

    let orchestrator = SagaOrchestrator::new(backend.clone(), alumnos, especialidades, renderer)
        .with_record_ttl(config.saga_ttl);
    let state = Arc::new(AppState {
        orchestrator,
        backend,
    });

    let app = api::create_app(state, metrics_handle);

    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}

#[tokio::main]
async fn main() {
    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Pick the key-value backend and start serving
    let config = Config::from_env();
    match &config.redis_url {
        Some(url) => {
            let backend = RedisKvBackend::connect(url)
                .await
                .expect("failed to connect to redis");
            serve(backend, config, metrics_handle).await;
        }
        None => {
            tracing::warn!("REDIS_URL not set, using in-memory store");
            serve(InMemoryKvBackend::new(), config, metrics_handle).await;
        }
    }
}
