//! Document generation and saga inspection endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderName, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::TransactionId;
use kv_store::KvBackend;
use saga::{
    DocumentFormat, DocumentRenderer, FailureKind, OrchestrationResult, RemoteDataClient,
    RenderError, SagaOrchestrator, SagaTransaction,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<B, A, E, R>
where
    B: KvBackend + Clone,
    A: RemoteDataClient,
    E: RemoteDataClient,
    R: DocumentRenderer,
{
    pub orchestrator: SagaOrchestrator<B, A, E, R>,
    pub backend: B,
}

// -- Request types --

#[derive(Deserialize)]
pub struct GenerateDocumentRequest {
    pub alumno_id: u64,
    pub especialidad_id: u64,
    #[serde(default = "default_tipo_documento")]
    pub tipo_documento: String,
    #[serde(default = "default_formato")]
    pub formato: String,
}

fn default_tipo_documento() -> String {
    "CERTIFICADO_REGULAR".to_string()
}

fn default_formato() -> String {
    "pdf".to_string()
}

// -- Response types --

#[derive(Serialize)]
pub struct FailureResponse {
    pub transaction_id: String,
    pub kind: FailureKind,
    pub error: String,
    pub state: String,
}

#[derive(Serialize)]
pub struct ActiveTransactionsResponse {
    pub active: Vec<String>,
}

// -- Handlers --

/// POST /documentacion/certificados — run a document-generation saga.
///
/// On success answers with the rendered bytes, the format's MIME type and
/// an `X-Transaction-Id` header. A business failure answers with a JSON
/// body carrying the transaction id, the error and the final saga state.
#[tracing::instrument(skip(state, req))]
pub async fn generar<B, A, E, R>(
    State(state): State<Arc<AppState<B, A, E, R>>>,
    Json(req): Json<GenerateDocumentRequest>,
) -> Result<Response, ApiError>
where
    B: KvBackend + Clone + 'static,
    A: RemoteDataClient + 'static,
    E: RemoteDataClient + 'static,
    R: DocumentRenderer + 'static,
{
    if req.alumno_id == 0 {
        return Err(ApiError::BadRequest(
            "el id de alumno debe ser un número positivo".to_string(),
        ));
    }
    if req.especialidad_id == 0 {
        return Err(ApiError::BadRequest(
            "el id de especialidad debe ser un número positivo".to_string(),
        ));
    }
    let formato: DocumentFormat = req
        .formato
        .parse()
        .map_err(|err: RenderError| ApiError::BadRequest(err.to_string()))?;

    let result = state
        .orchestrator
        .run(
            req.alumno_id,
            req.especialidad_id,
            &req.tipo_documento,
            formato.as_str(),
        )
        .await?;

    match result {
        OrchestrationResult::Success {
            transaction_id,
            document,
            metadata,
        } => {
            let mut response = (StatusCode::OK, document).into_response();
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(metadata.formato.mime_type()),
            );
            let id_value = HeaderValue::from_str(&transaction_id.to_string())
                .map_err(|err| ApiError::Internal(err.to_string()))?;
            response
                .headers_mut()
                .insert(HeaderName::from_static("x-transaction-id"), id_value);
            Ok(response)
        }
        OrchestrationResult::Failure {
            transaction_id,
            kind,
            error,
            state,
        } => {
            let body = FailureResponse {
                transaction_id: transaction_id.to_string(),
                kind,
                error,
                state: state.to_string(),
            };
            Ok((failure_status(kind), Json(body)).into_response())
        }
    }
}

/// GET /documentacion/transacciones/:id — persisted saga record.
#[tracing::instrument(skip(state))]
pub async fn estado<B, A, E, R>(
    State(state): State<Arc<AppState<B, A, E, R>>>,
    Path(id): Path<String>,
) -> Result<Json<SagaTransaction>, ApiError>
where
    B: KvBackend + Clone + 'static,
    A: RemoteDataClient + 'static,
    E: RemoteDataClient + 'static,
    R: DocumentRenderer + 'static,
{
    let transaction_id: TransactionId = id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("id de transacción inválido: {id}")))?;
    let saga = state.orchestrator.status(transaction_id).await?;
    Ok(Json(saga))
}

/// GET /documentacion/transacciones — ids of active (non-terminal) sagas.
#[tracing::instrument(skip(state))]
pub async fn listar<B, A, E, R>(
    State(state): State<Arc<AppState<B, A, E, R>>>,
) -> Result<Json<ActiveTransactionsResponse>, ApiError>
where
    B: KvBackend + Clone + 'static,
    A: RemoteDataClient + 'static,
    E: RemoteDataClient + 'static,
    R: DocumentRenderer + 'static,
{
    let ids = state.orchestrator.active().await?;
    Ok(Json(ActiveTransactionsResponse {
        active: ids.iter().map(ToString::to_string).collect(),
    }))
}

fn failure_status(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::NotFound => StatusCode::NOT_FOUND,
        FailureKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        FailureKind::Rendering | FailureKind::Precondition => StatusCode::UNPROCESSABLE_ENTITY,
    }
}
