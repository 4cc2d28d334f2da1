//! The saga coordinator.

use std::time::{Duration, Instant};

use common::TransactionId;
use kv_store::KvBackend;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::document_generation::{
    STEP_GENERAR_DOCUMENTO, STEP_OBTENER_ALUMNO, STEP_OBTENER_ESPECIALIDAD, alumno_cache_key,
    documento_temp_key, especialidad_cache_key, template_name,
};
use crate::error::{FailureKind, Result, SagaError, StepError};
use crate::events::{CHANNEL_DOCUMENTO_FALLIDO, CHANNEL_DOCUMENTO_GENERADO, DocumentEvent};
use crate::publisher::EventPublisher;
use crate::services::remote::{FetchOutcome, RemoteDataClient};
use crate::services::renderer::{DocumentFormat, DocumentRenderer, RenderContext, RenderError};
use crate::state::SagaState;
use crate::store::SagaStore;
use crate::transaction::SagaTransaction;

/// Default retention of persisted saga records (two hours).
pub const DEFAULT_RECORD_TTL: Duration = Duration::from_secs(7200);

/// Context metadata returned alongside a successfully rendered document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentMetadata {
    pub alumno: Value,
    pub especialidad: Value,
    pub tipo_documento: String,
    pub formato: DocumentFormat,
}

/// Terminal outcome of one orchestration.
///
/// Business failures never surface as `Err` from [`SagaOrchestrator::run`];
/// they become a `Failure` carrying the transaction id for traceability,
/// the recorded error message and the final saga state.
#[derive(Debug)]
pub enum OrchestrationResult {
    Success {
        transaction_id: TransactionId,
        document: Vec<u8>,
        metadata: DocumentMetadata,
    },
    Failure {
        transaction_id: TransactionId,
        kind: FailureKind,
        error: String,
        state: SagaState,
    },
}

impl OrchestrationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, OrchestrationResult::Success { .. })
    }

    pub fn transaction_id(&self) -> TransactionId {
        match self {
            OrchestrationResult::Success { transaction_id, .. }
            | OrchestrationResult::Failure { transaction_id, .. } => *transaction_id,
        }
    }
}

/// Orchestrates document-generation sagas.
///
/// Drives a 3-step saga (student fetch → specialty fetch → rendering) with
/// compensating actions on failure. State is persisted after every
/// transition so the record always reflects how far the saga got. All
/// collaborators are injected, so tests run against in-memory fakes.
pub struct SagaOrchestrator<B, A, E, R>
where
    B: KvBackend + Clone,
    A: RemoteDataClient,
    E: RemoteDataClient,
    R: DocumentRenderer,
{
    store: SagaStore<B>,
    publisher: EventPublisher<B>,
    cache: B,
    alumnos: A,
    especialidades: E,
    renderer: R,
    record_ttl: Duration,
}

impl<B, A, E, R> SagaOrchestrator<B, A, E, R>
where
    B: KvBackend + Clone,
    A: RemoteDataClient,
    E: RemoteDataClient,
    R: DocumentRenderer,
{
    /// Creates a new orchestrator over a shared key-value backend.
    pub fn new(backend: B, alumnos: A, especialidades: E, renderer: R) -> Self {
        Self {
            store: SagaStore::new(backend.clone()),
            publisher: EventPublisher::new(backend.clone()),
            cache: backend,
            alumnos,
            especialidades,
            renderer,
            record_ttl: DEFAULT_RECORD_TTL,
        }
    }

    /// Overrides the retention of persisted records.
    pub fn with_record_ttl(mut self, ttl: Duration) -> Self {
        self.record_ttl = ttl;
        self
    }

    /// Creates and executes a saga in one call.
    pub async fn run(
        &self,
        alumno_id: u64,
        especialidad_id: u64,
        tipo_documento: &str,
        formato: &str,
    ) -> Result<OrchestrationResult> {
        let transaction_id = self
            .begin(alumno_id, especialidad_id, tipo_documento, formato)
            .await?;
        self.execute(transaction_id).await
    }

    /// Creates a PENDING transaction and persists it with a bounded TTL.
    #[tracing::instrument(skip(self))]
    pub async fn begin(
        &self,
        alumno_id: u64,
        especialidad_id: u64,
        tipo_documento: &str,
        formato: &str,
    ) -> Result<TransactionId> {
        let mut metadata = Map::new();
        metadata.insert("formato".to_string(), Value::from(formato));
        metadata.insert("origen".to_string(), Value::from("api_rest"));

        let saga = SagaTransaction::new(alumno_id, especialidad_id, tipo_documento, metadata);
        self.store.save(&saga, self.record_ttl).await?;

        metrics::counter!("saga_executions_total").increment(1);
        tracing::info!(
            transaction_id = %saga.transaction_id(),
            alumno_id,
            especialidad_id,
            tipo_documento,
            "saga iniciada"
        );
        Ok(saga.transaction_id())
    }

    /// Drives a persisted PENDING transaction to a terminal state.
    #[tracing::instrument(skip(self), fields(%transaction_id))]
    pub async fn execute(&self, transaction_id: TransactionId) -> Result<OrchestrationResult> {
        let start = Instant::now();

        let mut saga = self
            .store
            .get(transaction_id)
            .await?
            .ok_or(SagaError::TransactionNotFound(transaction_id))?;

        if saga.state() != SagaState::Pending {
            return Err(SagaError::InvalidState {
                transaction_id,
                state: saga.state(),
            });
        }

        // A record without a requested format cannot start step 1; nothing
        // has executed yet, so FAILED applies and compensation is skipped.
        let Some(formato) = saga.formato().map(str::to_string) else {
            let message = "la transacción no registra formato de salida";
            saga.update_state(SagaState::Failed, Some(message));
            self.store.update(&saga).await?;
            self.publisher
                .publish(CHANNEL_DOCUMENTO_FALLIDO, &DocumentEvent::failed(&saga, message))
                .await;
            tracing::warn!(%transaction_id, "saga failed before any step executed");
            return Ok(OrchestrationResult::Failure {
                transaction_id,
                kind: FailureKind::Precondition,
                error: message.to_string(),
                state: saga.state(),
            });
        };

        saga.update_state(SagaState::InProgress, None);
        self.store.update(&saga).await?;

        // Paso 1: obtener alumno.
        tracing::info!(step = STEP_OBTENER_ALUMNO, "saga step started");
        let alumno = match self.alumnos.fetch(saga.alumno_id()).await {
            FetchOutcome::Found(payload) => payload,
            FetchOutcome::NotFound => {
                let error = StepError::NotFound {
                    resource: "alumno",
                    id: saga.alumno_id(),
                };
                return self.compensate_and_report(&mut saga, error, start).await;
            }
            FetchOutcome::Unavailable(reason) => {
                let error = StepError::Unavailable {
                    service: "alumnos",
                    reason,
                };
                return self.compensate_and_report(&mut saga, error, start).await;
            }
        };
        saga.add_completed_step(STEP_OBTENER_ALUMNO);
        self.store.update(&saga).await?;

        // Paso 2: obtener especialidad.
        tracing::info!(step = STEP_OBTENER_ESPECIALIDAD, "saga step started");
        let especialidad = match self.especialidades.fetch(saga.especialidad_id()).await {
            FetchOutcome::Found(payload) => payload,
            FetchOutcome::NotFound => {
                let error = StepError::NotFound {
                    resource: "especialidad",
                    id: saga.especialidad_id(),
                };
                return self.compensate_and_report(&mut saga, error, start).await;
            }
            FetchOutcome::Unavailable(reason) => {
                let error = StepError::Unavailable {
                    service: "especialidades",
                    reason,
                };
                return self.compensate_and_report(&mut saga, error, start).await;
            }
        };
        saga.add_completed_step(STEP_OBTENER_ESPECIALIDAD);
        self.store.update(&saga).await?;

        // Paso 3: generar documento.
        tracing::info!(step = STEP_GENERAR_DOCUMENTO, "saga step started");
        let (format, document) = match self
            .render_document(&saga, &formato, &alumno, &especialidad)
            .await
        {
            Ok(rendered) => rendered,
            Err(error) => {
                return self
                    .compensate_and_report(&mut saga, StepError::Rendering(error), start)
                    .await;
            }
        };
        saga.add_completed_step(STEP_GENERAR_DOCUMENTO);

        // The very next write is the terminal transition, so the last step
        // needs no intermediate persistence of its own.
        saga.update_state(SagaState::Completed, None);
        self.store.update(&saga).await?;

        self.publisher
            .publish(CHANNEL_DOCUMENTO_GENERADO, &DocumentEvent::generated(&saga))
            .await;

        metrics::histogram!("saga_duration_seconds").record(start.elapsed().as_secs_f64());
        metrics::counter!("saga_completed").increment(1);
        tracing::info!(%transaction_id, "saga completada");

        Ok(OrchestrationResult::Success {
            transaction_id,
            document,
            metadata: DocumentMetadata {
                alumno,
                especialidad,
                tipo_documento: saga.tipo_documento().to_string(),
                formato: format,
            },
        })
    }

    /// Reads the persisted record of a transaction.
    pub async fn status(&self, transaction_id: TransactionId) -> Result<SagaTransaction> {
        self.store
            .get(transaction_id)
            .await?
            .ok_or(SagaError::TransactionNotFound(transaction_id))
    }

    /// Lists ids of sagas that have not reached a terminal state.
    pub async fn active(&self) -> Result<Vec<TransactionId>> {
        self.store
            .list(&[
                SagaState::Pending,
                SagaState::InProgress,
                SagaState::Compensating,
            ])
            .await
    }

    async fn render_document(
        &self,
        saga: &SagaTransaction,
        formato: &str,
        alumno: &Value,
        especialidad: &Value,
    ) -> std::result::Result<(DocumentFormat, Vec<u8>), RenderError> {
        let format: DocumentFormat = formato.parse()?;
        let template = template_name(saga.tipo_documento());
        let context = RenderContext {
            alumno: alumno.clone(),
            especialidad: especialidad.clone(),
            tipo_documento: saga.tipo_documento().to_string(),
            transaction_id: saga.transaction_id(),
        };
        let document = self.renderer.render(format, &template, &context).await?;
        Ok((format, document))
    }

    /// Drives a failed saga through COMPENSATING → COMPENSATED, publishes
    /// the failure event and builds the failure result.
    async fn compensate_and_report(
        &self,
        saga: &mut SagaTransaction,
        error: StepError,
        start: Instant,
    ) -> Result<OrchestrationResult> {
        let kind = error.kind();
        let message = error.to_string();
        tracing::warn!(
            transaction_id = %saga.transaction_id(),
            error = %message,
            "saga step failed, compensating"
        );

        saga.update_state(SagaState::Compensating, Some(&message));
        self.store.update(saga).await?;

        self.run_compensations(saga).await;

        saga.update_state(SagaState::Compensated, None);
        self.store.update(saga).await?;

        self.publisher
            .publish(CHANNEL_DOCUMENTO_FALLIDO, &DocumentEvent::failed(saga, &message))
            .await;

        metrics::histogram!("saga_duration_seconds").record(start.elapsed().as_secs_f64());
        metrics::counter!("saga_compensated").increment(1);

        Ok(OrchestrationResult::Failure {
            transaction_id: saga.transaction_id(),
            kind,
            error: message,
            state: saga.state(),
        })
    }

    /// Undoes completed steps most-recent-first. Every action is an
    /// idempotent cache/artifact invalidation: deleting a key that never
    /// existed is a no-op, and a delete failure is logged without stopping
    /// the chain.
    async fn run_compensations(&self, saga: &mut SagaTransaction) {
        while let Some(step) = saga.next_compensation() {
            tracing::info!(
                transaction_id = %saga.transaction_id(),
                step,
                "compensating step"
            );
            let key = match step.as_str() {
                STEP_OBTENER_ALUMNO => alumno_cache_key(saga.alumno_id()),
                STEP_OBTENER_ESPECIALIDAD => especialidad_cache_key(saga.especialidad_id()),
                STEP_GENERAR_DOCUMENTO => documento_temp_key(&saga.transaction_id()),
                unknown => {
                    tracing::warn!(step = unknown, "no compensation registered for step");
                    continue;
                }
            };
            if let Err(err) = self.cache.delete(&key).await {
                tracing::warn!(key, error = %err, "compensation delete failed");
            }
        }
    }
}
