//! Saga error taxonomy.
//!
//! Two layers: [`StepError`] covers business failures inside a step (they
//! drive compensation and are converted into a failure result, never
//! surfaced as `Err` from `run`), while [`SagaError`] covers failures of the
//! orchestration's own bookkeeping, which are reported to the caller
//! directly.

use common::TransactionId;
use kv_store::StoreError;
use serde::Serialize;
use thiserror::Error;

use crate::services::renderer::RenderError;
use crate::state::SagaState;

/// Classification of a business failure, so callers can tell bad input
/// from a dependency outage without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A requested resource does not exist.
    NotFound,
    /// A remote dependency could not be reached.
    Unavailable,
    /// Document rendering failed.
    Rendering,
    /// The transaction record could not start executing at all.
    Precondition,
}

/// Business failure inside a saga step. Triggers compensation of whatever
/// already completed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StepError {
    /// The remote resource does not exist (404-class).
    #[error("{resource} {id} no encontrado")]
    NotFound { resource: &'static str, id: u64 },

    /// The remote dependency could not be reached (timeout/connection).
    #[error("servicio de {service} no disponible: {reason}")]
    Unavailable {
        service: &'static str,
        reason: String,
    },

    /// Document rendering failed (unsupported format, template failure).
    #[error("error al generar documento: {0}")]
    Rendering(#[from] RenderError),
}

impl StepError {
    /// Classifies this failure for reporting.
    pub fn kind(&self) -> FailureKind {
        match self {
            StepError::NotFound { .. } => FailureKind::NotFound,
            StepError::Unavailable { .. } => FailureKind::Unavailable,
            StepError::Rendering(_) => FailureKind::Rendering,
        }
    }
}

/// Orchestration-infrastructure failure surfaced to the caller.
#[derive(Debug, Error)]
pub enum SagaError {
    /// The store rejected a save/update; the attempt aborts because the
    /// orchestrator cannot proceed without a durable state trail.
    #[error("error de persistencia: {0}")]
    Persistence(#[from] StoreError),

    /// A saga record could not be (de)serialized.
    #[error("error de serialización: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No record exists for the given transaction id.
    #[error("transacción SAGA no encontrada: {0}")]
    TransactionNotFound(TransactionId),

    /// The record exists but is not in a state this operation accepts.
    #[error("la transacción {transaction_id} no puede ejecutarse desde el estado {state}")]
    InvalidState {
        transaction_id: TransactionId,
        state: SagaState,
    },
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
