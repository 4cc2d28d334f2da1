//! Notification events published when a saga reaches a terminal state.

use chrono::{DateTime, Utc};
use common::TransactionId;
use serde::{Deserialize, Serialize};

use crate::transaction::SagaTransaction;

/// Channel carrying success events.
pub const CHANNEL_DOCUMENTO_GENERADO: &str = "documentacion:documento_generado";

/// Channel carrying failure events.
pub const CHANNEL_DOCUMENTO_FALLIDO: &str = "documentacion:documento_fallido";

/// Event type tag for a successful generation.
pub const EVENT_DOCUMENTO_GENERADO: &str = "documento_generado";

/// Event type tag for a failed generation.
pub const EVENT_DOCUMENTO_FALLIDO: &str = "documento_fallido";

/// Structured message published on the success/failure channels.
///
/// `formato` is present on success events, `error` on failure events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEvent {
    pub event_type: String,
    pub transaction_id: TransactionId,
    pub alumno_id: u64,
    pub especialidad_id: u64,
    pub tipo_documento: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formato: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl DocumentEvent {
    /// Builds the success event for a completed saga.
    pub fn generated(saga: &SagaTransaction) -> Self {
        Self {
            event_type: EVENT_DOCUMENTO_GENERADO.to_string(),
            transaction_id: saga.transaction_id(),
            alumno_id: saga.alumno_id(),
            especialidad_id: saga.especialidad_id(),
            tipo_documento: saga.tipo_documento().to_string(),
            formato: saga.formato().map(str::to_string),
            error: None,
            timestamp: saga.updated_at(),
        }
    }

    /// Builds the failure event for a compensated or failed saga.
    pub fn failed(saga: &SagaTransaction, error: impl Into<String>) -> Self {
        Self {
            event_type: EVENT_DOCUMENTO_FALLIDO.to_string(),
            transaction_id: saga.transaction_id(),
            alumno_id: saga.alumno_id(),
            especialidad_id: saga.especialidad_id(),
            tipo_documento: saga.tipo_documento().to_string(),
            formato: None,
            error: Some(error.into()),
            timestamp: saga.updated_at(),
        }
    }
}
