//! The saga transaction record.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use common::TransactionId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::state::SagaState;

/// One in-flight or completed document-generation orchestration.
///
/// The record tracks which forward steps completed and mirrors them into a
/// LIFO compensation queue: completing step X pushes X to the front, and
/// compensation pops from the front, so steps are always undone
/// most-recent-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SagaTransaction {
    transaction_id: TransactionId,
    alumno_id: u64,
    especialidad_id: u64,
    tipo_documento: String,
    state: SagaState,
    metadata: Map<String, Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    steps_completed: Vec<String>,
    steps_to_compensate: VecDeque<String>,
    error_message: Option<String>,
}

impl SagaTransaction {
    /// Creates a new PENDING transaction with a fresh id.
    pub fn new(
        alumno_id: u64,
        especialidad_id: u64,
        tipo_documento: impl Into<String>,
        metadata: Map<String, Value>,
    ) -> Self {
        let now = Utc::now();
        Self {
            transaction_id: TransactionId::new(),
            alumno_id,
            especialidad_id,
            tipo_documento: tipo_documento.into(),
            state: SagaState::Pending,
            metadata,
            created_at: now,
            updated_at: now,
            steps_completed: Vec::new(),
            steps_to_compensate: VecDeque::new(),
            error_message: None,
        }
    }

    /// Sets the state and refreshes `updated_at`. A supplied error message
    /// is recorded; an empty one never overwrites a previous message.
    pub fn update_state(&mut self, new_state: SagaState, error_message: Option<&str>) {
        self.state = new_state;
        self.updated_at = Utc::now();
        if let Some(message) = error_message {
            if !message.is_empty() {
                self.error_message = Some(message.to_string());
            }
        }
    }

    /// Records a completed step and queues its compensation (LIFO).
    /// Idempotent: a step already recorded is not added again.
    pub fn add_completed_step(&mut self, step_name: &str) {
        if self.steps_completed.iter().any(|s| s == step_name) {
            return;
        }
        self.steps_completed.push(step_name.to_string());
        self.steps_to_compensate.push_front(step_name.to_string());
        self.updated_at = Utc::now();
    }

    /// Removes and returns the next step to compensate, or `None` when the
    /// queue is exhausted. Calling on an empty queue does not mutate.
    pub fn next_compensation(&mut self) -> Option<String> {
        let step = self.steps_to_compensate.pop_front()?;
        self.updated_at = Utc::now();
        Some(step)
    }

    /// The requested output format, read from `metadata`.
    pub fn formato(&self) -> Option<&str> {
        self.metadata.get("formato").and_then(Value::as_str)
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    pub fn alumno_id(&self) -> u64 {
        self.alumno_id
    }

    pub fn especialidad_id(&self) -> u64 {
        self.especialidad_id
    }

    pub fn tipo_documento(&self) -> &str {
        &self.tipo_documento
    }

    pub fn state(&self) -> SagaState {
        self.state
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn steps_completed(&self) -> &[String] {
        &self.steps_completed
    }

    pub fn steps_to_compensate(&self) -> &VecDeque<String> {
        &self.steps_to_compensate
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}
