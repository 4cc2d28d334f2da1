//! Saga orchestration for academic document generation.
//!
//! This crate implements the Saga pattern for the certificate workflow:
//!
//! 1. Fetch the student record (`obtener_alumno`)
//! 2. Fetch the specialty record (`obtener_especialidad`)
//! 3. Render the document (`generar_documento`)
//!
//! Steps run strictly in order; on failure, completed steps are compensated
//! in reverse order (LIFO) and a failure event is published. Transaction
//! state is persisted after every transition through a key-value backend
//! with per-record expiry.

pub mod document_generation;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod publisher;
pub mod services;
pub mod state;
pub mod store;
pub mod transaction;

pub use error::{FailureKind, SagaError, StepError};
pub use events::{CHANNEL_DOCUMENTO_FALLIDO, CHANNEL_DOCUMENTO_GENERADO, DocumentEvent};
pub use orchestrator::{
    DEFAULT_RECORD_TTL, DocumentMetadata, OrchestrationResult, SagaOrchestrator,
};
pub use publisher::EventPublisher;
pub use services::remote::{
    FetchOutcome, HttpRemoteDataClient, InMemoryRemoteService, RemoteDataClient,
};
pub use services::renderer::{
    DocumentFormat, DocumentRenderer, InMemoryRenderer, RenderContext, RenderError,
};
pub use state::SagaState;
pub use store::SagaStore;
pub use transaction::SagaTransaction;
