//! External collaborator contracts and their implementations.

pub mod remote;
pub mod renderer;

pub use remote::{FetchOutcome, HttpRemoteDataClient, InMemoryRemoteService, RemoteDataClient};
pub use renderer::{
    DocumentFormat, DocumentRenderer, InMemoryRenderer, RenderContext, RenderError,
};
