//! Request Executor
//!
//! Performs parameterized calls against the remote notes service and
//! normalizes the responses. The executor holds no browsing state; the
//! `NotesApi` trait is the seam the cache, the controller and the hydration
//! bridge depend on, so tests and local tools can substitute their own
//! implementation.
//!
//! - [`HttpNotesClient`] - the production implementation over HTTP
//! - [`ClientConfig`] - base endpoint, credential and auth-failure callback
//! - [`ApiError`] - failure taxonomy (network, auth, not found, decode)

pub mod error;
pub mod http;

pub use error::ApiError;
pub use http::{AuthFailureHook, ClientConfig, HttpNotesClient};

use crate::models::{ListResult, NewNote, Note, ViewParams};
use async_trait::async_trait;

/// Operations the core consumes from the remote notes service
#[async_trait]
pub trait NotesApi: Send + Sync {
    /// Fetch one page of notes matching the search text and tag in `params`
    async fn list_notes(&self, params: &ViewParams) -> Result<ListResult, ApiError>;

    /// Create a note, returning the stored record
    async fn create_note(&self, note: &NewNote) -> Result<Note, ApiError>;

    /// Delete a note by ID, returning the removed record
    async fn delete_note(&self, id: &str) -> Result<Note, ApiError>;

    /// Fetch a single note by ID
    async fn fetch_note(&self, id: &str) -> Result<Note, ApiError>;
}
