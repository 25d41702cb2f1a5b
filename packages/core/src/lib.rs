//! NoteHub Core Query-State Layer
//!
//! This crate turns raw user input (search text, tag selection, page clicks)
//! into a coherent, cached, race-free stream of note list results backed by
//! the remote NoteHub service.
//!
//! # Architecture
//!
//! - **Explicit cache**: one finite-state entry per query key with
//!   stale-while-revalidate and at most one in-flight load per key
//! - **Single owner of view state**: the browsing controller owns the current
//!   params and reads results back from the cache, never storing them itself
//! - **Debounced search**: a disposable trailing-edge debouncer in front of
//!   the search term
//! - **SSR handoff**: the server prefetch and the client share one cache-key
//!   function, so a hydrated first view costs no request
//!
//! # Modules
//!
//! - [`models`] - Notes, view params, cache keys, pagination contract
//! - [`client`] - Request Executor (`NotesApi`, `HttpNotesClient`)
//! - [`services`] - Query cache, debouncer, browsing controller, hydration bridge
//! - [`config`] - Deployment configuration

pub mod client;
pub mod config;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use client::{ApiError, ClientConfig, HttpNotesClient, NotesApi};
pub use config::NotehubConfig;
pub use models::*;
pub use services::*;
