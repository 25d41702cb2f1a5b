//! Service Layer Error Types
//!
//! Errors surfaced by the browsing controller and the hydration bridge.

use crate::client::ApiError;
use crate::models::ValidationError;
use thiserror::Error;

/// Browsing operation errors
#[derive(Error, Debug)]
pub enum BrowseError {
    /// Requested page lies outside the current result set
    #[error("Page {page} is outside the available range 1..={total_pages}")]
    PageOutOfRange { page: u32, total_pages: u32 },

    /// The current filter has not produced a page count yet
    #[error("Page count unknown until the current results have loaded")]
    PageCountUnknown,

    /// Remote call failed
    #[error("Notes service call failed: {0}")]
    Api(#[from] ApiError),

    /// Note payload rejected before sending
    #[error("Note validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl BrowseError {
    pub fn page_out_of_range(page: u32, total_pages: u32) -> Self {
        Self::PageOutOfRange { page, total_pages }
    }
}

/// Hydration transport errors
#[derive(Error, Debug)]
pub enum HydrationError {
    #[error("Failed to encode or decode dehydrated state: {0}")]
    Serialization(#[from] serde_json::Error),
}
