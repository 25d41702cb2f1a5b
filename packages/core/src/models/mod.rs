//! Data Models
//!
//! This module contains the data structures shared by every NoteHub component:
//!
//! - `Note`, `NoteTag`, `NewNote` - records exchanged with the remote service
//! - `ViewParams`, `CacheKey`, `ListResult` - the browsing state and its cache identity
//! - `PaginationControls` - the page selector contract for the presentation layer

mod note;
mod pagination;
mod view;

pub use note::{
    NewNote, Note, NoteTag, ValidationError, CONTENT_MAX_CHARS, TITLE_MAX_CHARS, TITLE_MIN_CHARS,
};
pub use pagination::PaginationControls;
pub use view::{CacheKey, ListResult, ViewParams};
