//! Note Data Structures
//!
//! This module defines the `Note` record returned by the remote NoteHub service,
//! the closed set of `NoteTag` values, and the `NewNote` payload used when
//! creating notes.
//!
//! The browsing core treats notes as opaque: only `id` and `tag` are ever
//! interpreted (tag filtering). Everything else is carried through untouched
//! for the presentation layer.
//!
//! # Examples
//!
//! ```rust
//! use notehub_core::models::{NewNote, NoteTag};
//!
//! let draft = NewNote::new("Groceries", "Milk, eggs", NoteTag::Shopping);
//! assert!(draft.validate().is_ok());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Title length bounds enforced by the note form
pub const TITLE_MIN_CHARS: usize = 3;
pub const TITLE_MAX_CHARS: usize = 50;

/// Maximum content length enforced by the note form
pub const CONTENT_MAX_CHARS: usize = 500;

/// Validation errors for note creation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Title must be between {min} and {max} characters, got {actual}")]
    TitleLength {
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("Content must be at most {max} characters, got {actual}")]
    ContentTooLong { max: usize, actual: usize },

    #[error("Unknown tag: {0}")]
    UnknownTag(String),
}

/// Tag attached to every note
///
/// The remote service accepts exactly these five values. The pseudo-tag
/// "All" used by route segments is not a tag; it parses to "no filter"
/// via [`NoteTag::parse_filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteTag {
    Todo,
    Work,
    Personal,
    Meeting,
    Shopping,
}

impl NoteTag {
    /// All tags in display order
    pub const ALL: [NoteTag; 5] = [
        NoteTag::Todo,
        NoteTag::Work,
        NoteTag::Personal,
        NoteTag::Meeting,
        NoteTag::Shopping,
    ];

    /// Sentinel route segment meaning "no tag filter"
    pub const ALL_SEGMENT: &'static str = "All";

    pub fn as_str(&self) -> &'static str {
        match self {
            NoteTag::Todo => "Todo",
            NoteTag::Work => "Work",
            NoteTag::Personal => "Personal",
            NoteTag::Meeting => "Meeting",
            NoteTag::Shopping => "Shopping",
        }
    }

    /// Parse a tag filter as it arrives from a route segment or UI control.
    ///
    /// Empty input and `"All"` both mean "no filter" and normalize to `None`,
    /// so they can never produce distinct cache keys.
    pub fn parse_filter(raw: &str) -> Result<Option<NoteTag>, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(Self::ALL_SEGMENT) {
            return Ok(None);
        }
        trimmed.parse().map(Some)
    }
}

impl fmt::Display for NoteTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteTag {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoteTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownTag(s.to_string()))
    }
}

/// A note as stored by the remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Server-assigned identifier
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub content: String,

    pub tag: NoteTag,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub tag: NoteTag,
}

impl NewNote {
    pub fn new(title: impl Into<String>, content: impl Into<String>, tag: NoteTag) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            tag,
        }
    }

    /// Check the payload against the form rules before it is sent.
    ///
    /// Title is trimmed before measuring; content is measured as-is.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let title_len = self.title.trim().chars().count();
        if title_len == 0 {
            return Err(ValidationError::MissingField("title".to_string()));
        }
        if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&title_len) {
            return Err(ValidationError::TitleLength {
                min: TITLE_MIN_CHARS,
                max: TITLE_MAX_CHARS,
                actual: title_len,
            });
        }

        let content_len = self.content.chars().count();
        if content_len > CONTENT_MAX_CHARS {
            return Err(ValidationError::ContentTooLong {
                max: CONTENT_MAX_CHARS,
                actual: content_len,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_note_deserializes_wire_shape() {
        let json = json!({
            "id": "65f1c0",
            "title": "Standup",
            "content": "Discuss sprint",
            "tag": "Meeting",
            "createdAt": "2025-03-01T09:00:00Z",
            "updatedAt": "2025-03-01T09:30:00Z"
        });

        let note: Note = serde_json::from_value(json).unwrap();
        assert_eq!(note.id, "65f1c0");
        assert_eq!(note.tag, NoteTag::Meeting);
        assert!(note.updated_at > note.created_at);
    }

    #[test]
    fn test_note_content_defaults_to_empty() {
        let json = json!({
            "id": "1",
            "title": "Empty",
            "tag": "Todo",
            "createdAt": "2025-03-01T09:00:00Z",
            "updatedAt": "2025-03-01T09:00:00Z"
        });

        let note: Note = serde_json::from_value(json).unwrap();
        assert_eq!(note.content, "");
    }

    #[test]
    fn test_parse_filter_normalizes_all() {
        assert_eq!(NoteTag::parse_filter("All").unwrap(), None);
        assert_eq!(NoteTag::parse_filter("all").unwrap(), None);
        assert_eq!(NoteTag::parse_filter("  ").unwrap(), None);
        assert_eq!(NoteTag::parse_filter("Work").unwrap(), Some(NoteTag::Work));
        assert_eq!(
            NoteTag::parse_filter("Holiday"),
            Err(ValidationError::UnknownTag("Holiday".to_string()))
        );
    }

    #[test]
    fn test_new_note_validation() {
        assert!(NewNote::new("Buy milk", "", NoteTag::Shopping)
            .validate()
            .is_ok());

        assert_eq!(
            NewNote::new("   ", "x", NoteTag::Todo).validate(),
            Err(ValidationError::MissingField("title".to_string()))
        );

        assert!(matches!(
            NewNote::new("ab", "", NoteTag::Todo).validate(),
            Err(ValidationError::TitleLength { actual: 2, .. })
        ));

        let long_content = "x".repeat(CONTENT_MAX_CHARS + 1);
        assert!(matches!(
            NewNote::new("Long one", long_content, NoteTag::Work).validate(),
            Err(ValidationError::ContentTooLong { .. })
        ));
    }
}
