//! View parameters, cache keys, and list results
//!
//! `ViewParams` is the complete input that decides which page of which
//! filtered result set is on screen. It is an immutable value: every
//! committed change produces a new one through the `with_*` methods, and
//! those methods apply the page-reset rule (a new search or tag always lands
//! on page 1).
//!
//! `CacheKey` is the canonical serialization of a `ViewParams`. The server
//! prefetch and the client compute it with the same function, so the
//! hydrated entry is found byte-for-byte by the client.

use crate::models::{Note, NoteTag};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;

/// Namespace prefix shared by every list query key
const KEY_SCOPE: &str = "notes";

/// The full set of inputs that determine the displayed list page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewParams {
    /// Committed search text, always trimmed (may be empty)
    search: String,

    /// Tag filter; `None` means all tags
    tag: Option<NoteTag>,

    /// 1-based page number
    page: u32,

    /// Items per page, fixed for the session
    page_size: u32,
}

impl ViewParams {
    /// Create params, normalizing search (trimmed) and page/page size (at least 1)
    pub fn new(search: &str, tag: Option<NoteTag>, page: u32, page_size: u32) -> Self {
        Self {
            search: search.trim().to_string(),
            tag,
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// Params for the first view of a session: page 1, no search
    pub fn initial(page_size: u32, tag: Option<NoteTag>) -> Self {
        Self::new("", tag, 1, page_size)
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn tag(&self) -> Option<NoteTag> {
        self.tag
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// New params with a committed search term. Resets to page 1.
    pub fn with_search(&self, raw: &str) -> Self {
        Self::new(raw, self.tag, 1, self.page_size)
    }

    /// New params with a tag filter. Resets to page 1.
    pub fn with_tag(&self, tag: Option<NoteTag>) -> Self {
        Self::new(&self.search, tag, 1, self.page_size)
    }

    /// New params pointing at another page of the same result set
    pub fn with_page(&self, page: u32) -> Self {
        Self::new(&self.search, self.tag, page, self.page_size)
    }

    /// True when both params select the same result set (only the page may differ)
    pub fn same_filter(&self, other: &ViewParams) -> bool {
        self.search == other.search && self.tag == other.tag && self.page_size == other.page_size
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::for_params(self)
    }
}

/// Canonical, deterministic serialization of `ViewParams`
///
/// Encoded as a compact JSON array, e.g.
/// `["notes",{"page":1,"perPage":12,"search":"","tag":null}]`.
/// A missing tag is `null`, which no real tag string can collide with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_params(params: &ViewParams) -> Self {
        let encoded = json!([
            KEY_SCOPE,
            // Keys stay in sorted order, with or without `preserve_order`
            {
                "page": params.page,
                "perPage": params.page_size,
                "search": params.search,
                "tag": params.tag.map(|tag| tag.as_str()),
            }
        ]);
        Self(encoded.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&ViewParams> for CacheKey {
    fn from(params: &ViewParams) -> Self {
        CacheKey::for_params(params)
    }
}

/// One page of notes plus the total page count for its result set
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResult {
    #[serde(rename = "notes")]
    pub items: Vec<Note>,

    #[serde(default)]
    pub total_pages: u32,
}

impl ListResult {
    pub fn new(items: Vec<Note>, total_pages: u32) -> Self {
        Self { items, total_pages }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
