//! Browsing Controller
//!
//! Orchestrates the note list: owns the current `ViewParams`, turns user
//! input into new params, resolves the matching cache entry and derives the
//! single `NotesView` the presentation layer renders.
//!
//! # Rules
//!
//! - Search input goes through the `InputDebouncer`; only committed terms
//!   change params. A changed search or tag always lands on page 1, before
//!   the next cache resolution.
//! - The view reads the entry for the *current* key only. A late response for
//!   a superseded key lands in its own cache entry and never reaches the view.
//! - While the current key has no result, the last key that had one is shown
//!   as a placeholder (no loading flag, no layout flicker).
//! - Page changes are validated against the page count of the current
//!   result set. A placeholder from a different search or tag does not count.
//!
//! # Lifecycle
//!
//! `mount()` resolves the initial key and starts listening for debounced
//! commits. Dropping the controller (or `unmount()`) disposes the debouncer
//! and the commit listener.

use crate::client::{ApiError, NotesApi};
use crate::models::{
    CacheKey, ListResult, NewNote, Note, NoteTag, PaginationControls, ViewParams,
};
use crate::services::error::BrowseError;
use crate::services::{EntryStatus, InputDebouncer, QueryCache};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::{Stream, StreamExt};

/// Per-session browsing constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowseSettings {
    /// Items per page, fixed for the session
    pub page_size: u32,

    /// Quiet interval before search input is committed
    pub debounce: Duration,
}

impl Default for BrowseSettings {
    fn default() -> Self {
        Self {
            page_size: 12,
            debounce: Duration::from_millis(300),
        }
    }
}

/// Everything the presentation layer needs to render the list
#[derive(Debug, Clone, PartialEq)]
pub struct NotesView {
    /// Params this view was derived for
    pub params: ViewParams,

    pub items: Vec<Note>,

    pub total_pages: u32,

    /// Nothing displayable yet and the current key is loading
    pub is_loading: bool,

    /// Nothing displayable and the current key failed
    pub is_error: bool,

    /// `items` belong to a previous key, shown while the current one loads
    pub is_placeholder: bool,

    /// Error of the current key, if its last load failed
    pub error: Option<ApiError>,

    /// Page selector, present only when there is more than one page
    pub pagination: Option<PaginationControls>,
}

struct ControllerState {
    params: ViewParams,

    /// Raw search box text, possibly not committed yet
    search_input: String,

    /// Most recent previous params whose entry held a result
    placeholder: Option<ViewParams>,
}

struct ControllerShared {
    state: Mutex<ControllerState>,
    cache: QueryCache,
    api: Arc<dyn NotesApi>,
    params_tx: watch::Sender<ViewParams>,
}

fn load_list(
    api: Arc<dyn NotesApi>,
    params: ViewParams,
) -> impl Future<Output = Result<ListResult, ApiError>> + Send + 'static {
    async move { api.list_notes(&params).await }
}

impl ControllerShared {
    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn result_for(&self, params: &ViewParams) -> Option<ListResult> {
        self.cache
            .peek(&params.cache_key())
            .and_then(|entry| entry.result)
    }

    /// Install `next` as the current params. Caller holds the state lock.
    ///
    /// Returns `true` when params actually changed.
    fn replace_params(&self, state: &mut ControllerState, next: ViewParams) -> bool {
        if next == state.params {
            return false;
        }
        if self.result_for(&state.params).is_some() {
            state.placeholder = Some(state.params.clone());
        }
        tracing::debug!(
            "View params: search={:?} tag={:?} page={}",
            next.search(),
            next.tag(),
            next.page()
        );
        state.params = next;
        true
    }

    /// Publish changed params and resolve their key
    fn params_changed(&self, params: ViewParams) {
        self.params_tx.send_replace(params.clone());
        self.resolve(params);
    }

    fn resolve(&self, params: ViewParams) {
        let key = params.cache_key();
        let api = self.api.clone();
        self.cache.resolve(&key, move || load_list(api, params));
    }

    fn update(&self, next: impl FnOnce(&ViewParams) -> ViewParams) -> ViewParams {
        let (params, changed) = {
            let mut state = self.state();
            let candidate = next(&state.params);
            let changed = self.replace_params(&mut state, candidate);
            (state.params.clone(), changed)
        };
        if changed {
            self.params_changed(params.clone());
        }
        params
    }

    fn apply_search(&self, committed: &str) -> ViewParams {
        self.update(|params| {
            if params.search() == committed.trim() {
                params.clone()
            } else {
                params.with_search(committed)
            }
        })
    }

    fn view(&self) -> NotesView {
        let (params, placeholder) = {
            let state = self.state();
            (state.params.clone(), state.placeholder.clone())
        };

        let entry = self.cache.peek(&params.cache_key());
        let status = entry
            .as_ref()
            .map(|entry| entry.status)
            .unwrap_or(EntryStatus::Idle);
        let error = entry
            .as_ref()
            .filter(|entry| entry.is_error())
            .and_then(|entry| entry.error.clone());

        let own = entry.and_then(|entry| entry.result);
        let (shown, is_placeholder, pageable) = match own {
            Some(result) => (Some(result), false, true),
            None => {
                let fallback = placeholder
                    .as_ref()
                    .and_then(|p| self.result_for(p));
                let is_placeholder = fallback.is_some();
                // Page counts only carry over between pages of one filter
                let pageable = placeholder.is_some_and(|p| p.same_filter(&params));
                (fallback, is_placeholder, pageable)
            }
        };

        let has_display = shown.is_some();
        let ListResult { items, total_pages } = shown.unwrap_or_default();
        let pagination = if pageable {
            PaginationControls::for_view(total_pages, params.page())
        } else {
            None
        };

        NotesView {
            pagination,
            params,
            items,
            total_pages,
            is_loading: !has_display && status == EntryStatus::Loading,
            is_error: !has_display && status == EntryStatus::Error,
            is_placeholder,
            error,
        }
    }

    /// Page count of the current result set, if known
    fn known_page_count(&self, state: &ControllerState) -> Option<u32> {
        if let Some(result) = self.result_for(&state.params) {
            return Some(result.total_pages);
        }
        state
            .placeholder
            .as_ref()
            .filter(|placeholder| placeholder.same_filter(&state.params))
            .and_then(|placeholder| self.result_for(placeholder))
            .map(|result| result.total_pages)
    }

    fn invalidate_current(&self) {
        let params = self.state().params.clone();
        let key = params.cache_key();
        tracing::debug!("Invalidating {}", key);
        self.cache.invalidate_all();
        let api = self.api.clone();
        self.cache.refresh(&key, move || load_list(api, params));
    }
}

/// Orchestrator for browsing, searching, filtering and paginating notes
pub struct BrowsingController {
    shared: Arc<ControllerShared>,
    debouncer: InputDebouncer,
    commit_listener: JoinHandle<()>,
}

impl BrowsingController {
    /// Mount a controller on `cache` and resolve the initial view
    ///
    /// The initial view is page 1 with no search and the given tag filter.
    /// If the cache was hydrated with that key, no request is made. Must be
    /// called from within a tokio runtime.
    pub fn mount(
        cache: QueryCache,
        api: Arc<dyn NotesApi>,
        settings: BrowseSettings,
        initial_tag: Option<NoteTag>,
    ) -> Self {
        let params = ViewParams::initial(settings.page_size, initial_tag);
        let (params_tx, _) = watch::channel(params.clone());

        let shared = Arc::new(ControllerShared {
            state: Mutex::new(ControllerState {
                params: params.clone(),
                search_input: String::new(),
                placeholder: None,
            }),
            cache,
            api,
            params_tx,
        });

        let debouncer = InputDebouncer::new(settings.debounce);
        let mut commits = debouncer.subscribe();
        let listener = shared.clone();
        let commit_listener = tokio::spawn(async move {
            loop {
                match commits.recv().await {
                    Ok(committed) => {
                        listener.apply_search(&committed);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::debug!("Skipped {} superseded search commits", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        tracing::info!(
            "Mounting browsing controller (page size {}, tag {:?})",
            settings.page_size,
            initial_tag
        );
        shared.resolve(params);

        Self {
            shared,
            debouncer,
            commit_listener,
        }
    }

    /// Current committed params
    pub fn params(&self) -> ViewParams {
        self.shared.state().params.clone()
    }

    pub fn cache_key(&self) -> CacheKey {
        self.params().cache_key()
    }

    /// Raw search box text, which may not be committed yet
    pub fn search_input(&self) -> String {
        self.shared.state().search_input.clone()
    }

    pub fn cache(&self) -> &QueryCache {
        &self.shared.cache
    }

    /// Feed raw search box input; params change once the debouncer commits
    pub fn set_search_input(&self, raw: impl Into<String>) {
        let raw = raw.into();
        self.shared.state().search_input = raw.clone();
        self.debouncer.commit(raw);
    }

    /// Commit a search term immediately, bypassing the debouncer
    pub fn commit_search(&self, term: &str) -> ViewParams {
        self.debouncer.cancel();
        self.shared.state().search_input = term.to_string();
        self.shared.apply_search(term)
    }

    /// Select a tag filter (`None` for all tags); resets to page 1
    pub fn set_tag(&self, tag: Option<NoteTag>) -> ViewParams {
        self.shared.update(|params| {
            if params.tag() == tag {
                params.clone()
            } else {
                params.with_tag(tag)
            }
        })
    }

    /// Move to page `page` of the current result set
    ///
    /// # Errors
    ///
    /// - `PageCountUnknown` if the current search/tag has not loaded any page yet
    /// - `PageOutOfRange` if `page` is outside `1..=total_pages`
    pub fn set_page(&self, page: u32) -> Result<ViewParams, BrowseError> {
        let params = {
            let mut state = self.shared.state();
            let total_pages = self
                .shared
                .known_page_count(&state)
                .ok_or(BrowseError::PageCountUnknown)?;
            if page < 1 || page > total_pages {
                return Err(BrowseError::page_out_of_range(page, total_pages));
            }

            let next = state.params.with_page(page);
            if !self.shared.replace_params(&mut state, next) {
                return Ok(state.params.clone());
            }
            state.params.clone()
        };

        self.shared.params_changed(params.clone());
        Ok(params)
    }

    /// Derived view for the current params
    pub fn view(&self) -> NotesView {
        self.shared.view()
    }

    /// Stream of views, recomputed on every param change and cache transition
    pub fn watch(&self) -> impl Stream<Item = NotesView> + Send + 'static {
        let params = WatchStream::new(self.shared.params_tx.subscribe()).map(|_| ());
        let revisions = WatchStream::new(self.shared.cache.subscribe()).map(|_| ());
        let shared = self.shared.clone();
        params.merge(revisions).map(move |_| shared.view())
    }

    /// Refresh the current key (e.g. after a note was created elsewhere)
    pub fn invalidate_current(&self) {
        self.shared.invalidate_current();
    }

    /// Validate and create a note, then refresh the current list
    pub async fn create_note(&self, note: NewNote) -> Result<Note, BrowseError> {
        note.validate()?;
        let created = self.shared.api.create_note(&note).await?;
        tracing::info!("Created note {} ({})", created.id, created.tag);
        self.invalidate_current();
        Ok(created)
    }

    /// Delete a note, then refresh the current list
    pub async fn delete_note(&self, id: &str) -> Result<Note, BrowseError> {
        let deleted = self.shared.api.delete_note(id).await?;
        tracing::info!("Deleted note {}", deleted.id);
        self.invalidate_current();
        Ok(deleted)
    }

    /// Tear down the controller; pending search input is discarded
    pub fn unmount(self) {}
}

impl Drop for BrowsingController {
    fn drop(&mut self) {
        tracing::debug!("Unmounting browsing controller");
        self.debouncer.dispose();
        self.commit_listener.abort();
    }
}
