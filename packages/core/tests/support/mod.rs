//! Shared test doubles for integration tests
//!
//! `FakeNotesApi` serves deterministic pages, records every list call, and
//! can hold back (gate) or fail individual keys so tests can stage races.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use notehub_core::{
    ApiError, BrowsingController, CacheKey, ListResult, NewNote, Note, NoteTag, NotesApi,
    NotesView, QueryCache, ViewParams,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio::time::{timeout, Duration};
use tokio_stream::StreamExt;

pub const PAGE_SIZE: u32 = 12;

fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
}

/// Note ID encoding the request that produced it: `search|tag|pN|i`
pub fn note_id(params: &ViewParams, index: u32) -> String {
    format!(
        "{}|{}|p{}|{}",
        params.search(),
        params.tag().map(|t| t.as_str()).unwrap_or("All"),
        params.page(),
        index
    )
}

pub fn page_of(view: &NotesView) -> Option<u32> {
    let id = &view.items.first()?.id;
    id.split('|')
        .nth(2)
        .and_then(|segment| segment.trim_start_matches('p').parse().ok())
}

pub struct FakeNotesApi {
    total_pages: u32,
    list_calls: Mutex<Vec<ViewParams>>,
    gates: Mutex<HashMap<CacheKey, Arc<Notify>>>,
    failures: Mutex<HashMap<CacheKey, ApiError>>,
    created: Mutex<Vec<NewNote>>,
}

impl FakeNotesApi {
    pub fn new(total_pages: u32) -> Arc<Self> {
        Arc::new(Self {
            total_pages,
            list_calls: Mutex::new(Vec::new()),
            gates: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            created: Mutex::new(Vec::new()),
        })
    }

    /// Hold back responses for `params` until `release` is called
    pub fn gate(&self, params: &ViewParams) {
        self.gates
            .lock()
            .unwrap()
            .insert(params.cache_key(), Arc::new(Notify::new()));
    }

    pub fn release(&self, params: &ViewParams) {
        if let Some(gate) = self.gates.lock().unwrap().remove(&params.cache_key()) {
            gate.notify_one();
        }
    }

    pub fn fail(&self, params: &ViewParams, error: ApiError) {
        self.failures
            .lock()
            .unwrap()
            .insert(params.cache_key(), error);
    }

    pub fn list_calls(&self) -> Vec<ViewParams> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, params: &ViewParams) -> usize {
        self.list_calls
            .lock()
            .unwrap()
            .iter()
            .filter(|p| *p == params)
            .count()
    }

    pub fn created(&self) -> Vec<NewNote> {
        self.created.lock().unwrap().clone()
    }

    pub fn page(&self, params: &ViewParams) -> ListResult {
        let items = (0..params.page_size())
            .map(|i| Note {
                id: note_id(params, i),
                title: format!("Note {}", i),
                content: String::new(),
                tag: params.tag().unwrap_or(NoteTag::Todo),
                created_at: timestamp(),
                updated_at: timestamp(),
            })
            .collect();
        ListResult::new(items, self.total_pages)
    }
}

#[async_trait]
impl NotesApi for FakeNotesApi {
    async fn list_notes(&self, params: &ViewParams) -> Result<ListResult, ApiError> {
        self.list_calls.lock().unwrap().push(params.clone());

        let gate = self.gates.lock().unwrap().get(&params.cache_key()).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if let Some(error) = self.failures.lock().unwrap().get(&params.cache_key()) {
            return Err(error.clone());
        }
        Ok(self.page(params))
    }

    async fn create_note(&self, note: &NewNote) -> Result<Note, ApiError> {
        self.created.lock().unwrap().push(note.clone());
        Ok(Note {
            id: format!("created-{}", self.created.lock().unwrap().len()),
            title: note.title.clone(),
            content: note.content.clone(),
            tag: note.tag,
            created_at: timestamp(),
            updated_at: timestamp(),
        })
    }

    async fn delete_note(&self, id: &str) -> Result<Note, ApiError> {
        Err(ApiError::not_found(id))
    }

    async fn fetch_note(&self, id: &str) -> Result<Note, ApiError> {
        Err(ApiError::not_found(id))
    }
}

/// Wait (bounded) until the controller's view satisfies `condition`
pub async fn wait_for_view(
    controller: &BrowsingController,
    condition: impl Fn(&NotesView) -> bool,
) -> NotesView {
    let mut views = Box::pin(controller.watch());
    timeout(Duration::from_secs(5), async {
        while let Some(view) = views.next().await {
            if condition(&view) {
                return view;
            }
        }
        panic!("view stream ended");
    })
    .await
    .expect("view condition not reached in time")
}

/// Wait (bounded) until the entry for `params` has finished loading
pub async fn wait_for_settled(cache: &QueryCache, params: &ViewParams) {
    let key = params.cache_key();
    let mut revisions = cache.subscribe();
    timeout(Duration::from_secs(5), async {
        loop {
            match cache.peek(&key) {
                Some(entry) if !entry.is_loading() => return,
                _ => revisions.changed().await.expect("cache dropped"),
            }
        }
    })
    .await
    .expect("entry did not settle in time")
}
