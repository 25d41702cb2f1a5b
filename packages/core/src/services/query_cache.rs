//! Query Cache with stale-while-revalidate policy
//!
//! Keyed store mapping a `CacheKey` to a `CacheEntry`. It is the single
//! source of truth for fetched list data; the browsing controller only ever
//! reads entries back out of it.
//!
//! # Entry lifecycle
//!
//! ```text
//! idle ──resolve──▶ loading ──ok──▶ success ──resolve──▶ loading (result kept)
//!                      │                                     │
//!                      └──err──▶ error (previous result kept)◀┘
//! ```
//!
//! # Policy
//!
//! - Unknown key: create the entry, start the loader.
//! - Key already `loading`: attach to the in-flight load. The loader passed
//!   in is dropped without being called, so one key never has two loads.
//! - `success`/`error` entry: return it immediately and revalidate in the
//!   background. An entry seeded by hydration is fresh for exactly its first
//!   resolution and is served without a load.
//! - Failed loads keep whatever result the entry already held.
//!
//! Entries are never evicted; the cache lives as long as the session.
//!
//! # Concurrency
//!
//! The map sits behind a `std::sync::Mutex` whose guard is never held
//! across an await. Loads run as tokio tasks and write back through the same
//! lock. Every transition bumps a `watch` revision counter so observers can
//! recompute derived views.

use crate::client::ApiError;
use crate::models::{CacheKey, ListResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

type LoadFuture = Pin<Box<dyn Future<Output = Result<ListResult, ApiError>> + Send>>;
type QueuedLoader = Box<dyn FnOnce() -> LoadFuture + Send>;

/// Lifecycle state of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Snapshot of one cached query
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: CacheKey,

    /// Last successful result; survives later loads and failures
    pub result: Option<ListResult>,

    /// Error the most recent load finished with, cleared on success
    pub error: Option<ApiError>,

    /// When `result` was produced
    pub fetched_at: Option<DateTime<Utc>>,

    pub status: EntryStatus,

    /// Stale entries are revalidated on their next resolution
    pub is_stale: bool,
}

impl CacheEntry {
    fn idle(key: CacheKey) -> Self {
        Self {
            key,
            result: None,
            error: None,
            fetched_at: None,
            status: EntryStatus::Idle,
            is_stale: true,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == EntryStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == EntryStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == EntryStatus::Error
    }
}

struct Slot {
    entry: CacheEntry,

    /// Forced refresh requested while a load was in flight; runs when it settles
    queued_refresh: Option<QueuedLoader>,
}

struct CacheInner {
    slots: Mutex<HashMap<CacheKey, Slot>>,
    revision: watch::Sender<u64>,
    loads_started: AtomicU64,
}

/// Shared handle to the query cache
///
/// Cloning is cheap; every clone refers to the same store.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(CacheInner {
                slots: Mutex::new(HashMap::new()),
                revision,
                loads_started: AtomicU64::new(0),
            }),
        }
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<CacheKey, Slot>> {
        self.inner
            .slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn bump(&self) {
        self.inner.revision.send_modify(|revision| *revision += 1);
    }

    /// Revision counter, bumped on every entry transition
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Resolve `key` under the stale-while-revalidate policy
    ///
    /// Returns the entry as it stands after the policy is applied. The
    /// loader is only invoked when a load actually starts. Must be called
    /// from within a tokio runtime.
    pub fn resolve<F, Fut>(&self, key: &CacheKey, loader: F) -> CacheEntry
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ListResult, ApiError>> + Send + 'static,
    {
        let (snapshot, start) = {
            let mut slots = self.slots();
            let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
                entry: CacheEntry::idle(key.clone()),
                queued_refresh: None,
            });
            let entry = &mut slot.entry;

            match entry.status {
                EntryStatus::Loading => {
                    tracing::debug!("Attaching to in-flight load for {}", key);
                    (entry.clone(), false)
                }
                EntryStatus::Success if !entry.is_stale => {
                    tracing::debug!("Serving fresh entry for {} without a load", key);
                    entry.is_stale = true;
                    (entry.clone(), false)
                }
                _ => {
                    entry.status = EntryStatus::Loading;
                    (entry.clone(), true)
                }
            }
        };

        if start {
            tracing::debug!("Starting load for {}", key);
            self.bump();
            self.spawn_load(key.clone(), Box::pin(loader()));
        }

        snapshot
    }

    /// Resolve `key` and wait until it leaves `loading`
    ///
    /// Attaches to an in-flight load when one exists. A `success` entry is
    /// returned straight away while it revalidates in the background.
    pub async fn fetch<F, Fut>(&self, key: &CacheKey, loader: F) -> Result<ListResult, ApiError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<ListResult, ApiError>> + Send + 'static,
    {
        let mut revisions = self.subscribe();
        let mut entry = self.resolve(key, loader);

        loop {
            match entry.status {
                EntryStatus::Success => return Ok(entry.result.unwrap_or_default()),
                EntryStatus::Error => {
                    return Err(entry
                        .error
                        .unwrap_or_else(|| ApiError::network(None, "load failed")))
                }
                // Revalidating: the cached result is the answer for now
                EntryStatus::Loading if entry.result.is_some() => {
                    return Ok(entry.result.unwrap_or_default())
                }
                _ => {}
            }

            if revisions.changed().await.is_err() {
                return Err(ApiError::network(None, "query cache closed"));
            }
            entry = match self.peek(key) {
                Some(entry) => entry,
                None => return Err(ApiError::network(None, "cache entry vanished")),
            };
        }
    }

    /// Force a reload of `key`, bypassing freshness
    ///
    /// If a load is already in flight the refresh is queued and starts as
    /// soon as that load settles, so its result can't be older than the
    /// invalidation.
    pub fn refresh<F, Fut>(&self, key: &CacheKey, loader: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<ListResult, ApiError>> + Send + 'static,
    {
        let start = {
            let mut slots = self.slots();
            let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
                entry: CacheEntry::idle(key.clone()),
                queued_refresh: None,
            });
            slot.entry.is_stale = true;

            if slot.entry.is_loading() {
                tracing::debug!("Queueing refresh for {} behind in-flight load", key);
                slot.queued_refresh = Some(Box::new(move || Box::pin(loader()) as LoadFuture));
                None
            } else {
                slot.entry.status = EntryStatus::Loading;
                Some(loader)
            }
        };

        if let Some(loader) = start {
            tracing::debug!("Refreshing {}", key);
            self.bump();
            self.spawn_load(key.clone(), Box::pin(loader()));
        }
    }

    fn spawn_load(&self, key: CacheKey, load: LoadFuture) {
        self.inner.loads_started.fetch_add(1, Ordering::Relaxed);
        let cache = self.clone();
        tokio::spawn(async move {
            let outcome = load.await;
            cache.complete(key, outcome);
        });
    }

    /// Apply a finished load to its own key only
    fn complete(&self, key: CacheKey, outcome: Result<ListResult, ApiError>) {
        let queued = {
            let mut slots = self.slots();
            let slot = slots.entry(key.clone()).or_insert_with(|| Slot {
                entry: CacheEntry::idle(key.clone()),
                queued_refresh: None,
            });
            let entry = &mut slot.entry;

            match outcome {
                Ok(result) => {
                    tracing::debug!(
                        "Load succeeded for {} ({} items, {} pages)",
                        key,
                        result.items.len(),
                        result.total_pages
                    );
                    entry.result = Some(result);
                    entry.error = None;
                    entry.fetched_at = Some(Utc::now());
                    entry.status = EntryStatus::Success;
                }
                Err(error) => {
                    tracing::warn!("Load failed for {}: {}", key, error);
                    entry.error = Some(error);
                    entry.status = EntryStatus::Error;
                }
            }
            entry.is_stale = true;

            let queued = slot.queued_refresh.take();
            if queued.is_some() {
                slot.entry.status = EntryStatus::Loading;
            }
            queued
        };

        self.bump();

        if let Some(loader) = queued {
            tracing::debug!("Running queued refresh for {}", key);
            self.spawn_load(key, loader());
        }
    }

    /// Current entry for `key`, without triggering anything
    pub fn peek(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.slots().get(key).map(|slot| slot.entry.clone())
    }

    /// Mark `key` stale so its next resolution revalidates
    pub fn invalidate(&self, key: &CacheKey) {
        if let Some(slot) = self.slots().get_mut(key) {
            slot.entry.is_stale = true;
        }
    }

    /// Mark every entry stale
    pub fn invalidate_all(&self) {
        for slot in self.slots().values_mut() {
            slot.entry.is_stale = true;
        }
    }

    /// Seed a successful entry produced elsewhere (e.g. a server prefetch)
    ///
    /// The seeded entry is fresh: its first resolution does not load.
    /// Returns `false` and leaves the cache untouched when the key has a
    /// load in flight or already holds a result at least as new.
    pub fn seed(&self, key: CacheKey, result: ListResult, fetched_at: DateTime<Utc>) -> bool {
        let seeded = {
            let mut slots = self.slots();
            match slots.get_mut(&key) {
                Some(slot) if slot.entry.is_loading() => false,
                Some(slot) if slot.entry.fetched_at.is_some_and(|at| at >= fetched_at) => false,
                Some(slot) => {
                    slot.entry.result = Some(result);
                    slot.entry.error = None;
                    slot.entry.fetched_at = Some(fetched_at);
                    slot.entry.status = EntryStatus::Success;
                    slot.entry.is_stale = false;
                    true
                }
                None => {
                    slots.insert(
                        key.clone(),
                        Slot {
                            entry: CacheEntry {
                                key,
                                result: Some(result),
                                error: None,
                                fetched_at: Some(fetched_at),
                                status: EntryStatus::Success,
                                is_stale: false,
                            },
                            queued_refresh: None,
                        },
                    );
                    true
                }
            }
        };

        if seeded {
            self.bump();
        }
        seeded
    }

    /// Every entry currently holding a successful result
    pub fn successful_entries(&self) -> Vec<CacheEntry> {
        let mut entries: Vec<CacheEntry> = self
            .slots()
            .values()
            .filter(|slot| slot.entry.is_success())
            .map(|slot| slot.entry.clone())
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }

    /// Get cache statistics (for debugging/monitoring)
    pub fn stats(&self) -> CacheStats {
        let slots = self.slots();
        CacheStats {
            entries: slots.len(),
            in_flight: slots.values().filter(|s| s.entry.is_loading()).count(),
            loads_started: self.inner.loads_started.load(Ordering::Relaxed),
        }
    }
}

/// Statistics about the query cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of keys ever resolved or seeded
    pub entries: usize,
    /// Keys with a load currently running
    pub in_flight: usize,
    /// Total loads started over the cache's lifetime
    pub loads_started: u64,
}
