//! Hydration Bridge
//!
//! Server-side prefetch of the initial list view and its handoff to the
//! client cache, so the first render is not empty and the client does not
//! refetch what the server already loaded.
//!
//! # Flow
//!
//! 1. Server: `HydrationBridge::prefetch()` loads the initial `ViewParams`
//!    (page 1, empty search, optional route tag) through the same
//!    `NotesApi` the client uses.
//! 2. Server: the resulting `DehydratedState` is encoded with `to_json()` and
//!    embedded in the response.
//! 3. Client: `DehydratedState::from_json()` + `HydrationBridge::hydrate()`
//!    seed the `QueryCache` before the browsing controller mounts.
//!
//! Keys travel as the exact `CacheKey` string computed by
//! `ViewParams::cache_key()` on both sides.

use crate::client::NotesApi;
use crate::models::{CacheKey, ListResult, NoteTag, ViewParams};
use crate::services::error::HydrationError;
use crate::services::QueryCache;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One prefetched query as it crosses the server/client boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DehydratedQuery {
    pub key: CacheKey,
    pub result: ListResult,
    pub fetched_at: DateTime<Utc>,
}

/// Serializable snapshot of prefetched cache entries
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DehydratedState {
    #[serde(default)]
    pub queries: Vec<DehydratedQuery>,
}

impl DehydratedState {
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn to_json(&self) -> Result<String, HydrationError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, HydrationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Export every successful entry of `cache`
    pub fn from_cache(cache: &QueryCache) -> Self {
        let queries = cache
            .successful_entries()
            .into_iter()
            .filter_map(|entry| {
                Some(DehydratedQuery {
                    result: entry.result?,
                    fetched_at: entry.fetched_at?,
                    key: entry.key,
                })
            })
            .collect();
        Self { queries }
    }
}

pub struct HydrationBridge;

impl HydrationBridge {
    /// Prefetch the initial view on the server
    ///
    /// A failed prefetch is logged and yields an empty state; the client
    /// then loads the view itself.
    pub async fn prefetch(
        api: &dyn NotesApi,
        page_size: u32,
        initial_tag: Option<NoteTag>,
    ) -> DehydratedState {
        let params = ViewParams::initial(page_size, initial_tag);
        let key = params.cache_key();

        match api.list_notes(&params).await {
            Ok(result) => {
                tracing::info!(
                    "Prefetched {} ({} notes, {} pages)",
                    key,
                    result.items.len(),
                    result.total_pages
                );
                DehydratedState {
                    queries: vec![DehydratedQuery {
                        key,
                        result,
                        fetched_at: Utc::now(),
                    }],
                }
            }
            Err(e) => {
                tracing::warn!("Prefetch of {} failed, client will load it: {}", key, e);
                DehydratedState::default()
            }
        }
    }

    /// Seed the client cache from a dehydrated state
    ///
    /// Returns how many entries were seeded. Entries the client already has
    /// newer data for, or is loading, are skipped.
    pub fn hydrate(cache: &QueryCache, state: &DehydratedState) -> usize {
        let seeded = state
            .queries
            .iter()
            .filter(|query| {
                cache.seed(
                    query.key.clone(),
                    query.result.clone(),
                    query.fetched_at,
                )
            })
            .count();

        tracing::info!(
            "Hydrated {} of {} prefetched queries",
            seeded,
            state.queries.len()
        );
        seeded
    }
}
