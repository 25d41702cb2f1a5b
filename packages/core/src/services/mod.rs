//! Browsing Services
//!
//! This module contains the query-state orchestration core:
//!
//! - `QueryCache` - keyed entries with stale-while-revalidate and in-flight dedup
//! - `InputDebouncer` - trailing-edge debounce for search input
//! - `BrowsingController` - owns the view params and derives the list view
//! - `HydrationBridge` - server prefetch and client cache seeding
//!
//! Services sit between the Request Executor (`client`) and the presentation
//! layer, which only ever talks to the controller.

pub mod browsing_controller;
pub mod debouncer;
pub mod error;
pub mod hydration;
pub mod query_cache;

pub use browsing_controller::{BrowseSettings, BrowsingController, NotesView};
pub use debouncer::InputDebouncer;
pub use error::{BrowseError, HydrationError};
pub use hydration::{DehydratedQuery, DehydratedState, HydrationBridge};
pub use query_cache::{CacheEntry, CacheStats, EntryStatus, QueryCache};
