//! Pagination affordance
//!
//! Describes the page selector the presentation layer may render. Controls
//! only exist when there is more than one page, and every page they offer
//! lies inside `[1, total_pages]`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationControls {
    pub current_page: u32,
    pub total_pages: u32,
}

impl PaginationControls {
    /// Controls for a view, or `None` when a selector should not be shown
    pub fn for_view(total_pages: u32, current_page: u32) -> Option<Self> {
        if total_pages <= 1 {
            return None;
        }
        Some(Self {
            current_page: current_page.clamp(1, total_pages),
            total_pages,
        })
    }

    /// Clamp a requested page into the selectable range
    pub fn clamp(&self, page: u32) -> u32 {
        page.clamp(1, self.total_pages)
    }

    /// Convert a 0-based page event (e.g. from a paginate widget) to a selectable page
    pub fn from_zero_based(&self, selected: u32) -> u32 {
        self.clamp(selected.saturating_add(1))
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn pages(&self) -> impl Iterator<Item = u32> {
        1..=self.total_pages
    }
}
