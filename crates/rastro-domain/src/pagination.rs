//! Page selection for the dedup-ledger audit listings.

use serde::{Deserialize, Serialize};

const DEFAULT_PER_PAGE: u32 = 25;
const MAX_PER_PAGE: u32 = 100;

/// Page selection parsed from an audit listing's query string.
///
/// The wire key for the page size is kebab-case (`?page=2&per-page=50`).
/// Out-of-range values survive deserialization; [`PageRequest::clamped`]
/// brings them into range before a query is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_per_page", rename = "per-page")]
    pub per_page: u32,
    #[serde(default = "default_page")]
    pub page: u32,
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

fn default_page() -> u32 {
    1
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            page: 1,
        }
    }
}

impl PageRequest {
    /// Bring `per_page` into `1..=100` and `page` to ≥ 1.
    pub fn clamped(self) -> Self {
        Self {
            per_page: self.per_page.clamp(1, MAX_PER_PAGE),
            page: self.page.max(1),
        }
    }

    /// Rows to skip before the first row of this page.
    pub fn offset(self) -> u64 {
        u64::from(self.per_page) * u64::from(self.page.saturating_sub(1))
    }
}
