use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Documents per page for every list endpoint.
pub const PAGE_SIZE: u64 = 25;

/// Totals reported next to a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageMetadata {
    /// Documents matching the query across all pages
    pub total: u64,
    pub pages: u64,
}

pub fn calculate_total_and_pages(total: u64) -> PageMetadata {
    PageMetadata {
        total,
        pages: total.div_ceil(PAGE_SIZE),
    }
}
