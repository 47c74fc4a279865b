use crate::corpus::Entry;
use serde::{Deserialize, Serialize};

/// One page of search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Entries on the requested page, already ranked
    pub entries: Vec<Entry>,
    /// Number of entries matching the query across all pages
    pub total: usize,
}

impl SearchPage {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            total: 0,
        }
    }

    /// Whether the query matched nothing at all
    pub fn is_no_match(&self) -> bool {
        self.total == 0
    }
}

/// Bounds of page `page` (1-based) within `total` results.
///
/// Returns `None` when the page starts at or past the end, including page 0
/// and an empty result set.
pub fn page_bounds(total: usize, page: usize, page_size: usize) -> Option<(usize, usize)> {
    let start = page.checked_sub(1)?.checked_mul(page_size)?;
    if start >= total {
        return None;
    }
    let end = start.saturating_add(page_size).min(total);
    Some((start, end))
}

/// Navigation numbers for a results page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    pub current: usize,
    pub total_pages: usize,
    /// Previous page number, if any
    pub previous: Option<usize>,
    /// Next page number, if any
    pub next: Option<usize>,
}

impl PageInfo {
    pub fn new(current: usize, total: usize, page_size: usize) -> Self {
        let total_pages = total_pages(total, page_size);
        Self {
            current,
            total_pages,
            previous: (current > 1).then(|| current - 1),
            next: (current < total_pages).then(|| current + 1),
        }
    }
}

/// Number of pages needed for `total` results
pub fn total_pages(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size)
}
