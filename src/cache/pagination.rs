//! Pagination Oracle - page-completeness decision
//!
//! Given a requested page and the ledger's authoritative total for a label,
//! decides whether the cached, ordered slice for that page is complete. The
//! rule is exact-count-match: any disagreement between the cached slice
//! length and the count the server claims for that page forces a remote
//! fetch. Correctness over hit rate.

use crate::models::CacheEntity;

/// Outcome of the cache-completeness decision.
#[derive(Debug, Clone, PartialEq)]
pub enum PageDecision<T> {
    /// The cache holds exactly the entities this page should contain.
    Hit(Vec<T>),
    /// The cache cannot be trusted for this page; fetch remotely.
    Miss,
}

/// How many entities the server-side listing holds on `page`, given the
/// authoritative `total` for the label.
pub fn expected_on_page(total: i64, page: usize, page_size: usize) -> usize {
    let total = total.max(0) as usize;

    if page_size == 0 {
        return 0;
    }

    if total % page_size == 0 {
        return page_size;
    }

    let last_page = (total + page_size - 1) / page_size - 1;
    if last_page == page {
        total % page_size
    } else {
        page_size
    }
}

/// Decide whether `ordered` (the full cached, time-descending list for a
/// label) can answer `page`. An unknown total is an immediate miss.
pub fn decide<T: CacheEntity>(
    ordered: Vec<T>,
    total: Option<i64>,
    page: usize,
    page_size: usize,
) -> PageDecision<T> {
    // A degenerate page size can never be served locally.
    if page_size == 0 {
        return PageDecision::Miss;
    }

    let total = match total {
        Some(total) => total,
        None => return PageDecision::Miss,
    };

    let expected = expected_on_page(total, page, page_size);

    let start = page * page_size;
    let end = (start + page_size).min(ordered.len());
    let slice: Vec<T> = if start < ordered.len() {
        ordered[start..end].to_vec()
    } else {
        Vec::new()
    };

    if slice.len() == expected {
        PageDecision::Hit(slice)
    } else {
        PageDecision::Miss
    }
}
