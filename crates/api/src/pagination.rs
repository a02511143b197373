//! Fixed-size pagination for list endpoints.

use serde::{Deserialize, Serialize};

/// Records per page for paginated listings.
pub const PAGE_SIZE: i64 = 10;

/// Page number query parameter (`?page=N`, 1-based).
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
}

impl PageParams {
    /// The effective 1-based page number. Zero, negative, and absent values
    /// read as the first page.
    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Pagination envelope returned by paginated list endpoints.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    /// Total records matching the query, across all pages.
    pub count: i64,
    /// The 1-based page this response holds.
    pub page: i64,
    pub page_size: i64,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Wrap one page of results in the envelope.
    #[must_use]
    pub const fn new(count: i64, page: i64, results: Vec<T>) -> Self {
        Self {
            count,
            page,
            page_size: PAGE_SIZE,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(PageParams { page: None }.page(), 1);
    }

    #[test]
    fn page_clamps_non_positive_values() {
        assert_eq!(PageParams { page: Some(0) }.page(), 1);
        assert_eq!(PageParams { page: Some(-3) }.page(), 1);
    }

    #[test]
    fn page_passes_positive_values_through() {
        assert_eq!(PageParams { page: Some(4) }.page(), 4);
    }

    #[test]
    fn envelope_carries_fixed_page_size() {
        let page = Page::new(25, 2, vec![1, 2, 3]);
        assert_eq!(page.page_size, PAGE_SIZE);
        assert_eq!(page.count, 25);
        assert_eq!(page.results.len(), 3);
    }
}
