//! Pagination window math shared by entity-scope interpolators and fetchers.

use serde::{Deserialize, Serialize};

/// Derived pagination values for one page of a listing.
///
/// Item indices are 1-based. With a total count of zero, `total_pages` and
/// `last_item_index` are zero while `first_item_index` stays at its 1-based
/// floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    /// Number of pages needed for the full listing
    pub total_pages: u64,
    /// 1-based index of the first item on this page
    pub first_item_index: u64,
    /// 1-based index of the last item on this page
    pub last_item_index: u64,
}

impl PageWindow {
    /// Compute the window for `page` of a listing of `total_count` items.
    ///
    /// `page` and `page_size` are clamped to a minimum of 1.
    pub fn compute(total_count: u64, page_size: u64, page: u64) -> Self {
        let page_size = page_size.max(1);
        let page = page.max(1);

        Self {
            total_pages: total_count.div_ceil(page_size),
            first_item_index: page_size * (page - 1) + 1,
            last_item_index: (page_size * page).min(total_count),
        }
    }
}

/// Parse a `page` parameter, clamping to a minimum of 1. Unparseable values
/// fall back to 1 so authored text degrades instead of erroring.
pub fn parse_page_param(raw: Option<&str>) -> u64 {
    raw.and_then(|v| v.parse::<u64>().ok()).unwrap_or(1).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_last_page() {
        let window = PageWindow::compute(45, 20, 3);
        assert_eq!(window.total_pages, 3);
        assert_eq!(window.first_item_index, 41);
        assert_eq!(window.last_item_index, 45);
    }

    #[test]
    fn test_exact_fit() {
        let window = PageWindow::compute(40, 20, 2);
        assert_eq!(window.total_pages, 2);
        assert_eq!(window.first_item_index, 21);
        assert_eq!(window.last_item_index, 40);
    }

    #[test]
    fn test_empty_listing() {
        let window = PageWindow::compute(0, 20, 1);
        assert_eq!(window.total_pages, 0);
        assert_eq!(window.first_item_index, 1);
        assert_eq!(window.last_item_index, 0);
    }

    #[test]
    fn test_zero_inputs_clamped() {
        let window = PageWindow::compute(5, 0, 0);
        assert_eq!(window.total_pages, 5);
        assert_eq!(window.first_item_index, 1);
        assert_eq!(window.last_item_index, 1);
    }

    #[test]
    fn test_parse_page_param() {
        assert_eq!(parse_page_param(Some("3")), 3);
        assert_eq!(parse_page_param(Some("0")), 1);
        assert_eq!(parse_page_param(Some("junk")), 1);
        assert_eq!(parse_page_param(None), 1);
    }
}
