//! Page arithmetic for listing controls.
//!
//! Previous/next controls are derived from a clamped page, so a page beyond
//! the last one can never be linked to.

use serde::{Deserialize, Serialize};

/// Paging state of one listing response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    page: u32,
    per_page: u32,
    total_items: u64,
    total_pages: u32,
}

impl Pagination {
    /// Build paging state, clamping `page` into `[1, total_pages]`.
    ///
    /// An empty listing still has one (empty) page.
    #[must_use]
    pub fn new(page: u32, per_page: u32, total_items: u64) -> Self {
        let per_page = per_page.max(1);
        let pages = total_items.div_ceil(u64::from(per_page)).max(1);
        let total_pages = u32::try_from(pages).unwrap_or(u32::MAX);
        Self {
            page: page.clamp(1, total_pages),
            per_page,
            total_items,
            total_pages,
        }
    }

    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    #[must_use]
    pub const fn per_page(&self) -> u32 {
        self.per_page
    }

    #[must_use]
    pub const fn total_items(&self) -> u64 {
        self.total_items
    }

    #[must_use]
    pub const fn total_pages(&self) -> u32 {
        self.total_pages
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Previous page number, or `None` on the first page.
    #[must_use]
    pub const fn prev(&self) -> Option<u32> {
        if self.has_prev() {
            Some(self.page - 1)
        } else {
            None
        }
    }

    /// Next page number, or `None` on the last page.
    #[must_use]
    pub const fn next(&self) -> Option<u32> {
        if self.has_next() {
            Some(self.page + 1)
        } else {
            None
        }
    }

    /// Page numbers within `radius` of the current page.
    #[must_use]
    pub fn window(&self, radius: u32) -> Vec<u32> {
        let start = self.page.saturating_sub(radius).max(1);
        let end = self.page.saturating_add(radius).min(self.total_pages);
        (start..=end).collect()
    }

    /// 1-based index range of the items on this page, for "Showing 13–24 of
    /// 40" labels. `None` when the listing is empty.
    #[must_use]
    pub fn item_range(&self) -> Option<(u64, u64)> {
        if self.total_items == 0 {
            return None;
        }
        let first = u64::from(self.page - 1) * u64::from(self.per_page) + 1;
        let last = (first + u64::from(self.per_page) - 1).min(self.total_items);
        Some((first, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(Pagination::new(1, 12, 25).total_pages(), 3);
        assert_eq!(Pagination::new(1, 12, 24).total_pages(), 2);
        assert_eq!(Pagination::new(1, 12, 0).total_pages(), 1);
    }

    #[test]
    fn test_controls_disabled_at_bounds() {
        let first = Pagination::new(1, 10, 30);
        assert_eq!(first.prev(), None);
        assert_eq!(first.next(), Some(2));

        let last = Pagination::new(3, 10, 30);
        assert_eq!(last.prev(), Some(2));
        assert_eq!(last.next(), None);
    }

    #[test]
    fn test_out_of_range_pages_clamp() {
        let p = Pagination::new(9, 10, 30);
        assert_eq!(p.page(), 3);
        assert!(!p.has_next());
        assert_eq!(Pagination::new(0, 10, 30).page(), 1);
    }

    #[test]
    fn test_next_never_exceeds_total() {
        for total in 0..50_u64 {
            for page in 0..8 {
                let p = Pagination::new(page, 7, total);
                if let Some(next) = p.next() {
                    assert!(next <= p.total_pages());
                }
                assert!(p.page() <= p.total_pages());
            }
        }
    }

    #[test]
    fn test_window_and_range() {
        let p = Pagination::new(5, 10, 100);
        assert_eq!(p.window(2), vec![3, 4, 5, 6, 7]);
        assert_eq!(Pagination::new(1, 10, 100).window(2), vec![1, 2, 3]);
        assert_eq!(p.item_range(), Some((41, 50)));
        assert_eq!(Pagination::new(3, 10, 25).item_range(), Some((21, 25)));
        assert_eq!(Pagination::new(1, 10, 0).item_range(), None);
    }

    #[test]
    fn test_zero_per_page_is_treated_as_one() {
        let p = Pagination::new(2, 0, 3);
        assert_eq!(p.per_page(), 1);
        assert_eq!(p.total_pages(), 3);
    }
}
