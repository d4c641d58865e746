use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;
/// Largest page whose offset still fits in an `i64` at any limit.
pub const MAX_PAGE: i64 = i64::MAX / MAX_LIMIT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Page {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    pub fn meta(&self, total: i64) -> PageMeta {
        let total_pages = ((total as f64) / (self.limit as f64)).ceil() as i64;
        PageMeta {
            page: self.page,
            limit: self.limit,
            total,
            total_pages,
        }
    }

    /// Pages an already materialized result set.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset() as usize)
            .take(self.limit as usize)
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_page_and_limit() {
        assert_eq!(Page::new(Some(0), Some(0)), Page { page: 1, limit: 1 });
        assert_eq!(Page::new(Some(-3), Some(500)), Page { page: 1, limit: 100 });
        assert_eq!(Page::new(None, None), Page { page: 1, limit: 20 });
        assert_eq!(
            Page::new(Some(i64::MAX), Some(MAX_LIMIT)),
            Page { page: MAX_PAGE, limit: MAX_LIMIT }
        );
    }

    #[test]
    fn offset_of_last_page_does_not_overflow() {
        let page = Page::new(Some(i64::MAX), Some(i64::MAX));
        assert!(page.offset() > 0);
        assert!(page.slice(vec![1, 2, 3]).is_empty());
        assert_eq!(page.meta(3).total, 3);
    }

    #[test]
    fn meta_rounds_total_pages_up() {
        let page = Page::new(Some(2), Some(20));
        assert_eq!(page.offset(), 20);
        let meta = page.meta(41);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(page.meta(0).total_pages, 0);
    }

    #[test]
    fn slice_skips_to_requested_page() {
        let page = Page::new(Some(2), Some(2));
        assert_eq!(page.slice(vec![1, 2, 3, 4, 5]), vec![3, 4]);
        assert!(Page::new(Some(9), Some(2)).slice(vec![1, 2]).is_empty());
    }
}
