//! Pagination request/response shapes.

use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Normalized 1-based page selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Builds a page selector, defaulting page to 1 and size to 10, and
    /// clamping size to `MAX_PAGE_SIZE`.
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        let page = match page {
            Some(0) | None => 1,
            Some(value) => value,
        };
        let page_size = match page_size {
            Some(0) | None => DEFAULT_PAGE_SIZE,
            Some(value) if value > MAX_PAGE_SIZE => MAX_PAGE_SIZE,
            Some(value) => value,
        };
        Self { page, page_size }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of records plus the unpaged total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub records: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn new(records: Vec<T>, total: i64, request: PageRequest) -> Self {
        Self {
            records,
            total,
            page: request.page,
            page_size: request.page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PageRequest;

    #[test]
    fn defaults_and_clamps() {
        let default = PageRequest::new(None, Some(0));
        assert_eq!((default.page, default.page_size), (1, 10));

        let clamped = PageRequest::new(Some(3), Some(500));
        assert_eq!(clamped.page_size, 100);
        assert_eq!(clamped.offset(), 200);
    }
}
