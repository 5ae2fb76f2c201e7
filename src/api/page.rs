use serde::{Deserialize, Serialize};

use crate::config::PaginationConfig;
use crate::error::ApiError;

/// Raw `?page=&size=` query parameters as sent by the client
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

/// A validated page request: 0-based page index and a page size of at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl PageRequest {
    /// Returns `None` when `size` is zero.
    pub fn new(page: u32, size: u32) -> Option<Self> {
        (size > 0).then_some(Self { page, size })
    }

    /// Resolve query parameters against the configured defaults.
    /// Oversized pages are clamped to `max_size`; a zero size is rejected.
    pub fn from_query(query: PageQuery, config: &PaginationConfig) -> Result<Self, ApiError> {
        let page = query.page.unwrap_or(0);
        let size = query.size.unwrap_or(config.default_size).min(config.max_size);
        Self::new(page, size).ok_or_else(|| ApiError::bad_request("Page size must be at least 1"))
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Row offset of the first item on this page
    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// `ceil(total_items / page_size)`, zero for an empty collection.
pub fn total_pages(total_items: i64, page_size: u32) -> u64 {
    if total_items <= 0 || page_size == 0 {
        return 0;
    }
    total_items.unsigned_abs().div_ceil(u64::from(page_size))
}

/// One page of items plus the metadata clients need to walk the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    pub page: u32,
    pub size: u32,
    pub total_data: i64,
    pub total_pages: u64,
    pub items: Vec<T>,
}

impl<T> PageResult<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_data: i64) -> Self {
        Self {
            page: request.page(),
            size: request.size(),
            total_data,
            total_pages: total_pages(total_data, request.size()),
            items,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PageResult<U> {
        PageResult {
            page: self.page,
            size: self.size,
            total_data: self.total_data,
            total_pages: self.total_pages,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pagination() -> PaginationConfig {
        PaginationConfig {
            default_size: 10,
            max_size: 100,
        }
    }

    #[test]
    fn total_pages_is_ceiling_division() {
        for size in 1..=12u32 {
            for total in 0..=100i64 {
                let expected = (total + i64::from(size) - 1) / i64::from(size);
                assert_eq!(total_pages(total, size) as i64, expected, "total={total} size={size}");
            }
        }
    }

    #[test]
    fn total_pages_does_not_saturate_for_huge_collections() {
        assert_eq!(total_pages(10_000_000_000, 1), 10_000_000_000);
        assert_eq!(total_pages(i64::MAX, 1), i64::MAX as u64);
        assert_eq!(total_pages(10_000_000_001, 2), 5_000_000_001);
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(PageRequest::new(0, 0).is_none());
        let err = PageRequest::from_query(PageQuery { page: Some(1), size: Some(0) }, &pagination()).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn query_defaults_and_clamping() {
        let request = PageRequest::from_query(PageQuery::default(), &pagination()).unwrap();
        assert_eq!((request.page(), request.size()), (0, 10));

        let request = PageRequest::from_query(PageQuery { page: Some(3), size: Some(500) }, &pagination()).unwrap();
        assert_eq!((request.page(), request.size()), (3, 100));
        assert_eq!(request.offset(), 300);
    }

    #[test]
    fn page_result_serializes_with_wire_names() {
        let result = PageResult::new(vec!["a", "b"], PageRequest::new(0, 2).unwrap(), 5);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["totalData"], 5);
        assert_eq!(value["totalPages"], 3);
        assert_eq!(value["items"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn map_keeps_metadata() {
        let result = PageResult::new(vec![1, 2], PageRequest::new(1, 2).unwrap(), 4).map(|n| n * 10);
        assert_eq!(result.items, vec![10, 20]);
        assert_eq!(result.page, 1);
        assert_eq!(result.total_pages, 2);
    }
}
