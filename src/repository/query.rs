//! Filter, sort and cursor parameters for paginated listings.
//!
//! Cursors are offsets into the filtered, sorted result. They are only meaningful
//! when passed back with the same filters and sort.

use crate::entities::{GarmentStage, OrderStatus};
use serde::Serialize;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u64 = 100;
/// Page size when none is given.
pub const DEFAULT_PAGE_SIZE: u64 = 25;

/// Ascending or descending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest first
    #[default]
    Asc,
    /// Largest first
    Desc,
}

/// Garment listing sort keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GarmentSort {
    /// Due date; undated garments always last
    #[default]
    DueDate,
    /// Check-in time
    CreatedAt,
    /// Garment name
    Name,
}

/// Order listing sort keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderSort {
    /// Creation time
    #[default]
    CreatedAt,
    /// Order number
    OrderNumber,
    /// Order total
    Total,
}

/// Garment listing parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GarmentQuery {
    /// Only this stage
    pub stage: Option<GarmentStage>,
    /// Include `Done` garments (ignored when `stage` is set)
    pub include_done: bool,
    /// Only garments of this order
    pub order_id: Option<i64>,
    /// Case-insensitive substring of the garment name
    pub search: Option<String>,
    /// Sort key
    pub sort: GarmentSort,
    /// Sort direction
    pub direction: SortDirection,
    /// Offset returned as `next_cursor` by the previous page
    pub cursor: Option<u64>,
    /// Requested page size, clamped to `1..=MAX_PAGE_SIZE`
    pub limit: Option<u64>,
}

/// Order listing parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    /// Only this status
    pub status: Option<OrderStatus>,
    /// Include cancelled orders (ignored when `status` is set)
    pub include_cancelled: bool,
    /// Only orders of this client
    pub client_id: Option<i64>,
    /// Case-insensitive substring of the order number
    pub search: Option<String>,
    /// Sort key
    pub sort: OrderSort,
    /// Sort direction
    pub direction: SortDirection,
    /// Offset returned as `next_cursor` by the previous page
    pub cursor: Option<u64>,
    /// Requested page size, clamped to `1..=MAX_PAGE_SIZE`
    pub limit: Option<u64>,
}

/// Clamps a requested page size.
#[must_use]
pub fn page_size(limit: Option<u64>) -> u64 {
    limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
}

/// Trimmed, non-empty search term.
#[must_use]
pub fn search_term(search: Option<&String>) -> Option<&str> {
    search.map(|s| s.trim()).filter(|s| !s.is_empty())
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Cursor for the next page, `None` on the last page
    pub next_cursor: Option<u64>,
    /// Number of matching records across all pages
    pub total: u64,
}

impl<T> Page<T> {
    /// Builds a page from `limit + 1` fetched rows, trimming the lookahead row.
    #[must_use]
    pub fn from_lookahead(mut items: Vec<T>, offset: u64, limit: u64, total: u64) -> Self {
        let has_more = items.len() as u64 > limit;
        if has_more {
            items.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }
        Self {
            next_cursor: has_more.then_some(offset + limit),
            items,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_is_clamped() {
        assert_eq!(page_size(None), DEFAULT_PAGE_SIZE);
        assert_eq!(page_size(Some(0)), 1);
        assert_eq!(page_size(Some(1000)), MAX_PAGE_SIZE);
        assert_eq!(page_size(Some(10)), 10);
    }

    #[test]
    fn test_search_term_trims_blank() {
        assert_eq!(search_term(Some(&"  suit ".to_string())), Some("suit"));
        assert_eq!(search_term(Some(&"   ".to_string())), None);
        assert_eq!(search_term(None), None);
    }

    #[test]
    fn test_page_from_lookahead() {
        let page = Page::from_lookahead(vec![1, 2, 3], 0, 2, 7);
        assert_eq!(page.items, vec![1, 2]);
        assert_eq!(page.next_cursor, Some(2));

        let last = Page::from_lookahead(vec![7], 6, 2, 7);
        assert_eq!(last.items, vec![7]);
        assert_eq!(last.next_cursor, None);
    }
}
