//! Offset pagination helpers
//!
//! Pages are 1-indexed. Unlike a clamped browser, a page past the end is
//! not an error: it simply yields no rows.

/// Books per page
pub const PAGE_SIZE: i64 = 10;

/// Largest `limit` a caller may request for review listings
pub const MAX_LIMIT: i64 = 100;

/// Offset window for a LIMIT/OFFSET query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: i64,
    /// Rows per page
    pub limit: i64,
    /// Offset for SQL LIMIT/OFFSET query
    pub offset: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64) -> Self {
        let page = page.max(1);
        let limit = limit.clamp(1, MAX_LIMIT);
        Self {
            page,
            limit,
            offset: (page - 1).saturating_mul(limit),
        }
    }

    /// Book listing window (fixed page size)
    pub fn books(page: i64) -> Self {
        Self::new(page, PAGE_SIZE)
    }
}

/// Interpret a raw `page` query value
///
/// Absent, non-numeric and non-positive values all mean page 1.
///
/// # Examples
/// ```
/// use shelf_catalog::pagination::parse_page;
///
/// assert_eq!(parse_page(Some("3")), 3);
/// assert_eq!(parse_page(Some("abc")), 1);
/// assert_eq!(parse_page(None), 1);
/// ```
pub fn parse_page(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

/// Interpret a raw `limit` query value, falling back to `default`
pub fn parse_limit(raw: Option<&str>, default: i64) -> i64 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|limit| *limit >= 1)
        .unwrap_or(default)
        .min(MAX_LIMIT)
}
