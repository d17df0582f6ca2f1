//! Offset pagination primitives shared by listing endpoints.
//!
//! A [`PageRequest`] is built from untrusted `page`/`limit` query values and
//! always yields positive numbers. [`PageInfo`] derives the envelope metadata
//! from a request and the total row count observed under the same filter as
//! the page query, so `total_pages` stays consistent with the returned rows.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page number used when the caller omits `page` or sends garbage.
pub const DEFAULT_PAGE: u32 = 1;
/// Page size used when the caller omits `limit` or sends garbage.
pub const DEFAULT_LIMIT: u32 = 10;
/// Upper bound applied to caller-supplied page sizes.
pub const MAX_LIMIT: u32 = 1000;

/// Errors raised by the strict [`PageRequest::new`] constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// Page numbers start at one.
    #[error("page must be at least 1")]
    ZeroPage,
    /// A page must hold at least one row.
    #[error("limit must be at least 1")]
    ZeroLimit,
}

/// A validated `(page, limit)` pair.
///
/// # Examples
/// ```
/// use pagination::PageRequest;
///
/// let request = PageRequest::from_query(Some("3"), Some("25"));
/// assert_eq!(request.page(), 3);
/// assert_eq!(request.limit(), 25);
/// assert_eq!(request.offset(), 50);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Build a request from already-typed values, rejecting zeroes.
    ///
    /// `limit` is clamped to [`MAX_LIMIT`].
    ///
    /// # Errors
    /// Returns [`PageRequestError`] when either value is zero.
    pub fn new(page: u32, limit: u32) -> Result<Self, PageRequestError> {
        if page == 0 {
            return Err(PageRequestError::ZeroPage);
        }
        if limit == 0 {
            return Err(PageRequestError::ZeroLimit);
        }
        Ok(Self {
            page,
            limit: limit.min(MAX_LIMIT),
        })
    }

    /// Coerce raw query-string values into a request.
    ///
    /// Each value is read as its leading integer (so `"5abc"` is `5`).
    /// Missing, non-numeric, zero or negative input falls back to
    /// [`DEFAULT_PAGE`] and [`DEFAULT_LIMIT`].
    #[must_use]
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let page = page
            .and_then(leading_positive_integer)
            .unwrap_or(DEFAULT_PAGE);
        let limit = limit
            .and_then(leading_positive_integer)
            .map_or(DEFAULT_LIMIT, |value| value.min(MAX_LIMIT));
        Self { page, limit }
    }

    /// One-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Maximum number of rows on the page.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of rows to skip: `(page - 1) * limit`.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

fn leading_positive_integer(raw: &str) -> Option<u32> {
    let trimmed = raw.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits: String = unsigned.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    // Overlong digit runs saturate rather than fall back to the default.
    let value = digits.parse::<u64>().unwrap_or(u64::MAX);
    let value = u32::try_from(value).unwrap_or(u32::MAX);
    (value > 0).then_some(value)
}

/// Pagination metadata returned alongside a page of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// One-based page number that was served.
    pub current_page: u32,
    /// `ceil(total_records / per_page)`.
    pub total_pages: u64,
    /// Rows matching the filter across all pages.
    pub total_records: u64,
    /// Page size that was applied.
    pub per_page: u32,
    /// Following page number, when one exists.
    pub next_page: Option<u32>,
    /// Preceding page number, when one exists.
    pub prev_page: Option<u32>,
}

impl PageInfo {
    /// Derive metadata from the request and the filtered total.
    ///
    /// # Examples
    /// ```
    /// use pagination::{PageInfo, PageRequest};
    ///
    /// let request = PageRequest::new(2, 10).expect("valid request");
    /// let info = PageInfo::new(request, 21);
    /// assert_eq!(info.total_pages, 3);
    /// assert_eq!(info.next_page, Some(3));
    /// assert_eq!(info.prev_page, Some(1));
    /// ```
    #[must_use]
    pub fn new(request: PageRequest, total_records: u64) -> Self {
        let total_pages = total_records.div_ceil(u64::from(request.limit()));
        let current_page = request.page();
        let next_page = (u64::from(current_page) < total_pages)
            .then(|| current_page.checked_add(1))
            .flatten();
        let prev_page = (current_page > 1).then(|| current_page - 1);
        Self {
            current_page,
            total_pages,
            total_records,
            per_page: request.limit(),
            next_page,
            prev_page,
        }
    }
}

/// A page of rows together with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Rows on this page, at most `info.per_page` of them.
    pub items: Vec<T>,
    /// Envelope metadata.
    pub info: PageInfo,
}

impl<T> Page<T> {
    /// Assemble a page from rows and the filtered total.
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total_records: u64) -> Self {
        Self {
            items,
            info: PageInfo::new(request, total_records),
        }
    }

    /// Transform each row while keeping the metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            info: self.info,
        }
    }
}
