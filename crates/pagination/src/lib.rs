//! Page request and page envelope primitives shared by list endpoints.
//!
//! Backend list endpoints page with a zero-based page number and a bounded
//! page size. [`PageRequest`] validates and encodes those parameters as URL
//! query pairs, and [`Paginated`] decodes the envelope returned alongside
//! the items.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Largest page size accepted by [`PageRequest::new`].
pub const MAX_PAGE_SIZE: u32 = 100;

/// Errors raised when constructing a [`PageRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// Page size was zero.
    #[error("page size must be at least 1")]
    ZeroSize,
    /// Page size exceeded [`MAX_PAGE_SIZE`].
    #[error("page size must be at most {max}")]
    SizeTooLarge {
        /// Maximum allowed size.
        max: u32,
    },
}

/// Zero-based page number plus page size.
///
/// # Examples
/// ```
/// use pagination::PageRequest;
///
/// let page = PageRequest::new(2, 50).expect("valid page");
/// assert_eq!(page.query_pairs(), vec![("page", "2".to_owned()), ("size", "50".to_owned())]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Validate and construct a page request.
    ///
    /// # Errors
    ///
    /// Returns [`PageRequestError`] when `size` is zero or above
    /// [`MAX_PAGE_SIZE`].
    pub fn new(page: u32, size: u32) -> Result<Self, PageRequestError> {
        if size == 0 {
            return Err(PageRequestError::ZeroSize);
        }
        if size > MAX_PAGE_SIZE {
            return Err(PageRequestError::SizeTooLarge { max: MAX_PAGE_SIZE });
        }
        Ok(Self { page, size })
    }

    /// First page with the same size.
    #[must_use]
    pub const fn first(self) -> Self {
        Self {
            page: 0,
            size: self.size,
        }
    }

    /// Same size, a different page number.
    #[must_use]
    pub const fn with_page(self, page: u32) -> Self {
        Self {
            page,
            size: self.size,
        }
    }

    /// Zero-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Items per page.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Query pairs in the order the backend documents them.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![("page", self.page.to_string()), ("size", self.size.to_string())]
    }
}

/// Pagination metadata returned with each page of items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    /// Zero-based page number of this page.
    #[serde(default)]
    pub page: u32,
    /// Requested page size.
    #[serde(default)]
    pub size: u32,
    /// Total items across all pages.
    #[serde(default, alias = "totalElements")]
    pub total_items: u64,
    /// Total number of pages.
    #[serde(default)]
    pub total_pages: u32,
}

impl PageMeta {
    /// Whether a page after this one exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page.saturating_add(1) < self.total_pages
    }

    /// Whether a page before this one exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 0
    }
}

/// A page of items plus its metadata.
///
/// The envelope accepts `items` or `content` for the item array so it decodes
/// both backend list shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    /// Items on this page.
    #[serde(alias = "content")]
    pub items: Vec<T>,
    /// Page metadata.
    #[serde(flatten)]
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    /// Wrap a full, unpaged list as a single page.
    #[must_use]
    pub fn single_page(items: Vec<T>) -> Self {
        let total = items.len();
        Self {
            meta: PageMeta {
                page: 0,
                size: u32::try_from(total).unwrap_or(u32::MAX),
                total_items: u64::try_from(total).unwrap_or(u64::MAX),
                total_pages: u32::from(total > 0),
            },
            items,
        }
    }
}
