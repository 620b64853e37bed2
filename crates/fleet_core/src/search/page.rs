//! Page-number pagination.
//!
//! # Invariants
//! - Page numbers are 1-based.
//! - An empty collection still has exactly one (empty) page.
//! - Requests past the last page are rejected, never clamped.

use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default list page size.
pub const DEFAULT_PAGE_SIZE: u32 = 5;

/// Requested page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u32,
    pub size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            number: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Builds a request; a zero `size` falls back to the default.
    pub fn new(number: u32, size: u32) -> Self {
        Self {
            number,
            size: if size == 0 { DEFAULT_PAGE_SIZE } else { size },
        }
    }

    /// Parses the raw `page` query value. Absent or blank means page 1.
    pub fn parse(raw: Option<&str>, size: u32) -> Result<Self, PageError> {
        let number = match raw.map(str::trim).filter(|value| !value.is_empty()) {
            None => 1,
            Some(value) => value
                .parse::<u32>()
                .map_err(|_| PageError::NotANumber(value.to_string()))?,
        };
        if number == 0 {
            return Err(PageError::OutOfRange {
                page: 0,
                num_pages: 1,
            });
        }
        Ok(Self::new(number, size))
    }

    /// Validates the request against `total` rows and returns `(limit, offset)`.
    pub fn window(&self, total: u64) -> Result<(u32, u64), PageError> {
        let num_pages = num_pages(total, self.size);
        if self.number == 0 || self.number > num_pages {
            return Err(PageError::OutOfRange {
                page: self.number,
                num_pages,
            });
        }
        let offset = u64::from(self.number - 1) * u64::from(self.size);
        Ok((self.size, offset))
    }
}

fn num_pages(total: u64, size: u32) -> u32 {
    let size = u64::from(size.max(1));
    let pages = total.div_ceil(size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Invalid page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    NotANumber(String),
    OutOfRange { page: u32, num_pages: u32 },
}

impl Display for PageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotANumber(value) => write!(f, "page `{value}` is not a number"),
            Self::OutOfRange { page, num_pages } => {
                write!(f, "page {page} is out of range 1..={num_pages}")
            }
        }
    }
}

impl Error for PageError {}

/// One page of list results plus paginator metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total rows matching the filter, across all pages.
    pub total: u64,
    pub number: u32,
    pub size: u32,
}

impl<T> Page<T> {
    pub fn num_pages(&self) -> u32 {
        num_pages(self.total, self.size)
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages()
    }
}

#[cfg(test)]
mod tests {
    use super::{Page, PageError, PageRequest, DEFAULT_PAGE_SIZE};

    #[test]
    fn parse_defaults_to_first_page() {
        assert_eq!(PageRequest::parse(None, 5).unwrap().number, 1);
        assert_eq!(PageRequest::parse(Some(""), 5).unwrap().number, 1);
        assert_eq!(PageRequest::parse(Some("3"), 0).unwrap().size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn parse_rejects_garbage_and_zero() {
        assert!(matches!(
            PageRequest::parse(Some("abc"), 5),
            Err(PageError::NotANumber(_))
        ));
        assert!(matches!(
            PageRequest::parse(Some("0"), 5),
            Err(PageError::OutOfRange { .. })
        ));
    }

    #[test]
    fn empty_collection_has_one_page() {
        let request = PageRequest::default();
        assert_eq!(request.window(0), Ok((DEFAULT_PAGE_SIZE, 0)));
        assert_eq!(
            PageRequest::new(2, 5).window(0),
            Err(PageError::OutOfRange {
                page: 2,
                num_pages: 1
            })
        );
    }

    #[test]
    fn window_offsets_by_page() {
        assert_eq!(PageRequest::new(3, 5).window(11), Ok((5, 10)));
        assert!(PageRequest::new(4, 5).window(15).is_err());
    }

    #[test]
    fn page_flags_follow_position() {
        let page = Page {
            items: vec![1, 2],
            total: 12,
            number: 2,
            size: 5,
        };
        assert_eq!(page.num_pages(), 3);
        assert!(page.has_previous());
        assert!(page.has_next());
    }
}
