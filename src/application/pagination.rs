//! Page-number pagination with lenient request handling.
//!
//! Listing endpoints accept the page number as an untrusted query string.
//! Anything that is not a positive integer resolves to the first page, and a
//! page past the end resolves to the last page; pagination input is never an
//! error.

use serde::Serialize;

/// Default number of posts per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 3;

/// Computes page boundaries for a known total row count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total: u64,
    per_page: u32,
}

/// Resolved position within a paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub number: u32,
    pub num_pages: u32,
    pub total: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl Paginator {
    pub fn new(total: u64, per_page: u32) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
        }
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Number of pages, always at least one so an empty listing still has a
    /// valid page 1.
    pub fn num_pages(&self) -> u32 {
        let pages = self.total.div_ceil(u64::from(self.per_page)).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Resolve a raw page parameter to a valid 1-indexed page number.
    pub fn resolve(&self, requested: Option<&str>) -> u32 {
        match requested.and_then(parse_page) {
            None | Some(0) => 1,
            Some(number) => {
                let last = u64::from(self.num_pages());
                u32::try_from(number.min(last)).unwrap_or(u32::MAX)
            }
        }
    }

    /// Row offset of the first item on `page`.
    pub fn offset(&self, page: u32) -> u64 {
        u64::from(page.saturating_sub(1)) * u64::from(self.per_page)
    }

    pub fn page_info(&self, page: u32) -> PageInfo {
        let num_pages = self.num_pages();
        PageInfo {
            number: page,
            num_pages,
            total: self.total,
            has_previous: page > 1,
            has_next: page < num_pages,
        }
    }
}

/// Parse a page parameter. All-digit values too large for `u64` count as
/// "past the end" rather than malformed, so they clamp to the last page.
fn parse_page(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    match trimmed.parse::<u64>() {
        Ok(number) => Some(number),
        Err(_) if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) => {
            Some(u64::MAX)
        }
        Err(_) => None,
    }
}
