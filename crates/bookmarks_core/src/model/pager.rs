//! Page window over an ordinal result sequence.
//!
//! # Invariants
//! - Page numbers are 1-based, indexes are 0-based.
//! - `Pager::All` makes every index visible.
//! - Callers normalize page numbers below 1 (see [`normalize_page`]).

/// Visibility predicate and page arithmetic for list results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Pager {
    /// No pagination requested.
    #[default]
    All,
    /// One contiguous page of `size` rows.
    Page { page: u32, size: u32 },
}

impl Pager {
    /// Creates a page window. Returns `None` when `page` or `size` is zero.
    pub fn new(page: u32, size: u32) -> Option<Self> {
        if page == 0 || size == 0 {
            return None;
        }
        Some(Self::Page { page, size })
    }

    /// Returns whether the row at `index` falls inside the window.
    pub fn is_visible(&self, index: usize) -> bool {
        match *self {
            Self::All => true,
            Self::Page { page, size } => {
                let size = size as usize;
                let start = (page as usize).saturating_sub(1).saturating_mul(size);
                index >= start && index - start < size
            }
        }
    }

    /// Returns the 1-based page containing `index`.
    pub fn page_of(&self, index: usize) -> u32 {
        match *self {
            Self::All => 1,
            Self::Page { size, .. } => (index / size.max(1) as usize) as u32 + 1,
        }
    }

    /// Returns the number of pages needed for `total` rows. Zero rows is zero pages.
    pub fn page_count(&self, total: usize) -> u32 {
        match total {
            0 => 0,
            n => self.page_of(n - 1),
        }
    }

    /// Returns page numbers `1..=page_count(total)` for link rendering.
    pub fn page_numbers(&self, total: usize) -> Vec<u32> {
        (1..=self.page_count(total)).collect()
    }
}

/// Normalizes a caller-supplied page number; anything below 1 becomes 1.
pub fn normalize_page(raw: i64) -> u32 {
    if raw < 1 {
        1
    } else {
        u32::try_from(raw).unwrap_or(u32::MAX)
    }
}
