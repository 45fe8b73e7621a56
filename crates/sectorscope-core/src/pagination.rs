use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Page sizes offered by the listing.
pub const PAGE_SIZES: [u32; 6] = [10, 20, 30, 50, 100, 200];
pub const DEFAULT_PAGE_SIZE: u32 = 30;

/// Validated listing page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageSize(u32);

impl PageSize {
    pub fn new(value: u32) -> Result<Self, ValidationError> {
        if PAGE_SIZES.contains(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::InvalidPageSize { value })
        }
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(DEFAULT_PAGE_SIZE)
    }
}

impl TryFrom<u32> for PageSize {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageSize> for u32 {
    fn from(value: PageSize) -> Self {
        value.0
    }
}

/// Current page, page size and the last total reported by the backend.
///
/// `page` is always within `1..=max(total_pages, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    page: u32,
    page_size: PageSize,
    count: u64,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: PageSize::default(),
            count: 0,
        }
    }
}

impl PaginationState {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    pub const fn page(&self) -> u32 {
        self.page
    }

    pub const fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub const fn count(&self) -> u64 {
        self.count
    }

    pub fn total_pages(&self) -> u32 {
        let pages = self.count.div_ceil(u64::from(self.page_size.get()));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    fn last_page(&self) -> u32 {
        self.total_pages().max(1)
    }

    /// Moves to `page`, clamped into range. Returns the page landed on.
    pub fn go_to_page(&mut self, page: u32) -> u32 {
        self.page = page.clamp(1, self.last_page());
        self.page
    }

    /// Returns whether the page changed.
    pub fn next_page(&mut self) -> bool {
        let before = self.page;
        self.go_to_page(self.page.saturating_add(1));
        self.page != before
    }

    /// Returns whether the page changed.
    pub fn previous_page(&mut self) -> bool {
        let before = self.page;
        self.go_to_page(self.page.saturating_sub(1));
        self.page != before
    }

    pub fn has_next(&self) -> bool {
        self.page < self.last_page()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        self.page_size = page_size;
        self.page = 1;
    }

    pub fn reset_page(&mut self) {
        self.page = 1;
    }

    /// Records a new total. Returns `true` when the current page was out of
    /// range and had to be clamped.
    pub fn set_count(&mut self, count: u64) -> bool {
        self.count = count;
        let before = self.page;
        self.page = self.page.clamp(1, self.last_page());
        self.page != before
    }

    /// One-based positions of the first and last rows on this page.
    pub fn visible_range(&self) -> Option<(u64, u64)> {
        if self.count == 0 {
            return None;
        }
        let size = u64::from(self.page_size.get());
        let start = u64::from(self.page - 1) * size + 1;
        let end = (start + size - 1).min(self.count);
        Some((start, end))
    }
}
