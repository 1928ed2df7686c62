//! Page/per_page query handling and list envelopes

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult, FieldErrors};

pub const DEFAULT_PER_PAGE: i64 = 20;
pub const MAX_PER_PAGE: i64 = 100;

/// Raw `page` / `per_page` query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// A resolved page window (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    /// Rows to skip; `None` when the window lies beyond any addressable row
    pub fn checked_offset(&self) -> Option<i64> {
        (self.page - 1).checked_mul(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        self.checked_offset().unwrap_or(i64::MAX)
    }
}

impl PageQuery {
    /// `None` when the caller asked for neither parameter
    pub fn resolve(&self) -> AppResult<Option<PageRequest>> {
        if self.page.is_none() && self.per_page.is_none() {
            return Ok(None);
        }

        let mut errors = FieldErrors::new();
        let page = self.page.unwrap_or(1);
        let per_page = self.per_page.unwrap_or(DEFAULT_PER_PAGE);
        if page < 1 {
            errors.add("page", "Must be at least 1.");
        }
        if per_page < 1 {
            errors.add("per_page", "Must be at least 1.");
        }
        errors.into_result()?;

        let window = PageRequest {
            page,
            per_page: per_page.min(MAX_PER_PAGE),
        };
        if window.checked_offset().is_none() {
            return Err(AppError::InvalidFields(FieldErrors::single("page", "Too large.")));
        }
        Ok(Some(window))
    }
}

/// Paginated response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// Total number of records
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    /// Number of pages at this page size
    pub pages: i64,
}

/// Either a bare sequence or a paginated envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    All(Vec<T>),
    Page(Paginated<T>),
}

impl<T> Listing<T> {
    pub fn page(items: Vec<T>, total: i64, window: PageRequest) -> Self {
        let pages = if total == 0 {
            0
        } else {
            (total + window.per_page - 1) / window.per_page
        };
        Listing::Page(Paginated {
            items,
            total,
            page: window.page,
            per_page: window.per_page,
            pages,
        })
    }

    pub fn items(&self) -> &[T] {
        match self {
            Listing::All(items) => items,
            Listing::Page(page) => &page.items,
        }
    }
}
