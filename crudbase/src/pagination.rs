//! Length-aware pagination.
//!
//! A [`Page`] is one slice of a result set together with the numbers needed to
//! render `meta` and `links` in a response envelope. Page numbers are 1-based.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::ToSchema;

/// Items per page when the caller does not say otherwise
pub const DEFAULT_PER_PAGE: u64 = 15;

const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

/// Which page to fetch and where its links point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    per_page: u64,
    path: String,
}

impl PageRequest {
    /// Page numbers and sizes below 1 are raised to 1.
    #[must_use]
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.max(1),
            path: "/".to_string(),
        }
    }

    /// Base URL used for the page links, e.g. `/api/tasks`
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn page(&self) -> u64 {
        self.page
    }

    #[must_use]
    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of rows skipped before this page, capped at what SQL backends
    /// accept as a signed 64-bit offset
    #[must_use]
    pub fn offset(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.per_page)
            .min(MAX_OFFSET)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

/// Pagination numbers rendered as the `meta` member of an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageMeta {
    pub current_page: u64,
    /// 1-based index of the first item on the page, `null` for an empty page
    pub from: Option<u64>,
    /// 1-based index of the last item on the page, `null` for an empty page
    pub to: Option<u64>,
    pub per_page: u64,
    pub total: u64,
    pub last_page: u64,
}

/// Navigation links rendered as the `links` member of an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageLinks {
    pub first: String,
    pub last: String,
    pub prev: Option<String>,
    pub next: Option<String>,
}

/// One page of results
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    items: Vec<T>,
    current_page: u64,
    per_page: u64,
    total: u64,
    path: String,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, total: u64, request: &PageRequest) -> Self {
        Self {
            items,
            current_page: request.page(),
            per_page: request.per_page(),
            total,
            path: request.path().to_string(),
        }
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    #[must_use]
    pub fn current_page(&self) -> u64 {
        self.current_page
    }

    #[must_use]
    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Always at least 1, even for an empty result set
    #[must_use]
    pub fn last_page(&self) -> u64 {
        self.total.div_ceil(self.per_page).max(1)
    }

    #[must_use]
    pub fn first_item(&self) -> Option<u64> {
        if self.items.is_empty() {
            None
        } else {
            Some(
                (self.current_page - 1)
                    .saturating_mul(self.per_page)
                    .saturating_add(1),
            )
        }
    }

    #[must_use]
    pub fn last_item(&self) -> Option<u64> {
        self.first_item()
            .map(|first| first + self.items.len() as u64 - 1)
    }

    #[must_use]
    pub fn has_more_pages(&self) -> bool {
        self.current_page < self.last_page()
    }

    /// Link to `page` on this page's path
    #[must_use]
    pub fn url(&self, page: u64) -> String {
        let separator = if self.path.contains('?') { '&' } else { '?' };
        format!("{}{separator}page={}", self.path, page.max(1))
    }

    #[must_use]
    pub fn previous_page_url(&self) -> Option<String> {
        (self.current_page > 1).then(|| self.url(self.current_page - 1))
    }

    #[must_use]
    pub fn next_page_url(&self) -> Option<String> {
        self.has_more_pages()
            .then(|| self.url(self.current_page + 1))
    }

    #[must_use]
    pub fn meta(&self) -> PageMeta {
        PageMeta {
            current_page: self.current_page,
            from: self.first_item(),
            to: self.last_item(),
            per_page: self.per_page,
            total: self.total,
            last_page: self.last_page(),
        }
    }

    #[must_use]
    pub fn links(&self) -> PageLinks {
        PageLinks {
            first: self.url(1),
            last: self.url(self.last_page()),
            prev: self.previous_page_url(),
            next: self.next_page_url(),
        }
    }

    /// Convert the items while keeping the pagination numbers
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            current_page: self.current_page,
            per_page: self.per_page,
            total: self.total,
            path: self.path,
        }
    }
}

impl PageMeta {
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "current_page": self.current_page,
            "from": self.from,
            "to": self.to,
            "per_page": self.per_page,
            "total": self.total,
            "last_page": self.last_page,
        })
    }
}

impl PageLinks {
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "first": self.first,
            "last": self.last,
            "prev": self.prev,
            "next": self.next,
        })
    }
}
