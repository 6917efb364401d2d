//! Page/limit pagination for the dashboard API.
//!
//! ```rust,ignore
//! let page = params.validate();
//! let (items, total) = Report::find_filtered(&filter, &page, pool).await?;
//! let meta = Pagination::new(&page, total);
//! ```

use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

/// Raw query parameters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    /// Clamp to `page >= 1` and `1 <= limit <= 100`.
    pub fn validate(&self) -> ValidatedPage {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        ValidatedPage { page, limit }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatedPage {
    pub page: i64,
    pub limit: i64,
}

impl ValidatedPage {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: &ValidatedPage, total: i64) -> Self {
        Self {
            page: page.page,
            limit: page.limit,
            total,
            total_pages: (total + page.limit - 1) / page.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_clamping() {
        let page = PageParams::default().validate();
        assert_eq!(page, ValidatedPage { page: 1, limit: 20 });

        let page = PageParams {
            page: Some(0),
            limit: Some(1000),
        }
        .validate();
        assert_eq!(page, ValidatedPage { page: 1, limit: 100 });

        let page = PageParams {
            page: Some(3),
            limit: Some(0),
        }
        .validate();
        assert_eq!(page.limit, 1);
        assert_eq!(page.offset(), 2);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let page = ValidatedPage { page: 1, limit: 20 };
        assert_eq!(Pagination::new(&page, 0).total_pages, 0);
        assert_eq!(Pagination::new(&page, 20).total_pages, 1);
        assert_eq!(Pagination::new(&page, 21).total_pages, 2);
    }
}
