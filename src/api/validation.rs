use axum::{Json, extract::rejection::JsonRejection};
use serde::Deserialize;

use super::ApiError;
use crate::config::PaginationConfig;

/// Unwraps a JSON body, keeping a rejection as its message.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, String> {
    body.map(|Json(value)| value)
        .map_err(|rejection| rejection.body_text())
}

/// Raw `page` / `limit` query values. Kept as strings so garbage falls back
/// to the defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Largest offset SQLite can bind.
const MAX_OFFSET: u64 = i64::MAX.unsigned_abs();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

fn positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
}

impl PageRequest {
    #[must_use]
    pub fn from_params(params: &PageParams, config: &PaginationConfig) -> Self {
        let limit = positive(params.limit.as_deref())
            .unwrap_or(config.default_page_size)
            .min(config.max_page_size)
            .max(1);
        // Any page this far out is past the end anyway.
        let page = positive(params.page.as_deref())
            .unwrap_or(1)
            .min(MAX_OFFSET / limit + 1);

        Self { page, limit }
    }

    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Pages past the last one are rejected; the first page always exists.
    pub fn check(&self, total: u64) -> Result<(), ApiError> {
        if self.page > 1 && self.offset() >= total {
            return Err(ApiError::not_found("Invalid page."));
        }
        Ok(())
    }

    #[must_use]
    pub const fn has_next(&self, total: u64) -> bool {
        self.offset().saturating_add(self.limit) < total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<&str>, limit: Option<&str>) -> PageParams {
        PageParams {
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn defaults_apply_to_missing_or_bad_values() {
        let config = PaginationConfig::default();
        let request = PageRequest::from_params(&params(None, None), &config);
        assert_eq!(request, PageRequest { page: 1, limit: 6 });

        let request = PageRequest::from_params(&params(Some("abc"), Some("-3")), &config);
        assert_eq!(request, PageRequest { page: 1, limit: 6 });

        let request = PageRequest::from_params(&params(Some("0"), Some("0")), &config);
        assert_eq!(request, PageRequest { page: 1, limit: 6 });
    }

    #[test]
    fn limit_is_clamped() {
        let config = PaginationConfig::default();
        let request = PageRequest::from_params(&params(Some("2"), Some("1000")), &config);
        assert_eq!(request.limit, config.max_page_size);
        assert_eq!(request.offset(), config.max_page_size);
    }

    #[test]
    fn huge_pages_keep_the_offset_bindable() {
        let config = PaginationConfig::default();
        let request = PageRequest::from_params(
            &params(Some("9223372036854775807"), Some("2")),
            &config,
        );
        assert!(request.offset() <= MAX_OFFSET);
        assert!(request.check(10).is_err());

        let request =
            PageRequest::from_params(&params(Some("18446744073709551615"), None), &config);
        assert!(request.offset() <= MAX_OFFSET);
    }

    #[test]
    fn pages_past_the_end_are_rejected() {
        let request = PageRequest { page: 3, limit: 2 };
        assert!(request.check(4).is_err());
        assert!(request.check(5).is_ok());
        assert!(PageRequest { page: 1, limit: 2 }.check(0).is_ok());
    }

    #[test]
    fn next_exists_while_rows_remain() {
        let request = PageRequest { page: 1, limit: 2 };
        assert!(request.has_next(3));
        assert!(!request.has_next(2));
    }
}
