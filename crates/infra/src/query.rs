//! Pagination and date-range policy for the pickup-point listing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pvz_core::DomainError;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
/// Larger limits are clamped to this value.
pub const MAX_LIMIT: u32 = 100;

/// Raw listing parameters as supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Normalized pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Missing or non-positive values fall back to the defaults; `limit` is
    /// capped at [`MAX_LIMIT`].
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = match page {
            Some(p) if p > 0 => u32::try_from(p).unwrap_or(u32::MAX),
            _ => DEFAULT_PAGE,
        };
        let limit = match limit {
            Some(l) if l > 0 => l.min(i64::from(MAX_LIMIT)) as u32,
            _ => DEFAULT_LIMIT,
        };
        Self { page, limit }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

/// Inclusive creation-time range of pickup-points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Missing `start` means the Unix epoch, missing `end` means `now`.
    pub fn new(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let start = start.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        let end = end.unwrap_or(now);
        if start > end {
            return Err(DomainError::validation(format!(
                "startDate {start} is after endDate {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Everything the listing query needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListWindow {
    pub range: DateRange,
    pub limit: u32,
    pub offset: u64,
}

impl ListQuery {
    pub fn normalize(&self, now: DateTime<Utc>) -> Result<ListWindow, DomainError> {
        let range = DateRange::new(self.start_date, self.end_date, now)?;
        let pagination = Pagination::new(self.page, self.limit);
        Ok(ListWindow {
            range,
            limit: pagination.limit,
            offset: pagination.offset(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn defaults_apply_when_missing() {
        let now = Utc.with_ymd_and_hms(2025, 4, 10, 9, 0, 0).unwrap();
        let window = ListQuery::default().normalize(now).unwrap();

        assert_eq!(window.limit, 10);
        assert_eq!(window.offset, 0);
        assert_eq!(window.range.start, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(window.range.end, now);
    }

    #[test]
    fn non_positive_values_are_coerced() {
        assert_eq!(Pagination::new(Some(0), Some(-5)), Pagination::default());
        assert_eq!(Pagination::new(Some(-1), Some(0)), Pagination::default());
    }

    #[test]
    fn second_page_of_ten_skips_ten() {
        let p = Pagination::new(Some(2), Some(10));
        assert_eq!(p.offset(), 10);
        assert_eq!(p.limit, 10);
    }

    #[test]
    fn limit_is_capped() {
        assert_eq!(Pagination::new(None, Some(10_000)).limit, MAX_LIMIT);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let now = Utc::now();
        let query = ListQuery {
            start_date: Some(now),
            end_date: Some(now - chrono::Duration::days(1)),
            ..ListQuery::default()
        };
        match query.normalize(now).unwrap_err() {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for inverted range"),
        }
    }

    #[test]
    fn range_is_inclusive() {
        let now = Utc::now();
        let range = DateRange::new(Some(now), Some(now), now).unwrap();
        assert!(range.contains(now));
    }

    #[test]
    fn query_deserializes_camel_case() {
        let q: ListQuery = serde_json::from_str(
            r#"{"startDate":"2025-01-01T00:00:00Z","page":3,"limit":5}"#,
        )
        .unwrap();
        assert_eq!(q.page, Some(3));
        assert_eq!(q.limit, Some(5));
        assert!(q.start_date.is_some());
        assert!(q.end_date.is_none());
    }

    proptest! {
        #[test]
        fn normalized_pagination_is_always_usable(page in any::<Option<i64>>(), limit in any::<Option<i64>>()) {
            let p = Pagination::new(page, limit);
            prop_assert!(p.page >= 1);
            prop_assert!((1..=MAX_LIMIT).contains(&p.limit));
            prop_assert_eq!(p.offset(), u64::from(p.page - 1) * u64::from(p.limit));
        }
    }
}
