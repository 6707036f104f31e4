use chrono::{NaiveDate, NaiveDateTime};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dates;
use crate::error::ApiError;

/// Category value the dashboard sends when nothing is selected.
pub const ALL_CATEGORIES: &str = "All Categories";

/// Date range and category scoping every analytics query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsFilter {
    #[serde(default, deserialize_with = "dates::deserialize_opt_date")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "dates::deserialize_opt_date")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Query-string form of the filter (`?startDate=..&endDate=..&category=..`).
#[derive(Debug, Default, FromForm)]
pub struct FilterParams {
    #[field(name = "startDate")]
    pub start_date: Option<String>,
    #[field(name = "endDate")]
    pub end_date: Option<String>,
    pub category: Option<String>,
}

impl TryFrom<FilterParams> for AnalyticsFilter {
    type Error = ApiError;

    fn try_from(params: FilterParams) -> Result<Self, Self::Error> {
        let date = |raw: Option<String>, name: &str| -> Result<Option<NaiveDate>, ApiError> {
            match raw.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(s) => dates::parse_date(s)
                    .map(Some)
                    .ok_or_else(|| ApiError::Validation(format!("Invalid {}: '{}'", name, s))),
            }
        };
        Ok(AnalyticsFilter {
            start_date: date(params.start_date, "startDate")?,
            end_date: date(params.end_date, "endDate")?,
            category: params.category,
        })
    }
}

impl AnalyticsFilter {
    /// Category restriction for pageview queries: exact, case-sensitive match.
    pub fn pageview_category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
    }

    /// Category restriction for article queries: compared trimmed and lowercased.
    pub fn article_category(&self) -> Option<String> {
        self.category
            .as_deref()
            .filter(|c| !c.trim().is_empty() && *c != ALL_CATEGORIES)
            .map(|c| c.trim().to_lowercase())
    }

    /// Inclusive UTC bounds for `viewed_at`: start of the start day through the
    /// last microsecond of the end day, both taken in `tz`.
    pub fn viewed_window(&self, tz: Tz) -> (Option<NaiveDateTime>, Option<NaiveDateTime>) {
        let start = self
            .start_date
            .map(|d| dates::local_to_utc(tz, dates::start_of_day(d)));
        let end = self
            .end_date
            .map(|d| dates::local_end_to_utc(tz, dates::end_of_day(d)));
        (start, end)
    }
}
