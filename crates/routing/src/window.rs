use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::error::RouteError;

/// Inclusive reporting window `[end - days, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: u32,
}

impl ReportWindow {
    pub fn ending(end: NaiveDate, days: u32) -> Result<Self, RouteError> {
        if days == 0 {
            return Err(RouteError::InvalidWindow("days must be at least 1".into()));
        }
        let start = end
            .checked_sub_signed(Duration::days(i64::from(days)))
            .ok_or_else(|| RouteError::InvalidWindow(format!("{days} days before {end} is out of range")))?;
        Ok(Self { start, end, days })
    }

    /// Window ending today (UTC).
    pub fn trailing(days: u32) -> Result<Self, RouteError> {
        Self::ending(Utc::now().date_naive(), days)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl std::fmt::Display for ReportWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {} (last {} days)", self.start, self.end, self.days)
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}
