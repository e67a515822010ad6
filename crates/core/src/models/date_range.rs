use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Maximum reporting window in days (two years).
pub const MAX_RANGE_DAYS: i64 = 731;

/// Inclusive calendar date range used for every fetch and aggregation.
///
/// **Invariant**: `start <= end`. The only way to build a `DateRange` is
/// through the validating constructors, and deserialization goes through
/// them too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = CoreError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        DateRange::new(raw.start, raw.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::ValidationError(format!(
                "start date ({start}) must not be after end date ({end})"
            )));
        }
        let days = (end - start).num_days() + 1;
        if days > MAX_RANGE_DAYS {
            return Err(CoreError::ValidationError(format!(
                "range of {days} days exceeds maximum of {MAX_RANGE_DAYS} days"
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse two `YYYY-MM-DD` strings (surrounding whitespace ignored).
    pub fn parse(start: &str, end: &str) -> Result<Self, CoreError> {
        Self::new(parse_date("start", start)?, parse_date("end", end)?)
    }

    pub fn single_day(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// The `days` most recent days ending at `today`, e.g. the form default of 30.
    pub fn last_n_days(today: NaiveDate, days: u32) -> Result<Self, CoreError> {
        if days == 0 {
            return Err(CoreError::ValidationError(
                "range must cover at least one day".into(),
            ));
        }
        Self::new(today - Duration::days(i64::from(days) - 1), today)
    }

    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of calendar days covered, both ends included.
    #[must_use]
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Iterate over every day in the range, oldest first.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

fn parse_date(label: &str, value: &str) -> Result<NaiveDate, CoreError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        CoreError::ValidationError(format!(
            "invalid {label} date '{value}': {e} (expected YYYY-MM-DD)"
        ))
    })
}
