use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use timeledger_core::constants::DATE_FORMAT;

use crate::error::ValueError;

/// Inclusive date interval with an optional open end.
///
/// An unset `start_date` together with an unset `end_date` is the
/// "undefined" range read back from `NULL` columns. Containment treats an
/// unset start as unbounded below and an unset end as unbounded above.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DateRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl DateRange {
    pub const UNDEFINED: Self = Self {
        start_date: None,
        end_date: None,
    };

    #[must_use]
    pub const fn new(start_date: NaiveDate, end_date: Option<NaiveDate>) -> Self {
        Self {
            start_date: Some(start_date),
            end_date,
        }
    }

    #[must_use]
    pub const fn open_ended(start_date: NaiveDate) -> Self {
        Self::new(start_date, None)
    }

    #[must_use]
    pub const fn bounded(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self::new(start_date, Some(end_date))
    }

    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        self.start_date.is_none() && self.end_date.is_none()
    }

    #[must_use]
    pub const fn is_open_ended(&self) -> bool {
        self.end_date.is_none()
    }

    /// ## Summary
    /// True iff `start ≤ date` and (`end` is unset or `date ≤ end`).
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date.is_none_or(|start| start <= date)
            && self.end_date.is_none_or(|end| date <= end)
    }

    /// ## Summary
    /// Whether the range shares at least one day with `[from, to]`.
    #[must_use]
    pub fn intersects(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.start_date.is_none_or(|start| start <= to)
            && self.end_date.is_none_or(|end| from <= end)
    }

    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let starts_before_other_ends = match (self.start_date, other.end_date) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        };
        let ends_after_other_starts = match (self.end_date, other.start_date) {
            (Some(end), Some(start)) => start <= end,
            _ => true,
        };
        starts_before_other_ends && ends_after_other_starts
    }

    /// ## Summary
    /// Whether `next` takes over on the last day of this range: this range
    /// ends on the day `next` starts, and started strictly earlier.
    #[must_use]
    pub fn hands_off_to(&self, next: &Self) -> bool {
        self.end_date.is_some()
            && self.end_date == next.start_date
            && self.start_date < next.start_date
    }

    /// ## Summary
    /// A range is well formed when its end, if any, is not before its start.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }

    /// ## Summary
    /// Builds a range from two lenient date strings.
    ///
    /// ## Errors
    /// Returns an error if either non-empty string is not a recognizable date.
    pub fn parse(start: &str, end: &str) -> Result<Self, ValueError> {
        Ok(Self {
            start_date: parse_lenient_date(start)?,
            end_date: parse_lenient_date(end)?,
        })
    }
}

/// ## Summary
/// Parses a date written as `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or RFC 3339.
///
/// Empty input and the zero date `0001-01-01` both read as `None`. For an
/// RFC 3339 timestamp the calendar date in its own offset is kept.
///
/// ## Errors
/// Returns `ValueError::InvalidDate` when no format matches.
pub fn parse_lenient_date(value: &str) -> Result<Option<NaiveDate>, ValueError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    let date = NaiveDate::parse_from_str(value, DATE_FORMAT)
        .or_else(|_e| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date())
        })
        .or_else(|_e| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
        .or_else(|_e| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_e| ValueError::InvalidDate(value.to_string()))?;

    if date == NaiveDate::MIN || date == zero_date() {
        return Ok(None);
    }

    Ok(Some(date))
}

fn zero_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or(NaiveDate::MIN)
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

#[derive(Serialize)]
struct DateRangeColumn {
    start_date: String,
    end_date: String,
}

#[derive(Deserialize)]
struct LenientDateRangeColumn {
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
}

impl Serialize for DateRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DateRangeColumn {
            start_date: format_date(self.start_date),
            end_date: format_date(self.end_date),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DateRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let Some(column) = Option::<LenientDateRangeColumn>::deserialize(deserializer)? else {
            return Ok(Self::UNDEFINED);
        };
        Self::parse(
            column.start_date.as_deref().unwrap_or_default(),
            column.end_date.as_deref().unwrap_or_default(),
        )
        .map_err(serde::de::Error::custom)
    }
}
