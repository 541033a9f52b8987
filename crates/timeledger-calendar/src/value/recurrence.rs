use chrono::{NaiveDate, NaiveTime, TimeZone};
use rrule::{RRule, Tz, Unvalidated};
use serde::{Deserialize, Serialize};

use timeledger_core::constants::DATE_FORMAT;

use crate::error::ValueError;
use crate::value::time::weekday_from_iso;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
        }
    }
}

/// Recurrence hint attached to exceptions.
///
/// The expander never consumes it; callers use [`RecurrenceRule::preview`] to
/// enumerate the dates a repeating exception would cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    #[serde(rename = "type")]
    pub frequency: Frequency,
    pub interval: u32,
    /// ISO weekday numbers, only meaningful for weekly rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weekdays: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl RecurrenceRule {
    #[must_use]
    pub const fn new(frequency: Frequency, interval: u32) -> Self {
        Self {
            frequency,
            interval,
            weekdays: Vec::new(),
            until: None,
            count: None,
        }
    }

    /// ## Summary
    /// Checks the interval and weekday list.
    ///
    /// ## Errors
    /// Returns `ValueError::InvalidRecurrence` for a zero interval, weekdays
    /// on a non-weekly rule, or a weekday outside `1..=7`.
    pub fn validate(&self) -> Result<(), ValueError> {
        if self.interval < 1 {
            return Err(ValueError::InvalidRecurrence(
                "interval must be at least 1".to_string(),
            ));
        }
        if !self.weekdays.is_empty() && self.frequency != Frequency::Weekly {
            return Err(ValueError::InvalidRecurrence(format!(
                "weekdays are only allowed on WEEKLY rules, got {}",
                self.frequency.as_str()
            )));
        }
        for &weekday in &self.weekdays {
            weekday_from_iso(i64::from(weekday))?;
        }
        Ok(())
    }

    /// ## Summary
    /// Reads an optional recurrence column. `NULL` and empty text yield `None`.
    ///
    /// ## Errors
    /// Returns an error for malformed JSON or an invalid rule.
    pub fn from_column(column: Option<&str>) -> Result<Option<Self>, ValueError> {
        match column.map(str::trim) {
            None | Some("" | "null") => Ok(None),
            Some(text) => {
                let rule: Self = serde_json::from_str(text)?;
                rule.validate()?;
                Ok(Some(rule))
            }
        }
    }

    /// ## Errors
    /// Returns an error if the rule cannot be encoded as JSON.
    pub fn to_column(&self) -> Result<String, ValueError> {
        Ok(serde_json::to_string(self)?)
    }

    /// ## Summary
    /// Renders the rule as RFC 5545 `RRULE` text.
    #[must_use]
    pub fn to_rrule_text(&self) -> String {
        let mut text = format!("FREQ={};INTERVAL={}", self.frequency.as_str(), self.interval);

        if !self.weekdays.is_empty() {
            let days: Vec<&str> = self
                .weekdays
                .iter()
                .filter_map(|&n| byday_code(n))
                .collect();
            text.push_str(";BYDAY=");
            text.push_str(&days.join(","));
        }
        if let Some(until) = self.until {
            text.push_str(&format!(";UNTIL={}T235959Z", until.format("%Y%m%d")));
        }
        if let Some(count) = self.count {
            text.push_str(&format!(";COUNT={count}"));
        }

        text
    }

    /// ## Summary
    /// Lists up to `limit` dates produced by the rule starting at `start`.
    ///
    /// ## Errors
    /// Returns `ValueError::InvalidRecurrence` if the rule is invalid or the
    /// recurrence library rejects it.
    pub fn preview(&self, start: NaiveDate, limit: u16) -> Result<Vec<NaiveDate>, ValueError> {
        self.validate()?;

        let rrule = self
            .to_rrule_text()
            .parse::<RRule<Unvalidated>>()
            .map_err(|err| ValueError::InvalidRecurrence(err.to_string()))?;

        // Dates are floating, so UTC midnight stands in for local midnight.
        let dt_start = Tz::UTC.from_utc_datetime(&start.and_time(NaiveTime::MIN));
        let rrule_set = rrule
            .build(dt_start)
            .map_err(|err| ValueError::InvalidRecurrence(err.to_string()))?;

        let dates = rrule_set
            .all(limit)
            .dates
            .into_iter()
            .map(|dt| dt.date_naive())
            .collect();

        tracing::trace!(
            rule = %self.to_rrule_text(),
            start = %start.format(DATE_FORMAT),
            "Previewed recurrence"
        );

        Ok(dates)
    }
}

fn byday_code(iso: u8) -> Option<&'static str> {
    match iso {
        1 => Some("MO"),
        2 => Some("TU"),
        3 => Some("WE"),
        4 => Some("TH"),
        5 => Some("FR"),
        6 => Some("SA"),
        7 => Some("SU"),
        _ => None,
    }
}
