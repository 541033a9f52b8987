use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, CalendarResult};
use crate::value::parse_lenient_date;

/// Inclusive `[from, to]` date interval requested for expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "WindowBounds")]
pub struct ExpansionWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Deserialize)]
struct WindowBounds {
    from: NaiveDate,
    to: NaiveDate,
}

impl TryFrom<WindowBounds> for ExpansionWindow {
    type Error = CalendarError;

    fn try_from(bounds: WindowBounds) -> CalendarResult<Self> {
        Self::new(bounds.from, bounds.to)
    }
}

impl ExpansionWindow {
    /// ## Errors
    /// Returns `CalendarError::InvalidWindow` when `from > to`.
    pub fn new(from: NaiveDate, to: NaiveDate) -> CalendarResult<Self> {
        if from > to {
            return Err(CalendarError::InvalidWindow(format!(
                "from {from} is after to {to}"
            )));
        }
        Ok(Self { from, to })
    }

    /// ## Summary
    /// Parses the window bounds from query-string dates.
    ///
    /// ## Errors
    /// Returns `CalendarError::InvalidWindow` if a bound is missing, malformed
    /// or the bounds are reversed.
    pub fn parse(from: &str, to: &str) -> CalendarResult<Self> {
        let from = Self::parse_bound("from", from)?;
        let to = Self::parse_bound("to", to)?;
        Self::new(from, to)
    }

    fn parse_bound(name: &str, value: &str) -> CalendarResult<NaiveDate> {
        parse_lenient_date(value)
            .map_err(|err| CalendarError::InvalidWindow(format!("{name}: {err}")))?
            .ok_or_else(|| CalendarError::InvalidWindow(format!("{name} is required")))
    }

    /// Number of days covered, both ends included.
    #[must_use]
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    /// ## Errors
    /// Returns `CalendarError::WindowTooLarge` when the window spans more than
    /// `max_days` days.
    pub fn ensure_within(&self, max_days: u32) -> CalendarResult<()> {
        let days = self.days();
        if days > i64::from(max_days) {
            return Err(CalendarError::WindowTooLarge {
                days,
                max: max_days,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }

    /// Every date in the window, ascending.
    pub fn dates(self) -> impl Iterator<Item = NaiveDate> {
        self.from.iter_days().take_while(move |date| *date <= self.to)
    }
}
