//! Wall-clock and weekday helpers shared by the schedule model.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// ## Summary
/// Parses a wall-clock time in `HH:MM:SS` or `HH:MM` form.
///
/// ## Errors
/// Returns `ValueError::InvalidTime` when neither form matches.
pub fn parse_wall_clock(value: &str) -> Result<NaiveTime, ValueError> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_e| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_e| ValueError::InvalidTime(value.to_string()))
}

/// ## Summary
/// Maps an ISO weekday number (Monday = 1 .. Sunday = 7) to a `Weekday`.
///
/// ## Errors
/// Returns `ValueError::InvalidWeekday` outside `1..=7`.
pub fn weekday_from_iso(number: i64) -> Result<Weekday, ValueError> {
    match number {
        1 => Ok(Weekday::Mon),
        2 => Ok(Weekday::Tue),
        3 => Ok(Weekday::Wed),
        4 => Ok(Weekday::Thu),
        5 => Ok(Weekday::Fri),
        6 => Ok(Weekday::Sat),
        7 => Ok(Weekday::Sun),
        other => Err(ValueError::InvalidWeekday(other)),
    }
}

#[must_use]
pub fn iso_number(weekday: Weekday) -> u8 {
    // number_from_monday is 1..=7, which always fits
    u8::try_from(weekday.number_from_monday()).unwrap_or(u8::MAX)
}

/// Half-open wall-clock interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeSlot {
    #[serde(with = "wall_clock")]
    pub start: NaiveTime,
    #[serde(with = "wall_clock")]
    pub end: NaiveTime,
}

impl TimeSlot {
    #[must_use]
    pub const fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Whether `start` is strictly before `end`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.start < self.end
    }

    /// ## Summary
    /// Two slots overlap when they share any instant. Slots that only touch
    /// (`a.end == b.start`) do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Serde adapter writing `NaiveTime` as `HH:MM:SS`.
pub mod wall_clock {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use timeledger_core::constants::TIME_FORMAT;

    /// ## Errors
    /// Propagates serializer failures.
    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(TIME_FORMAT))
    }

    /// ## Errors
    /// Fails when the string is not a wall-clock time.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_wall_clock(&text).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for optional wall-clock times; empty strings read as `None`.
pub mod wall_clock_opt {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use timeledger_core::constants::TIME_FORMAT;

    /// ## Errors
    /// Propagates serializer failures.
    pub fn serialize<S: Serializer>(
        time: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(time) => serializer.collect_str(&time.format(TIME_FORMAT)),
            None => serializer.serialize_none(),
        }
    }

    /// ## Errors
    /// Fails when a non-empty string is not a wall-clock time.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) if !text.trim().is_empty() => super::parse_wall_clock(&text)
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}

/// Serde adapter writing `Weekday` as its ISO number.
pub mod iso_weekday {
    use chrono::Weekday;
    use serde::{Deserialize, Deserializer, Serializer};

    /// ## Errors
    /// Propagates serializer failures.
    pub fn serialize<S: Serializer>(weekday: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(super::iso_number(*weekday))
    }

    /// ## Errors
    /// Fails outside `1..=7`.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Weekday, D::Error> {
        let number = i64::deserialize(deserializer)?;
        super::weekday_from_iso(number).map_err(serde::de::Error::custom)
    }
}
