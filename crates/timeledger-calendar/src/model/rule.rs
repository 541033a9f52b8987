use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use timeledger_core::types::{CenterId, OfferingId, RoomId, RuleId, TeacherId};

use crate::error::{CalendarError, CalendarResult};
use crate::value::time::{iso_weekday, wall_clock};
use crate::value::{DateRange, TimeSlot};

/// One weekly slot of an offering, valid for an effective date range.
///
/// Several rules for the same offering and weekday with disjoint ranges form
/// a phased schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRule {
    pub id: RuleId,
    pub center_id: CenterId,
    pub offering_id: OfferingId,
    #[serde(with = "iso_weekday")]
    pub weekday: Weekday,
    #[serde(with = "wall_clock")]
    pub start_time: NaiveTime,
    #[serde(with = "wall_clock")]
    pub end_time: NaiveTime,
    pub room_id: RoomId,
    #[serde(default)]
    pub teacher_id: Option<TeacherId>,
    pub effective_range: DateRange,
    /// Exceptions for this rule can no longer be requested after this
    /// instant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_at: Option<DateTime<Utc>>,
}

impl ScheduleRule {
    #[must_use]
    pub const fn time_slot(&self) -> TimeSlot {
        TimeSlot::new(self.start_time, self.end_time)
    }

    /// ## Summary
    /// Whether the rule fires on `date`: same weekday and inside its range.
    #[must_use]
    pub fn fires_on(&self, date: NaiveDate) -> bool {
        date.weekday() == self.weekday && self.effective_range.contains(date)
    }

    #[must_use]
    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.lock_at.is_some_and(|lock_at| now > lock_at)
    }

    /// ## Summary
    /// Checks the invariants a single rule must hold on its own.
    ///
    /// ## Errors
    /// Returns `CalendarError::Validation` when the start date is missing, the
    /// end date precedes it, or the time slot is empty or inverted.
    pub fn validate(&self) -> CalendarResult<()> {
        if self.effective_range.start_date.is_none() {
            return Err(CalendarError::Validation(format!(
                "rule {} has no effective start date",
                self.id
            )));
        }
        if !self.effective_range.is_well_formed() {
            return Err(CalendarError::Validation(format!(
                "rule {} ends before it starts",
                self.id
            )));
        }
        if !self.time_slot().is_valid() {
            return Err(CalendarError::Validation(format!(
                "rule {} start time {} is not before end time {}",
                self.id, self.start_time, self.end_time
            )));
        }
        Ok(())
    }

    /// ## Summary
    /// Two distinct rules conflict when they share an offering and weekday and
    /// overlap both in effective dates and in time.
    ///
    /// A phase handoff, where one range ends on the day the other starts, is
    /// not a conflict: the later phase governs the shared day.
    #[must_use]
    pub fn conflicts_with(&self, other: &Self) -> bool {
        self.id != other.id
            && self.offering_id == other.offering_id
            && self.weekday == other.weekday
            && self.effective_range.overlaps(&other.effective_range)
            && !self.effective_range.hands_off_to(&other.effective_range)
            && !other.effective_range.hands_off_to(&self.effective_range)
            && self.time_slot().overlaps(&other.time_slot())
    }
}
