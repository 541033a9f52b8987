use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use timeledger_core::types::{ADHOC_RULE_ID, ExceptionId, OfferingId, RoomId, RuleId, TeacherId};

use crate::model::ExceptionKind;
use crate::value::time::wall_clock;

/// One materialized occurrence. Produced by expansion, never stored.
///
/// `starts_at`/`ends_at` anchor the wall-clock times to the center's offset
/// on `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandedSchedule {
    /// `0` for ad-hoc sessions.
    pub rule_id: RuleId,
    pub offering_id: OfferingId,
    pub date: NaiveDate,
    #[serde(with = "wall_clock")]
    pub start_time: NaiveTime,
    #[serde(with = "wall_clock")]
    pub end_time: NaiveTime,
    pub starts_at: DateTime<FixedOffset>,
    pub ends_at: DateTime<FixedOffset>,
    pub room_id: RoomId,
    pub teacher_id: Option<TeacherId>,
    pub is_holiday: bool,
    pub has_exception: bool,
    pub exception_kind: Option<ExceptionKind>,
    pub exception_id: Option<ExceptionId>,
    pub cancelled: bool,
}

impl ExpandedSchedule {
    #[must_use]
    pub const fn is_adhoc(&self) -> bool {
        self.rule_id == ADHOC_RULE_ID
    }

    /// Ordering key: date, start time, offering, rule.
    #[must_use]
    pub const fn sort_key(&self) -> (NaiveDate, NaiveTime, OfferingId, RuleId) {
        (self.date, self.start_time, self.offering_id, self.rule_id)
    }
}
