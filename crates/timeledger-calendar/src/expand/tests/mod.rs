//! End-to-end expansion over in-memory snapshots.


use chrono::{NaiveDate, NaiveTime, Weekday};
use tokio_util::sync::CancellationToken;

use timeledger_core::types::{ExceptionId, RuleId};

use crate::expand::{ExpandOptions, Expansion, ExpansionWindow, expand};
use crate::model::{
    CenterHoliday, ExceptionKind, ExceptionStatus, Offering, ScheduleException, ScheduleRule,
};
use crate::store::ScheduleSnapshot;
use crate::value::DateRange;

pub(super) const CENTER: u64 = 1;
pub(super) const OFFERING: u64 = 10;

pub(super) fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
}

pub(super) fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
}

pub(super) fn rule(
    id: RuleId,
    weekday: Weekday,
    start: NaiveTime,
    end: NaiveTime,
    range: DateRange,
) -> ScheduleRule {
    ScheduleRule {
        id,
        center_id: CENTER,
        offering_id: OFFERING,
        weekday,
        start_time: start,
        end_time: end,
        room_id: 1,
        teacher_id: Some(100),
        effective_range: range,
        lock_at: None,
    }
}

pub(super) fn exception(
    id: ExceptionId,
    rule_id: Option<RuleId>,
    date: NaiveDate,
    kind: ExceptionKind,
) -> ScheduleException {
    ScheduleException {
        id,
        center_id: CENTER,
        rule_id,
        offering_id: OFFERING,
        date,
        kind,
        status: ExceptionStatus::Approved,
        start_time: None,
        end_time: None,
        room_id: None,
        teacher_id: None,
        reason: String::new(),
        recurrence: None,
    }
}

pub(super) fn holiday(id: u64, date: NaiveDate, name: &str) -> CenterHoliday {
    CenterHoliday {
        id,
        center_id: CENTER,
        date,
        name: name.to_string(),
    }
}

pub(super) fn offering(default_room_id: Option<u64>) -> Offering {
    Offering {
        id: OFFERING,
        center_id: CENTER,
        name: "Morning Yoga".to_string(),
        default_room_id,
    }
}

/// R1 from the January scenarios: Mondays 10:00-11:00 through January 2026.
pub(super) fn january_mondays() -> ScheduleRule {
    rule(
        1,
        Weekday::Mon,
        t(10, 0),
        t(11, 0),
        DateRange::bounded(d(2026, 1, 1), d(2026, 1, 31)),
    )
}

pub(super) fn january() -> ExpansionWindow {
    ExpansionWindow::new(d(2026, 1, 1), d(2026, 1, 31)).expect("valid window")
}

pub(super) fn run(snapshot: &ScheduleSnapshot, window: &ExpansionWindow) -> Expansion {
    expand(
        CENTER,
        window,
        snapshot,
        &ExpandOptions::default(),
        &CancellationToken::new(),
    )
    .expect("expansion succeeds")
}
