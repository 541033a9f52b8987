use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use timeledger_core::constants::{CANCELLATION_CHECK_INTERVAL, DEFAULT_MAX_WINDOW_DAYS};
use timeledger_core::types::{ADHOC_RULE_ID, CenterId, ExceptionId, OfferingId, RoomId, RuleId, TeacherId};

use crate::error::{CalendarError, CalendarResult};
use crate::expand::{
    Diagnostic, DiagnosticKind, Diagnostics, ExceptionIndex, ExpansionWindow, HolidayIndex,
    PhaseIndex, localize,
};
use crate::model::{ExceptionKind, ExpandedSchedule, ScheduleException, ScheduleRule};
use crate::store::ScheduleSnapshot;

/// Knobs for one expansion run.
#[derive(Debug, Clone, Copy)]
pub struct ExpandOptions {
    /// Zone used to anchor `starts_at`/`ends_at`.
    pub timezone: Tz,
    pub max_window_days: u32,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            timezone: Tz::UTC,
            max_window_days: DEFAULT_MAX_WINDOW_DAYS,
        }
    }
}

/// Output of one run: ordered occurrences plus data diagnostics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Expansion {
    pub schedules: Vec<ExpandedSchedule>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Occurrence under construction, before it is anchored to a zone.
struct Draft {
    rule_id: RuleId,
    offering_id: OfferingId,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    room_id: RoomId,
    teacher_id: Option<TeacherId>,
    exception: Option<(ExceptionKind, ExceptionId)>,
    cancelled: bool,
}

impl Draft {
    const fn from_rule(rule: &ScheduleRule, date: NaiveDate) -> Self {
        Self {
            rule_id: rule.id,
            offering_id: rule.offering_id,
            date,
            start_time: rule.start_time,
            end_time: rule.end_time,
            room_id: rule.room_id,
            teacher_id: rule.teacher_id,
            exception: None,
            cancelled: false,
        }
    }

    /// Applies a rule-targeted exception to this occurrence.
    fn overlay(&mut self, exception: &ScheduleException, diagnostics: &mut Diagnostics) {
        self.exception = Some((exception.kind, exception.id));

        match exception.kind {
            ExceptionKind::Cancel => self.cancelled = true,
            ExceptionKind::Move => {
                let start = exception.start_time.unwrap_or(self.start_time);
                let end = exception.end_time.unwrap_or(self.end_time);
                if start < end {
                    self.start_time = start;
                    self.end_time = end;
                } else {
                    diagnostics.record(
                        DiagnosticKind::InvalidException,
                        &[exception.id],
                        Some(self.date),
                        || {
                            format!(
                                "MOVE exception {} would start at {start} and end at {end}, keeping rule times",
                                exception.id
                            )
                        },
                    );
                }
                if let Some(room_id) = exception.room_id {
                    self.room_id = room_id;
                }
                if exception.teacher_id.is_some() {
                    self.teacher_id = exception.teacher_id;
                }
            }
            ExceptionKind::Substitute => match exception.teacher_id {
                Some(teacher_id) => self.teacher_id = Some(teacher_id),
                None => diagnostics.record(
                    DiagnosticKind::InvalidException,
                    &[exception.id],
                    Some(self.date),
                    || format!("SUBSTITUTE exception {} names no teacher", exception.id),
                ),
            },
            // Indexed separately and never keyed by rule.
            ExceptionKind::Adhoc => {}
        }
    }

    fn into_schedule(self, holidays: &HolidayIndex, tz: Tz) -> ExpandedSchedule {
        ExpandedSchedule {
            rule_id: self.rule_id,
            offering_id: self.offering_id,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            starts_at: localize(self.date, self.start_time, tz),
            ends_at: localize(self.date, self.end_time, tz),
            room_id: self.room_id,
            teacher_id: self.teacher_id,
            is_holiday: holidays.is_holiday(self.date),
            has_exception: self.exception.is_some(),
            exception_kind: self.exception.map(|(kind, _)| kind),
            exception_id: self.exception.map(|(_, id)| id),
            cancelled: self.cancelled,
        }
    }
}

/// Builds the occurrence for an ad-hoc session, or explains why it cannot.
fn adhoc_draft(
    exception: &ScheduleException,
    default_rooms: &HashMap<OfferingId, RoomId>,
) -> Result<Draft, String> {
    let (Some(start_time), Some(end_time)) = (exception.start_time, exception.end_time) else {
        return Err(format!("ADHOC exception {} has no start or end time", exception.id));
    };
    if start_time >= end_time {
        return Err(format!(
            "ADHOC exception {} starts at {start_time} but ends at {end_time}",
            exception.id
        ));
    }
    let Some(room_id) = exception
        .room_id
        .or_else(|| default_rooms.get(&exception.offering_id).copied())
    else {
        return Err(format!("ADHOC exception {} has no room", exception.id));
    };

    Ok(Draft {
        rule_id: ADHOC_RULE_ID,
        offering_id: exception.offering_id,
        date: exception.date,
        start_time,
        end_time,
        room_id,
        teacher_id: exception.teacher_id,
        exception: Some((ExceptionKind::Adhoc, exception.id)),
        cancelled: false,
    })
}

/// Appends records and polls the cancellation token every
/// `CANCELLATION_CHECK_INTERVAL` records.
struct Emitter<'t> {
    schedules: Vec<ExpandedSchedule>,
    cancel: &'t CancellationToken,
    next_check: usize,
}

impl Emitter<'_> {
    fn push(&mut self, schedule: ExpandedSchedule) -> CalendarResult<()> {
        self.schedules.push(schedule);
        if self.schedules.len() >= self.next_check {
            self.next_check += CANCELLATION_CHECK_INTERVAL;
            if self.cancel.is_cancelled() {
                tracing::debug!(emitted = self.schedules.len(), "Expansion cancelled mid-run");
                return Err(CalendarError::Cancelled);
            }
        }
        Ok(())
    }
}

/// ## Summary
/// Expands one center's rules over `window` using an already fetched snapshot.
///
/// Records are ordered by date, start time, offering id and rule id, with
/// ad-hoc sessions (rule id `0`) first among equals. Identical inputs give
/// identical output. Cancelled occurrences stay in the output with
/// `cancelled = true`; holidays only set `is_holiday`.
///
/// ## Errors
/// Returns `CalendarError::WindowTooLarge` when the window exceeds
/// `options.max_window_days`, and `CalendarError::Cancelled` if `cancel`
/// fires while records are being emitted. Partial output is dropped.
#[tracing::instrument(skip(window, snapshot, options, cancel), fields(from = %window.from, to = %window.to))]
pub fn expand(
    center_id: CenterId,
    window: &ExpansionWindow,
    snapshot: &ScheduleSnapshot,
    options: &ExpandOptions,
    cancel: &CancellationToken,
) -> CalendarResult<Expansion> {
    window.ensure_within(options.max_window_days)?;

    let mut diagnostics = Diagnostics::default();
    let phases = PhaseIndex::build(center_id, &snapshot.rules, &mut diagnostics);
    let mut exceptions =
        ExceptionIndex::build(center_id, window, &snapshot.exceptions, &mut diagnostics);
    let holidays = HolidayIndex::build(center_id, &snapshot.holidays);
    let default_rooms: HashMap<OfferingId, RoomId> = snapshot
        .offerings
        .iter()
        .filter(|offering| offering.center_id == center_id)
        .filter_map(|offering| Some((offering.id, offering.default_room_id?)))
        .collect();

    let mut emitter = Emitter {
        schedules: Vec::new(),
        cancel,
        next_check: CANCELLATION_CHECK_INTERVAL,
    };

    for date in window.dates() {
        for rule in phases.resolve(date, &mut diagnostics) {
            let mut draft = Draft::from_rule(rule, date);
            if let Some(exception) = exceptions.take(rule.id, date) {
                draft.overlay(exception, &mut diagnostics);
            }
            emitter.push(draft.into_schedule(&holidays, options.timezone))?;
        }
    }

    for exception in exceptions.adhoc() {
        match adhoc_draft(exception, &default_rooms) {
            Ok(draft) => emitter.push(draft.into_schedule(&holidays, options.timezone))?,
            Err(reason) => diagnostics.record(
                DiagnosticKind::InvalidException,
                &[exception.id],
                Some(exception.date),
                || reason,
            ),
        }
    }

    for orphan in exceptions.into_unmatched() {
        diagnostics.record(
            DiagnosticKind::OrphanException,
            &[orphan.id],
            Some(orphan.date),
            || {
                format!(
                    "{} exception {} targets rule {} which does not fire on {}",
                    orphan.kind.as_str(),
                    orphan.id,
                    orphan.rule_id.unwrap_or(ADHOC_RULE_ID),
                    orphan.date
                )
            },
        );
    }

    let mut schedules = emitter.schedules;
    schedules.sort_by_key(ExpandedSchedule::sort_key);

    tracing::debug!(
        center_id,
        records = schedules.len(),
        diagnostics = diagnostics.len(),
        holidays = holidays.len(),
        "Expanded schedule"
    );

    Ok(Expansion {
        schedules,
        diagnostics: diagnostics.into_vec(),
    })
}
