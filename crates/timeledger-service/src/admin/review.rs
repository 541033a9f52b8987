//! Exception review: approval with a conflict check, rejection and revocation.

use chrono::{NaiveDate, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use timeledger_calendar::expand::{ExpandOptions, ExpansionWindow, expand};
use timeledger_calendar::model::{ExceptionStatus, ExpandedSchedule, ScheduleException};
use timeledger_calendar::store::ScheduleSnapshot;
use timeledger_calendar::value::time::wall_clock;
use timeledger_calendar::value::{AuditPayload, CenterSettings, TimeSlot};
use timeledger_core::types::{ExceptionId, OfferingId, RuleId};
use timeledger_db::admin::AuditEntry;
use timeledger_db::repository::Entity;

use super::{AdminService, to_object};
use crate::error::{ServiceError, ServiceResult};
use crate::schedule::service::{center_timezone, fetch_failed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReviewAction {
    Approve,
    Reject,
}

/// A reviewer's decision on one pending exception.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReviewDecision {
    pub action: ReviewAction,
    /// Approve even when the only collisions are buffer gaps.
    #[serde(default)]
    pub override_buffer: bool,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictKind {
    RoomOverlap,
    TeacherOverlap,
    RoomBuffer,
    TeacherBuffer,
}

impl ConflictKind {
    /// Overlaps can never be overridden; buffer gaps can.
    #[must_use]
    pub const fn is_hard(self) -> bool {
        matches!(self, Self::RoomOverlap | Self::TeacherOverlap)
    }
}

/// A session the approved exception would collide with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotConflict {
    pub kind: ConflictKind,
    pub date: NaiveDate,
    pub rule_id: RuleId,
    pub offering_id: OfferingId,
    #[serde(with = "wall_clock")]
    pub start_time: NaiveTime,
    #[serde(with = "wall_clock")]
    pub end_time: NaiveTime,
}

impl SlotConflict {
    fn new(kind: ConflictKind, other: &ExpandedSchedule) -> Self {
        Self {
            kind,
            date: other.date,
            rule_id: other.rule_id,
            offering_id: other.offering_id,
            start_time: other.start_time,
            end_time: other.end_time,
        }
    }
}

/// Minutes between two slots that do not overlap.
fn gap_between(a: &ExpandedSchedule, b: &ExpandedSchedule) -> TimeDelta {
    if a.end_time <= b.start_time {
        b.start_time - a.end_time
    } else {
        a.start_time - b.end_time
    }
}

fn below_buffer(gap: TimeDelta, buffer_minutes: u32) -> bool {
    gap < TimeDelta::minutes(i64::from(buffer_minutes))
}

/// ## Summary
/// Collisions between `candidate` and the other sessions of its day.
///
/// Sharing a room or a teacher with an overlapping slot is a hard conflict.
/// A gap shorter than the center's room or teacher buffer is a buffer
/// conflict. Cancelled sessions never collide.
#[must_use]
pub fn find_conflicts(
    candidate: &ExpandedSchedule,
    others: &[ExpandedSchedule],
    settings: &CenterSettings,
) -> Vec<SlotConflict> {
    if candidate.cancelled {
        return Vec::new();
    }
    let slot = TimeSlot::new(candidate.start_time, candidate.end_time);
    let mut conflicts = Vec::new();

    for other in others
        .iter()
        .filter(|other| !other.cancelled && other.date == candidate.date)
    {
        let overlaps = slot.overlaps(&TimeSlot::new(other.start_time, other.end_time));
        let same_room = other.room_id == candidate.room_id;
        let same_teacher =
            candidate.teacher_id.is_some() && other.teacher_id == candidate.teacher_id;

        if overlaps {
            if same_room {
                conflicts.push(SlotConflict::new(ConflictKind::RoomOverlap, other));
            }
            if same_teacher {
                conflicts.push(SlotConflict::new(ConflictKind::TeacherOverlap, other));
            }
            continue;
        }

        let gap = gap_between(candidate, other);
        if same_room && below_buffer(gap, settings.room_buffer_minutes) {
            conflicts.push(SlotConflict::new(ConflictKind::RoomBuffer, other));
        }
        if same_teacher && below_buffer(gap, settings.teacher_buffer_minutes) {
            conflicts.push(SlotConflict::new(ConflictKind::TeacherBuffer, other));
        }
    }

    conflicts
}

impl AdminService {
    /// ## Summary
    /// Sessions the pending `exception` would collide with once approved.
    ///
    /// The exception's day is expanded as if it were already approved; the
    /// sessions it produces are compared against the rest of that day.
    async fn conflicts_if_approved(
        &self,
        exception: &ScheduleException,
    ) -> ServiceResult<Vec<SlotConflict>> {
        let center = self.center(exception.center_id).await?;
        let window = ExpansionWindow::new(exception.date, exception.date)?;

        let store = &self.admin;
        let (offerings, rules, mut exceptions, holidays) = tokio::try_join!(
            store.list_offerings_for_center(center.id),
            store.list_rules_for_center(center.id, window),
            store.list_exceptions_for_center(center.id, window),
            store.list_holidays_for_center(center.id, window),
        )
        .map_err(fetch_failed)?;

        let mut approved = exception.clone();
        approved.status = ExceptionStatus::Approved;
        exceptions.retain(|other| other.id != exception.id);
        exceptions.push(approved);

        let snapshot = ScheduleSnapshot {
            offerings,
            rules,
            exceptions,
            holidays,
        };
        let options = ExpandOptions {
            timezone: center_timezone(&center, self.default_timezone),
            max_window_days: self.max_window_days,
        };
        let expansion = expand(
            center.id,
            &window,
            &snapshot,
            &options,
            &CancellationToken::new(),
        )?;

        let (produced, others): (Vec<_>, Vec<_>) = expansion
            .schedules
            .into_iter()
            .partition(|session| session.exception_id == Some(exception.id));

        Ok(produced
            .iter()
            .flat_map(|session| find_conflicts(session, &others, &center.settings))
            .collect())
    }

    async fn transition(
        &self,
        exception: &ScheduleException,
        to: ExceptionStatus,
        action: &str,
        actor: &str,
        note: Option<(&str, bool)>,
    ) -> ServiceResult<ScheduleException> {
        let mut after = exception.clone();
        after.status = to;
        let mut snapshot = to_object(&after)?;
        if let Some((note, override_buffer)) = note {
            snapshot.insert("review_note".to_string(), note.into());
            snapshot.insert("override_buffer".to_string(), override_buffer.into());
        }

        let audit = AuditEntry {
            center_id: exception.center_id,
            actor: actor.to_string(),
            action: action.to_string(),
            target_type: ScheduleException::TABLE_NAME,
            target_id: Some(exception.id),
            payload: AuditPayload::changed(to_object(exception)?, snapshot),
        };

        self.admin
            .transition_exception(exception.id, exception.status, to, audit)
            .await?
            .ok_or_else(|| {
                ServiceError::Conflict(format!(
                    "exception {} changed while it was being reviewed",
                    exception.id
                ))
            })
    }

    /// ## Summary
    /// Approves or rejects a pending exception.
    ///
    /// Approval first checks the sessions the exception would produce against
    /// the rest of its day. Overlaps always block it; buffer gaps block it
    /// unless `decision.override_buffer` is set.
    ///
    /// ## Side Effects
    /// Moves the exception to `APPROVED` or `REJECTED` together with an audit
    /// entry carrying the review note.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown exception
    /// - `Conflict` when the exception is not `PENDING`
    /// - `ScheduleConflict` listing the sessions that block approval
    #[tracing::instrument(skip(self, decision), fields(action = ?decision.action))]
    pub async fn review_exception(
        &self,
        exception_id: ExceptionId,
        decision: ReviewDecision,
        actor: &str,
    ) -> ServiceResult<ScheduleException> {
        let exception = self.exception(exception_id).await?;
        if exception.status != ExceptionStatus::Pending {
            return Err(ServiceError::Conflict(format!(
                "exception {exception_id} is {}, only PENDING exceptions can be reviewed",
                exception.status.as_str()
            )));
        }

        let (to, action) = match decision.action {
            ReviewAction::Approve => {
                let conflicts = self.conflicts_if_approved(&exception).await?;
                let blocking = conflicts.iter().any(|conflict| conflict.kind.is_hard())
                    || (!conflicts.is_empty() && !decision.override_buffer);
                if blocking {
                    tracing::info!(conflicts = conflicts.len(), "Approval blocked");
                    return Err(ServiceError::ScheduleConflict {
                        exception_id,
                        conflicts,
                    });
                }
                (ExceptionStatus::Approved, "exception.approve")
            }
            ReviewAction::Reject => (ExceptionStatus::Rejected, "exception.reject"),
        };

        self.transition(
            &exception,
            to,
            action,
            actor,
            Some((decision.note.as_str(), decision.override_buffer)),
        )
        .await
    }

    /// ## Summary
    /// Withdraws a pending exception request.
    ///
    /// ## Side Effects
    /// Moves the exception to `REVOKED` with an audit entry.
    ///
    /// ## Errors
    /// Returns `NotFound` for an unknown exception and `Conflict` when it is
    /// no longer `PENDING`.
    #[tracing::instrument(skip(self))]
    pub async fn revoke_exception(
        &self,
        exception_id: ExceptionId,
        actor: &str,
    ) -> ServiceResult<ScheduleException> {
        let exception = self.exception(exception_id).await?;
        if exception.status != ExceptionStatus::Pending {
            return Err(ServiceError::Conflict(format!(
                "exception {exception_id} is {}, only PENDING exceptions can be revoked",
                exception.status.as_str()
            )));
        }

        self.transition(
            &exception,
            ExceptionStatus::Revoked,
            "exception.revoke",
            actor,
            None,
        )
        .await
    }
}
