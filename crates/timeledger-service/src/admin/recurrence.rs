//! Edits and deletes of a recurring rule for one date, from a date on, or for
//! the whole rule.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use timeledger_calendar::error::{CalendarError, CalendarResult};
use timeledger_calendar::model::{ExceptionKind, ExceptionStatus, ScheduleException, ScheduleRule};
use timeledger_calendar::value::time::wall_clock_opt;
use timeledger_calendar::value::{AuditPayload, DateRange};
use timeledger_core::types::{RoomId, RuleId, TeacherId};
use timeledger_db::admin::AuditEntry;
use timeledger_db::repository::{Entity, ListFilter, Page};

use super::{AdminService, rule_patch};
use crate::error::{ServiceError, ServiceResult};
use crate::validate::{check_rule_lock, validate_rule};

/// How far an edit of a recurring rule reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EditMode {
    /// Only the occurrence on the edit date.
    Single,
    /// The edit date and every later occurrence.
    Future,
    /// Every occurrence of the rule.
    All,
}

impl EditMode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "SINGLE",
            Self::Future => "FUTURE",
            Self::All => "ALL",
        }
    }
}

impl std::str::FromStr for EditMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SINGLE" => Ok(Self::Single),
            "FUTURE" => Ok(Self::Future),
            "ALL" => Ok(Self::All),
            other => Err(format!("unknown edit mode: {other}")),
        }
    }
}

/// Replacement fields of an edit. Unset fields keep the rule's value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RecurrenceEdit {
    pub edit_date: NaiveDate,
    pub mode: EditMode,
    #[serde(default, with = "wall_clock_opt")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "wall_clock_opt")]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub room_id: Option<RoomId>,
    #[serde(default)]
    pub teacher_id: Option<TeacherId>,
    #[serde(default)]
    pub reason: String,
}

impl RecurrenceEdit {
    const fn changes_slot(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some() || self.room_id.is_some()
    }

    /// ## Summary
    /// `rule` with this edit's replacements applied.
    fn apply_to(&self, rule: &ScheduleRule) -> ScheduleRule {
        ScheduleRule {
            start_time: self.start_time.unwrap_or(rule.start_time),
            end_time: self.end_time.unwrap_or(rule.end_time),
            room_id: self.room_id.unwrap_or(rule.room_id),
            teacher_id: self.teacher_id.or(rule.teacher_id),
            ..rule.clone()
        }
    }
}

/// Occurrences an edit would touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffectedSessions {
    pub mode: EditMode,
    pub affected_count: usize,
    pub affected_dates: Vec<NaiveDate>,
    /// Whether a `FUTURE` edit splits the rule into a successor.
    pub will_create_rule: bool,
}

/// What an edit or delete wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecurrenceEditResult {
    pub mode: EditMode,
    pub affected_count: usize,
    /// Pending exception requests filed for a `SINGLE` change.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exceptions: Vec<ScheduleException>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_rule: Option<ScheduleRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_rule: Option<ScheduleRule>,
}

impl RecurrenceEditResult {
    const fn new(mode: EditMode, affected_count: usize) -> Self {
        Self {
            mode,
            affected_count,
            exceptions: Vec::new(),
            updated_rule: None,
            new_rule: None,
        }
    }
}

/// ## Summary
/// Dates on which `rule` fires that an edit in `mode` at `edit_date` reaches.
///
/// `SINGLE` reaches only `edit_date`. `FUTURE` runs from `edit_date` (or the
/// rule's start when later) to the rule's end, `ALL` from the start to the
/// end. An open end is cut after `max_days` days.
///
/// ## Errors
/// Returns `CalendarError::Validation` when the rule has no start date, or
/// for `SINGLE` when the rule does not fire on `edit_date`.
pub fn affected_dates(
    rule: &ScheduleRule,
    edit_date: NaiveDate,
    mode: EditMode,
    max_days: u32,
) -> CalendarResult<Vec<NaiveDate>> {
    let Some(start) = rule.effective_range.start_date else {
        return Err(CalendarError::Validation(format!(
            "rule {} has no effective start date",
            rule.id
        )));
    };

    let from = match mode {
        EditMode::Single if rule.fires_on(edit_date) => return Ok(vec![edit_date]),
        EditMode::Single => {
            return Err(CalendarError::Validation(format!(
                "rule {} does not fire on {edit_date}",
                rule.id
            )));
        }
        EditMode::Future => edit_date.max(start),
        EditMode::All => start,
    };

    let cap = from
        .checked_add_days(Days::new(u64::from(max_days.saturating_sub(1))))
        .unwrap_or(NaiveDate::MAX);
    let to = rule.effective_range.end_date.map_or(cap, |end| end.min(cap));

    Ok(from
        .iter_days()
        .take_while(|date| *date <= to)
        .filter(|date| rule.fires_on(*date))
        .collect())
}

fn rule_audit(
    actor: &str,
    action: &str,
    rule: &ScheduleRule,
    after: Option<&ScheduleRule>,
) -> ServiceResult<AuditEntry> {
    Ok(AuditEntry {
        center_id: rule.center_id,
        actor: actor.to_string(),
        action: action.to_string(),
        target_type: ScheduleRule::TABLE_NAME,
        target_id: Some(rule.id),
        payload: AuditPayload::from_snapshots(Some(rule), after).map_err(CalendarError::from)?,
    })
}

fn ends_before(rule: &ScheduleRule, date: NaiveDate) -> bool {
    rule.effective_range.end_date.is_some_and(|end| end < date)
}

impl AdminService {
    /// ## Summary
    /// Lists the occurrences of rule `rule_id` an edit in `mode` at
    /// `edit_date` would touch.
    ///
    /// ## Errors
    /// Returns `NotFound` for an unknown rule, plus the errors of
    /// [`affected_dates`].
    #[tracing::instrument(skip(self))]
    pub async fn preview_affected_sessions(
        &self,
        rule_id: RuleId,
        edit_date: NaiveDate,
        mode: EditMode,
    ) -> ServiceResult<AffectedSessions> {
        let rule = self.rule(rule_id).await?;
        let dates = affected_dates(&rule, edit_date, mode, self.max_window_days)?;

        Ok(AffectedSessions {
            mode,
            affected_count: dates.len(),
            affected_dates: dates,
            will_create_rule: mode == EditMode::Future
                && rule
                    .effective_range
                    .start_date
                    .is_some_and(|start| edit_date > start)
                && !ends_before(&rule, edit_date),
        })
    }

    /// ## Summary
    /// Files the pending exception requests that make one occurrence follow
    /// `edit`.
    ///
    /// A teacher change alone is a `SUBSTITUTE`, a slot change alone a
    /// `MOVE`. Changing both cancels the occurrence and adds an ad-hoc
    /// session with the new slot and teacher.
    async fn edit_single(
        &self,
        rule: &ScheduleRule,
        edit: &RecurrenceEdit,
        now: DateTime<Utc>,
        actor: &str,
    ) -> ServiceResult<Vec<ScheduleException>> {
        check_rule_lock(rule, now)?;

        let on_rule = |kind: ExceptionKind| ScheduleException {
            id: 0,
            center_id: rule.center_id,
            rule_id: Some(rule.id),
            offering_id: rule.offering_id,
            date: edit.edit_date,
            kind,
            status: ExceptionStatus::Pending,
            start_time: None,
            end_time: None,
            room_id: None,
            teacher_id: None,
            reason: edit.reason.clone(),
            recurrence: None,
        };

        let requests = match (edit.changes_slot(), edit.teacher_id) {
            (false, teacher_id) => vec![ScheduleException {
                teacher_id,
                ..on_rule(ExceptionKind::Substitute)
            }],
            (true, None) => vec![ScheduleException {
                start_time: edit.start_time,
                end_time: edit.end_time,
                room_id: edit.room_id,
                ..on_rule(ExceptionKind::Move)
            }],
            (true, Some(_)) => {
                let edited = edit.apply_to(rule);
                vec![
                    on_rule(ExceptionKind::Cancel),
                    ScheduleException {
                        rule_id: None,
                        start_time: Some(edited.start_time),
                        end_time: Some(edited.end_time),
                        room_id: Some(edited.room_id),
                        teacher_id: edited.teacher_id,
                        ..on_rule(ExceptionKind::Adhoc)
                    },
                ]
            }
        };

        let mut created = Vec::with_capacity(requests.len());
        for request in requests {
            created.push(
                self.request_exception(rule.center_id, request, now, actor)
                    .await?,
            );
        }
        Ok(created)
    }

    /// ## Summary
    /// Ends `rule` the day before `edit.edit_date` and continues it from that
    /// date as a successor carrying the edit.
    async fn edit_future(
        &self,
        rule: &ScheduleRule,
        edit: &RecurrenceEdit,
        actor: &str,
    ) -> ServiceResult<(ScheduleRule, ScheduleRule)> {
        let last_date = edit.edit_date.pred_opt().unwrap_or(NaiveDate::MIN);
        let mut truncated = rule.clone();
        truncated.effective_range.end_date = Some(last_date);

        let successor = ScheduleRule {
            id: 0,
            effective_range: DateRange::new(edit.edit_date, rule.effective_range.end_date),
            lock_at: None,
            ..edit.apply_to(rule)
        };

        let mut siblings = self
            .admin
            .rule_repo()
            .list(ListFilter::center(rule.center_id), Page::unbounded())
            .await?;
        siblings.retain(|other| other.id != rule.id);
        siblings.push(truncated);
        validate_rule(&successor, &siblings)?;

        let audit = rule_audit(actor, "rule.split", rule, Some(&successor))?;

        Ok(self
            .admin
            .split_rule(rule.id, last_date, successor, audit)
            .await?)
    }

    /// ## Summary
    /// Applies `edit` to rule `rule_id` for one date, from a date on, or for
    /// every occurrence.
    ///
    /// `SINGLE` files pending exception requests. `FUTURE` splits the rule at
    /// the edit date; an edit date on or before the rule's start edits the
    /// whole rule instead. `ALL` updates the rule in place.
    ///
    /// ## Side Effects
    /// Writes the exceptions or rules described above with their audit
    /// entries.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown rule
    /// - a validation error for an edit that changes nothing, a date the rule
    ///   does not fire on, a `FUTURE` edit after the rule's end, or a result
    ///   that breaks a rule invariant
    /// - `LeadTimeViolated` and `RuleLocked` for `SINGLE` edits
    #[tracing::instrument(skip(self, edit), fields(edit_date = %edit.edit_date, mode = edit.mode.as_str()))]
    pub async fn edit_recurring(
        &self,
        rule_id: RuleId,
        edit: RecurrenceEdit,
        now: DateTime<Utc>,
        actor: &str,
    ) -> ServiceResult<RecurrenceEditResult> {
        let rule = self.rule(rule_id).await?;
        if !edit.changes_slot() && edit.teacher_id.is_none() {
            return Err(ServiceError::validation(format!(
                "edit of rule {rule_id} on {} changes nothing",
                edit.edit_date
            )));
        }
        let affected = affected_dates(&rule, edit.edit_date, edit.mode, self.max_window_days)?;
        let mut result = RecurrenceEditResult::new(edit.mode, affected.len());

        let covers_whole_rule = rule
            .effective_range
            .start_date
            .is_none_or(|start| edit.edit_date <= start);

        match edit.mode {
            EditMode::Single => {
                result.exceptions = self.edit_single(&rule, &edit, now, actor).await?;
            }
            EditMode::Future if ends_before(&rule, edit.edit_date) => {
                return Err(ServiceError::validation(format!(
                    "rule {rule_id} ends before {}",
                    edit.edit_date
                )));
            }
            EditMode::Future if !covers_whole_rule => {
                let (truncated, successor) = self.edit_future(&rule, &edit, actor).await?;
                result.updated_rule = Some(truncated);
                result.new_rule = Some(successor);
            }
            EditMode::Future | EditMode::All => {
                let patch = rule_patch(
                    &edit.apply_to(&rule),
                    &["start_time", "end_time", "room_id", "teacher_id"],
                )?;
                result.updated_rule = Some(self.update_rule(rule_id, patch, actor).await?);
            }
        }

        tracing::info!(affected = result.affected_count, "Recurring rule edited");
        Ok(result)
    }

    /// ## Summary
    /// Removes rule `rule_id` for one date, from a date on, or entirely.
    ///
    /// `SINGLE` files a pending `CANCEL` request. `FUTURE` ends the rule the
    /// day before `edit_date`, or deletes it when nothing would remain. `ALL`
    /// deletes the rule.
    ///
    /// ## Side Effects
    /// Writes the exception, the truncated rule or the deletion, with an
    /// audit entry.
    ///
    /// ## Errors
    /// Returns `NotFound` for an unknown rule, a validation error for a date
    /// the rule does not fire on, plus `LeadTimeViolated` and `RuleLocked`
    /// for `SINGLE` deletes.
    #[tracing::instrument(skip(self, reason))]
    pub async fn delete_recurring(
        &self,
        rule_id: RuleId,
        edit_date: NaiveDate,
        mode: EditMode,
        reason: String,
        now: DateTime<Utc>,
        actor: &str,
    ) -> ServiceResult<RecurrenceEditResult> {
        let rule = self.rule(rule_id).await?;
        let affected = affected_dates(&rule, edit_date, mode, self.max_window_days)?;
        let mut result = RecurrenceEditResult::new(mode, affected.len());

        let keeps_earlier_dates = rule
            .effective_range
            .start_date
            .is_some_and(|start| edit_date > start);

        match mode {
            EditMode::Single => {
                check_rule_lock(&rule, now)?;
                let cancel = ScheduleException {
                    id: 0,
                    center_id: rule.center_id,
                    rule_id: Some(rule.id),
                    offering_id: rule.offering_id,
                    date: edit_date,
                    kind: ExceptionKind::Cancel,
                    status: ExceptionStatus::Pending,
                    start_time: None,
                    end_time: None,
                    room_id: None,
                    teacher_id: None,
                    reason,
                    recurrence: None,
                };
                result.exceptions = vec![
                    self.request_exception(rule.center_id, cancel, now, actor)
                        .await?,
                ];
            }
            EditMode::Future if ends_before(&rule, edit_date) => {
                return Err(ServiceError::validation(format!(
                    "rule {rule_id} ends before {edit_date}"
                )));
            }
            EditMode::Future if keeps_earlier_dates => {
                let mut truncated = rule.clone();
                truncated.effective_range.end_date = edit_date.pred_opt();
                let patch = rule_patch(&truncated, &["effective_range"])?;
                result.updated_rule = Some(self.update_rule(rule_id, patch, actor).await?);
            }
            EditMode::Future | EditMode::All => {
                self.admin.rule_repo().delete(rule_id).await?;
                self.admin
                    .record_audit(rule_audit(actor, "rule.delete", &rule, None)?)
                    .await?;
                tracing::info!("Rule deleted");
            }
        }

        Ok(result)
    }
}
