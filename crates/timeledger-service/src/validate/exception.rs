//! Exception validation: lead time, target rule and kind-specific fields.

use chrono::{DateTime, Days, NaiveDate, Utc};

use timeledger_calendar::error::{CalendarError, CalendarResult};
use timeledger_calendar::model::{
    Center, ExceptionKind, ExceptionStatus, ScheduleException, ScheduleRule,
};
use timeledger_calendar::value::{CenterSettings, TimeSlot};
use timeledger_db::repository::{ListFilter, Page, Repository};

use crate::error::{ServiceError, ServiceResult};

/// ## Summary
/// First date an exception created on `today` may target.
#[must_use]
pub fn earliest_exception_date(today: NaiveDate, settings: &CenterSettings) -> NaiveDate {
    today
        .checked_add_days(Days::new(u64::from(settings.lead_days())))
        .unwrap_or(NaiveDate::MAX)
}

/// ## Summary
/// Rejects exception dates inside the center's lead time.
///
/// ## Errors
/// Returns `CalendarError::LeadTimeViolated`.
pub fn check_lead_time(
    date: NaiveDate,
    today: NaiveDate,
    settings: &CenterSettings,
) -> CalendarResult<()> {
    let earliest = earliest_exception_date(today, settings);
    if date < earliest {
        return Err(CalendarError::LeadTimeViolated {
            date,
            earliest,
            lead_days: settings.lead_days(),
        });
    }
    Ok(())
}

/// ## Summary
/// Rejects new exceptions for a rule once its lock time has passed. A rule
/// without a lock time never locks.
///
/// ## Errors
/// Returns `CalendarError::RuleLocked` when `now` is after the lock time.
pub fn check_rule_lock(rule: &ScheduleRule, now: DateTime<Utc>) -> CalendarResult<()> {
    match rule.lock_at {
        Some(lock_at) if rule.is_locked_at(now) => Err(CalendarError::RuleLocked {
            rule_id: rule.id,
            lock_at,
        }),
        _ => Ok(()),
    }
}

fn invalid(exception: &ScheduleException, reason: &str) -> CalendarError {
    CalendarError::Validation(format!(
        "{} exception on {} {reason}",
        exception.kind.as_str(),
        exception.date
    ))
}

/// ## Summary
/// Checks an exception's fields against its kind and target rule.
///
/// `rule` is the rule named by `exception.rule_id`, or `None` when it does
/// not exist.
///
/// ## Errors
/// Returns `CalendarError::Validation` when:
/// - an `ADHOC` names a rule or lacks start, end or room
/// - any other kind has no rule, or a rule of another center or offering
/// - the rule does not fire on the exception date
/// - a `MOVE` replaces nothing or yields an empty slot
/// - a `SUBSTITUTE` has no teacher
///
/// Returns `CalendarError::Value` for an invalid recurrence.
pub fn validate_exception(
    exception: &ScheduleException,
    rule: Option<&ScheduleRule>,
) -> CalendarResult<()> {
    if let Some(recurrence) = &exception.recurrence {
        recurrence.validate()?;
    }

    if exception.is_adhoc() {
        if exception.rule_id.is_some() {
            return Err(invalid(exception, "must not target a rule"));
        }
        let (Some(start), Some(end), Some(_room)) =
            (exception.start_time, exception.end_time, exception.room_id)
        else {
            return Err(invalid(exception, "needs a start time, end time and room"));
        };
        if !TimeSlot::new(start, end).is_valid() {
            return Err(invalid(exception, "starts at or after its end"));
        }
        return Ok(());
    }

    let Some(rule_id) = exception.rule_id else {
        return Err(invalid(exception, "must target a rule"));
    };
    let Some(rule) = rule.filter(|rule| rule.id == rule_id) else {
        return Err(invalid(exception, &format!("targets unknown rule {rule_id}")));
    };
    if rule.center_id != exception.center_id || rule.offering_id != exception.offering_id {
        return Err(invalid(
            exception,
            &format!("does not match the center and offering of rule {rule_id}"),
        ));
    }
    if !rule.fires_on(exception.date) {
        return Err(invalid(
            exception,
            &format!("falls on a date rule {rule_id} does not fire"),
        ));
    }

    match exception.kind {
        ExceptionKind::Move => {
            if !exception.has_move_fields() {
                return Err(invalid(exception, "replaces neither time nor room"));
            }
            let slot = TimeSlot::new(
                exception.start_time.unwrap_or(rule.start_time),
                exception.end_time.unwrap_or(rule.end_time),
            );
            if !slot.is_valid() {
                return Err(invalid(exception, "starts at or after its end"));
            }
        }
        ExceptionKind::Substitute if exception.teacher_id.is_none() => {
            return Err(invalid(exception, "needs a substitute teacher"));
        }
        ExceptionKind::Cancel | ExceptionKind::Substitute | ExceptionKind::Adhoc => {}
    }

    Ok(())
}

const fn is_live(status: ExceptionStatus) -> bool {
    matches!(status, ExceptionStatus::Pending | ExceptionStatus::Approved)
}

/// ## Summary
/// Validates and stores a new exception for `center`.
///
/// `today` is the center-local date the request is made on and `now` the
/// instant checked against the rule's lock time.
///
/// ## Errors
/// Returns `LeadTimeViolated` for dates inside the lead time, `RuleLocked`
/// once the target rule stopped accepting exceptions, a validation
/// error for invalid fields or when a pending or approved exception already
/// covers the same rule and date, or the repository's error.
#[tracing::instrument(skip_all, fields(center_id = center.id, date = %exception.date))]
pub async fn create_exception(
    rules: &dyn Repository<ScheduleRule>,
    exceptions: &dyn Repository<ScheduleException>,
    center: &Center,
    exception: ScheduleException,
    today: NaiveDate,
    now: DateTime<Utc>,
) -> ServiceResult<ScheduleException> {
    if exception.center_id != center.id {
        return Err(ServiceError::validation(format!(
            "exception belongs to center {}, not {}",
            exception.center_id, center.id
        )));
    }
    check_lead_time(exception.date, today, &center.settings)?;

    let rule = match exception.rule_id {
        Some(rule_id) => rules.get_by_id(rule_id).await?,
        None => None,
    };
    validate_exception(&exception, rule.as_ref())?;
    if let Some(rule) = &rule {
        check_rule_lock(rule, now)?;
    }

    if let Some(rule_id) = exception.rule_id {
        let existing = exceptions
            .list(ListFilter::center(center.id), Page::unbounded())
            .await?;
        if let Some(taken) = existing.iter().find(|other| {
            other.rule_id == Some(rule_id) && other.date == exception.date && is_live(other.status)
        }) {
            return Err(ServiceError::validation(format!(
                "rule {rule_id} already has exception {} on {}",
                taken.id, exception.date
            )));
        }
    }

    Ok(exceptions.create(exception).await?)
}
