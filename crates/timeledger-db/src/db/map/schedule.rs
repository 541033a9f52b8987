//! Conversions between schedule rows and the calendar model.
//!
//! Ids are `BIGINT` in the database and unsigned in the model; negative ids
//! and weekday numbers outside `1..=7` are rejected as mapping errors rather
//! than silently coerced.

use timeledger_calendar::model::{
    Center, CenterHoliday, Offering, ScheduleException, ScheduleRule,
};
use timeledger_calendar::value::time::{iso_number, weekday_from_iso};
use timeledger_calendar::value::{CenterSettings, DateRange, JsonColumn, RecurrenceRule};
use timeledger_core::types::ADHOC_RULE_ID;

use crate::admin::AuditEntry;
use crate::error::{DbError, DbResult};
use crate::model::audit::NewAuditLogRow;
use crate::model::center::CenterRow;
use crate::model::exception::{NewScheduleExceptionRow, ScheduleExceptionRow};
use crate::model::holiday::CenterHolidayRow;
use crate::model::offering::{NewOfferingRow, OfferingRow};
use crate::model::rule::{NewScheduleRuleRow, ScheduleRuleRow};

/// ## Summary
/// Converts a database id into a model id.
///
/// ## Errors
/// Returns a mapping error for negative ids.
pub fn model_id(table: &'static str, id: i64) -> DbResult<u64> {
    u64::try_from(id).map_err(|_e| DbError::mapping(table, format!("negative id {id}")))
}

/// ## Summary
/// Converts a model id into a database id.
///
/// ## Errors
/// Returns a mapping error for ids beyond `i64::MAX`.
pub fn db_id(table: &'static str, id: u64) -> DbResult<i64> {
    i64::try_from(id).map_err(|_e| DbError::mapping(table, format!("id {id} out of range")))
}

fn optional_id(table: &'static str, id: Option<i64>) -> DbResult<Option<u64>> {
    id.map(|id| model_id(table, id)).transpose()
}

/// ## Errors
/// Returns an error for negative ids or a malformed settings column.
pub fn center_from_row(row: CenterRow) -> DbResult<Center> {
    Ok(Center {
        id: model_id("centers", row.id)?,
        name: row.name,
        timezone: row.timezone,
        settings: CenterSettings::from_column(row.settings.as_deref())?,
    })
}

/// ## Errors
/// Returns an error for negative ids.
pub fn offering_from_row(row: OfferingRow) -> DbResult<Offering> {
    Ok(Offering {
        id: model_id("offerings", row.id)?,
        center_id: model_id("offerings", row.center_id)?,
        name: row.name,
        default_room_id: optional_id("offerings", row.default_room_id)?,
    })
}

/// ## Errors
/// Returns an error for negative ids, an invalid weekday or a malformed
/// effective range.
pub fn rule_from_row(row: ScheduleRuleRow) -> DbResult<ScheduleRule> {
    const TABLE: &str = "schedule_rules";

    Ok(ScheduleRule {
        id: model_id(TABLE, row.id)?,
        center_id: model_id(TABLE, row.center_id)?,
        offering_id: model_id(TABLE, row.offering_id)?,
        weekday: weekday_from_iso(i64::from(row.weekday))?,
        start_time: row.start_time,
        end_time: row.end_time,
        room_id: model_id(TABLE, row.room_id)?,
        teacher_id: optional_id(TABLE, row.teacher_id)?,
        effective_range: DateRange::from_column(row.effective_range.as_deref())?,
        lock_at: row.lock_at,
    })
}

/// ## Summary
/// A `NULL` or zero `rule_id` marks an ad-hoc session.
///
/// ## Errors
/// Returns an error for negative ids or a malformed recurrence column.
pub fn exception_from_row(row: ScheduleExceptionRow) -> DbResult<ScheduleException> {
    const TABLE: &str = "schedule_exceptions";

    let rule_id = optional_id(TABLE, row.rule_id)?.filter(|id| *id != ADHOC_RULE_ID);

    Ok(ScheduleException {
        id: model_id(TABLE, row.id)?,
        center_id: model_id(TABLE, row.center_id)?,
        rule_id,
        offering_id: model_id(TABLE, row.offering_id)?,
        date: row.exception_date,
        kind: row.kind.into(),
        status: row.status.into(),
        start_time: row.new_start_time,
        end_time: row.new_end_time,
        room_id: optional_id(TABLE, row.new_room_id)?,
        teacher_id: optional_id(TABLE, row.new_teacher_id)?,
        reason: row.reason,
        recurrence: RecurrenceRule::from_column(row.recurrence.as_deref())?,
    })
}

/// ## Errors
/// Returns an error for negative ids.
pub fn holiday_from_row(row: CenterHolidayRow) -> DbResult<CenterHoliday> {
    Ok(CenterHoliday {
        id: model_id("center_holidays", row.id)?,
        center_id: model_id("center_holidays", row.center_id)?,
        date: row.holiday_date,
        name: row.name,
    })
}

fn optional_db_id(table: &'static str, id: Option<u64>) -> DbResult<Option<i64>> {
    id.map(|id| db_id(table, id)).transpose()
}

/// ## Errors
/// Returns an error for ids beyond `i64::MAX`.
pub fn offering_to_row(offering: &Offering) -> DbResult<NewOfferingRow> {
    Ok(NewOfferingRow {
        center_id: db_id("offerings", offering.center_id)?,
        name: offering.name.clone(),
        default_room_id: optional_db_id("offerings", offering.default_room_id)?,
    })
}

/// ## Errors
/// Returns an error for ids beyond `i64::MAX` or an unencodable range.
pub fn rule_to_row(rule: &ScheduleRule) -> DbResult<NewScheduleRuleRow> {
    const TABLE: &str = "schedule_rules";

    Ok(NewScheduleRuleRow {
        center_id: db_id(TABLE, rule.center_id)?,
        offering_id: db_id(TABLE, rule.offering_id)?,
        weekday: i16::from(iso_number(rule.weekday)),
        start_time: rule.start_time,
        end_time: rule.end_time,
        room_id: db_id(TABLE, rule.room_id)?,
        teacher_id: optional_db_id(TABLE, rule.teacher_id)?,
        effective_range: Some(rule.effective_range.to_column()?),
        lock_at: rule.lock_at,
    })
}

/// ## Summary
/// Ad-hoc sessions are written with a `NULL` rule id.
///
/// ## Errors
/// Returns an error for ids beyond `i64::MAX` or an unencodable recurrence.
pub fn exception_to_row(exception: &ScheduleException) -> DbResult<NewScheduleExceptionRow> {
    const TABLE: &str = "schedule_exceptions";

    Ok(NewScheduleExceptionRow {
        center_id: db_id(TABLE, exception.center_id)?,
        rule_id: optional_db_id(TABLE, exception.rule_id)?,
        offering_id: db_id(TABLE, exception.offering_id)?,
        exception_date: exception.date,
        kind: exception.kind.into(),
        status: exception.status.into(),
        new_start_time: exception.start_time,
        new_end_time: exception.end_time,
        new_room_id: optional_db_id(TABLE, exception.room_id)?,
        new_teacher_id: optional_db_id(TABLE, exception.teacher_id)?,
        reason: exception.reason.clone(),
        recurrence: exception
            .recurrence
            .as_ref()
            .map(RecurrenceRule::to_column)
            .transpose()?,
    })
}

/// ## Errors
/// Returns an error for ids beyond `i64::MAX` or an unencodable payload.
pub fn audit_to_row(entry: &AuditEntry) -> DbResult<NewAuditLogRow<'_>> {
    Ok(NewAuditLogRow {
        center_id: db_id("audit_logs", entry.center_id)?,
        actor: &entry.actor,
        action: &entry.action,
        target_type: entry.target_type,
        target_id: optional_db_id("audit_logs", entry.target_id)?,
        payload: entry.payload.to_column()?,
    })
}

/// ## Summary
/// Maps every row, failing on the first row that does not convert.
///
/// ## Errors
/// Returns the first mapping error.
pub fn map_rows<R, T>(rows: Vec<R>, map: impl Fn(R) -> DbResult<T>) -> DbResult<Vec<T>> {
    rows.into_iter().map(map).collect()
}
