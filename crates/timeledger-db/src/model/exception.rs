use diesel::{pg::Pg, prelude::*};

use crate::db::enums::{ExceptionKind, ExceptionStatus};
use crate::db::schema;

/// Per-date override row. The `new_*` columns carry replacement values.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::schedule_exceptions)]
#[diesel(check_for_backend(Pg))]
pub struct ScheduleExceptionRow {
    pub id: i64,
    pub center_id: i64,
    pub rule_id: Option<i64>,
    pub offering_id: i64,
    pub exception_date: chrono::NaiveDate,
    pub kind: ExceptionKind,
    pub status: ExceptionStatus,
    pub new_start_time: Option<chrono::NaiveTime>,
    pub new_end_time: Option<chrono::NaiveTime>,
    pub new_room_id: Option<i64>,
    pub new_teacher_id: Option<i64>,
    pub reason: String,
    pub recurrence: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Writable columns of an exception; also the full-row changeset.
#[derive(Debug, Clone, PartialEq, Eq, Insertable, AsChangeset)]
#[diesel(table_name = schema::schedule_exceptions)]
#[diesel(treat_none_as_null = true)]
pub struct NewScheduleExceptionRow {
    pub center_id: i64,
    pub rule_id: Option<i64>,
    pub offering_id: i64,
    pub exception_date: chrono::NaiveDate,
    pub kind: ExceptionKind,
    pub status: ExceptionStatus,
    pub new_start_time: Option<chrono::NaiveTime>,
    pub new_end_time: Option<chrono::NaiveTime>,
    pub new_room_id: Option<i64>,
    pub new_teacher_id: Option<i64>,
    pub reason: String,
    pub recurrence: Option<String>,
}
