use diesel::{pg::Pg, prelude::*};

use crate::db::schema;

/// Weekly rule row. `effective_range` holds the `DateRange` JSON column.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = schema::schedule_rules)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(super::offering::OfferingRow, foreign_key = offering_id))]
pub struct ScheduleRuleRow {
    pub id: i64,
    pub center_id: i64,
    pub offering_id: i64,
    pub weekday: i16,
    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,
    pub room_id: i64,
    pub teacher_id: Option<i64>,
    pub effective_range: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub lock_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Writable columns of a rule. Doubles as the full-row changeset, so `None`
/// clears a nullable column.
#[derive(Debug, Clone, PartialEq, Eq, Insertable, AsChangeset)]
#[diesel(table_name = schema::schedule_rules)]
#[diesel(treat_none_as_null = true)]
pub struct NewScheduleRuleRow {
    pub center_id: i64,
    pub offering_id: i64,
    pub weekday: i16,
    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,
    pub room_id: i64,
    pub teacher_id: Option<i64>,
    pub effective_range: Option<String>,
    pub lock_at: Option<chrono::DateTime<chrono::Utc>>,
}
