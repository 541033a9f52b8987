use diesel::{pg::Pg, prelude::*};

use crate::db::schema;

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::center_holidays)]
#[diesel(check_for_backend(Pg))]
pub struct CenterHolidayRow {
    pub id: i64,
    pub center_id: i64,
    pub holiday_date: chrono::NaiveDate,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::center_holidays)]
pub struct NewCenterHolidayRow<'a> {
    pub center_id: i64,
    pub holiday_date: chrono::NaiveDate,
    pub name: &'a str,
}
