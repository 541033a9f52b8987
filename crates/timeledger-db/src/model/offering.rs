use diesel::{pg::Pg, prelude::*};

use crate::db::schema;

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = schema::offerings)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(super::center::CenterRow, foreign_key = center_id))]
pub struct OfferingRow {
    pub id: i64,
    pub center_id: i64,
    pub name: String,
    pub default_room_id: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable, AsChangeset)]
#[diesel(table_name = schema::offerings)]
#[diesel(treat_none_as_null = true)]
pub struct NewOfferingRow {
    pub center_id: i64,
    pub name: String,
    pub default_room_id: Option<i64>,
}
