use diesel::{pg::Pg, prelude::*};

use crate::db::schema;

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = schema::centers)]
#[diesel(check_for_backend(Pg))]
pub struct CenterRow {
    pub id: i64,
    pub name: String,
    pub timezone: String,
    pub settings: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}
