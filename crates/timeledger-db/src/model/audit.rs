use diesel::prelude::*;

use crate::db::schema;

/// Audit entry; `payload` holds the `AuditPayload` JSON column.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::audit_logs)]
pub struct NewAuditLogRow<'a> {
    pub center_id: i64,
    pub actor: &'a str,
    pub action: &'a str,
    pub target_type: &'a str,
    pub target_id: Option<i64>,
    pub payload: String,
}
