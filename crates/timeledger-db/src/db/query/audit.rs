//! Query composition for `audit_logs`.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::connection::DbConnection;
use crate::db::schema::audit_logs;
use crate::model::audit::NewAuditLogRow;

/// ## Summary
/// Appends one audit entry.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn insert(conn: &mut DbConnection<'_>, row: &NewAuditLogRow<'_>) -> QueryResult<()> {
    diesel::insert_into(audit_logs::table)
        .values(row)
        .execute(conn)
        .await?;
    Ok(())
}
