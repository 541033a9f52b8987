//! Write-side contract behind rule and exception administration.
//!
//! Single-record writes go through the per-entity [`Repository`] accessors.
//! Writes that must land together with their audit entry, such as a review
//! decision or a rule split, get a dedicated method so each store can make
//! them atomic.

use chrono::NaiveDate;
use futures::future::BoxFuture;

use timeledger_calendar::model::{ExceptionStatus, Offering, ScheduleException, ScheduleRule};
use timeledger_calendar::store::ScheduleStore;
use timeledger_calendar::value::AuditPayload;
use timeledger_core::types::{CenterId, ExceptionId, RuleId};

use crate::error::DbResult;
use crate::repository::Repository;

/// One audit-log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub center_id: CenterId,
    pub actor: String,
    pub action: String,
    pub target_type: &'static str,
    pub target_id: Option<u64>,
    pub payload: AuditPayload,
}

pub trait ScheduleAdmin: ScheduleStore {
    fn offering_repo(&self) -> &dyn Repository<Offering>;

    fn rule_repo(&self) -> &dyn Repository<ScheduleRule>;

    fn exception_repo(&self) -> &dyn Repository<ScheduleException>;

    fn record_audit(&self, entry: AuditEntry) -> BoxFuture<'_, DbResult<()>>;

    /// ## Summary
    /// Moves an exception from `from` to `to` and records `audit` in the same
    /// write.
    ///
    /// Returns `None` when the exception does not exist or is no longer in
    /// `from`; nothing is written in that case.
    fn transition_exception(
        &self,
        id: ExceptionId,
        from: ExceptionStatus,
        to: ExceptionStatus,
        audit: AuditEntry,
    ) -> BoxFuture<'_, DbResult<Option<ScheduleException>>>;

    /// ## Summary
    /// Ends rule `rule_id` on `last_date`, stores `successor` and records
    /// `audit`, all in one write. Returns the truncated rule and the stored
    /// successor.
    ///
    /// ## Errors
    /// Returns `NotFound` for an unknown rule.
    fn split_rule(
        &self,
        rule_id: RuleId,
        last_date: NaiveDate,
        successor: ScheduleRule,
        audit: AuditEntry,
    ) -> BoxFuture<'_, DbResult<(ScheduleRule, ScheduleRule)>>;
}

pub const HOLIDAY_IMPORT_ACTOR: &str = "holiday-import";

/// ## Summary
/// Audit entry for one bulk holiday import, counting what was created and
/// what was skipped.
///
/// ## Errors
/// Returns an error if the snapshot cannot be encoded.
pub(crate) fn holiday_import_entry(
    center_id: CenterId,
    requested: usize,
    created: usize,
) -> DbResult<AuditEntry> {
    let snapshot = serde_json::json!({
        "requested_count": requested,
        "created_count": created,
        "skipped_count": requested.saturating_sub(created),
    });

    Ok(AuditEntry {
        center_id,
        actor: HOLIDAY_IMPORT_ACTOR.to_string(),
        action: "holiday.bulk_create".to_string(),
        target_type: "center_holidays",
        target_id: None,
        payload: AuditPayload::from_snapshots(None, Some(&snapshot))?,
    })
}
