//! Rule and exception administration.
//!
//! [`AdminService`] runs the validated writes behind the admin routes: rule
//! creation and edits, exception requests and their review, and the
//! single/future/all edits of a recurring rule. Every write leaves an audit
//! entry naming its actor.

mod recurrence;
mod review;

pub use recurrence::{
    AffectedSessions, EditMode, RecurrenceEdit, RecurrenceEditResult, affected_dates,
};
pub use review::{ConflictKind, ReviewAction, ReviewDecision, SlotConflict, find_conflicts};

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::{Map, Value};

use timeledger_calendar::error::{CalendarError, ValueError};
use timeledger_calendar::expand::resolve_timezone;
use timeledger_calendar::model::{Center, ExceptionStatus, ScheduleException, ScheduleRule};
use timeledger_calendar::value::AuditPayload;
use timeledger_core::config::ScheduleConfig;
use timeledger_core::types::{CenterId, ExceptionId, RuleId};
use timeledger_db::admin::{AuditEntry, ScheduleAdmin};
use timeledger_db::repository::{Entity, ListFilter, Page};

use crate::error::{ServiceError, ServiceResult};
use crate::schedule::service::{center_timezone, fetch_failed};
use crate::validate;

/// Validated writes for rules and exceptions over one admin store.
#[derive(Clone)]
pub struct AdminService {
    admin: Arc<dyn ScheduleAdmin>,
    default_timezone: Tz,
    max_window_days: u32,
}

/// ## Summary
/// Serializes `value` as a JSON object.
fn to_object<T: Serialize>(value: &T) -> ServiceResult<Map<String, Value>> {
    match serde_json::to_value(value).map_err(|e| CalendarError::Value(ValueError::from(e)))? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

/// ## Summary
/// Patch carrying only `keys` of `rule`, in its stored JSON form.
fn rule_patch(rule: &ScheduleRule, keys: &[&str]) -> ServiceResult<Map<String, Value>> {
    let mut document = to_object(rule)?;
    document.retain(|key, _| keys.contains(&key.as_str()));
    Ok(document)
}

fn audit_entry<E: Entity>(
    actor: &str,
    action: &str,
    before: Option<&E>,
    after: &E,
) -> ServiceResult<AuditEntry> {
    let payload =
        AuditPayload::from_snapshots(before, Some(after)).map_err(CalendarError::from)?;
    Ok(AuditEntry {
        center_id: after.center_id(),
        actor: actor.to_string(),
        action: action.to_string(),
        target_type: E::TABLE_NAME,
        target_id: Some(after.id()),
        payload,
    })
}

impl AdminService {
    /// ## Summary
    /// Creates a service over `admin`.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` when the default timezone is not a known
    /// IANA name.
    pub fn new(admin: Arc<dyn ScheduleAdmin>, config: &ScheduleConfig) -> ServiceResult<Self> {
        let default_timezone = resolve_timezone(&config.default_timezone)
            .map_err(|e| ServiceError::InvalidConfiguration(e.to_string()))?;

        Ok(Self {
            admin,
            default_timezone,
            max_window_days: config.max_window_days,
        })
    }

    async fn center(&self, center_id: CenterId) -> ServiceResult<Center> {
        self.admin
            .load_center(center_id)
            .await
            .map_err(fetch_failed)?
            .ok_or_else(|| ServiceError::NotFound(format!("center {center_id}")))
    }

    async fn rule(&self, rule_id: RuleId) -> ServiceResult<ScheduleRule> {
        self.admin
            .rule_repo()
            .get_by_id(rule_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("rule {rule_id}")))
    }

    async fn exception(&self, exception_id: ExceptionId) -> ServiceResult<ScheduleException> {
        self.admin
            .exception_repo()
            .get_by_id(exception_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("exception {exception_id}")))
    }

    /// ## Summary
    /// The center-local date at `now`.
    fn local_date(&self, center: &Center, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&center_timezone(center, self.default_timezone))
            .date_naive()
    }

    /// ## Summary
    /// Validates and stores a new rule for `center_id`.
    ///
    /// ## Side Effects
    /// Inserts the rule and a `rule.create` audit entry.
    ///
    /// ## Errors
    /// Returns a validation error when the rule names another center, plus
    /// everything [`validate::create_rule`] returns.
    #[tracing::instrument(skip(self, rule))]
    pub async fn create_rule(
        &self,
        center_id: CenterId,
        rule: ScheduleRule,
        actor: &str,
    ) -> ServiceResult<ScheduleRule> {
        if rule.center_id != center_id {
            return Err(ServiceError::validation(format!(
                "rule belongs to center {}, not {center_id}",
                rule.center_id
            )));
        }

        let created =
            validate::create_rule(self.admin.rule_repo(), self.admin.offering_repo(), rule).await?;
        self.admin
            .record_audit(audit_entry(actor, "rule.create", None, &created)?)
            .await?;

        tracing::info!(rule_id = created.id, "Rule created");
        Ok(created)
    }

    /// ## Summary
    /// Applies `patch` to rule `rule_id` after validating the result.
    ///
    /// ## Side Effects
    /// Updates the rule and records a `rule.update` audit entry with the
    /// before and after snapshots.
    ///
    /// ## Errors
    /// Same as [`validate::update_rule`].
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_rule(
        &self,
        rule_id: RuleId,
        patch: Map<String, Value>,
        actor: &str,
    ) -> ServiceResult<ScheduleRule> {
        let before = self.rule(rule_id).await?;
        let updated = validate::update_rule(
            self.admin.rule_repo(),
            self.admin.offering_repo(),
            rule_id,
            patch,
        )
        .await?;
        self.admin
            .record_audit(audit_entry(actor, "rule.update", Some(&before), &updated)?)
            .await?;

        Ok(updated)
    }

    /// ## Summary
    /// Files an exception request for `center_id`. Requests always start
    /// `PENDING`, whatever status the caller sent.
    ///
    /// ## Side Effects
    /// Inserts the exception and an `exception.create` audit entry.
    ///
    /// ## Errors
    /// Returns `NotFound` for an unknown center, plus everything
    /// [`validate::create_exception`] returns.
    #[tracing::instrument(skip(self, exception), fields(date = %exception.date, kind = exception.kind.as_str()))]
    pub async fn request_exception(
        &self,
        center_id: CenterId,
        mut exception: ScheduleException,
        now: DateTime<Utc>,
        actor: &str,
    ) -> ServiceResult<ScheduleException> {
        let center = self.center(center_id).await?;
        exception.status = ExceptionStatus::Pending;

        let created = validate::create_exception(
            self.admin.rule_repo(),
            self.admin.exception_repo(),
            &center,
            exception,
            self.local_date(&center, now),
            now,
        )
        .await?;
        self.admin
            .record_audit(audit_entry(actor, "exception.create", None, &created)?)
            .await?;

        tracing::info!(exception_id = created.id, "Exception requested");
        Ok(created)
    }

    /// ## Summary
    /// Lists the exceptions of a center in id order, optionally only those in
    /// `status`.
    ///
    /// ## Errors
    /// Returns the repository's error.
    pub async fn list_exceptions(
        &self,
        center_id: CenterId,
        status: Option<ExceptionStatus>,
        page: Page,
    ) -> ServiceResult<Vec<ScheduleException>> {
        let exceptions = self
            .admin
            .exception_repo()
            .list(ListFilter::center(center_id), Page::unbounded())
            .await?;

        Ok(exceptions
            .into_iter()
            .filter(|exception| status.is_none_or(|status| exception.status == status))
            .skip(page.offset)
            .take(page.limit)
            .collect())
    }

    /// ## Summary
    /// Dates a repeating exception covers, starting from its own date.
    ///
    /// ## Errors
    /// Returns `NotFound` for an unknown exception, a validation error when
    /// it carries no recurrence, or `CalendarError::Value` when the
    /// recurrence cannot be expanded.
    pub async fn recurrence_dates(
        &self,
        exception_id: ExceptionId,
        limit: u16,
    ) -> ServiceResult<Vec<NaiveDate>> {
        let exception = self.exception(exception_id).await?;
        let Some(recurrence) = &exception.recurrence else {
            return Err(ServiceError::validation(format!(
                "exception {exception_id} does not repeat"
            )));
        };

        Ok(recurrence
            .preview(exception.date, limit)
            .map_err(CalendarError::from)?)
    }
}
