//! Rule validation against its own invariants and its siblings.

use serde_json::{Map, Value};

use timeledger_calendar::error::{CalendarError, CalendarResult};
use timeledger_calendar::model::{Offering, ScheduleRule};
use timeledger_db::repository::{ListFilter, Page, Repository, apply_patch};

use crate::error::{ServiceError, ServiceResult};

/// ## Summary
/// Checks a rule on its own and against the other rules of its center.
///
/// Two rules of the same offering and weekday may share dates only when their
/// time slots are disjoint.
///
/// ## Errors
/// Returns `CalendarError::Validation` naming the first conflicting rule.
pub fn validate_rule(rule: &ScheduleRule, siblings: &[ScheduleRule]) -> CalendarResult<()> {
    rule.validate()?;

    if let Some(other) = siblings
        .iter()
        .filter(|other| other.center_id == rule.center_id)
        .find(|other| rule.conflicts_with(other))
    {
        return Err(CalendarError::Validation(format!(
            "rule overlaps rule {} on {} between {} and {}",
            other.id, other.weekday, other.start_time, other.end_time
        )));
    }

    Ok(())
}

async fn ensure_offering(
    offerings: &dyn Repository<Offering>,
    rule: &ScheduleRule,
) -> ServiceResult<()> {
    match offerings.get_by_id(rule.offering_id).await? {
        Some(offering) if offering.center_id == rule.center_id => Ok(()),
        Some(_) => Err(ServiceError::validation(format!(
            "offering {} belongs to another center",
            rule.offering_id
        ))),
        None => Err(ServiceError::NotFound(format!(
            "offering {}",
            rule.offering_id
        ))),
    }
}

/// ## Summary
/// Validates and stores a new rule.
///
/// ## Errors
/// Returns `NotFound` for an unknown offering, a validation error for
/// invalid or conflicting rules, or the repository's error.
#[tracing::instrument(skip_all, fields(center_id = rule.center_id, offering_id = rule.offering_id))]
pub async fn create_rule(
    rules: &dyn Repository<ScheduleRule>,
    offerings: &dyn Repository<Offering>,
    rule: ScheduleRule,
) -> ServiceResult<ScheduleRule> {
    ensure_offering(offerings, &rule).await?;

    let siblings = rules
        .list(ListFilter::center(rule.center_id), Page::unbounded())
        .await?;
    validate_rule(&rule, &siblings)?;

    Ok(rules.create(rule).await?)
}

/// ## Summary
/// Applies `patch` to a stored rule after validating the patched result.
///
/// ## Errors
/// Returns `NotFound` for unknown ids, a validation error when the patched
/// rule breaks an invariant, or the repository's error.
#[tracing::instrument(skip(rules, offerings, patch))]
pub async fn update_rule(
    rules: &dyn Repository<ScheduleRule>,
    offerings: &dyn Repository<Offering>,
    id: u64,
    patch: Map<String, Value>,
) -> ServiceResult<ScheduleRule> {
    let current = rules
        .get_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("rule {id}")))?;

    let patched = apply_patch(&current, patch.clone())?;
    if patched.offering_id != current.offering_id {
        ensure_offering(offerings, &patched).await?;
    }

    let siblings = rules
        .list(ListFilter::center(current.center_id), Page::unbounded())
        .await?;
    validate_rule(&patched, &siblings)?;

    Ok(rules.update(id, patch).await?)
}
