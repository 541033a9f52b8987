//! `/api/rules/{rule_id}`: edits, previews and deletes of one recurring rule.

use chrono::{NaiveDate, Utc};
use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};
use serde_json::{Map, Value};

use timeledger_calendar::model::ScheduleRule;
use timeledger_core::constants::{DATE_FORMAT, RULES_ROUTE_COMPONENT};
use timeledger_service::admin::{AffectedSessions, EditMode, RecurrenceEdit, RecurrenceEditResult};

use super::{actor, json_body, path_id};
use crate::error::{AppError, AppResult};
use crate::service_handler::get_admin_service_from_depot;

#[must_use]
pub fn routes() -> Router {
    Router::with_path(RULES_ROUTE_COMPONENT).push(
        Router::with_path("{rule_id}")
            .patch(update_rule)
            .delete(delete_rule)
            .push(Router::with_path("preview").get(preview_rule_edit))
            .push(Router::with_path("edits").post(edit_rule)),
    )
}

/// ## Summary
/// Reads the `date` and `mode` query parameters of a preview or delete.
///
/// ## Errors
/// Returns `BadRequest` when either is missing or malformed.
fn edit_query(req: &Request) -> AppResult<(NaiveDate, EditMode)> {
    let date = req
        .query::<String>("date")
        .and_then(|raw| NaiveDate::parse_from_str(&raw, DATE_FORMAT).ok())
        .ok_or_else(|| AppError::BadRequest("date must be YYYY-MM-DD".to_string()))?;
    let mode = req
        .query::<String>("mode")
        .ok_or_else(|| AppError::BadRequest("mode is required".to_string()))?
        .to_uppercase()
        .parse::<EditMode>()
        .map_err(AppError::BadRequest)?;
    Ok((date, mode))
}

async fn update(req: &mut Request, depot: &Depot) -> AppResult<ScheduleRule> {
    let rule_id = path_id(req, "rule_id")?;
    let patch: Map<String, Value> = json_body(req).await?;
    let service = get_admin_service_from_depot(depot)?;

    Ok(service.update_rule(rule_id, patch, &actor(req)).await?)
}

/// ## Summary
/// Applies a partial update to a rule. Ids cannot be changed.
///
/// ## Errors
/// Returns HTTP 400 for a malformed body, 404 for an unknown rule and 422
/// when the updated rule is invalid or overlaps another rule.
#[handler]
pub async fn update_rule(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match update(req, depot).await {
        Ok(rule) => res.render(Json(rule)),
        Err(e) => e.render(res),
    }
}

async fn preview(req: &Request, depot: &Depot) -> AppResult<AffectedSessions> {
    let rule_id = path_id(req, "rule_id")?;
    let (date, mode) = edit_query(req)?;
    let service = get_admin_service_from_depot(depot)?;

    Ok(service.preview_affected_sessions(rule_id, date, mode).await?)
}

/// ## Summary
/// Lists the occurrences an edit in `mode` from `date` would touch.
///
/// ## Errors
/// Returns HTTP 400 for bad query parameters, 404 for an unknown rule and
/// 422 for a `SINGLE` date the rule does not fire on.
#[handler]
pub async fn preview_rule_edit(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match preview(req, depot).await {
        Ok(preview) => res.render(Json(preview)),
        Err(e) => e.render(res),
    }
}

async fn edit(req: &mut Request, depot: &Depot) -> AppResult<RecurrenceEditResult> {
    let rule_id = path_id(req, "rule_id")?;
    let edit: RecurrenceEdit = json_body(req).await?;
    let service = get_admin_service_from_depot(depot)?;

    Ok(service
        .edit_recurring(rule_id, edit, Utc::now(), &actor(req))
        .await?)
}

/// ## Summary
/// Edits one occurrence, every occurrence from a date on, or the whole rule.
///
/// ## Side Effects
/// Files exception requests, splits the rule or updates it in place.
///
/// ## Errors
/// Returns HTTP 400 for a malformed body, 404 for an unknown rule and 422
/// for edits the rule cannot take.
#[handler]
pub async fn edit_rule(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match edit(req, depot).await {
        Ok(result) => res.render(Json(result)),
        Err(e) => e.render(res),
    }
}

async fn delete(req: &Request, depot: &Depot) -> AppResult<RecurrenceEditResult> {
    let rule_id = path_id(req, "rule_id")?;
    let (date, mode) = edit_query(req)?;
    let reason = req.query::<String>("reason").unwrap_or_default();
    let service = get_admin_service_from_depot(depot)?;

    Ok(service
        .delete_recurring(rule_id, date, mode, reason, Utc::now(), &actor(req))
        .await?)
}

/// ## Summary
/// Cancels one occurrence, ends the rule before `date`, or deletes it.
///
/// ## Errors
/// Returns HTTP 400 for bad query parameters, 404 for an unknown rule and
/// 422 when a single cancellation is not allowed.
#[handler]
pub async fn delete_rule(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match delete(req, depot).await {
        Ok(result) => res.render(Json(result)),
        Err(e) => e.render(res),
    }
}
