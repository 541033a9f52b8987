//! `/api/exceptions/{exception_id}`: review, revocation and recurrence dates.

use chrono::NaiveDate;
use salvo::writing::Json;
use salvo::{Depot, Request, Response, Router, handler};

use timeledger_calendar::model::ScheduleException;
use timeledger_core::constants::EXCEPTIONS_ROUTE_COMPONENT;
use timeledger_service::admin::ReviewDecision;

use super::{actor, json_body, path_id};
use crate::error::AppResult;
use crate::service_handler::get_admin_service_from_depot;

/// Dates listed for a repeating exception when `limit` is not given.
const DEFAULT_RECURRENCE_LIMIT: u16 = 52;

#[must_use]
pub fn routes() -> Router {
    Router::with_path(EXCEPTIONS_ROUTE_COMPONENT).push(
        Router::with_path("{exception_id}")
            .push(Router::with_path("review").post(review_exception))
            .push(Router::with_path("revoke").post(revoke_exception))
            .push(Router::with_path("recurrence").get(get_recurrence)),
    )
}

async fn review(req: &mut Request, depot: &Depot) -> AppResult<ScheduleException> {
    let exception_id = path_id(req, "exception_id")?;
    let decision: ReviewDecision = json_body(req).await?;
    let service = get_admin_service_from_depot(depot)?;

    Ok(service
        .review_exception(exception_id, decision, &actor(req))
        .await?)
}

/// ## Summary
/// Approves or rejects a pending exception.
///
/// ## Side Effects
/// Changes the exception's status and records the decision in the audit log.
///
/// ## Errors
/// Returns HTTP 404 for an unknown exception and 409 when it is no longer
/// pending or when approval would collide with other sessions; the collisions
/// are listed under `conflicts`.
#[handler]
pub async fn review_exception(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match review(req, depot).await {
        Ok(exception) => res.render(Json(exception)),
        Err(e) => e.render(res),
    }
}

async fn revoke(req: &Request, depot: &Depot) -> AppResult<ScheduleException> {
    let exception_id = path_id(req, "exception_id")?;
    let service = get_admin_service_from_depot(depot)?;

    Ok(service.revoke_exception(exception_id, &actor(req)).await?)
}

/// ## Summary
/// Withdraws a pending exception request.
///
/// ## Errors
/// Returns HTTP 404 for an unknown exception and 409 when it is no longer
/// pending.
#[handler]
pub async fn revoke_exception(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match revoke(req, depot).await {
        Ok(exception) => res.render(Json(exception)),
        Err(e) => e.render(res),
    }
}

async fn recurrence(req: &Request, depot: &Depot) -> AppResult<Vec<NaiveDate>> {
    let exception_id = path_id(req, "exception_id")?;
    let limit = req
        .query::<u16>("limit")
        .unwrap_or(DEFAULT_RECURRENCE_LIMIT);
    let service = get_admin_service_from_depot(depot)?;

    Ok(service.recurrence_dates(exception_id, limit).await?)
}

/// ## Summary
/// Lists the dates a repeating exception covers.
///
/// ## Errors
/// Returns HTTP 404 for an unknown exception and 422 when it does not repeat.
#[handler]
pub async fn get_recurrence(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match recurrence(req, depot).await {
        Ok(dates) => res.render(Json(dates)),
        Err(e) => e.render(res),
    }
}
