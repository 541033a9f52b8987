//! `GET|POST /api/centers/{center_id}/exceptions`

use chrono::Utc;
use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Response, handler};

use timeledger_calendar::model::{ExceptionStatus, ScheduleException};
use timeledger_db::repository::Page;

use super::path_id;
use crate::app::api::{actor, json_body};
use crate::error::{AppError, AppResult};
use crate::service_handler::get_admin_service_from_depot;

/// ## Summary
/// Reads `status`, `offset` and `limit` from the query string.
fn list_query(req: &Request) -> AppResult<(Option<ExceptionStatus>, Page)> {
    let status = req
        .query::<String>("status")
        .map(|raw| raw.to_uppercase().parse::<ExceptionStatus>())
        .transpose()
        .map_err(AppError::BadRequest)?;
    let page = Page::new(
        req.query::<usize>("offset").unwrap_or(0),
        req.query::<usize>("limit").unwrap_or(Page::DEFAULT_LIMIT),
    );
    Ok((status, page))
}

async fn list(req: &Request, depot: &Depot) -> AppResult<Vec<ScheduleException>> {
    let center_id = path_id(req, "center_id")?;
    let (status, page) = list_query(req)?;
    let service = get_admin_service_from_depot(depot)?;

    Ok(service.list_exceptions(center_id, status, page).await?)
}

/// ## Summary
/// Lists the exceptions of a center in id order. `status=PENDING` narrows the
/// list to requests awaiting review.
///
/// ## Errors
/// Returns HTTP 400 for a bad center id or an unknown status.
#[handler]
pub async fn list_exceptions(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match list(req, depot).await {
        Ok(exceptions) => res.render(Json(exceptions)),
        Err(e) => e.render(res),
    }
}

async fn request(req: &mut Request, depot: &Depot) -> AppResult<ScheduleException> {
    let center_id = path_id(req, "center_id")?;
    let exception: ScheduleException = json_body(req).await?;
    let service = get_admin_service_from_depot(depot)?;

    Ok(service
        .request_exception(center_id, exception, Utc::now(), &actor(req))
        .await?)
}

/// ## Summary
/// Files an exception request. The stored request is always `PENDING` until
/// reviewed.
///
/// ## Side Effects
/// Inserts the exception and an audit entry.
///
/// ## Errors
/// Returns HTTP 400 for a malformed body, 404 for an unknown center and 422
/// when the date is inside the lead time, the rule is locked or the fields do
/// not fit the exception kind.
#[handler]
pub async fn request_exception(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match request(req, depot).await {
        Ok(exception) => {
            res.status_code(StatusCode::CREATED);
            res.render(Json(exception));
        }
        Err(e) => e.render(res),
    }
}
