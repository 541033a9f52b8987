//! `POST /api/centers/{center_id}/rules`

use salvo::http::StatusCode;
use salvo::writing::Json;
use salvo::{Depot, Request, Response, handler};

use timeledger_calendar::model::ScheduleRule;

use super::path_id;
use crate::app::api::{actor, json_body};
use crate::error::AppResult;
use crate::service_handler::get_admin_service_from_depot;

async fn create(req: &mut Request, depot: &Depot) -> AppResult<ScheduleRule> {
    let center_id = path_id(req, "center_id")?;
    let rule: ScheduleRule = json_body(req).await?;
    let service = get_admin_service_from_depot(depot)?;

    Ok(service.create_rule(center_id, rule, &actor(req)).await?)
}

/// ## Summary
/// Adds a weekly rule to a center after checking it against the center's
/// other rules.
///
/// ## Errors
/// Returns HTTP 400 for a malformed body, 404 for an unknown offering and
/// 422 for an invalid or overlapping rule.
#[handler]
pub async fn create_rule(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match create(req, depot).await {
        Ok(rule) => {
            res.status_code(StatusCode::CREATED);
            res.render(Json(rule));
        }
        Err(e) => e.render(res),
    }
}
