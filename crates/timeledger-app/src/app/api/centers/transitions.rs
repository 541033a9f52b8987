//! `GET /api/centers/{center_id}/offerings/{offering_id}/transitions`

use std::time::Duration;

use salvo::writing::Json;
use salvo::{Depot, Request, Response, handler};

use timeledger_calendar::expand::TransitionReport;

use super::deadline::Deadline;
use super::{path_id, query_window};
use crate::config::get_config_from_depot;
use crate::error::AppResult;
use crate::service_handler::get_service_from_depot;

async fn load(req: &Request, depot: &Depot) -> AppResult<TransitionReport> {
    let center_id = path_id(req, "center_id")?;
    let offering_id = path_id(req, "offering_id")?;
    let window = query_window(req)?;
    let settings = get_config_from_depot(depot)?;
    let service = get_service_from_depot(depot)?;

    let deadline = Deadline::after(Duration::from_secs(
        settings.schedule.request_timeout_secs,
    ));
    Ok(service
        .phase_transitions(center_id, offering_id, window, deadline.token())
        .await?)
}

/// ## Summary
/// Lists the dates within `[from, to]` where the rules governing one
/// offering change.
///
/// ## Errors
/// Returns HTTP 400 for bad ids or window, 502 when rules cannot be read and
/// 503 when the request deadline elapses.
#[handler]
pub async fn get_transitions(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match load(req, depot).await {
        Ok(report) => res.render(Json(report)),
        Err(e) => e.render(res),
    }
}
