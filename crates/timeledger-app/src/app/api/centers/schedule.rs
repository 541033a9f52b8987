//! `GET /api/centers/{center_id}/schedule?from=YYYY-MM-DD&to=YYYY-MM-DD`

use std::time::Duration;

use salvo::http::header::{HeaderName, HeaderValue};
use salvo::writing::Json;
use salvo::{Depot, Request, Response, handler};
use serde::Serialize;

use timeledger_calendar::expand::Expansion;
use timeledger_calendar::model::ExpandedSchedule;

use super::deadline::Deadline;
use super::{path_id, query_window};
use crate::config::get_config_from_depot;
use crate::error::AppResult;
use crate::service_handler::get_service_from_depot;

pub const DIAGNOSTICS_HEADER: &str = "x-schedule-diagnostics";

/// The bare record array, or records plus diagnostics when asked for.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ScheduleBody {
    Schedules(Vec<ExpandedSchedule>),
    Expansion(Expansion),
}

async fn load(req: &Request, depot: &Depot) -> AppResult<Expansion> {
    let center_id = path_id(req, "center_id")?;
    let window = query_window(req)?;
    let settings = get_config_from_depot(depot)?;
    let service = get_service_from_depot(depot)?;

    let deadline = Deadline::after(Duration::from_secs(
        settings.schedule.request_timeout_secs,
    ));
    Ok(service.expand(center_id, window, deadline.token()).await?)
}

/// ## Summary
/// Returns the materialized schedule of a center as a JSON array of
/// occurrences ordered by date, start time, offering and rule.
///
/// The number of data diagnostics is reported in `x-schedule-diagnostics`;
/// `diagnostics=true` returns `{schedules, diagnostics}` instead of the array.
///
/// ## Errors
/// Returns HTTP 400 for a bad center id or window, 404 for an unknown center,
/// 502 when schedule data cannot be read and 503 when the request deadline
/// elapses.
#[handler]
pub async fn get_schedule(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    let expansion = match load(req, depot).await {
        Ok(expansion) => expansion,
        Err(e) => {
            e.render(res);
            return;
        }
    };

    res.headers_mut().insert(
        HeaderName::from_static(DIAGNOSTICS_HEADER),
        HeaderValue::from(expansion.diagnostics.len()),
    );

    let body = if req.query::<bool>("diagnostics").unwrap_or(false) {
        ScheduleBody::Expansion(expansion)
    } else {
        ScheduleBody::Schedules(expansion.schedules)
    };
    res.render(Json(body));
}
