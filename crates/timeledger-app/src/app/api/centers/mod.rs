//! Per-center schedule routes.

mod deadline;
mod exceptions;
mod holidays;
mod rules;
mod schedule;
mod transitions;


use salvo::{Request, Router};

use timeledger_calendar::expand::ExpansionWindow;
use timeledger_core::constants::CENTERS_ROUTE_COMPONENT;

use super::path_id;
use crate::error::AppResult;

#[must_use]
pub fn routes() -> Router {
    Router::with_path(CENTERS_ROUTE_COMPONENT).push(
        Router::with_path("{center_id}")
            .push(Router::with_path("schedule").get(schedule::get_schedule))
            .push(Router::with_path("holidays/bulk").post(holidays::bulk_import))
            .push(Router::with_path("rules").post(rules::create_rule))
            .push(
                Router::with_path("exceptions")
                    .get(exceptions::list_exceptions)
                    .post(exceptions::request_exception),
            )
            .push(
                Router::with_path("offerings/{offering_id}/transitions")
                    .get(transitions::get_transitions),
            ),
    )
}

/// ## Summary
/// Reads the `from`/`to` query parameters as an expansion window.
///
/// ## Errors
/// Returns `InvalidWindow` for missing, malformed or reversed bounds.
fn query_window(req: &Request) -> AppResult<ExpansionWindow> {
    let from = req.query::<String>("from").unwrap_or_default();
    let to = req.query::<String>("to").unwrap_or_default();
    Ok(ExpansionWindow::parse(&from, &to)?)
}
