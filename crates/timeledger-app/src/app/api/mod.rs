mod app_specific;
mod centers;
mod exceptions;
mod rules;


use salvo::{Request, Router};
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

// Re-export route constants from core
pub use timeledger_core::constants::{
    API_ROUTE_COMPONENT, API_ROUTE_PREFIX, CENTERS_ROUTE_COMPONENT, CENTERS_ROUTE_PREFIX,
};
use timeledger_core::constants::{ACTOR_HEADER, DEFAULT_ACTOR};

/// ## Summary
/// Constructs the main API router.
#[must_use]
pub fn routes() -> Router {
    Router::with_path(API_ROUTE_COMPONENT)
        .push(app_specific::routes())
        .push(centers::routes())
        .push(rules::routes())
        .push(exceptions::routes())
}

/// ## Summary
/// Reads a numeric id from the route.
///
/// ## Errors
/// Returns `BadRequest` when the segment is missing or not an id.
fn path_id(req: &Request, name: &str) -> AppResult<u64> {
    req.param::<String>(name)
        .and_then(|raw| raw.parse::<u64>().ok())
        .ok_or_else(|| AppError::BadRequest(format!("{name} must be a positive integer")))
}

/// ## Summary
/// Parses the JSON body of an admin write.
///
/// ## Errors
/// Returns `BadRequest` for a missing or malformed body.
async fn json_body<T: DeserializeOwned>(req: &mut Request) -> AppResult<T> {
    req.parse_json::<T>().await.map_err(|e| {
        tracing::debug!(error = %e, "Failed to parse request body");
        AppError::BadRequest("Invalid request body".to_string())
    })
}

/// Who performs the write, from the actor header.
fn actor(req: &Request) -> String {
    req.header::<String>(ACTOR_HEADER)
        .filter(|actor| !actor.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ACTOR.to_string())
}
