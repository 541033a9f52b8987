//! `POST /api/centers/{center_id}/holidays/bulk`

use salvo::writing::Json;
use salvo::{Depot, Request, Response, handler};
use serde::Deserialize;

use timeledger_calendar::model::NewHoliday;
use timeledger_service::schedule::HolidayImport;

use super::path_id;
use crate::error::{AppError, AppResult};
use crate::service_handler::get_service_from_depot;

/// ## Summary
/// Bulk holiday request payload
#[derive(Debug, Deserialize)]
pub struct BulkHolidayRequest {
    pub holidays: Vec<NewHoliday>,
}

async fn import(req: &mut Request, depot: &Depot) -> AppResult<HolidayImport> {
    let center_id = path_id(req, "center_id")?;
    let body: BulkHolidayRequest = req.parse_json().await.map_err(|e| {
        tracing::debug!(error = %e, "Failed to parse bulk holiday request");
        AppError::BadRequest("Invalid request body".to_string())
    })?;
    let service = get_service_from_depot(depot)?;

    Ok(service.import_holidays(center_id, body.holidays).await?)
}

/// ## Summary
/// Creates the submitted holidays, skipping dates the center already has.
///
/// ## Side Effects
/// Inserts holiday rows and one audit entry.
///
/// ## Errors
/// Returns HTTP 400 for a malformed body, 404 for an unknown center and 502
/// when the store rejects the write.
#[handler]
pub async fn bulk_import(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    match import(req, depot).await {
        Ok(import) => res.render(Json(import)),
        Err(e) => e.render(res),
    }
}
