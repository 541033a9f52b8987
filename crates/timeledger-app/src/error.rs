use salvo::http::StatusCode;
use salvo::writing::Json;
use serde::Serialize;
use thiserror::Error;

use timeledger_calendar::error::CalendarError;
use timeledger_db::error::DbError;
use timeledger_service::admin::SlotConflict;
use timeledger_service::error::ServiceError;

/// Application-level errors (HTTP layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] ServiceError),

    #[error(transparent)]
    CoreError(#[from] timeledger_core::error::CoreError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<CalendarError> for AppError {
    fn from(err: CalendarError) -> Self {
        Self::ServiceError(ServiceError::CalendarError(err))
    }
}

/// ## Summary
/// Error response payload
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Sessions that blocked an approval.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<SlotConflict>,
}

impl AppError {
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::ServiceError(ServiceError::CalendarError(err)) => match err {
                CalendarError::InvalidWindow(_)
                | CalendarError::WindowTooLarge { .. }
                | CalendarError::Value(_) => StatusCode::BAD_REQUEST,
                CalendarError::FetchFailed { .. } => StatusCode::BAD_GATEWAY,
                CalendarError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                CalendarError::Validation(_)
                | CalendarError::LeadTimeViolated { .. }
                | CalendarError::RuleLocked { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            },
            Self::ServiceError(
                ServiceError::NotFound(_) | ServiceError::DatabaseError(DbError::NotFound { .. }),
            ) => StatusCode::NOT_FOUND,
            Self::ServiceError(ServiceError::DatabaseError(DbError::ValueError(_))) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::ServiceError(
                ServiceError::Conflict(_) | ServiceError::ScheduleConflict { .. },
            ) => StatusCode::CONFLICT,
            Self::ServiceError(ServiceError::WriteFailed(_)) => StatusCode::BAD_GATEWAY,
            Self::ServiceError(_) | Self::CoreError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// ## Summary
    /// Writes the error as a JSON body with its status code. Server-side
    /// failures are logged with their details and answered generically.
    pub fn render(&self, res: &mut salvo::Response) {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = ?self, status = status.as_u16(), "Request failed");
            match status {
                StatusCode::BAD_GATEWAY => "Schedule data unavailable".to_string(),
                StatusCode::SERVICE_UNAVAILABLE => "Request timed out".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
            self.to_string()
        };

        let conflicts = match self {
            Self::ServiceError(ServiceError::ScheduleConflict { conflicts, .. }) => {
                conflicts.clone()
            }
            _ => Vec::new(),
        };

        res.status_code(status);
        res.render(Json(ErrorResponse {
            error: message,
            conflicts,
        }));
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
