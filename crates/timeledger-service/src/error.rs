use thiserror::Error;

use timeledger_calendar::error::CalendarError;
use timeledger_calendar::store::StoreError;
use timeledger_core::types::ExceptionId;

use crate::admin::SlotConflict;

/// Service layer errors - combines all error types
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    CalendarError(#[from] CalendarError),

    #[error(transparent)]
    DatabaseError(#[from] timeledger_db::error::DbError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Write failed: {0}")]
    WriteFailed(#[source] StoreError),

    /// The record is not in a state that allows the operation.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Exception {exception_id} collides with {} scheduled session(s)", conflicts.len())]
    ScheduleConflict {
        exception_id: ExceptionId,
        conflicts: Vec<SlotConflict>,
    },
}

impl ServiceError {
    /// ## Summary
    /// Shorthand for a write-side validation failure.
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::CalendarError(CalendarError::Validation(message.into()))
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
