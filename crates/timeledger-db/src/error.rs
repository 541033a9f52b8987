use thiserror::Error;

use timeledger_calendar::error::ValueError;

/// Database layer errors
#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] diesel::result::Error),

    #[error("Pool error: {0}")]
    PoolError(#[from] diesel_async::pooled_connection::bb8::RunError),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Row mapping error in {table}: {message}")]
    MappingError {
        table: &'static str,
        message: String,
    },

    #[error("{table} {id} not found")]
    NotFound { table: &'static str, id: u64 },

    #[error(transparent)]
    ValueError(#[from] ValueError),
}

impl DbError {
    pub(crate) fn mapping(table: &'static str, message: impl Into<String>) -> Self {
        Self::MappingError {
            table,
            message: message.into(),
        }
    }
}

pub type DbResult<T> = std::result::Result<T, DbError>;
