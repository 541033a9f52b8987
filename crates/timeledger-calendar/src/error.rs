use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use timeledger_core::types::RuleId;

use crate::store::StoreError;

/// Errors raised while reading or writing value-object columns.
#[derive(Error, Debug)]
pub enum ValueError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid weekday {0}, expected 1 (Monday) through 7 (Sunday)")]
    InvalidWeekday(i64),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRecurrence(String),

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("Malformed JSON column: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced by the expansion engine and the write-side validators.
#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Window of {days} days exceeds the maximum of {max} days")]
    WindowTooLarge { days: i64, max: u32 },

    #[error("{component}: {source}")]
    FetchFailed {
        component: &'static str,
        source: StoreError,
    },

    #[error("Expansion cancelled")]
    Cancelled,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Exception date {date} is inside the {lead_days}-day lead time, earliest allowed is {earliest}")]
    LeadTimeViolated {
        date: NaiveDate,
        earliest: NaiveDate,
        lead_days: u32,
    },

    #[error("Rule {rule_id} stopped accepting exceptions at {lock_at}")]
    RuleLocked {
        rule_id: RuleId,
        lock_at: DateTime<Utc>,
    },

    #[error(transparent)]
    Value(#[from] ValueError),
}

pub type CalendarResult<T> = std::result::Result<T, CalendarError>;
