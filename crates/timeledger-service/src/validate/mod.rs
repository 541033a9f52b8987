//! Write-side checks for rules and exceptions.
//!
//! The expander tolerates bad data and reports it as diagnostics; these
//! validators keep it from being written in the first place.

pub mod exception;
pub mod rule;

pub use exception::{
    check_lead_time, check_rule_lock, create_exception, earliest_exception_date, validate_exception,
};
pub use rule::{create_rule, update_rule, validate_rule};
