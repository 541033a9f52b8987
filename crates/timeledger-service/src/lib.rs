//! Orchestration on top of the calendar engine: fetching a snapshot from a
//! store, running the expansion under a cancellation token, holiday imports,
//! write-side validation and the rule and exception lifecycle.

pub mod admin;
pub mod error;
pub mod schedule;
pub mod validate;
