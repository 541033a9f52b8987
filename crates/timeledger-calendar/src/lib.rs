//! Schedule domain for multi-tenant centers.
//!
//! Value objects and the schedule data model live here together with the
//! expansion engine that materializes weekly rules, their phases, per-date
//! exceptions and center holidays into a date-keyed calendar. Nothing in this
//! crate performs I/O; persistence is reached through the [`store`] contracts.

pub mod error;
pub mod expand;
pub mod model;
pub mod store;
pub mod value;
