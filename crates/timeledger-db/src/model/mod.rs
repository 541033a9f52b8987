//! Row types for the schedule tables.

pub mod audit;
pub mod center;
pub mod exception;
pub mod holiday;
pub mod offering;
pub mod rule;
