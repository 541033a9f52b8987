//! Query builders and executors, one module per table.

pub mod audit;
pub mod center;
pub mod exception;
pub mod holiday;
pub mod offering;
pub mod rule;
