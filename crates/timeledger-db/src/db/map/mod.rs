//! Row <-> calendar model mapping.

pub mod schedule;
