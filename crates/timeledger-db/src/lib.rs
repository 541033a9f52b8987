//! Persistence for centers, offerings, schedule rules, exceptions and
//! holidays.
//!
//! [`store::PgScheduleStore`] serves the schedule contracts from PostgreSQL
//! over split read/write pools; [`memory::MemoryScheduleStore`] serves them
//! from process memory through the generic [`repository::Repository`]. Both
//! implement [`admin::ScheduleAdmin`] for the write side.

pub mod admin;
pub mod db;
pub mod error;
pub mod memory;
pub mod model;
pub mod repository;
pub mod store;
