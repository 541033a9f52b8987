//! HTTP surface for the schedule engine.

pub mod app;
pub mod config;
pub mod error;
pub mod service_handler;
