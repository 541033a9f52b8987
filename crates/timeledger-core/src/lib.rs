//! Shared configuration, errors, identifiers and constants for the
//! timeledger workspace.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
