//! Service-level tests over the in-memory store.

mod admin;
mod failures;
mod helpers;
mod holidays;
mod properties;
mod scenarios;
mod transitions;
