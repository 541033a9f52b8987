//! Materializes weekly rules into dated occurrences.
//!
//! [`expand`] walks an [`ExpansionWindow`] day by day. For each weekday the
//! [`PhaseIndex`] names the governing rules of every offering, the
//! [`ExceptionIndex`] overlays per-date changes and the [`HolidayIndex`] tags
//! non-operating days. Problems in the stored data never abort a run; they
//! are collected as [`Diagnostic`]s next to the output.

mod diagnostic;
mod exception_index;
mod expander;
mod holiday_index;
mod phase;
mod timezone;
mod transition;
mod window;

#[cfg(test)]
mod tests;

pub use diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
pub use exception_index::ExceptionIndex;
pub use expander::{ExpandOptions, Expansion, expand};
pub use holiday_index::HolidayIndex;
pub use phase::{PhaseGroup, PhaseIndex};
pub use timezone::{localize, resolve_timezone};
pub use transition::{PhaseTransition, RuleSlot, TransitionReport, detect_phase_transitions};
pub use window::ExpansionWindow;
