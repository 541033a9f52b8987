//! Value objects persisted as JSON text columns.

mod audit;
mod date_range;
mod recurrence;
mod settings;
pub mod time;


pub use audit::AuditPayload;
pub use date_range::{DateRange, parse_lenient_date};
pub use recurrence::{Frequency, RecurrenceRule};
pub use settings::CenterSettings;
pub use time::TimeSlot;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ValueError;

/// A value object stored as a single JSON text column.
///
/// A `NULL` or empty column reads back as the type's default value.
pub trait JsonColumn: Serialize + DeserializeOwned + Default {
    /// ## Summary
    /// Serializes the value into its column text.
    ///
    /// ## Errors
    /// Returns an error if the value cannot be encoded as JSON.
    fn to_column(&self) -> Result<String, ValueError> {
        Ok(serde_json::to_string(self)?)
    }

    /// ## Summary
    /// Reads a value back from its column text.
    ///
    /// ## Errors
    /// Returns an error if the column holds malformed JSON.
    fn from_column(column: Option<&str>) -> Result<Self, ValueError> {
        match column.map(str::trim) {
            None | Some("" | "null") => Ok(Self::default()),
            Some(text) => Ok(serde_json::from_str(text)?),
        }
    }
}

impl JsonColumn for DateRange {}
impl JsonColumn for CenterSettings {}
impl JsonColumn for AuditPayload {}
