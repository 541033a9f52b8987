use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use timeledger_core::constants::DEFAULT_EXCEPTION_LEAD_DAYS;

/// Per-center preferences stored as a JSON column.
///
/// Keys this type does not recognize are kept in `extra` and written back
/// unchanged, so newer settings survive older writers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterSettings {
    #[serde(default)]
    pub allow_public_register: bool,
    #[serde(default)]
    pub default_language: String,
    #[serde(default = "default_exception_lead_days")]
    pub exception_lead_days: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_course_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operating_end_time: Option<String>,
    /// Minimum gap a teacher needs between two sessions.
    #[serde(default)]
    pub teacher_buffer_minutes: u32,
    /// Minimum gap a room needs between two sessions.
    #[serde(default)]
    pub room_buffer_minutes: u32,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_exception_lead_days() -> i64 {
    i64::from(DEFAULT_EXCEPTION_LEAD_DAYS)
}

impl Default for CenterSettings {
    fn default() -> Self {
        Self {
            allow_public_register: false,
            default_language: String::new(),
            exception_lead_days: default_exception_lead_days(),
            default_course_duration: None,
            operating_start_time: None,
            operating_end_time: None,
            teacher_buffer_minutes: 0,
            room_buffer_minutes: 0,
            extra: Map::new(),
        }
    }
}

impl CenterSettings {
    /// ## Summary
    /// Lead time applied to new exceptions. Zero allows same-day exceptions;
    /// negative values fall back to the default of 14 days.
    #[must_use]
    pub fn lead_days(&self) -> u32 {
        u32::try_from(self.exception_lead_days).unwrap_or(DEFAULT_EXCEPTION_LEAD_DAYS)
    }
}
