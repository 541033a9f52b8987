use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValueError;

/// Before/after snapshot recorded with an audit-log row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuditPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<Map<String, Value>>,
}

impl AuditPayload {
    #[must_use]
    pub const fn changed(before: Map<String, Value>, after: Map<String, Value>) -> Self {
        Self {
            before: Some(before),
            after: Some(after),
        }
    }

    /// ## Summary
    /// Builds a payload from any serializable snapshots.
    ///
    /// ## Errors
    /// Returns an error when a snapshot does not serialize to a JSON object.
    pub fn from_snapshots<T: Serialize>(
        before: Option<&T>,
        after: Option<&T>,
    ) -> Result<Self, ValueError> {
        Ok(Self {
            before: before.map(to_object).transpose()?,
            after: after.map(to_object).transpose()?,
        })
    }
}

fn to_object<T: Serialize>(value: &T) -> Result<Map<String, Value>, ValueError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(ValueError::Json(serde::ser::Error::custom(format!(
            "audit snapshot must be an object, got {other}"
        )))),
    }
}
