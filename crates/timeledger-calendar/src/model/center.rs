use serde::{Deserialize, Serialize};

use timeledger_core::types::CenterId;

use crate::value::CenterSettings;

/// A tenant. Owns every offering, rule, exception and holiday beneath it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Center {
    pub id: CenterId,
    pub name: String,
    /// IANA zone name; empty when the center never picked one.
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub settings: CenterSettings,
}

impl Center {
    /// ## Summary
    /// The stored zone name, or `fallback` when none is stored.
    #[must_use]
    pub fn timezone_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.timezone.trim().is_empty() {
            fallback
        } else {
            &self.timezone
        }
    }
}
