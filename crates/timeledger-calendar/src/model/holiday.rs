use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use timeledger_core::types::{CenterId, HolidayId};

/// A non-operating date. Unique per `(center_id, date)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CenterHoliday {
    pub id: HolidayId,
    pub center_id: CenterId,
    pub date: NaiveDate,
    pub name: String,
}

/// Holiday submitted for creation; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHoliday {
    pub date: NaiveDate,
    #[serde(default)]
    pub name: String,
}
