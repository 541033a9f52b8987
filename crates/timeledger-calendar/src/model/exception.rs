use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use timeledger_core::types::{CenterId, ExceptionId, OfferingId, RoomId, RuleId, TeacherId};

use crate::value::RecurrenceRule;
use crate::value::time::wall_clock_opt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExceptionKind {
    Cancel,
    Move,
    Substitute,
    Adhoc,
}

impl ExceptionKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cancel => "CANCEL",
            Self::Move => "MOVE",
            Self::Substitute => "SUBSTITUTE",
            Self::Adhoc => "ADHOC",
        }
    }
}

impl std::str::FromStr for ExceptionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CANCEL" => Ok(Self::Cancel),
            "MOVE" => Ok(Self::Move),
            "SUBSTITUTE" => Ok(Self::Substitute),
            "ADHOC" => Ok(Self::Adhoc),
            other => Err(format!("unknown exception kind: {other}")),
        }
    }
}

/// Review state of an exception. Only approved exceptions affect expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExceptionStatus {
    Pending,
    #[default]
    Approved,
    Rejected,
    Revoked,
}

impl ExceptionStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Revoked => "REVOKED",
        }
    }
}

impl std::str::FromStr for ExceptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            "REVOKED" => Ok(Self::Revoked),
            other => Err(format!("unknown exception status: {other}")),
        }
    }
}

/// A per-date override of a rule, or an ad-hoc session with no rule.
///
/// Replacement fields are only read for the kinds that use them: `MOVE` reads
/// times and room, `SUBSTITUTE` reads the teacher, `ADHOC` reads all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleException {
    pub id: ExceptionId,
    pub center_id: CenterId,
    /// `None` for ad-hoc sessions.
    #[serde(default)]
    pub rule_id: Option<RuleId>,
    pub offering_id: OfferingId,
    pub date: NaiveDate,
    pub kind: ExceptionKind,
    #[serde(default)]
    pub status: ExceptionStatus,
    #[serde(default, with = "wall_clock_opt")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "wall_clock_opt")]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub room_id: Option<RoomId>,
    #[serde(default)]
    pub teacher_id: Option<TeacherId>,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,
}

impl ScheduleException {
    #[must_use]
    pub const fn is_adhoc(&self) -> bool {
        matches!(self.kind, ExceptionKind::Adhoc)
    }

    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self.status, ExceptionStatus::Approved)
    }

    /// ## Summary
    /// Whether the exception carries any of the fields a `MOVE` may replace.
    #[must_use]
    pub const fn has_move_fields(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some() || self.room_id.is_some()
    }
}
