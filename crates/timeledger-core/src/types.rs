//! Identifier aliases shared by every layer.
//!
//! All ids are the unsigned surrogate keys of the relational store. A center
//! owns every other record; nothing references across centers.

pub type CenterId = u64;
pub type OfferingId = u64;
pub type RuleId = u64;
pub type ExceptionId = u64;
pub type HolidayId = u64;
pub type RoomId = u64;
pub type TeacherId = u64;

/// Rule id carried by occurrences synthesized from ad-hoc exceptions.
pub const ADHOC_RULE_ID: RuleId = 0;
