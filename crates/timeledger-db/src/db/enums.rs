//! Database enum types with Diesel serialization.
//!
//! Each enum backs a CHECK-constrained text column and converts to and from
//! its counterpart in the calendar model.

use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use std::fmt;
use std::io::Write;

use timeledger_calendar::model;

/// Maps to `schedule_exceptions.kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum ExceptionKind {
    Cancel,
    Move,
    Substitute,
    Adhoc,
}

impl ExceptionKind {
    /// Returns the database string representation of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cancel => "CANCEL",
            Self::Move => "MOVE",
            Self::Substitute => "SUBSTITUTE",
            Self::Adhoc => "ADHOC",
        }
    }
}

impl ToSql<Text, Pg> for ExceptionKind {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for ExceptionKind {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"CANCEL" => Ok(Self::Cancel),
            b"MOVE" => Ok(Self::Move),
            b"SUBSTITUTE" => Ok(Self::Substitute),
            b"ADHOC" => Ok(Self::Adhoc),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ExceptionKind> for model::ExceptionKind {
    fn from(kind: ExceptionKind) -> Self {
        match kind {
            ExceptionKind::Cancel => Self::Cancel,
            ExceptionKind::Move => Self::Move,
            ExceptionKind::Substitute => Self::Substitute,
            ExceptionKind::Adhoc => Self::Adhoc,
        }
    }
}

impl From<model::ExceptionKind> for ExceptionKind {
    fn from(kind: model::ExceptionKind) -> Self {
        match kind {
            model::ExceptionKind::Cancel => Self::Cancel,
            model::ExceptionKind::Move => Self::Move,
            model::ExceptionKind::Substitute => Self::Substitute,
            model::ExceptionKind::Adhoc => Self::Adhoc,
        }
    }
}

/// Maps to `schedule_exceptions.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow)]
#[diesel(sql_type = Text)]
pub enum ExceptionStatus {
    Pending,
    Approved,
    Rejected,
    Revoked,
}

impl ExceptionStatus {
    /// Returns the database string representation of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Revoked => "REVOKED",
        }
    }
}

impl ToSql<Text, Pg> for ExceptionStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Pg> for ExceptionStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"PENDING" => Ok(Self::Pending),
            b"APPROVED" => Ok(Self::Approved),
            b"REJECTED" => Ok(Self::Rejected),
            b"REVOKED" => Ok(Self::Revoked),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl fmt::Display for ExceptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ExceptionStatus> for model::ExceptionStatus {
    fn from(status: ExceptionStatus) -> Self {
        match status {
            ExceptionStatus::Pending => Self::Pending,
            ExceptionStatus::Approved => Self::Approved,
            ExceptionStatus::Rejected => Self::Rejected,
            ExceptionStatus::Revoked => Self::Revoked,
        }
    }
}

impl From<model::ExceptionStatus> for ExceptionStatus {
    fn from(status: model::ExceptionStatus) -> Self {
        match status {
            model::ExceptionStatus::Pending => Self::Pending,
            model::ExceptionStatus::Approved => Self::Approved,
            model::ExceptionStatus::Rejected => Self::Rejected,
            model::ExceptionStatus::Revoked => Self::Revoked,
        }
    }
}
