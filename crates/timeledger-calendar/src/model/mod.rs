//! Schedule data model. Every record is scoped to exactly one center.

mod center;
mod exception;
mod holiday;
mod occurrence;
mod offering;
mod rule;

pub use center::Center;
pub use exception::{ExceptionKind, ExceptionStatus, ScheduleException};
pub use holiday::{CenterHoliday, NewHoliday};
pub use occurrence::ExpandedSchedule;
pub use offering::Offering;
pub use rule::ScheduleRule;
