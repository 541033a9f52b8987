//! Schedule queries and holiday imports over a [`ScheduleStore`].
//!
//! [`ScheduleStore`]: timeledger_calendar::store::ScheduleStore

pub mod holiday;
pub mod service;

pub use holiday::HolidayImport;
pub use service::ScheduleService;
