//! Persistence contracts the engine and the admin surface depend on.
//!
//! Futures are boxed so the traits stay object safe and can be shared as
//! `Arc<dyn ScheduleStore>`.

use futures::future::BoxFuture;

use timeledger_core::types::{CenterId, OfferingId};

use crate::expand::ExpansionWindow;
use crate::model::{
    Center, CenterHoliday, NewHoliday, Offering, ScheduleException, ScheduleRule,
};

/// Error type collaborators report; carried unchanged inside
/// `CalendarError::FetchFailed`.
pub type StoreError = Box<dyn std::error::Error + Send + Sync>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Read side. Implementations answer from a read endpoint where one exists.
pub trait ScheduleSource: Send + Sync {
    fn load_center(&self, center_id: CenterId) -> BoxFuture<'_, StoreResult<Option<Center>>>;

    fn list_offerings_for_center(
        &self,
        center_id: CenterId,
    ) -> BoxFuture<'_, StoreResult<Vec<Offering>>>;

    /// Every rule of the center whose effective range intersects `window`.
    fn list_rules_for_center(
        &self,
        center_id: CenterId,
        window: ExpansionWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<ScheduleRule>>>;

    /// Every exception of the center dated inside `window`, in any status.
    fn list_exceptions_for_center(
        &self,
        center_id: CenterId,
        window: ExpansionWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<ScheduleException>>>;

    fn list_holidays_for_center(
        &self,
        center_id: CenterId,
        window: ExpansionWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<CenterHoliday>>>;

    /// Rules of one offering whose effective range intersects `window`.
    fn list_rules_for_offering(
        &self,
        center_id: CenterId,
        offering_id: OfferingId,
        window: ExpansionWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<ScheduleRule>>>;
}

/// Write side used by the holiday import.
pub trait HolidayWriter: Send + Sync {
    /// ## Summary
    /// Inserts holidays, silently skipping dates the center already has.
    /// Returns only the rows that were created.
    fn insert_holidays_skip_existing(
        &self,
        center_id: CenterId,
        holidays: Vec<NewHoliday>,
    ) -> BoxFuture<'_, StoreResult<Vec<CenterHoliday>>>;
}

/// A store offering both sides.
pub trait ScheduleStore: ScheduleSource + HolidayWriter {}

impl<T: ScheduleSource + HolidayWriter> ScheduleStore for T {}

/// Everything one expansion reads, fetched once up front.
#[derive(Debug, Clone, Default)]
pub struct ScheduleSnapshot {
    pub offerings: Vec<Offering>,
    pub rules: Vec<ScheduleRule>,
    pub exceptions: Vec<ScheduleException>,
    pub holidays: Vec<CenterHoliday>,
}
