use std::collections::HashSet;

use chrono::NaiveDate;

use timeledger_core::types::CenterId;

use crate::model::CenterHoliday;

/// Set of a center's non-operating dates.
///
/// Holidays only tag occurrences; they never remove them.
#[derive(Debug, Default)]
pub struct HolidayIndex {
    dates: HashSet<NaiveDate>,
}

impl HolidayIndex {
    /// ## Summary
    /// Indexes the holidays that belong to `center_id`.
    #[must_use]
    pub fn build<'a, I>(center_id: CenterId, holidays: I) -> Self
    where
        I: IntoIterator<Item = &'a CenterHoliday>,
    {
        let dates = holidays
            .into_iter()
            .filter(|holiday| holiday.center_id == center_id)
            .map(|holiday| holiday.date)
            .collect();
        Self { dates }
    }

    #[must_use]
    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}
