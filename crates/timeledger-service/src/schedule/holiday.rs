//! Holiday bulk import result.

use std::collections::HashSet;

use serde::Serialize;

use timeledger_calendar::model::{CenterHoliday, NewHoliday};

/// Outcome of one bulk import. `skipped` covers both dates the center
/// already had and dates repeated within the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HolidayImport {
    pub requested: usize,
    pub created: usize,
    pub skipped: usize,
    pub holidays: Vec<CenterHoliday>,
}

impl HolidayImport {
    #[must_use]
    pub fn new(requested: usize, holidays: Vec<CenterHoliday>) -> Self {
        Self {
            requested,
            created: holidays.len(),
            skipped: requested.saturating_sub(holidays.len()),
            holidays,
        }
    }
}

/// Keeps the first holiday submitted for each date.
pub(crate) fn dedupe_by_date(holidays: Vec<NewHoliday>) -> Vec<NewHoliday> {
    let mut seen = HashSet::new();
    holidays
        .into_iter()
        .filter(|holiday| seen.insert(holiday.date))
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn new_holiday(day: u32, name: &str) -> NewHoliday {
        NewHoliday {
            date: NaiveDate::from_ymd_opt(2026, 1, day).expect("valid date"),
            name: name.to_string(),
        }
    }

    #[test]
    fn dedupe_keeps_first_name() {
        let unique = dedupe_by_date(vec![
            new_holiday(1, "New Year"),
            new_holiday(19, "MLK Day"),
            new_holiday(1, "duplicate"),
        ]);

        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].name, "New Year");
        assert_eq!(unique[1].name, "MLK Day");
    }

    #[test]
    fn skipped_counts_everything_not_created() {
        let import = HolidayImport::new(3, Vec::new());
        assert_eq!(import.created, 0);
        assert_eq!(import.skipped, 3);
    }
}
