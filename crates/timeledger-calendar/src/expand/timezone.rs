//! Anchors wall-clock times to the center's UTC offset.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDate, NaiveTime, Offset, TimeDelta, TimeZone};
use chrono_tz::Tz;

use crate::error::ValueError;

/// ## Summary
/// Resolves an IANA zone name.
///
/// ## Errors
/// Returns `ValueError::UnknownTimezone` for names chrono-tz does not know.
pub fn resolve_timezone(name: &str) -> Result<Tz, ValueError> {
    Tz::from_str(name.trim()).map_err(|_e| ValueError::UnknownTimezone(name.to_string()))
}

/// ## Summary
/// Places a local wall-clock time on `date` in `tz`.
///
/// A time that falls in a spring-forward gap is shifted forward by the gap
/// length; an ambiguous fall-back time resolves to the earlier instant. The
/// local date of the result may therefore only change inside a gap that
/// crosses midnight.
#[must_use]
pub fn localize(date: NaiveDate, time: NaiveTime, tz: Tz) -> DateTime<FixedOffset> {
    let local = date.and_time(time);

    let resolved = match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            // Read the wall clock with the offset in force before the gap.
            let before = tz
                .offset_from_utc_datetime(&(local - TimeDelta::days(1)))
                .fix();
            let utc = local - TimeDelta::seconds(i64::from(before.local_minus_utc()));
            let shifted = tz.from_utc_datetime(&utc);
            tracing::trace!(
                requested = %local,
                shifted = %shifted,
                zone = %tz,
                "Wall-clock time falls in a DST gap"
            );
            shifted
        }
    };

    resolved.with_timezone(&resolved.offset().fix())
}
