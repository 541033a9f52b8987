//! Schedule expansion service.

use std::future::Future;
use std::sync::Arc;

use chrono_tz::Tz;
use tokio_util::sync::CancellationToken;

use timeledger_calendar::error::CalendarError;
use timeledger_calendar::expand::{
    ExpandOptions, Expansion, ExpansionWindow, TransitionReport, detect_phase_transitions, expand,
    resolve_timezone,
};
use timeledger_calendar::model::{Center, NewHoliday};
use timeledger_calendar::store::{ScheduleSnapshot, ScheduleStore, StoreError, StoreResult};
use timeledger_core::config::ScheduleConfig;
use timeledger_core::constants::FETCH_COMPONENT;
use timeledger_core::types::{CenterId, OfferingId};

use super::holiday::{HolidayImport, dedupe_by_date};
use crate::error::{ServiceError, ServiceResult};

/// Runs expansions and holiday imports for every center against one store.
#[derive(Clone)]
pub struct ScheduleService {
    store: Arc<dyn ScheduleStore>,
    default_timezone: Tz,
    max_window_days: u32,
}

/// ## Summary
/// Awaits one upstream fetch, tagging its failure and checking the token
/// once it completes.
async fn fetch<T>(
    cancel: &CancellationToken,
    future: impl Future<Output = StoreResult<T>>,
) -> ServiceResult<T> {
    let value = future.await.map_err(fetch_failed)?;
    ensure_live(cancel)?;
    Ok(value)
}

pub(crate) fn fetch_failed(source: StoreError) -> CalendarError {
    CalendarError::FetchFailed {
        component: FETCH_COMPONENT,
        source,
    }
}

pub(crate) fn center_timezone(center: &Center, default: Tz) -> Tz {
    if center.timezone.trim().is_empty() {
        return default;
    }
    resolve_timezone(&center.timezone).unwrap_or_else(|e| {
        tracing::warn!(center_id = center.id, error = %e, "Falling back to default timezone");
        default
    })
}

fn ensure_live(cancel: &CancellationToken) -> ServiceResult<()> {
    if cancel.is_cancelled() {
        return Err(CalendarError::Cancelled.into());
    }
    Ok(())
}

impl ScheduleService {
    /// ## Summary
    /// Creates a service over `store`.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` when the default timezone is not a known
    /// IANA name.
    pub fn new(store: Arc<dyn ScheduleStore>, config: &ScheduleConfig) -> ServiceResult<Self> {
        let default_timezone = resolve_timezone(&config.default_timezone)
            .map_err(|e| ServiceError::InvalidConfiguration(e.to_string()))?;

        Ok(Self {
            store,
            default_timezone,
            max_window_days: config.max_window_days,
        })
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn ScheduleStore> {
        &self.store
    }

    /// ## Summary
    /// The zone occurrences of `center` are anchored to. A missing or unknown
    /// stored zone falls back to the configured default.
    #[must_use]
    pub fn timezone_for(&self, center: &Center) -> Tz {
        center_timezone(center, self.default_timezone)
    }

    /// ## Summary
    /// Materializes the schedule of `center_id` over `window`.
    ///
    /// The center, its offerings, rules, exceptions and holidays are fetched
    /// concurrently and form the snapshot for this call; nothing is re-read.
    ///
    /// ## Errors
    /// - `WindowTooLarge` before anything is fetched
    /// - `FetchFailed` tagged `expander.fetch` carrying the store's error
    /// - `Cancelled` when `cancel` fires after a fetch or during emission
    /// - `NotFound` for an unknown center
    #[tracing::instrument(skip(self, window, cancel), fields(from = %window.from, to = %window.to))]
    pub async fn expand(
        &self,
        center_id: CenterId,
        window: ExpansionWindow,
        cancel: &CancellationToken,
    ) -> ServiceResult<Expansion> {
        window.ensure_within(self.max_window_days)?;

        let store = &self.store;
        let (center, offerings, rules, exceptions, holidays) = tokio::try_join!(
            fetch(cancel, store.load_center(center_id)),
            fetch(cancel, store.list_offerings_for_center(center_id)),
            fetch(cancel, store.list_rules_for_center(center_id, window)),
            fetch(cancel, store.list_exceptions_for_center(center_id, window)),
            fetch(cancel, store.list_holidays_for_center(center_id, window)),
        )?;

        let center = center.ok_or_else(|| ServiceError::NotFound(format!("center {center_id}")))?;

        tracing::debug!(
            rules = rules.len(),
            exceptions = exceptions.len(),
            holidays = holidays.len(),
            "Fetched schedule snapshot"
        );

        let snapshot = ScheduleSnapshot {
            offerings,
            rules,
            exceptions,
            holidays,
        };
        let options = ExpandOptions {
            timezone: self.timezone_for(&center),
            max_window_days: self.max_window_days,
        };

        Ok(expand(center_id, &window, &snapshot, &options, cancel)?)
    }

    /// ## Summary
    /// Reports where the governing rules of one offering change within
    /// `window`.
    ///
    /// ## Errors
    /// Same window, fetch and cancellation errors as [`Self::expand`].
    #[tracing::instrument(skip(self, window, cancel), fields(from = %window.from, to = %window.to))]
    pub async fn phase_transitions(
        &self,
        center_id: CenterId,
        offering_id: OfferingId,
        window: ExpansionWindow,
        cancel: &CancellationToken,
    ) -> ServiceResult<TransitionReport> {
        window.ensure_within(self.max_window_days)?;

        let rules = fetch(
            cancel,
            self.store
                .list_rules_for_offering(center_id, offering_id, window),
        )
        .await?;

        Ok(detect_phase_transitions(
            center_id,
            offering_id,
            &rules,
            &window,
        ))
    }

    /// ## Summary
    /// Imports holidays for a center, skipping dates it already has and dates
    /// repeated within the request.
    ///
    /// ## Side Effects
    /// Inserts the new holidays and one audit entry.
    ///
    /// ## Errors
    /// Returns `NotFound` for an unknown center and `WriteFailed` when the
    /// store rejects the insert.
    #[tracing::instrument(skip(self, holidays), fields(requested = holidays.len()))]
    pub async fn import_holidays(
        &self,
        center_id: CenterId,
        holidays: Vec<NewHoliday>,
    ) -> ServiceResult<HolidayImport> {
        let center = self
            .store
            .load_center(center_id)
            .await
            .map_err(fetch_failed)?;
        if center.is_none() {
            return Err(ServiceError::NotFound(format!("center {center_id}")));
        }

        let requested = holidays.len();
        let unique = dedupe_by_date(holidays);
        let created = self
            .store
            .insert_holidays_skip_existing(center_id, unique)
            .await
            .map_err(ServiceError::WriteFailed)?;

        let import = HolidayImport::new(requested, created);
        tracing::info!(
            center_id,
            created = import.created,
            skipped = import.skipped,
            "Imported holidays"
        );
        Ok(import)
    }
}
