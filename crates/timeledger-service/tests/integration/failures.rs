//! Window, fetch, cancellation and lookup failures.

use std::io;
use std::sync::Arc;

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use timeledger_calendar::error::CalendarError;
use timeledger_calendar::expand::ExpansionWindow;
use timeledger_calendar::model::{
    Center, CenterHoliday, NewHoliday, Offering, ScheduleException, ScheduleRule,
};
use timeledger_calendar::store::{HolidayWriter, ScheduleSource, StoreResult};
use timeledger_core::constants::FETCH_COMPONENT;
use timeledger_core::types::{CenterId, OfferingId};
use timeledger_db::memory::MemoryScheduleStore;
use timeledger_service::error::ServiceError;

use crate::helpers::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    Rules,
    Exceptions,
    Holidays,
    Writes,
    Everything,
}

/// Delegates to a memory store, failing the chosen fetch.
struct FaultyStore {
    inner: MemoryScheduleStore,
    fault: Fault,
}

impl FaultyStore {
    fn fails(&self, fetch: Fault) -> bool {
        self.fault == Fault::Everything || self.fault == fetch
    }
}

fn unavailable<T>() -> StoreResult<T> {
    Err(Box::new(io::Error::other("read replica unavailable")))
}

impl ScheduleSource for FaultyStore {
    fn load_center(&self, center_id: CenterId) -> BoxFuture<'_, StoreResult<Option<Center>>> {
        if self.fault == Fault::Everything {
            return Box::pin(async { unavailable() });
        }
        self.inner.load_center(center_id)
    }

    fn list_offerings_for_center(
        &self,
        center_id: CenterId,
    ) -> BoxFuture<'_, StoreResult<Vec<Offering>>> {
        self.inner.list_offerings_for_center(center_id)
    }

    fn list_rules_for_center(
        &self,
        center_id: CenterId,
        window: ExpansionWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<ScheduleRule>>> {
        if self.fails(Fault::Rules) {
            return Box::pin(async { unavailable() });
        }
        self.inner.list_rules_for_center(center_id, window)
    }

    fn list_exceptions_for_center(
        &self,
        center_id: CenterId,
        window: ExpansionWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<ScheduleException>>> {
        if self.fails(Fault::Exceptions) {
            return Box::pin(async { unavailable() });
        }
        self.inner.list_exceptions_for_center(center_id, window)
    }

    fn list_holidays_for_center(
        &self,
        center_id: CenterId,
        window: ExpansionWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<CenterHoliday>>> {
        if self.fails(Fault::Holidays) {
            return Box::pin(async { unavailable() });
        }
        self.inner.list_holidays_for_center(center_id, window)
    }

    fn list_rules_for_offering(
        &self,
        center_id: CenterId,
        offering_id: OfferingId,
        window: ExpansionWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<ScheduleRule>>> {
        if self.fails(Fault::Rules) {
            return Box::pin(async { unavailable() });
        }
        self.inner
            .list_rules_for_offering(center_id, offering_id, window)
    }
}

impl HolidayWriter for FaultyStore {
    fn insert_holidays_skip_existing(
        &self,
        center_id: CenterId,
        holidays: Vec<NewHoliday>,
    ) -> BoxFuture<'_, StoreResult<Vec<CenterHoliday>>> {
        if self.fails(Fault::Writes) {
            return Box::pin(async { unavailable() });
        }
        self.inner.insert_holidays_skip_existing(center_id, holidays)
    }
}

async fn faulty(fault: Fault) -> Arc<FaultyStore> {
    let inner = MemoryScheduleStore::new();
    inner
        .seed(
            vec![center(CENTER, "UTC")],
            vec![offering(OFFERING, CENTER)],
            vec![january_mondays(1)],
            Vec::new(),
            Vec::new(),
        )
        .await
        .expect("seeded");
    Arc::new(FaultyStore { inner, fault })
}

#[test_log::test(tokio::test)]
async fn fetch_failure_is_tagged_and_carries_source() {
    for fault in [Fault::Rules, Fault::Exceptions, Fault::Holidays] {
        let service = service_over(faulty(fault).await);

        let err = service
            .expand(CENTER, january(), &CancellationToken::new())
            .await
            .expect_err("fetch fails");

        let (component, source) = match err {
            ServiceError::CalendarError(CalendarError::FetchFailed { component, source }) => {
                (component, source)
            }
            other => panic!("expected FetchFailed for {fault:?}, got {other:?}"),
        };
        assert_eq!(component, FETCH_COMPONENT);
        assert_eq!(component, "expander.fetch");
        assert!(source.downcast_ref::<io::Error>().is_some());
        assert_eq!(source.to_string(), "read replica unavailable");
    }
}

#[tokio::test]
async fn window_cap_is_checked_before_fetching() {
    let service = service_over(faulty(Fault::Everything).await);

    let err = service
        .expand(
            CENTER,
            window(d(2026, 1, 1), d(2027, 2, 5)),
            &CancellationToken::new(),
        )
        .await
        .expect_err("too large");

    assert!(matches!(
        err,
        ServiceError::CalendarError(CalendarError::WindowTooLarge { days: 401, max: 400 })
    ));
}

#[tokio::test]
async fn largest_window_is_accepted() {
    let fixture = fixture(vec![january_mondays(1)], Vec::new(), Vec::new()).await;
    let expansion = fixture
        .expand(window(d(2026, 1, 1), d(2027, 2, 4)))
        .await
        .expect("400 days is allowed");
    assert_eq!(expansion.schedules.len(), 4);
}

#[tokio::test]
async fn cancelled_token_discards_output() {
    let fixture = fixture(vec![january_mondays(1)], Vec::new(), Vec::new()).await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = fixture
        .service
        .expand(CENTER, january(), &cancel)
        .await
        .expect_err("cancelled");

    assert!(matches!(
        err,
        ServiceError::CalendarError(CalendarError::Cancelled)
    ));
}

/// Cancels the caller's token from inside the holiday fetch.
struct CancellingStore {
    inner: MemoryScheduleStore,
    cancel: CancellationToken,
}

impl ScheduleSource for CancellingStore {
    fn load_center(&self, center_id: CenterId) -> BoxFuture<'_, StoreResult<Option<Center>>> {
        self.inner.load_center(center_id)
    }

    fn list_offerings_for_center(
        &self,
        center_id: CenterId,
    ) -> BoxFuture<'_, StoreResult<Vec<Offering>>> {
        self.inner.list_offerings_for_center(center_id)
    }

    fn list_rules_for_center(
        &self,
        center_id: CenterId,
        window: ExpansionWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<ScheduleRule>>> {
        self.inner.list_rules_for_center(center_id, window)
    }

    fn list_exceptions_for_center(
        &self,
        center_id: CenterId,
        window: ExpansionWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<ScheduleException>>> {
        self.inner.list_exceptions_for_center(center_id, window)
    }

    fn list_holidays_for_center(
        &self,
        center_id: CenterId,
        window: ExpansionWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<CenterHoliday>>> {
        self.cancel.cancel();
        self.inner.list_holidays_for_center(center_id, window)
    }

    fn list_rules_for_offering(
        &self,
        center_id: CenterId,
        offering_id: OfferingId,
        window: ExpansionWindow,
    ) -> BoxFuture<'_, StoreResult<Vec<ScheduleRule>>> {
        self.inner
            .list_rules_for_offering(center_id, offering_id, window)
    }
}

impl HolidayWriter for CancellingStore {
    fn insert_holidays_skip_existing(
        &self,
        center_id: CenterId,
        holidays: Vec<NewHoliday>,
    ) -> BoxFuture<'_, StoreResult<Vec<CenterHoliday>>> {
        self.inner.insert_holidays_skip_existing(center_id, holidays)
    }
}

#[tokio::test]
async fn cancellation_during_fetch_is_observed() {
    let inner = MemoryScheduleStore::new();
    inner
        .seed(
            vec![center(CENTER, "UTC")],
            vec![offering(OFFERING, CENTER)],
            vec![january_mondays(1)],
            Vec::new(),
            Vec::new(),
        )
        .await
        .expect("seeded");
    let cancel = CancellationToken::new();
    let service = service_over(Arc::new(CancellingStore {
        inner,
        cancel: cancel.clone(),
    }));

    let result = service.expand(CENTER, january(), &cancel).await;

    assert!(matches!(
        result,
        Err(ServiceError::CalendarError(CalendarError::Cancelled))
    ));
}

#[tokio::test]
async fn unknown_center_is_not_found() {
    let fixture = fixture(Vec::new(), Vec::new(), Vec::new()).await;

    let result = fixture
        .service
        .expand(99, january(), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(ServiceError::NotFound(_))));
}

fn new_year() -> Vec<NewHoliday> {
    vec![NewHoliday {
        date: d(2026, 1, 1),
        name: "New Year".to_string(),
    }]
}

#[tokio::test]
async fn holiday_write_failure_is_reported() {
    let service = service_over(faulty(Fault::Writes).await);

    let result = service.import_holidays(CENTER, new_year()).await;

    assert!(matches!(result, Err(ServiceError::WriteFailed(_))));
}

#[tokio::test]
async fn holiday_import_needs_center_lookup() {
    let service = service_over(faulty(Fault::Everything).await);

    let result = service.import_holidays(CENTER, new_year()).await;

    assert!(matches!(
        result,
        Err(ServiceError::CalendarError(CalendarError::FetchFailed { .. }))
    ));
}
