#![allow(clippy::expect_used, dead_code)]
//! Fixtures shared by the service tests.
//!
//! Every fixture seeds center 1 with offering 10 (default room 4) and runs
//! the service with a UTC default zone and the standard 400-day cap.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Weekday};
use tokio_util::sync::CancellationToken;

use timeledger_calendar::expand::{Expansion, ExpansionWindow};
use timeledger_calendar::model::{
    Center, CenterHoliday, ExceptionKind, ExceptionStatus, Offering, ScheduleException,
    ScheduleRule,
};
use timeledger_calendar::store::ScheduleStore;
use timeledger_calendar::value::{CenterSettings, DateRange};
use timeledger_core::config::ScheduleConfig;
use timeledger_core::types::{CenterId, ExceptionId, OfferingId, RuleId};
use timeledger_db::admin::ScheduleAdmin;
use timeledger_db::memory::MemoryScheduleStore;
use timeledger_service::admin::AdminService;
use timeledger_service::error::ServiceResult;
use timeledger_service::schedule::ScheduleService;

pub const CENTER: CenterId = 1;
pub const OFFERING: OfferingId = 10;
pub const DEFAULT_ROOM: u64 = 4;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
}

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("valid time")
}

pub fn window(from: NaiveDate, to: NaiveDate) -> ExpansionWindow {
    ExpansionWindow::new(from, to).expect("valid window")
}

pub fn january() -> ExpansionWindow {
    window(d(2026, 1, 1), d(2026, 1, 31))
}

pub fn center(id: CenterId, timezone: &str) -> Center {
    Center {
        id,
        name: format!("center {id}"),
        timezone: timezone.to_string(),
        settings: CenterSettings::default(),
    }
}

pub fn offering(id: OfferingId, center_id: CenterId) -> Offering {
    Offering {
        id,
        center_id,
        name: format!("offering {id}"),
        default_room_id: Some(DEFAULT_ROOM),
    }
}

pub fn rule(
    id: RuleId,
    weekday: Weekday,
    start: NaiveTime,
    end: NaiveTime,
    range: DateRange,
) -> ScheduleRule {
    ScheduleRule {
        id,
        center_id: CENTER,
        offering_id: OFFERING,
        weekday,
        start_time: start,
        end_time: end,
        room_id: 5,
        teacher_id: Some(8),
        effective_range: range,
        lock_at: None,
    }
}

/// Monday 10:00-11:00 for all of January 2026.
pub fn january_mondays(id: RuleId) -> ScheduleRule {
    rule(
        id,
        Weekday::Mon,
        t(10, 0),
        t(11, 0),
        DateRange::bounded(d(2026, 1, 1), d(2026, 1, 31)),
    )
}

pub fn exception(
    id: ExceptionId,
    rule_id: Option<RuleId>,
    kind: ExceptionKind,
    date: NaiveDate,
) -> ScheduleException {
    ScheduleException {
        id,
        center_id: CENTER,
        rule_id,
        offering_id: OFFERING,
        date,
        kind,
        status: ExceptionStatus::Approved,
        start_time: None,
        end_time: None,
        room_id: None,
        teacher_id: None,
        reason: String::new(),
        recurrence: None,
    }
}

pub fn holiday(date: NaiveDate, name: &str) -> CenterHoliday {
    CenterHoliday {
        id: 0,
        center_id: CENTER,
        date,
        name: name.to_string(),
    }
}

pub struct Fixture {
    pub store: Arc<MemoryScheduleStore>,
    pub service: ScheduleService,
    pub admin: AdminService,
}

impl Fixture {
    pub async fn expand(&self, window: ExpansionWindow) -> ServiceResult<Expansion> {
        self.service
            .expand(CENTER, window, &CancellationToken::new())
            .await
    }
}

pub fn admin_over(store: Arc<dyn ScheduleAdmin>) -> AdminService {
    AdminService::new(store, &ScheduleConfig::default()).expect("valid config")
}

pub fn service_over(store: Arc<dyn ScheduleStore>) -> ScheduleService {
    ScheduleService::new(store, &ScheduleConfig::default()).expect("valid config")
}

/// Seeds center 1 in `timezone` with the given schedule data.
pub async fn fixture_in(
    timezone: &str,
    rules: Vec<ScheduleRule>,
    exceptions: Vec<ScheduleException>,
    holidays: Vec<CenterHoliday>,
) -> Fixture {
    let store = Arc::new(MemoryScheduleStore::new());
    store
        .seed(
            vec![center(CENTER, timezone)],
            vec![offering(OFFERING, CENTER)],
            rules,
            exceptions,
            holidays,
        )
        .await
        .expect("seeded");

    Fixture {
        service: service_over(store.clone()),
        admin: admin_over(store.clone()),
        store,
    }
}

pub async fn fixture(
    rules: Vec<ScheduleRule>,
    exceptions: Vec<ScheduleException>,
    holidays: Vec<CenterHoliday>,
) -> Fixture {
    fixture_in("UTC", rules, exceptions, holidays).await
}
