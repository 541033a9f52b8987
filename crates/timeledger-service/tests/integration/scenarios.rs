//! End-to-end expansion scenarios through the service.

use chrono::Weekday;

use timeledger_calendar::model::{ExceptionKind, ExceptionStatus};
use timeledger_calendar::value::DateRange;
use timeledger_core::types::ADHOC_RULE_ID;

use crate::helpers::*;

#[test_log::test(tokio::test)]
async fn single_rule_fires_on_each_monday() {
    let rule = rule(
        1,
        Weekday::Mon,
        t(10, 0),
        t(11, 0),
        DateRange::bounded(d(2026, 1, 5), d(2026, 1, 26)),
    );
    let fixture = fixture(vec![rule], Vec::new(), Vec::new()).await;

    let expansion = fixture.expand(january()).await.expect("expanded");

    let dates: Vec<_> = expansion.schedules.iter().map(|s| s.date).collect();
    assert_eq!(
        dates,
        vec![
            d(2026, 1, 5),
            d(2026, 1, 12),
            d(2026, 1, 19),
            d(2026, 1, 26)
        ]
    );
    assert!(
        expansion
            .schedules
            .iter()
            .all(|s| !s.is_holiday && !s.has_exception && !s.cancelled)
    );
    assert!(expansion.diagnostics.is_empty());
}

#[test_log::test(tokio::test)]
async fn phased_rules_hand_over_at_month_boundary() {
    let january = rule(
        1,
        Weekday::Mon,
        t(10, 0),
        t(11, 0),
        DateRange::bounded(d(2026, 1, 1), d(2026, 1, 31)),
    );
    let february = rule(
        2,
        Weekday::Mon,
        t(14, 0),
        t(15, 0),
        DateRange::bounded(d(2026, 2, 1), d(2026, 2, 28)),
    );
    let fixture = fixture(vec![january, february], Vec::new(), Vec::new()).await;

    let expansion = fixture
        .expand(window(d(2026, 1, 25), d(2026, 2, 8)))
        .await
        .expect("expanded");

    let fired: Vec<_> = expansion
        .schedules
        .iter()
        .map(|s| (s.rule_id, s.date, s.start_time))
        .collect();
    assert_eq!(
        fired,
        vec![
            (1, d(2026, 1, 26), t(10, 0)),
            (2, d(2026, 2, 2), t(14, 0)),
        ]
    );
}

#[tokio::test]
async fn cancelled_occurrence_stays_in_output() {
    let fixture = fixture(
        vec![january_mondays(1)],
        vec![exception(50, Some(1), ExceptionKind::Cancel, d(2026, 1, 12))],
        Vec::new(),
    )
    .await;

    let expansion = fixture.expand(january()).await.expect("expanded");

    assert_eq!(expansion.schedules.len(), 4);
    let cancelled = &expansion.schedules[1];
    assert_eq!(cancelled.date, d(2026, 1, 12));
    assert!(cancelled.cancelled);
    assert!(cancelled.has_exception);
    assert_eq!(cancelled.exception_kind, Some(ExceptionKind::Cancel));
    assert_eq!(cancelled.exception_id, Some(50));
}

#[tokio::test]
async fn holiday_is_tagged_not_cancelled() {
    let fixture = fixture(
        vec![january_mondays(1)],
        Vec::new(),
        vec![holiday(d(2026, 1, 19), "MLK Day")],
    )
    .await;

    let expansion = fixture.expand(january()).await.expect("expanded");

    assert_eq!(expansion.schedules.len(), 4);
    for schedule in &expansion.schedules {
        assert_eq!(schedule.is_holiday, schedule.date == d(2026, 1, 19));
        assert!(!schedule.cancelled);
    }
}

#[tokio::test]
async fn move_replaces_time_and_room() {
    let mut moved = exception(51, Some(1), ExceptionKind::Move, d(2026, 1, 5));
    moved.start_time = Some(t(15, 0));
    moved.end_time = Some(t(16, 0));
    moved.room_id = Some(7);
    let fixture = fixture(vec![january_mondays(1)], vec![moved], Vec::new()).await;

    let expansion = fixture.expand(january()).await.expect("expanded");

    let first = &expansion.schedules[0];
    assert_eq!(first.date, d(2026, 1, 5));
    assert_eq!(first.start_time, t(15, 0));
    assert_eq!(first.end_time, t(16, 0));
    assert_eq!(first.room_id, 7);
    assert_eq!(first.teacher_id, Some(8));
    assert!(first.has_exception);
    assert_eq!(first.exception_kind, Some(ExceptionKind::Move));
}

#[tokio::test]
async fn adhoc_session_without_rules() {
    let mut adhoc = exception(52, None, ExceptionKind::Adhoc, d(2026, 1, 7));
    adhoc.start_time = Some(t(18, 0));
    adhoc.end_time = Some(t(19, 0));
    let fixture = fixture(Vec::new(), vec![adhoc], Vec::new()).await;

    let expansion = fixture.expand(january()).await.expect("expanded");

    assert_eq!(expansion.schedules.len(), 1);
    let session = &expansion.schedules[0];
    assert_eq!(session.rule_id, ADHOC_RULE_ID);
    assert_eq!(session.offering_id, OFFERING);
    assert_eq!(session.date, d(2026, 1, 7));
    assert_eq!(session.room_id, DEFAULT_ROOM);
    assert!(session.has_exception);
    assert_eq!(session.exception_kind, Some(ExceptionKind::Adhoc));
}

#[tokio::test]
async fn pending_exceptions_are_ignored() {
    let mut pending = exception(53, Some(1), ExceptionKind::Cancel, d(2026, 1, 12));
    pending.status = ExceptionStatus::Pending;
    let fixture = fixture(vec![january_mondays(1)], vec![pending], Vec::new()).await;

    let expansion = fixture.expand(january()).await.expect("expanded");

    assert!(expansion.schedules.iter().all(|s| !s.has_exception));
}

#[test_log::test(tokio::test)]
async fn center_timezone_anchors_instants() {
    let fixture = fixture_in(
        "America/New_York",
        vec![january_mondays(1)],
        Vec::new(),
        Vec::new(),
    )
    .await;

    let expansion = fixture.expand(january()).await.expect("expanded");

    let first = &expansion.schedules[0];
    assert_eq!(first.starts_at.to_rfc3339(), "2026-01-05T10:00:00-05:00");
    assert_eq!(first.ends_at.to_rfc3339(), "2026-01-05T11:00:00-05:00");
}

#[tokio::test]
async fn unknown_center_timezone_falls_back_to_default() {
    let fixture = fixture_in(
        "Mars/Olympus_Mons",
        vec![january_mondays(1)],
        Vec::new(),
        Vec::new(),
    )
    .await;

    let expansion = fixture.expand(january()).await.expect("expanded");

    assert_eq!(
        expansion.schedules[0].starts_at.to_rfc3339(),
        "2026-01-05T10:00:00+00:00"
    );
}

#[tokio::test]
async fn overlapping_rules_report_a_diagnostic() {
    let first = january_mondays(1);
    let mut second = january_mondays(2);
    second.start_time = t(10, 30);
    second.end_time = t(11, 30);
    let fixture = fixture(vec![second, first], Vec::new(), Vec::new()).await;

    let expansion = fixture.expand(january()).await.expect("expanded");

    assert_eq!(expansion.schedules.len(), 4);
    assert!(expansion.schedules.iter().all(|s| s.rule_id == 1));
    assert_eq!(expansion.diagnostics.len(), 1);
    assert_eq!(expansion.diagnostics[0].occurrences, 4);
}
