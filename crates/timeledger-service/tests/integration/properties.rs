//! Properties that hold for any expansion through the service.

use std::collections::HashSet;

use chrono::{Datelike, Weekday};

use timeledger_calendar::model::{ExceptionKind, ExpandedSchedule, ScheduleRule};
use timeledger_calendar::value::DateRange;
use timeledger_core::types::ADHOC_RULE_ID;

use crate::helpers::*;

/// A quarter with phased rules, a same-day afternoon slot, every exception
/// kind and a couple of holidays.
async fn busy_fixture() -> (Fixture, Vec<ScheduleRule>) {
    let rules = vec![
        rule(
            1,
            Weekday::Mon,
            t(10, 0),
            t(11, 0),
            DateRange::bounded(d(2026, 1, 1), d(2026, 2, 15)),
        ),
        rule(
            2,
            Weekday::Mon,
            t(9, 0),
            t(10, 0),
            DateRange::open_ended(d(2026, 2, 16)),
        ),
        rule(
            3,
            Weekday::Mon,
            t(14, 0),
            t(15, 0),
            DateRange::open_ended(d(2026, 1, 1)),
        ),
        rule(
            4,
            Weekday::Thu,
            t(18, 0),
            t(19, 30),
            DateRange::bounded(d(2026, 1, 8), d(2026, 3, 26)),
        ),
    ];

    let mut moved = exception(60, Some(1), ExceptionKind::Move, d(2026, 1, 19));
    moved.start_time = Some(t(12, 0));
    moved.end_time = Some(t(13, 0));
    let mut substitute = exception(61, Some(4), ExceptionKind::Substitute, d(2026, 2, 5));
    substitute.teacher_id = Some(9);
    let mut adhoc = exception(62, None, ExceptionKind::Adhoc, d(2026, 3, 4));
    adhoc.start_time = Some(t(8, 0));
    adhoc.end_time = Some(t(9, 0));
    adhoc.room_id = Some(2);

    let exceptions = vec![
        exception(63, Some(3), ExceptionKind::Cancel, d(2026, 2, 2)),
        moved,
        substitute,
        adhoc,
    ];
    let holidays = vec![
        holiday(d(2026, 1, 1), "New Year"),
        holiday(d(2026, 2, 16), "Presidents Day"),
    ];

    (fixture(rules.clone(), exceptions, holidays).await, rules)
}

fn quarter() -> timeledger_calendar::expand::ExpansionWindow {
    window(d(2026, 1, 1), d(2026, 3, 31))
}

#[test_log::test(tokio::test)]
async fn expansion_is_deterministic() {
    let (fixture, _) = busy_fixture().await;

    let first = fixture.expand(quarter()).await.expect("expanded");
    let second = fixture.expand(quarter()).await.expect("expanded");

    assert_eq!(first.schedules, second.schedules);
    assert_eq!(first.diagnostics, second.diagnostics);
    assert_eq!(
        serde_json::to_string(&first.schedules).expect("serializes"),
        serde_json::to_string(&second.schedules).expect("serializes")
    );
}

#[tokio::test]
async fn records_respect_window_rules_and_weekdays() {
    let (fixture, rules) = busy_fixture().await;
    let window = quarter();

    let expansion = fixture.expand(window).await.expect("expanded");
    assert!(!expansion.schedules.is_empty());

    for schedule in &expansion.schedules {
        assert!(window.contains(schedule.date), "{schedule:?}");
        assert!(schedule.start_time < schedule.end_time, "{schedule:?}");
        if schedule.rule_id == ADHOC_RULE_ID {
            continue;
        }
        let rule = rules
            .iter()
            .find(|rule| rule.id == schedule.rule_id)
            .expect("source rule");
        assert!(rule.effective_range.contains(schedule.date), "{schedule:?}");
        assert_eq!(schedule.date.weekday(), rule.weekday, "{schedule:?}");
    }
}

#[tokio::test]
async fn exception_flags_are_consistent() {
    let (fixture, _) = busy_fixture().await;

    let expansion = fixture.expand(quarter()).await.expect("expanded");
    let targeted: HashSet<_> = [
        (3, d(2026, 2, 2)),
        (1, d(2026, 1, 19)),
        (4, d(2026, 2, 5)),
    ]
    .into_iter()
    .collect();

    for schedule in &expansion.schedules {
        assert_eq!(schedule.has_exception, schedule.exception_kind.is_some());
        let expected = schedule.rule_id == ADHOC_RULE_ID
            || targeted.contains(&(schedule.rule_id, schedule.date));
        assert_eq!(schedule.has_exception, expected, "{schedule:?}");
        if schedule.cancelled {
            assert_eq!(schedule.exception_kind, Some(ExceptionKind::Cancel));
        }
    }
    assert_eq!(
        expansion.schedules.iter().filter(|s| s.cancelled).count(),
        1
    );
}

#[tokio::test]
async fn output_is_sorted() {
    let (fixture, _) = busy_fixture().await;

    let expansion = fixture.expand(quarter()).await.expect("expanded");

    let keys: Vec<_> = expansion
        .schedules
        .iter()
        .map(ExpandedSchedule::sort_key)
        .collect();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(keys, sorted);
}

#[tokio::test]
async fn adjacent_phases_cover_every_date_once() {
    let first = rule(
        1,
        Weekday::Mon,
        t(10, 0),
        t(11, 0),
        DateRange::bounded(d(2026, 1, 1), d(2026, 1, 31)),
    );
    let second = rule(
        2,
        Weekday::Mon,
        t(14, 0),
        t(15, 0),
        DateRange::bounded(d(2026, 2, 1), d(2026, 3, 31)),
    );
    let fixture = fixture(vec![first, second], Vec::new(), Vec::new()).await;

    let expansion = fixture.expand(quarter()).await.expect("expanded");

    let mondays: Vec<_> = quarter()
        .dates()
        .filter(|date| date.weekday() == Weekday::Mon)
        .collect();
    let dates: Vec<_> = expansion.schedules.iter().map(|s| s.date).collect();
    assert_eq!(dates, mondays);
    assert!(expansion.diagnostics.is_empty());
}
