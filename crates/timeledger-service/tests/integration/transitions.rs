//! Phase transition reports through the service.

use chrono::Weekday;
use tokio_util::sync::CancellationToken;

use timeledger_calendar::value::DateRange;

use crate::helpers::*;

#[test_log::test(tokio::test)]
async fn reports_handover_between_phases() {
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
        DateRange::open_ended(d(2026, 2, 1)),
    );
    let fixture = fixture(vec![january, february], Vec::new(), Vec::new()).await;

    let report = fixture
        .service
        .phase_transitions(
            CENTER,
            OFFERING,
            window(d(2026, 1, 1), d(2026, 3, 31)),
            &CancellationToken::new(),
        )
        .await
        .expect("reported");

    assert_eq!(report.transitions.len(), 1);
    let transition = &report.transitions[0];
    assert_eq!(transition.weekday, Weekday::Mon);
    assert_eq!(transition.date, d(2026, 2, 2));
    assert_eq!(transition.previous.as_ref().map(|slot| slot.rule_id), Some(1));
    assert_eq!(transition.next.as_ref().map(|slot| slot.rule_id), Some(2));
    assert!(!transition.has_gap);
}

#[tokio::test]
async fn rule_ending_without_successor_is_a_gap() {
    let fixture = fixture(
        vec![rule(
            1,
            Weekday::Thu,
            t(18, 0),
            t(19, 0),
            DateRange::bounded(d(2026, 1, 1), d(2026, 1, 31)),
        )],
        Vec::new(),
        Vec::new(),
    )
    .await;

    let report = fixture
        .service
        .phase_transitions(
            CENTER,
            OFFERING,
            window(d(2026, 1, 1), d(2026, 2, 28)),
            &CancellationToken::new(),
        )
        .await
        .expect("reported");

    assert_eq!(report.transitions.len(), 1);
    assert_eq!(report.transitions[0].date, d(2026, 2, 5));
    assert!(report.transitions[0].has_gap);
    assert!(report.transitions[0].next.is_none());
}

#[tokio::test]
async fn other_offerings_are_not_reported() {
    let fixture = fixture(vec![january_mondays(1)], Vec::new(), Vec::new()).await;

    let report = fixture
        .service
        .phase_transitions(
            CENTER,
            OFFERING + 1,
            window(d(2026, 1, 1), d(2026, 3, 31)),
            &CancellationToken::new(),
        )
        .await
        .expect("reported");

    assert!(report.transitions.is_empty());
}
