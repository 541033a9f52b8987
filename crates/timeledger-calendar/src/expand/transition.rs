use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::Serialize;

use timeledger_core::types::{CenterId, OfferingId, RoomId, RuleId, TeacherId};

use crate::expand::{Diagnostic, Diagnostics, ExpansionWindow, PhaseIndex};
use crate::model::ScheduleRule;
use crate::value::time::{iso_weekday, wall_clock};

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// The parts of a governing rule that a transition compares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSlot {
    pub rule_id: RuleId,
    #[serde(with = "wall_clock")]
    pub start_time: NaiveTime,
    #[serde(with = "wall_clock")]
    pub end_time: NaiveTime,
    pub room_id: RoomId,
    pub teacher_id: Option<TeacherId>,
}

impl From<&ScheduleRule> for RuleSlot {
    fn from(rule: &ScheduleRule) -> Self {
        Self {
            rule_id: rule.id,
            start_time: rule.start_time,
            end_time: rule.end_time,
            room_id: rule.room_id,
            teacher_id: rule.teacher_id,
        }
    }
}

/// A date on which the governing slot of an offering changes.
///
/// `previous` is what applied on the same weekday one week earlier. A
/// transition with no `next` slot opens a gap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseTransition {
    #[serde(with = "iso_weekday")]
    pub weekday: Weekday,
    pub date: NaiveDate,
    pub previous: Option<RuleSlot>,
    pub next: Option<RuleSlot>,
    pub has_gap: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TransitionReport {
    pub transitions: Vec<PhaseTransition>,
    pub diagnostics: Vec<Diagnostic>,
}

/// ## Summary
/// Lists every date in `window` where the governing rules of `offering_id`
/// change compared with the same weekday a week before.
///
/// The first matching date of each weekday is the baseline and never reports
/// a transition. When several time-disjoint rules govern a weekday they are
/// compared pairwise in start-time order.
#[must_use]
pub fn detect_phase_transitions(
    center_id: CenterId,
    offering_id: OfferingId,
    rules: &[ScheduleRule],
    window: &ExpansionWindow,
) -> TransitionReport {
    let mut diagnostics = Diagnostics::default();
    let phases = PhaseIndex::build(
        center_id,
        rules.iter().filter(|rule| rule.offering_id == offering_id),
        &mut diagnostics,
    );

    let mut transitions = Vec::new();
    for weekday in WEEK {
        let Some(group) = phases.group(offering_id, weekday) else {
            continue;
        };

        let mut previous: Option<Vec<RuleSlot>> = None;
        for date in window.dates().filter(|date| date.weekday() == weekday) {
            let current: Vec<RuleSlot> = group
                .resolve(date, &mut diagnostics)
                .into_iter()
                .map(RuleSlot::from)
                .collect();

            if let Some(before) = previous.as_ref().filter(|before| **before != current) {
                let lanes = before.len().max(current.len());
                for lane in 0..lanes {
                    let was = before.get(lane).cloned();
                    let now = current.get(lane).cloned();
                    if was != now {
                        transitions.push(PhaseTransition {
                            weekday,
                            date,
                            has_gap: was.is_some() && now.is_none(),
                            previous: was,
                            next: now,
                        });
                    }
                }
            }

            previous = Some(current);
        }
    }

    transitions.sort_by_key(|transition| transition.date);

    tracing::debug!(
        offering_id,
        transitions = transitions.len(),
        "Detected phase transitions"
    );

    TransitionReport {
        transitions,
        diagnostics: diagnostics.into_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::DateRange;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, day).expect("valid date")
    }

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).expect("valid time")
    }

    fn rule(id: u64, weekday: Weekday, start: u32, range: DateRange) -> ScheduleRule {
        ScheduleRule {
            id,
            center_id: 1,
            offering_id: 10,
            weekday,
            start_time: t(start),
            end_time: t(start + 1),
            room_id: 1,
            teacher_id: None,
            effective_range: range,
            lock_at: None,
        }
    }

    #[test_log::test]
    fn reports_phase_change() {
        let rules = [
            rule(1, Weekday::Mon, 10, DateRange::bounded(d(1, 1), d(1, 31))),
            rule(2, Weekday::Mon, 14, DateRange::bounded(d(2, 1), d(2, 28))),
        ];
        let window = ExpansionWindow::new(d(1, 1), d(2, 28)).expect("valid");

        let report = detect_phase_transitions(1, 10, &rules, &window);

        assert_eq!(report.transitions.len(), 1);
        let transition = &report.transitions[0];
        assert_eq!(transition.date, d(2, 2));
        assert_eq!(transition.previous.as_ref().map(|slot| slot.rule_id), Some(1));
        assert_eq!(transition.next.as_ref().map(|slot| slot.rule_id), Some(2));
        assert!(!transition.has_gap);
    }

    #[test]
    fn reports_gap_and_restart() {
        let rules = [
            rule(1, Weekday::Wed, 9, DateRange::bounded(d(1, 1), d(1, 14))),
            rule(2, Weekday::Wed, 9, DateRange::open_ended(d(1, 28))),
        ];
        let window = ExpansionWindow::new(d(1, 1), d(2, 4)).expect("valid");

        let report = detect_phase_transitions(1, 10, &rules, &window);
        let summary: Vec<_> = report
            .transitions
            .iter()
            .map(|transition| (transition.date, transition.has_gap))
            .collect();

        assert_eq!(summary, vec![(d(1, 21), true), (d(1, 28), false)]);
        assert_eq!(report.transitions[1].previous, None);
    }

    #[test]
    fn steady_schedule_has_no_transitions() {
        let rules = [rule(1, Weekday::Fri, 18, DateRange::open_ended(d(1, 1)))];
        let window = ExpansionWindow::new(d(1, 1), d(3, 31)).expect("valid");

        let report = detect_phase_transitions(1, 10, &rules, &window);
        assert!(report.transitions.is_empty());
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn other_offerings_are_ignored() {
        let mut foreign = rule(5, Weekday::Mon, 10, DateRange::bounded(d(1, 1), d(1, 12)));
        foreign.offering_id = 11;
        let window = ExpansionWindow::new(d(1, 1), d(1, 31)).expect("valid");

        let report = detect_phase_transitions(1, 10, &[foreign], &window);
        assert!(report.transitions.is_empty());
    }
}
