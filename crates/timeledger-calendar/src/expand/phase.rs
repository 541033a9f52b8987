use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};

use timeledger_core::types::{CenterId, OfferingId};

use crate::expand::{DiagnosticKind, Diagnostics};
use crate::model::ScheduleRule;

/// All rules of one offering on one weekday, i.e. the phases of that slot.
///
/// Rules are kept sorted by effective start date, then start time, then id.
#[derive(Debug)]
pub struct PhaseGroup<'a> {
    offering_id: OfferingId,
    weekday: Weekday,
    rules: Vec<&'a ScheduleRule>,
}

impl<'a> PhaseGroup<'a> {
    fn new(offering_id: OfferingId, weekday: Weekday, mut rules: Vec<&'a ScheduleRule>) -> Self {
        rules.sort_by_key(|rule| (rule.effective_range.start_date, rule.start_time, rule.id));
        Self {
            offering_id,
            weekday,
            rules,
        }
    }

    #[must_use]
    pub const fn offering_id(&self) -> OfferingId {
        self.offering_id
    }

    #[must_use]
    pub const fn weekday(&self) -> Weekday {
        self.weekday
    }

    #[must_use]
    pub fn rules(&self) -> &[&'a ScheduleRule] {
        &self.rules
    }

    /// ## Summary
    /// Returns the rules governing `date`, ordered by start time then id.
    ///
    /// Every rule whose effective range contains `date` applies, provided its
    /// time slot does not overlap another applicable rule. On overlap, a rule
    /// that starts on `date` takes over from one ending on `date`; any other
    /// overlap keeps the smaller id.
    ///
    /// ## Side Effects
    /// Records `RuleInvariantViolated` for every overlap that is not a
    /// same-day handoff.
    pub fn resolve(&self, date: NaiveDate, diagnostics: &mut Diagnostics) -> Vec<&'a ScheduleRule> {
        let mut governing: Vec<&'a ScheduleRule> = Vec::new();

        for &candidate in self
            .rules
            .iter()
            .filter(|rule| rule.effective_range.contains(date))
        {
            let overlapping: Vec<usize> = governing
                .iter()
                .enumerate()
                .filter(|(_, incumbent)| incumbent.time_slot().overlaps(&candidate.time_slot()))
                .map(|(position, _)| position)
                .collect();

            let mut candidate_wins = true;
            for &position in &overlapping {
                if !supersedes(candidate, governing[position], date, diagnostics) {
                    candidate_wins = false;
                }
            }

            if candidate_wins {
                for &position in overlapping.iter().rev() {
                    governing.remove(position);
                }
                governing.push(candidate);
            }
        }

        governing.sort_by_key(|rule| (rule.start_time, rule.id));

        if !governing.is_empty() {
            tracing::trace!(
                offering_id = self.offering_id,
                date = %date,
                rules = ?governing.iter().map(|rule| rule.id).collect::<Vec<_>>(),
                "Resolved governing rules"
            );
        }

        governing
    }
}

/// Decides an overlap between a later-sorted `candidate` and an `incumbent`.
fn supersedes(
    candidate: &ScheduleRule,
    incumbent: &ScheduleRule,
    date: NaiveDate,
    diagnostics: &mut Diagnostics,
) -> bool {
    let handoff = incumbent.effective_range.end_date == Some(date)
        && candidate.effective_range.start_date == Some(date)
        && incumbent.effective_range.start_date < candidate.effective_range.start_date;
    if handoff {
        tracing::trace!(
            from_rule = incumbent.id,
            to_rule = candidate.id,
            date = %date,
            "Phase handoff on boundary date"
        );
        return true;
    }

    let (kept, dropped) = if candidate.id < incumbent.id {
        (candidate, incumbent)
    } else {
        (incumbent, candidate)
    };
    diagnostics.record(
        DiagnosticKind::RuleInvariantViolated,
        &[kept.id, dropped.id],
        Some(date),
        || {
            format!(
                "rules {} and {} of offering {} overlap in date and time, keeping {}",
                kept.id, dropped.id, kept.offering_id, kept.id
            )
        },
    );

    kept.id == candidate.id
}

/// Phase groups of one center, bucketed by weekday.
#[derive(Debug)]
pub struct PhaseIndex<'a> {
    by_weekday: [Vec<PhaseGroup<'a>>; 7],
}

impl<'a> PhaseIndex<'a> {
    /// ## Summary
    /// Groups the valid rules of `center_id` by offering and weekday.
    ///
    /// ## Side Effects
    /// Records `InvalidRule` for each rule that fails validation; such rules
    /// are left out of every group.
    pub fn build<I>(center_id: CenterId, rules: I, diagnostics: &mut Diagnostics) -> Self
    where
        I: IntoIterator<Item = &'a ScheduleRule>,
    {
        let mut buckets: BTreeMap<(u32, OfferingId), Vec<&'a ScheduleRule>> = BTreeMap::new();

        for rule in rules {
            if rule.center_id != center_id {
                continue;
            }
            if let Err(err) = rule.validate() {
                diagnostics.record(
                    DiagnosticKind::InvalidRule,
                    &[rule.id],
                    rule.effective_range.start_date,
                    || err.to_string(),
                );
                continue;
            }
            buckets
                .entry((rule.weekday.num_days_from_monday(), rule.offering_id))
                .or_default()
                .push(rule);
        }

        let mut by_weekday: [Vec<PhaseGroup<'a>>; 7] = std::array::from_fn(|_| Vec::new());
        for ((_, offering_id), rules) in buckets {
            let weekday = rules[0].weekday;
            let slot = weekday.num_days_from_monday() as usize;
            by_weekday[slot].push(PhaseGroup::new(offering_id, weekday, rules));
        }

        Self { by_weekday }
    }

    /// Groups for `weekday`, ordered by offering id.
    #[must_use]
    pub fn groups_on(&self, weekday: Weekday) -> &[PhaseGroup<'a>] {
        &self.by_weekday[weekday.num_days_from_monday() as usize]
    }

    #[must_use]
    pub fn group(&self, offering_id: OfferingId, weekday: Weekday) -> Option<&PhaseGroup<'a>> {
        self.groups_on(weekday)
            .iter()
            .find(|group| group.offering_id == offering_id)
    }

    /// ## Summary
    /// Governing rules of every offering on `date`.
    pub fn resolve(&self, date: NaiveDate, diagnostics: &mut Diagnostics) -> Vec<&'a ScheduleRule> {
        self.groups_on(date.weekday())
            .iter()
            .flat_map(|group| group.resolve(date, diagnostics))
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_weekday.iter().all(Vec::is_empty)
    }
}
