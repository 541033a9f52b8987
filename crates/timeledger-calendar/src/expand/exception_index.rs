use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use timeledger_core::types::{CenterId, OfferingId, RuleId};

use crate::expand::{DiagnosticKind, Diagnostics, ExpansionWindow};
use crate::model::ScheduleException;

/// Date-keyed lookup of approved exceptions.
///
/// Rule-targeted exceptions are keyed by `(rule_id, date)` and are consumed
/// as the expander visits each occurrence; whatever is left afterwards never
/// matched a firing rule. Ad-hoc sessions are keyed by `(date, offering_id)`.
#[derive(Debug, Default)]
pub struct ExceptionIndex<'a> {
    by_rule: HashMap<(RuleId, NaiveDate), &'a ScheduleException>,
    adhoc: BTreeMap<(NaiveDate, OfferingId), Vec<&'a ScheduleException>>,
}

impl<'a> ExceptionIndex<'a> {
    /// ## Summary
    /// Indexes the approved exceptions of `center_id` that fall in `window`.
    ///
    /// ## Side Effects
    /// Records `DuplicateException` when two exceptions target the same rule
    /// and date (the smaller id is kept) and `InvalidException` for a
    /// non-ad-hoc exception with no rule.
    pub fn build<I>(
        center_id: CenterId,
        window: &ExpansionWindow,
        exceptions: I,
        diagnostics: &mut Diagnostics,
    ) -> Self
    where
        I: IntoIterator<Item = &'a ScheduleException>,
    {
        let mut index = Self::default();

        for exception in exceptions {
            if exception.center_id != center_id || !window.contains(exception.date) {
                continue;
            }
            if !exception.is_approved() {
                tracing::trace!(
                    exception_id = exception.id,
                    status = exception.status.as_str(),
                    "Skipping exception that is not approved"
                );
                continue;
            }

            if exception.is_adhoc() {
                index
                    .adhoc
                    .entry((exception.date, exception.offering_id))
                    .or_default()
                    .push(exception);
                continue;
            }

            let Some(rule_id) = exception.rule_id else {
                diagnostics.record(
                    DiagnosticKind::InvalidException,
                    &[exception.id],
                    Some(exception.date),
                    || {
                        format!(
                            "{} exception {} has no rule",
                            exception.kind.as_str(),
                            exception.id
                        )
                    },
                );
                continue;
            };

            index.insert_for_rule(rule_id, exception, diagnostics);
        }

        for sessions in index.adhoc.values_mut() {
            sessions.sort_by_key(|exception| exception.id);
        }

        index
    }

    fn insert_for_rule(
        &mut self,
        rule_id: RuleId,
        exception: &'a ScheduleException,
        diagnostics: &mut Diagnostics,
    ) {
        let key = (rule_id, exception.date);
        match self.by_rule.get(&key) {
            None => {
                self.by_rule.insert(key, exception);
            }
            Some(existing) => {
                let (kept, dropped) = if exception.id < existing.id {
                    (exception, *existing)
                } else {
                    (*existing, exception)
                };
                diagnostics.record(
                    DiagnosticKind::DuplicateException,
                    &[kept.id, dropped.id],
                    Some(exception.date),
                    || {
                        format!(
                            "rule {rule_id} has several exceptions on {}, keeping {}",
                            exception.date, kept.id
                        )
                    },
                );
                self.by_rule.insert(key, kept);
            }
        }
    }

    /// ## Summary
    /// Removes and returns the exception for one occurrence, if any.
    pub fn take(&mut self, rule_id: RuleId, date: NaiveDate) -> Option<&'a ScheduleException> {
        self.by_rule.remove(&(rule_id, date))
    }

    /// Every ad-hoc session, ordered by date, offering and id.
    pub fn adhoc(&self) -> impl Iterator<Item = &'a ScheduleException> + '_ {
        self.adhoc.values().flatten().copied()
    }

    /// ## Summary
    /// Rule-targeted exceptions that were never taken, ordered by date and id.
    #[must_use]
    pub fn into_unmatched(self) -> Vec<&'a ScheduleException> {
        let mut unmatched: Vec<_> = self.by_rule.into_values().collect();
        unmatched.sort_by_key(|exception| (exception.date, exception.id));
        unmatched
    }
}
