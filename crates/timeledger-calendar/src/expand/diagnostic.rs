use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

/// Kinds of data problems found while expanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    /// Two rules of one offering and weekday overlap in date and time.
    RuleInvariantViolated,
    /// A rule with an empty time slot or an inverted range.
    InvalidRule,
    /// More than one approved exception for the same rule and date.
    DuplicateException,
    /// An exception for a rule that does not fire on its date.
    OrphanException,
    /// An exception whose replacement fields cannot be applied.
    InvalidException,
}

impl DiagnosticKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RuleInvariantViolated => "RULE_INVARIANT_VIOLATED",
            Self::InvalidRule => "INVALID_RULE",
            Self::DuplicateException => "DUPLICATE_EXCEPTION",
            Self::OrphanException => "ORPHAN_EXCEPTION",
            Self::InvalidException => "INVALID_EXCEPTION",
        }
    }
}

/// A non-fatal finding reported next to the expansion output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Ids of the records involved; the first one is the record that was kept
    /// where a choice was made.
    pub subject_ids: Vec<u64>,
    pub first_date: Option<NaiveDate>,
    /// Number of dates the finding was observed on.
    pub occurrences: u32,
    pub message: String,
}

/// Collector that reports each distinct finding once.
///
/// Findings are keyed by kind and subject ids, so a broken rule pair seen on
/// fifty Mondays produces one entry with `occurrences = 50`.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: BTreeMap<(DiagnosticKind, Vec<u64>), Diagnostic>,
}

impl Diagnostics {
    /// ## Summary
    /// Records a finding. The message is only built the first time a
    /// `(kind, subject_ids)` pair is seen.
    ///
    /// ## Side Effects
    /// Logs a warning for each new distinct finding.
    pub fn record<F>(
        &mut self,
        kind: DiagnosticKind,
        subject_ids: &[u64],
        date: Option<NaiveDate>,
        message: F,
    ) where
        F: FnOnce() -> String,
    {
        let key = (kind, subject_ids.to_vec());
        if let Some(existing) = self.entries.get_mut(&key) {
            existing.occurrences = existing.occurrences.saturating_add(1);
            existing.first_date = match (existing.first_date, date) {
                (Some(first), Some(date)) => Some(first.min(date)),
                (first, date) => first.or(date),
            };
            return;
        }

        let message = message();
        tracing::warn!(
            kind = kind.as_str(),
            subjects = ?subject_ids,
            date = ?date,
            "{message}"
        );
        self.entries.insert(
            key,
            Diagnostic {
                kind,
                subject_ids: subject_ids.to_vec(),
                first_date: date,
                occurrences: 1,
                message,
            },
        );
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn contains(&self, kind: DiagnosticKind) -> bool {
        self.entries.keys().any(|(k, _)| *k == kind)
    }

    /// Findings ordered by kind, then subject ids.
    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries.into_values().collect()
    }
}
