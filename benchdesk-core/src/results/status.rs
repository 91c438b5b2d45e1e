//! Status browser: drill-down into one criteria bucket.
//!
//! Splits a bucket's entries into complete / skipped / errored tabs using
//! [`CriteriaResult::outcome`](crate::types::CriteriaResult::outcome), and
//! tracks which entry is open for detail inspection.

use super::aggregate::{CriteriaEntry, CriteriaStats};
use crate::types::Outcome;

/// Entries of one bucket split by outcome, each list in bucket order.
#[derive(Debug, Clone, Default)]
pub struct Partition<'a> {
    pub complete: Vec<&'a CriteriaEntry>,
    pub skipped: Vec<&'a CriteriaEntry>,
    pub errored: Vec<&'a CriteriaEntry>,
}

impl<'a> Partition<'a> {
    pub fn of(entries: &'a [CriteriaEntry]) -> Self {
        let mut partition = Self::default();
        for entry in entries {
            match entry.outcome() {
                Outcome::Complete => partition.complete.push(entry),
                Outcome::Skipped => partition.skipped.push(entry),
                Outcome::Errored => partition.errored.push(entry),
            }
        }
        partition
    }

    pub fn get(&self, outcome: Outcome) -> &[&'a CriteriaEntry] {
        match outcome {
            Outcome::Complete => &self.complete,
            Outcome::Skipped => &self.skipped,
            Outcome::Errored => &self.errored,
        }
    }
}

/// Browser state for one criteria bucket.
#[derive(Debug, Clone)]
pub struct StatusBrowser<'a> {
    criteria: &'a str,
    partition: Partition<'a>,
    tab: Outcome,
    selected: Option<usize>,
}

impl<'a> StatusBrowser<'a> {
    /// Open the browser on `stats`, showing the `tab` outcome first.
    pub fn new(stats: &'a CriteriaStats, tab: Outcome) -> Self {
        Self {
            criteria: &stats.criteria,
            partition: Partition::of(&stats.entries),
            tab,
            selected: None,
        }
    }

    pub fn criteria(&self) -> &'a str {
        self.criteria
    }

    pub fn tab(&self) -> Outcome {
        self.tab
    }

    /// Switch tabs. Clears the selection.
    pub fn set_tab(&mut self, tab: Outcome) {
        if self.tab != tab {
            self.tab = tab;
            self.selected = None;
        }
    }

    /// Entries shown under `outcome`.
    pub fn entries(&self, outcome: Outcome) -> &[&'a CriteriaEntry] {
        self.partition.get(outcome)
    }

    /// Entries under the current tab.
    pub fn visible(&self) -> &[&'a CriteriaEntry] {
        self.entries(self.tab)
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.partition.get(outcome).len()
    }

    /// Tab title with its count, e.g. "Complete (3)".
    pub fn tab_title(&self, outcome: Outcome) -> String {
        format!("{} ({})", outcome.display_name(), self.count(outcome))
    }

    /// Select the entry at `index` in the current tab.
    ///
    /// Out-of-range indices leave the selection unchanged and return `None`.
    pub fn select(&mut self, index: usize) -> Option<&'a CriteriaEntry> {
        let entry = self.visible().get(index).copied()?;
        self.selected = Some(index);
        Some(entry)
    }

    pub fn selected(&self) -> Option<&'a CriteriaEntry> {
        self.selected
            .and_then(|index| self.visible().get(index).copied())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }
}
