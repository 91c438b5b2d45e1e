//! Grouping and per-criteria statistics.
//!
//! Attempts are grouped by model, then by task source. Statistics are
//! computed for one (model, task source) group at a time and are rebuilt
//! from the document on every load.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::types::{AttemptRecord, CriteriaResult, Outcome, ResultDocument};

/// One attempt inside a (model, task source) group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedAttempt {
    /// Name of the task this attempt belongs to
    pub task_name: String,
    pub attempt: Arc<AttemptRecord>,
}

/// Task source name -> attempts in document order.
pub type TaskSourceGroups = BTreeMap<String, Vec<GroupedAttempt>>;

/// Model name -> task source groups.
pub type ModelGroups = BTreeMap<String, TaskSourceGroups>;

/// Group every attempt of a document by `(model_name, task_source_name)`.
///
/// Keys iterate in sorted order; attempts within a group keep input order.
pub fn group_attempts(document: &ResultDocument) -> ModelGroups {
    let mut groups = ModelGroups::new();

    for (task_source, task) in document.task_results() {
        for attempt in &task.details.task_results {
            groups
                .entry(attempt.model_name.clone())
                .or_default()
                .entry(task_source.to_string())
                .or_default()
                .push(GroupedAttempt {
                    task_name: task.name.clone(),
                    attempt: Arc::new(attempt.clone()),
                });
        }
    }

    groups
}

/// A criteria result together with the attempt that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaEntry {
    pub task_name: String,
    pub attempt: Arc<AttemptRecord>,
    /// Index into `attempt.evaluation_result`
    index: usize,
}

impl CriteriaEntry {
    /// The criteria result this entry points at.
    pub fn result(&self) -> &CriteriaResult {
        &self.attempt.evaluation_result[self.index]
    }

    pub fn outcome(&self) -> Outcome {
        self.result().outcome()
    }
}

/// Statistics for one criterion within a (model, task source) group.
#[derive(Debug, Clone, PartialEq)]
pub struct CriteriaStats {
    /// Criterion key
    pub criteria: String,
    pub complete: usize,
    pub skipped: usize,
    pub errors: usize,
    /// Mean score over complete results; 0 when none completed
    pub avg_score: f64,
    /// Every contributing result, in attempt order
    pub entries: Vec<CriteriaEntry>,
}

impl CriteriaStats {
    fn new(criteria: &str) -> Self {
        Self {
            criteria: criteria.to_string(),
            complete: 0,
            skipped: 0,
            errors: 0,
            avg_score: 0.0,
            entries: Vec::new(),
        }
    }

    /// Number of results that contributed to this bucket.
    pub fn total(&self) -> usize {
        self.complete + self.skipped + self.errors
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        match outcome {
            Outcome::Complete => self.complete,
            Outcome::Skipped => self.skipped,
            Outcome::Errored => self.errors,
        }
    }
}

/// Compute per-criteria statistics for the attempts of one group.
///
/// Buckets come back in the order their criteria key was first seen.
pub fn criteria_stats(attempts: &[GroupedAttempt]) -> Vec<CriteriaStats> {
    let mut buckets: Vec<CriteriaStats> = Vec::new();
    let mut sums: Vec<f64> = Vec::new();
    let mut index_by_key: HashMap<&str, usize> = HashMap::new();

    for grouped in attempts {
        for (index, result) in grouped.attempt.evaluation_result.iter().enumerate() {
            let slot = *index_by_key
                .entry(result.criteria.as_str())
                .or_insert_with(|| {
                    buckets.push(CriteriaStats::new(&result.criteria));
                    sums.push(0.0);
                    buckets.len() - 1
                });
            let stats = &mut buckets[slot];

            match result.outcome() {
                Outcome::Complete => {
                    stats.complete += 1;
                    sums[slot] += result.score;
                }
                Outcome::Skipped => stats.skipped += 1,
                Outcome::Errored => stats.errors += 1,
            }

            stats.entries.push(CriteriaEntry {
                task_name: grouped.task_name.clone(),
                attempt: Arc::clone(&grouped.attempt),
                index,
            });
        }
    }

    for (stats, sum) in buckets.iter_mut().zip(sums) {
        if stats.complete > 0 {
            stats.avg_score = sum / stats.complete as f64;
        }
    }

    buckets
}
