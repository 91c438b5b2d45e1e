//! Flat per-task table for filtering and pagination.

use serde::Serialize;

use crate::types::ResultDocument;

/// Rows per page in the results table.
pub const PAGE_SIZE: usize = 100;

/// One row per task result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRow {
    pub task_source_name: String,
    pub task_name: String,
    /// Distinct attempt languages, first-appearance order
    pub languages: Vec<String>,
    pub domain: String,
    pub difficulty: String,
    /// The whole task was filtered out (non-empty skip reasons)
    pub is_skipped: bool,
    /// At least one criteria result errored
    pub has_errors: bool,
    /// Position of the task in the document: (run index, result index)
    pub location: (usize, usize),
}

/// Flatten a document into table rows, in document order.
pub fn flatten_rows(document: &ResultDocument) -> Vec<TaskRow> {
    let mut rows = Vec::new();

    for (run_index, run) in document.runs.iter().enumerate() {
        for (task_index, task) in run.results.iter().enumerate() {
            rows.push(TaskRow {
                task_source_name: run.task_source_name.clone(),
                task_name: task.name.clone(),
                languages: task.languages(),
                domain: task.domain().to_string(),
                difficulty: task.difficulty().to_string(),
                is_skipped: task.is_filtered_out(),
                has_errors: task.has_errors(),
                location: (run_index, task_index),
            });
        }
    }

    rows
}

/// Table filters. Empty values match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    pub task_source: String,
    pub task_name: String,
    pub language: String,
    pub domain: String,
    pub difficulty: String,
}

impl RowFilter {
    /// True when no filter value is set.
    pub fn is_empty(&self) -> bool {
        self.task_source.is_empty()
            && self.task_name.is_empty()
            && self.language.is_empty()
            && self.domain.is_empty()
            && self.difficulty.is_empty()
    }

    /// Case-insensitive substring match on every non-empty filter value.
    pub fn matches(&self, row: &TaskRow) -> bool {
        contains(&row.task_source_name, &self.task_source)
            && contains(&row.task_name, &self.task_name)
            && (self.language.is_empty()
                || row.languages.iter().any(|l| contains(l, &self.language)))
            && contains(&row.domain, &self.domain)
            && contains(&row.difficulty, &self.difficulty)
    }
}

fn contains(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Rows passing the filter, in input order.
pub fn filter_rows<'a>(rows: &'a [TaskRow], filter: &RowFilter) -> Vec<&'a TaskRow> {
    rows.iter().filter(|row| filter.matches(row)).collect()
}

/// Number of pages needed for `len` items.
pub fn page_count(len: usize) -> usize {
    (len + PAGE_SIZE - 1) / PAGE_SIZE
}

/// The items on page `index` (0-based). Out-of-range pages are empty.
pub fn page<T>(items: &[T], index: usize) -> &[T] {
    let start = index.saturating_mul(PAGE_SIZE).min(items.len());
    let end = start.saturating_add(PAGE_SIZE).min(items.len());
    &items[start..end]
}
