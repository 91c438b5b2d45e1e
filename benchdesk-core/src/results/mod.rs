//! Benchmark result aggregation
//!
//! Turns one result document into the views the console shows:
//! - A grouping of attempts by model and task source, from which
//!   per-criteria statistics are computed ([`aggregate`])
//! - A flat per-task table with filtering and pagination ([`table`])
//! - A status browser over one criteria bucket ([`status`])
//!
//! Everything here is a pure function of the document. Views are rebuilt
//! wholesale whenever a result file is loaded or reloaded.

pub mod aggregate;
pub mod status;
pub mod table;

pub use aggregate::{
    criteria_stats, group_attempts, CriteriaEntry, CriteriaStats, GroupedAttempt, ModelGroups,
    TaskSourceGroups,
};
pub use status::{Partition, StatusBrowser};
pub use table::{filter_rows, flatten_rows, page, page_count, RowFilter, TaskRow, PAGE_SIZE};

use crate::error::Error;
use crate::types::{ResultDocument, TaskResult};

/// Derived views of one result document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultViews {
    /// The parsed document (empty when malformed)
    pub document: ResultDocument,
    /// Attempts grouped by model, then task source
    pub groups: ModelGroups,
    /// One row per task result
    pub rows: Vec<TaskRow>,
    /// Why the document could not be read, if it could not
    pub malformed: Option<String>,
}

impl ResultViews {
    /// Build views from an already parsed document.
    pub fn from_document(document: ResultDocument) -> Self {
        let groups = group_attempts(&document);
        let rows = flatten_rows(&document);
        Self {
            document,
            groups,
            rows,
            malformed: None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        self.malformed.is_some()
    }

    /// True when there is nothing to show (empty or malformed document).
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Model names, sorted.
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Task source names with attempts from `model`, sorted.
    pub fn task_sources<'a>(&'a self, model: &str) -> impl Iterator<Item = &'a str> {
        self.groups
            .get(model)
            .into_iter()
            .flat_map(|sources| sources.keys().map(String::as_str))
    }

    /// Criteria statistics for one (model, task source) group.
    ///
    /// Unknown groups have no statistics.
    pub fn stats_for(&self, model: &str, task_source: &str) -> Vec<CriteriaStats> {
        self.groups
            .get(model)
            .and_then(|sources| sources.get(task_source))
            .map(|attempts| criteria_stats(attempts))
            .unwrap_or_default()
    }

    /// The task result a table row was built from.
    pub fn task(&self, row: &TaskRow) -> Option<&TaskResult> {
        let (run, task) = row.location;
        self.document.runs.get(run)?.results.get(task)
    }
}

/// Parse result document text and build its views.
///
/// Never fails: a malformed document yields empty views with
/// [`ResultViews::malformed`] set, so the caller can show an
/// "empty or invalid format" state.
pub fn aggregate(text: &str) -> ResultViews {
    match ResultDocument::parse(text) {
        Ok(document) => {
            let views = ResultViews::from_document(document);
            tracing::debug!(
                runs = views.document.runs.len(),
                rows = views.rows.len(),
                models = views.groups.len(),
                "Aggregated result document"
            );
            views
        }
        Err(Error::MalformedDocument(reason)) => {
            tracing::warn!(reason = %reason, "Result document has unexpected shape");
            ResultViews {
                malformed: Some(reason),
                ..Default::default()
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read result document");
            ResultViews {
                malformed: Some(e.to_string()),
                ..Default::default()
            }
        }
    }
}
