//! Run status record returned by the benchmark server.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Progress counters for one task source of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSourceProgress {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub completed: u64,
    #[serde(default, alias = "in_progress")]
    pub in_progress: u64,
    #[serde(default, rename = "filtered", alias = "filteredOut", alias = "filtered_out")]
    pub filtered_out: u64,
    #[serde(default, alias = "errors")]
    pub error: u64,
}

impl TaskSourceProgress {
    /// Attempts that reached a final state.
    pub fn settled(&self) -> u64 {
        self.completed
            .saturating_add(self.error)
            .saturating_add(self.filtered_out)
    }

    /// Every attempt is accounted for.
    pub fn is_settled(&self) -> bool {
        self.settled() == self.total
    }

    /// Check that the counters never exceed the total.
    pub fn validate(&self) -> Result<()> {
        let counted = self.settled().saturating_add(self.in_progress);
        if counted > self.total {
            return Err(Error::InvalidStatus(format!(
                "{} attempts counted but total is {}",
                counted, self.total
            )));
        }
        Ok(())
    }
}

/// Status of a launched run, keyed by task source name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progress: BTreeMap<String, TaskSourceProgress>,
}

impl RunStatus {
    /// True once progress is known and every task source is settled.
    ///
    /// An empty progress map means the server has not reported yet, so the
    /// run is not considered finished.
    pub fn is_finished(&self) -> bool {
        !self.progress.is_empty() && self.progress.values().all(TaskSourceProgress::is_settled)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, progress) in &self.progress {
            progress
                .validate()
                .map_err(|e| Error::InvalidStatus(format!("{}: {}", name, e)))?;
        }
        Ok(())
    }

    /// Sum of counters across task sources.
    pub fn totals(&self) -> TaskSourceProgress {
        self.progress
            .values()
            .fold(TaskSourceProgress::default(), |acc, p| TaskSourceProgress {
                total: acc.total.saturating_add(p.total),
                completed: acc.completed.saturating_add(p.completed),
                in_progress: acc.in_progress.saturating_add(p.in_progress),
                filtered_out: acc.filtered_out.saturating_add(p.filtered_out),
                error: acc.error.saturating_add(p.error),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(total: u64, completed: u64, error: u64, filtered_out: u64) -> TaskSourceProgress {
        TaskSourceProgress {
            total,
            completed,
            error,
            filtered_out,
            in_progress: 0,
        }
    }

    #[test]
    fn test_parse_server_json() {
        let json = r#"{
            "status": "RUNNING",
            "progress": {
                "java-tasks": {"total": 10, "completed": 4, "filtered": 1, "error": 2, "inProgress": 3}
            }
        }"#;
        let status: RunStatus = serde_json::from_str(json).unwrap();
        let p = status.progress["java-tasks"];
        assert_eq!(status.status.as_deref(), Some("RUNNING"));
        assert_eq!(p.filtered_out, 1);
        assert_eq!(p.in_progress, 3);
        assert!(status.validate().is_ok());
        assert!(!status.is_finished());
    }

    #[test]
    fn test_alternate_spellings() {
        let json = r#"{"progress": {"a": {"total": 2, "filteredOut": 2}}}"#;
        let status: RunStatus = serde_json::from_str(json).unwrap();
        assert_eq!(status.progress["a"].filtered_out, 2);
        assert!(status.is_finished());
    }

    #[test]
    fn test_finished_requires_every_source() {
        let mut status = RunStatus::default();
        assert!(!status.is_finished());

        status.progress.insert("a".into(), progress(3, 1, 1, 1));
        assert!(status.is_finished());

        status.progress.insert("b".into(), progress(3, 2, 0, 0));
        assert!(!status.is_finished());

        status.progress.insert("b".into(), progress(3, 2, 1, 0));
        assert!(status.is_finished());
    }

    #[test]
    fn test_validate_rejects_overcount() {
        let mut status = RunStatus::default();
        status.progress.insert(
            "a".into(),
            TaskSourceProgress {
                in_progress: 2,
                ..progress(3, 1, 1, 0)
            },
        );
        assert!(matches!(status.validate(), Err(Error::InvalidStatus(_))));
    }

    #[test]
    fn test_huge_counters_saturate() {
        let json = format!(
            r#"{{"progress": {{"a": {{"total": 5, "completed": {max}, "error": {max}, "inProgress": 1}}}}}}"#,
            max = u64::MAX
        );
        let status: RunStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(status.progress["a"].settled(), u64::MAX);
        assert!(matches!(status.validate(), Err(Error::InvalidStatus(_))));

        let mut status = RunStatus::default();
        status.progress.insert("a".into(), progress(u64::MAX, u64::MAX, 0, 0));
        status.progress.insert("b".into(), progress(u64::MAX, 1, 0, 0));
        let totals = status.totals();
        assert_eq!(totals.total, u64::MAX);
        assert_eq!(totals.completed, u64::MAX);
    }

    #[test]
    fn test_totals() {
        let mut status = RunStatus::default();
        status.progress.insert("a".into(), progress(3, 1, 1, 1));
        status.progress.insert("b".into(), progress(5, 2, 0, 0));
        let totals = status.totals();
        assert_eq!(totals.total, 8);
        assert_eq!(totals.settled(), 5);
    }
}
