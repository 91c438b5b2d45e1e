//! Core domain types for benchdesk
//!
//! These types mirror the benchmark result documents written by the
//! benchmark executor, plus the small enums shared across the console.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Collection** | One of the named document groups (`exec_configs`, `task_sources`, `bench_results`) |
//! | **Run Entry** | One task source's results within a result document |
//! | **Task Result** | Results for a single task, across languages and models |
//! | **Attempt** | One (language, model) execution of a task with its evaluations |
//! | **Criteria Result** | The outcome of evaluating one attempt against one criterion |
//!
//! ### Skipped vs filtered out
//!
//! Two different signals look like "skipped" in a result document:
//! - A [`CriteriaResult`] with a negative score and no error is
//!   [`Outcome::Skipped`]: the criterion did not apply to that attempt.
//! - A [`TaskResult`] with a non-empty `skip_reasons` list was filtered out
//!   as a whole before any attempt ran.
//!
//! Only the first one feeds criteria statistics. The second one is reported
//! as [`TaskResult::is_filtered_out`] and never changes classification.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::{Error, Result};

// ============================================
// Collections
// ============================================

/// A named group of documents in the document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Execution configuration documents
    ExecConfigs,
    /// Task source documents
    TaskSources,
    /// Benchmark run result documents
    BenchResults,
}

impl Collection {
    /// Every collection, in sidebar order.
    pub const ALL: [Collection; 3] = [
        Collection::ExecConfigs,
        Collection::TaskSources,
        Collection::BenchResults,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::ExecConfigs => "exec_configs",
            Collection::TaskSources => "task_sources",
            Collection::BenchResults => "bench_results",
        }
    }

    /// Human-readable section title.
    pub fn display_name(&self) -> &'static str {
        match self {
            Collection::ExecConfigs => "Execution Configurations",
            Collection::TaskSources => "Task Sources",
            Collection::BenchResults => "Benchmark Runs",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "exec_configs" => Ok(Collection::ExecConfigs),
            "task_sources" => Ok(Collection::TaskSources),
            "bench_results" => Ok(Collection::BenchResults),
            _ => Err(format!("unknown collection: {}", s)),
        }
    }
}

// ============================================
// Criteria outcome
// ============================================

/// Classification of a single [`CriteriaResult`].
///
/// Exactly one variant applies to any criteria result. Use
/// [`CriteriaResult::outcome`] to compute it; never re-derive it from the
/// raw fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Evaluated without error and with a non-negative score
    Complete,
    /// No error, negative score: criterion not applicable
    Skipped,
    /// Evaluation failed; the score is meaningless
    Errored,
}

impl Outcome {
    /// All outcomes, in the order the status browser shows its tabs.
    pub const ALL: [Outcome; 3] = [Outcome::Complete, Outcome::Skipped, Outcome::Errored];

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Complete => "complete",
            Outcome::Skipped => "skipped",
            Outcome::Errored => "errors",
        }
    }

    /// Tab title (e.g. "Complete").
    pub fn display_name(&self) -> &'static str {
        match self {
            Outcome::Complete => "Complete",
            Outcome::Skipped => "Skipped",
            Outcome::Errored => "Errors",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "complete" | "completed" => Ok(Outcome::Complete),
            "skipped" | "skip" => Ok(Outcome::Skipped),
            "errors" | "error" | "errored" => Ok(Outcome::Errored),
            _ => Err(format!("unknown outcome: {}", s)),
        }
    }
}

// ============================================
// Result document
// ============================================

/// Treats an explicit YAML `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A parsed benchmark result document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultDocument {
    /// Run entries in document order
    pub runs: Vec<RunEntry>,
}

impl ResultDocument {
    /// Parse result document text.
    ///
    /// Blank text and a bare `null` are an empty document. Anything that is
    /// not a sequence of run entries is [`Error::MalformedDocument`].
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let value: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(|e| Error::MalformedDocument(e.to_string()))?;

        match value {
            serde_yaml::Value::Null => Ok(Self::default()),
            serde_yaml::Value::Sequence(_) => {
                let runs: Vec<RunEntry> = serde_yaml::from_value(value)
                    .map_err(|e| Error::MalformedDocument(e.to_string()))?;
                Ok(Self { runs })
            }
            other => Err(Error::MalformedDocument(format!(
                "expected a sequence of run entries, found {}",
                yaml_kind(&other)
            ))),
        }
    }

    /// Iterate every task result together with its run's task source name.
    pub fn task_results(&self) -> impl Iterator<Item = (&str, &TaskResult)> {
        self.runs.iter().flat_map(|run| {
            run.results
                .iter()
                .map(move |task| (run.task_source_name.as_str(), task))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

/// One task source's results within a result document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEntry {
    /// Task source identifier
    #[serde(rename = "task-source-name")]
    pub task_source_name: String,
    /// Task results in execution order
    pub results: Vec<TaskResult>,
}

/// Results for one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// Task name
    pub name: String,
    /// Task area, used as a fallback domain
    #[serde(default)]
    pub area: Option<String>,
    /// Task details and attempts
    pub details: TaskDetails,
}

impl TaskResult {
    /// Domain from the task definition, falling back to the area.
    pub fn domain(&self) -> &str {
        self.details
            .task_definition
            .as_ref()
            .and_then(|d| d.domain.as_deref())
            .or(self.area.as_deref())
            .unwrap_or("N/A")
    }

    pub fn difficulty(&self) -> &str {
        self.details
            .task_definition
            .as_ref()
            .and_then(|d| d.difficulty.as_deref())
            .unwrap_or("N/A")
    }

    /// True when the whole task was filtered out before execution.
    pub fn is_filtered_out(&self) -> bool {
        !self.details.skip_reasons.is_empty()
    }

    /// Distinct attempt languages, in first-appearance order.
    pub fn languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = Vec::new();
        for attempt in &self.details.task_results {
            if !languages.contains(&attempt.language) {
                languages.push(attempt.language.clone());
            }
        }
        languages
    }

    /// True when any criteria result of any attempt errored.
    pub fn has_errors(&self) -> bool {
        self.details.task_results.iter().any(|attempt| {
            attempt
                .evaluation_result
                .iter()
                .any(|r| r.outcome() == Outcome::Errored)
        })
    }
}

/// The `details` block of a task result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDetails {
    #[serde(default)]
    pub task_source_path: Option<String>,
    #[serde(default)]
    pub task_source_name: Option<String>,
    #[serde(default)]
    pub task_definition_name: Option<String>,
    #[serde(default)]
    pub task_definition: Option<TaskDefinition>,
    /// Reasons the task was filtered out (empty when it ran)
    #[serde(default, deserialize_with = "null_as_default")]
    pub skip_reasons: Vec<String>,
    /// One record per (language, model) attempt
    #[serde(default, deserialize_with = "null_as_default")]
    pub task_results: Vec<AttemptRecord>,
}

/// Task classification copied from the task source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

/// One (language, model) execution of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub language: String,
    pub model_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub provider_name: String,
    /// Generation details; absent when generation never ran
    #[serde(default)]
    pub llm_response: Option<LlmResponse>,
    /// Criteria results in evaluation order
    #[serde(default, deserialize_with = "null_as_default")]
    pub evaluation_result: Vec<CriteriaResult>,
}

/// What the model was asked and what it answered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub prompt: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub response_text: String,
    #[serde(default)]
    pub response_code: Option<String>,
    /// Completion tokens
    #[serde(default, deserialize_with = "null_as_default")]
    pub token_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub prompt_token_count: u64,
    /// Generation wall time
    #[serde(default, deserialize_with = "null_as_default")]
    pub time_millis: u64,
}

/// The outcome of evaluating one attempt against one criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaResult {
    /// Criterion key (e.g. "unit-test")
    pub criteria: String,
    /// Score; negative means not applicable
    pub score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unit: String,
    #[serde(default)]
    pub time_millis: Option<f64>,
    /// Evaluation failure message
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub prepared_code: Option<String>,
    #[serde(default)]
    pub executor_class: Option<String>,
}

impl CriteriaResult {
    /// Classify this result. The only place the three-way rule lives.
    ///
    /// An empty error string counts as no error. A score that is not a
    /// finite number (`.nan`, `.inf`) is never averaged and counts as skipped.
    pub fn outcome(&self) -> Outcome {
        match self.error.as_deref() {
            Some(error) if !error.is_empty() => Outcome::Errored,
            _ if !self.score.is_finite() || self.score < 0.0 => Outcome::Skipped,
            _ => Outcome::Complete,
        }
    }
}
