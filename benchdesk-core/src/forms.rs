//! Structured form surfaces for execution configs and task sources.
//!
//! The form never keeps its own copy of the document. It reads the same
//! YAML text the raw editor shows, and every form edit produces new YAML
//! text that is handed back to the editing session. Keys the form does not
//! know about are carried over untouched and key order is preserved.
//! Comments are not preserved by a form edit.

use serde::{Deserialize, Deserializer};
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

/// Typed view of an execution config document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExecConfig {
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub version: Option<String>,
    #[serde(default)]
    pub difficulties: Vec<String>,
    #[serde(default)]
    pub areas: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub parameters: Vec<Toggle>,
    #[serde(default)]
    pub criteria: Vec<Toggle>,
    #[serde(default)]
    pub llms: Vec<String>,
}

/// A named switch. A bare name in the document means enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggle {
    pub name: String,
    pub enabled: bool,
}

impl<'de> Deserialize<'de> for Toggle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Name(String),
            Full {
                name: String,
                #[serde(default = "enabled_by_default")]
                enabled: bool,
            },
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Name(name) => Toggle {
                name,
                enabled: true,
            },
            Repr::Full { name, enabled } => Toggle { name, enabled },
        })
    }
}

fn enabled_by_default() -> bool {
    true
}

fn scalar_as_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

impl ExecConfig {
    /// Parse the typed view from document text. Blank text is an empty config.
    pub fn parse(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn toggles(&self, section: ToggleSection) -> &[Toggle] {
        match section {
            ToggleSection::Parameters => &self.parameters,
            ToggleSection::Criteria => &self.criteria,
        }
    }

    /// Names of enabled toggles in `section`.
    pub fn enabled(&self, section: ToggleSection) -> Vec<&str> {
        self.toggles(section)
            .iter()
            .filter(|t| t.enabled)
            .map(|t| t.name.as_str())
            .collect()
    }
}

/// List-valued form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    /// Single-valued; edited as a one-element list
    Version,
    Difficulties,
    Areas,
    Languages,
    Llms,
}

impl ListField {
    pub fn key(&self) -> &'static str {
        match self {
            ListField::Version => "version",
            ListField::Difficulties => "difficulties",
            ListField::Areas => "areas",
            ListField::Languages => "languages",
            ListField::Llms => "llms",
        }
    }
}

impl std::str::FromStr for ListField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "version" => Ok(ListField::Version),
            "difficulties" => Ok(ListField::Difficulties),
            "areas" => Ok(ListField::Areas),
            "languages" => Ok(ListField::Languages),
            "llms" => Ok(ListField::Llms),
            _ => Err(format!("unknown field: {}", s)),
        }
    }
}

/// Sections holding named switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleSection {
    Parameters,
    Criteria,
}

impl ToggleSection {
    pub fn key(&self) -> &'static str {
        match self {
            ToggleSection::Parameters => "parameters",
            ToggleSection::Criteria => "criteria",
        }
    }
}

impl std::str::FromStr for ToggleSection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "parameters" => Ok(ToggleSection::Parameters),
            "criteria" => Ok(ToggleSection::Criteria),
            _ => Err(format!("unknown section: {}", s)),
        }
    }
}

fn load_mapping(text: &str) -> Result<Mapping> {
    if text.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(text)? {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err(Error::Form(
            "document must be a mapping at the top level".to_string(),
        )),
    }
}

fn render(mapping: Mapping) -> Result<String> {
    Ok(serde_yaml::to_string(&Value::Mapping(mapping))?)
}

/// Replace a list field and return the new document text.
pub fn set_list(text: &str, field: ListField, values: &[String]) -> Result<String> {
    let mut mapping = load_mapping(text)?;

    let value = match field {
        ListField::Version => match values {
            [version] => Value::String(version.clone()),
            _ => {
                return Err(Error::Form(format!(
                    "version takes exactly one value, got {}",
                    values.len()
                )))
            }
        },
        _ => Value::Sequence(values.iter().cloned().map(Value::String).collect()),
    };

    mapping.insert(Value::String(field.key().to_string()), value);
    render(mapping)
}

/// Switch one named item of a section on or off and return the new text.
pub fn set_enabled(
    text: &str,
    section: ToggleSection,
    name: &str,
    enabled: bool,
) -> Result<String> {
    let mut mapping = load_mapping(text)?;
    let key = Value::String(section.key().to_string());

    let items = match mapping.get_mut(&key) {
        Some(Value::Sequence(items)) => items,
        _ => {
            return Err(Error::Form(format!(
                "document has no {} list",
                section.key()
            )))
        }
    };

    let position = items.iter().position(|item| item_name(item) == Some(name));
    let Some(index) = position else {
        return Err(Error::Form(format!("unknown {} entry: {}", section.key(), name)));
    };

    let mut entry = Mapping::new();
    entry.insert(Value::String("name".to_string()), Value::String(name.to_string()));
    entry.insert(Value::String("enabled".to_string()), Value::Bool(enabled));
    items[index] = Value::Mapping(entry);

    render(mapping)
}

fn item_name(item: &Value) -> Option<&str> {
    match item {
        Value::String(name) => Some(name),
        Value::Mapping(map) => map.get("name").and_then(Value::as_str),
        _ => None,
    }
}

const TASKS_KEY: &str = "tasks";

/// Columns of the task source form that are edited as plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Name,
    Difficulty,
    Source,
}

impl TaskField {
    pub fn key(&self) -> &'static str {
        match self {
            TaskField::Name => "name",
            TaskField::Difficulty => "difficulty",
            TaskField::Source => "source",
        }
    }
}

impl std::str::FromStr for TaskField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "name" => Ok(TaskField::Name),
            "difficulty" => Ok(TaskField::Difficulty),
            "source" => Ok(TaskField::Source),
            _ => Err(format!("unknown task field: {}", s)),
        }
    }
}

/// One row of the task source form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEntry {
    pub name: String,
    pub difficulty: String,
    pub source: String,
    pub languages: Vec<String>,
}

impl TaskEntry {
    fn from_value(item: &Value) -> Self {
        let text = |key: &str| match item.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let languages = match item.get("languages") {
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };
        Self {
            name: text("name"),
            difficulty: text("difficulty"),
            source: text("source"),
            languages,
        }
    }
}

/// Rows of a task source document, in document order.
///
/// A document without a `tasks` list has no rows.
pub fn task_entries(text: &str) -> Result<Vec<TaskEntry>> {
    let mapping = load_mapping(text)?;
    Ok(match mapping.get(TASKS_KEY) {
        Some(Value::Sequence(items)) => items.iter().map(TaskEntry::from_value).collect(),
        _ => Vec::new(),
    })
}

fn tasks_mut(mapping: &mut Mapping) -> Result<&mut Vec<Value>> {
    match mapping.get_mut(TASKS_KEY) {
        Some(Value::Sequence(items)) => Ok(items),
        _ => Err(Error::Form("document has no tasks list".to_string())),
    }
}

fn task_out_of_range(index: usize, len: usize) -> Error {
    Error::Form(format!(
        "task {} out of range; the document has {} tasks",
        index + 1,
        len
    ))
}

/// Set one text field of the task at `index` and return the new text.
///
/// Other keys of the task, and the task's position, are left as they were.
pub fn set_task_field(text: &str, index: usize, field: TaskField, value: &str) -> Result<String> {
    let mut mapping = load_mapping(text)?;
    let tasks = tasks_mut(&mut mapping)?;
    let len = tasks.len();

    let task = match tasks.get_mut(index) {
        Some(Value::Mapping(task)) => task,
        Some(_) => {
            return Err(Error::Form(format!(
                "task {} is not a mapping",
                index + 1
            )))
        }
        None => return Err(task_out_of_range(index, len)),
    };
    task.insert(
        Value::String(field.key().to_string()),
        Value::String(value.to_string()),
    );

    render(mapping)
}

/// Append a task with the defaults a new row starts from.
pub fn add_task(text: &str, name: &str) -> Result<String> {
    let mut mapping = load_mapping(text)?;
    let key = Value::String(TASKS_KEY.to_string());
    if !matches!(mapping.get(&key), Some(Value::Sequence(_))) {
        mapping.insert(key, Value::Sequence(Vec::new()));
    }

    let mut task = Mapping::new();
    for (key, value) in [
        ("name", Value::String(name.to_string())),
        ("type", Value::String("implementation from zero".to_string())),
        ("difficulty", Value::String("easy".to_string())),
        ("area", Value::String("general".to_string())),
        ("source", Value::String("custom".to_string())),
        ("languages", string_seq(&["python", "java"])),
        ("available_parameters", string_seq(&[])),
        ("available_criteria", string_seq(&[])),
    ] {
        task.insert(Value::String(key.to_string()), value);
    }

    tasks_mut(&mut mapping)?.push(Value::Mapping(task));
    render(mapping)
}

fn string_seq(items: &[&str]) -> Value {
    Value::Sequence(items.iter().map(|s| Value::String(s.to_string())).collect())
}

/// Remove the task at `index` and return the new text.
pub fn remove_task(text: &str, index: usize) -> Result<String> {
    let mut mapping = load_mapping(text)?;
    let tasks = tasks_mut(&mut mapping)?;
    if index >= tasks.len() {
        return Err(task_out_of_range(index, tasks.len()));
    }
    tasks.remove(index);
    render(mapping)
}
