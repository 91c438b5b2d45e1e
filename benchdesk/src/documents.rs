//! Document commands: listing, viewing, raw edits and form edits.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use benchdesk_core::drafts::save_all;
use benchdesk_core::forms::{self, ListField, TaskEntry, TaskField, ToggleSection};
use benchdesk_core::{Collection, DocumentSession, DocumentStore, DraftOverlay, FsStore};

/// Read a document, turning a missing one into a message listing what exists.
pub fn read_document(store: &FsStore, collection: Collection, name: &str) -> Result<String> {
    match store.read(collection, name) {
        Ok(text) => Ok(text),
        Err(e) if e.is_not_found() => bail!("{}", not_found_message(store, collection, name)),
        Err(e) => Err(e).with_context(|| format!("failed to read {}/{}", collection, name)),
    }
}

fn not_found_message(store: &FsStore, collection: Collection, name: &str) -> String {
    let available = store.list(collection).unwrap_or_default();
    if available.is_empty() {
        format!(
            "Document '{}' not found in {}; the collection is empty",
            name, collection
        )
    } else {
        format!(
            "Document '{}' not found in {}. Available:\n  {}",
            name,
            collection,
            available.join("\n  ")
        )
    }
}

pub fn cmd_list(store: &FsStore, collection: Collection) -> Result<()> {
    let names = store
        .list(collection)
        .with_context(|| format!("failed to list {}", collection))?;

    println!("{} ({})", collection.display_name(), names.len());
    for name in names {
        println!("  {}", name);
    }
    Ok(())
}

pub fn cmd_show(store: &FsStore, collection: Collection, name: &str) -> Result<()> {
    let text = read_document(store, collection, name)?;
    print!("{}", text);
    if !text.ends_with('\n') {
        println!();
    }
    Ok(())
}

/// Open an editing session, turning a missing document into a message
/// listing what exists.
fn open_session(
    store: &FsStore,
    overlay: &DraftOverlay,
    collection: Collection,
    name: &str,
) -> Result<DocumentSession> {
    match DocumentSession::open(store, overlay, collection, name) {
        Ok(session) => Ok(session),
        Err(e) if e.is_not_found() => bail!("{}", not_found_message(store, collection, name)),
        Err(e) => Err(e).with_context(|| format!("failed to open {}/{}", collection, name)),
    }
}

/// Document text from `path`, or from stdin without one.
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read document text from stdin")?;
            Ok(text)
        }
    }
}

/// Save a session unless it has nothing new, or print it for a dry run.
fn finish_session(
    store: &FsStore,
    overlay: &mut DraftOverlay,
    session: &mut DocumentSession,
    dry_run: bool,
) -> Result<()> {
    let name = session.name().to_string();
    if !session.is_modified(overlay) {
        session.discard(overlay);
        println!("{} is unchanged", name);
        return Ok(());
    }

    if dry_run {
        print!("{}", session.content());
        return Ok(());
    }

    session
        .save(store, overlay)
        .with_context(|| format!("failed to save {}", name))?;
    tracing::info!(collection = %session.collection(), name = %name, "Document saved");
    println!("Saved {}", name);
    Ok(())
}

/// Replace a document's text with raw text from a file or stdin.
///
/// The stored text is read again once the input has arrived: a document
/// deleted meanwhile is reported rather than recreated, and input equal to
/// the current stored text writes nothing.
pub fn cmd_edit(
    store: &FsStore,
    collection: Collection,
    name: &str,
    input: Option<&Path>,
    dry_run: bool,
) -> Result<()> {
    let mut overlay = DraftOverlay::new();
    let mut session = open_session(store, &overlay, collection, name)?;

    session.edit(&mut overlay, read_input(input)?);

    match session.reload(store, &overlay) {
        Ok(()) => {}
        Err(e) if e.is_not_found() => {
            tracing::warn!(collection = %collection, name = %name, "Document removed while editing");
            bail!("{}", not_found_message(store, collection, name));
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to re-read {}/{}", collection, name))
        }
    }

    finish_session(store, &mut overlay, &mut session, dry_run)
}

/// Create a document that does not exist yet.
pub fn cmd_new(
    store: &FsStore,
    collection: Collection,
    name: &str,
    input: Option<&Path>,
) -> Result<()> {
    match store.read(collection, name) {
        Ok(_) => bail!("Document '{}' already exists in {}", name, collection),
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e).with_context(|| format!("failed to check {}/{}", collection, name)),
    }

    let mut overlay = DraftOverlay::new();
    overlay.set(collection, name, read_input(input)?);

    // Opens on an empty baseline showing the draft
    let mut session = DocumentSession::open(store, &overlay, collection, name)
        .with_context(|| format!("failed to open new document {}", name))?;
    session
        .save(store, &mut overlay)
        .with_context(|| format!("failed to create {}/{}", collection, name))?;

    println!("Created {}/{}", collection, name);
    Ok(())
}

pub fn cmd_delete(store: &FsStore, collection: Collection, name: &str) -> Result<()> {
    match store.delete(collection, name) {
        Ok(()) => {
            println!("Deleted {}/{}", collection, name);
            Ok(())
        }
        Err(e) if e.is_not_found() => bail!("{}", not_found_message(store, collection, name)),
        Err(e) => Err(e).with_context(|| format!("failed to delete {}/{}", collection, name)),
    }
}

/// Form edits requested on the command line.
pub struct FormEdits {
    /// `field=value,value`
    pub sets: Vec<String>,
    /// `section:name`
    pub enables: Vec<String>,
    /// `section:name`
    pub disables: Vec<String>,
}

impl FormEdits {
    fn is_empty(&self) -> bool {
        self.sets.is_empty() && self.enables.is_empty() && self.disables.is_empty()
    }
}

fn parse_set(raw: &str) -> Result<(ListField, Vec<String>)> {
    let (field, values) = raw
        .split_once('=')
        .with_context(|| format!("expected FIELD=VALUES, got '{}'", raw))?;
    let field: ListField = field.trim().parse().map_err(anyhow::Error::msg)?;
    let values = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    Ok((field, values))
}

fn parse_toggle(raw: &str) -> Result<(ToggleSection, &str)> {
    let (section, name) = raw
        .split_once(':')
        .with_context(|| format!("expected SECTION:NAME, got '{}'", raw))?;
    let section: ToggleSection = section.trim().parse().map_err(anyhow::Error::msg)?;
    Ok((section, name.trim()))
}

/// Apply the same form edits to one or more execution configs.
///
/// Every config is edited through its own session over one overlay and the
/// drafts are then written together. Configs that fail to save are reported
/// and make the command fail.
pub fn cmd_edit_config(
    store: &FsStore,
    names: &[String],
    edits: &FormEdits,
    dry_run: bool,
) -> Result<()> {
    if edits.is_empty() {
        bail!("nothing to edit; pass --set, --enable or --disable");
    }

    let sets = edits
        .sets
        .iter()
        .map(|raw| parse_set(raw))
        .collect::<Result<Vec<_>>>()?;
    let toggles = edits
        .enables
        .iter()
        .map(|raw| (raw, true))
        .chain(edits.disables.iter().map(|raw| (raw, false)))
        .map(|(raw, enabled)| parse_toggle(raw).map(|(section, item)| (section, item, enabled)))
        .collect::<Result<Vec<_>>>()?;

    let mut overlay = DraftOverlay::new();
    for name in names {
        let mut raw = open_session(store, &overlay, Collection::ExecConfigs, name)?;
        let mut form = raw.clone();

        for (field, values) in &sets {
            let text = forms::set_list(form.content(), *field, values)
                .with_context(|| format!("{}: failed to set {}", name, field.key()))?;
            form.edit(&mut overlay, text);
        }
        for (section, item, enabled) in &toggles {
            let text = forms::set_enabled(form.content(), *section, item, *enabled)
                .with_context(|| format!("{}: failed to update {}:{}", name, section.key(), item))?;
            form.edit(&mut overlay, text);
        }

        if !form.is_modified(&overlay) {
            form.discard(&mut overlay);
            println!("{} is unchanged", name);
            continue;
        }
        if dry_run {
            raw.sync_from(&overlay);
            if names.len() > 1 {
                println!("--- {} ---", name);
            }
            print!("{}", raw.content());
        }
    }

    if dry_run || overlay.is_empty() {
        return Ok(());
    }

    let report = save_all(store, &mut overlay, Collection::ExecConfigs);
    for name in &report.saved {
        println!("Saved {}", name);
    }
    if !report.is_success() {
        for (name, e) in &report.failed {
            eprintln!("Failed to save {}: {}", name, e);
        }
        bail!(
            "{} of {} execution configs could not be saved",
            report.failed.len(),
            report.failed.len() + report.saved.len()
        );
    }
    tracing::info!(saved = report.saved.len(), "Execution configs saved from form edits");
    Ok(())
}

/// Task source form edits requested on the command line.
pub struct TaskEdits {
    /// `TASK:FIELD=VALUE`
    pub sets: Vec<String>,
    /// Names of tasks to append
    pub adds: Vec<String>,
    /// `TASK`, positions referring to the list before any removal
    pub removes: Vec<String>,
}

impl TaskEdits {
    fn is_empty(&self) -> bool {
        self.sets.is_empty() && self.adds.is_empty() && self.removes.is_empty()
    }
}

/// Split `TASK:FIELD=VALUE`. The value may itself contain `:` and `=`.
fn parse_task_set(raw: &str) -> Result<(&str, TaskField, &str)> {
    let (target, value) = raw
        .split_once('=')
        .and_then(|(lhs, value)| lhs.rsplit_once(':').map(|(task, field)| ((task, field), value)))
        .with_context(|| format!("expected TASK:FIELD=VALUE, got '{}'", raw))?;
    let field: TaskField = target.1.trim().parse().map_err(anyhow::Error::msg)?;
    Ok((target.0.trim(), field, value))
}

/// Resolve a task given by position (from 1) or by name.
fn resolve_task(entries: &[TaskEntry], target: &str) -> Result<usize> {
    if let Ok(position) = target.parse::<usize>() {
        if (1..=entries.len()).contains(&position) {
            return Ok(position - 1);
        }
        bail!("task {} out of range; the document has {} tasks", position, entries.len());
    }
    entries
        .iter()
        .position(|task| task.name == target)
        .with_context(|| format!("no task named '{}'", target))
}

fn print_tasks(name: &str, entries: &[TaskEntry]) {
    println!("{} ({} tasks)", name, entries.len());
    println!(
        "{:>5} {:<28} {:<10} {:<16} {}",
        "#", "task", "difficulty", "source", "languages"
    );
    for (i, task) in entries.iter().enumerate() {
        println!(
            "{:>5} {:<28} {:<10} {:<16} {}",
            i + 1,
            task.name,
            task.difficulty,
            task.source,
            task.languages.join(", ")
        );
    }
}

/// Show the task rows of a task source, or edit them through the form.
pub fn cmd_edit_tasks(store: &FsStore, name: &str, edits: &TaskEdits, dry_run: bool) -> Result<()> {
    let mut overlay = DraftOverlay::new();
    let mut session = open_session(store, &overlay, Collection::TaskSources, name)?;

    if edits.is_empty() {
        print_tasks(name, &forms::task_entries(session.content())?);
        return Ok(());
    }

    for raw in &edits.sets {
        let (target, field, value) = parse_task_set(raw)?;
        let index = resolve_task(&forms::task_entries(session.content())?, target)?;
        let text = forms::set_task_field(session.content(), index, field, value)
            .with_context(|| format!("failed to set {} of task {}", field.key(), target))?;
        session.edit(&mut overlay, text);
    }

    let entries = forms::task_entries(session.content())?;
    let mut removed = edits
        .removes
        .iter()
        .map(|target| resolve_task(&entries, target))
        .collect::<Result<Vec<_>>>()?;
    removed.sort_unstable();
    removed.dedup();
    for index in removed.into_iter().rev() {
        let text = forms::remove_task(session.content(), index)?;
        session.edit(&mut overlay, text);
    }

    for task in &edits.adds {
        let text = forms::add_task(session.content(), task)?;
        session.edit(&mut overlay, text);
    }

    finish_session(store, &mut overlay, &mut session, dry_run)
}
