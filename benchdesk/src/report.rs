//! Result document views: statistics, task table and status browser.

use anyhow::{bail, Result};
use benchdesk_core::format::{error_preview, format_millis, format_score};
use benchdesk_core::results::{
    filter_rows, page, page_count, CriteriaEntry, RowFilter, TaskRow, PAGE_SIZE,
};
use benchdesk_core::{
    aggregate, Collection, CriteriaResult, FsStore, Outcome, ResultViews, StatusBrowser,
    TaskResult,
};

use crate::documents::read_document;

const INVALID_FORMAT: &str = "This benchmark result file is empty or has invalid format.";

/// Load and aggregate a result document.
///
/// Returns `None` after printing the empty/invalid notice when there is
/// nothing to show.
fn load_views(store: &FsStore, name: &str) -> Result<Option<ResultViews>> {
    let text = read_document(store, Collection::BenchResults, name)?;
    let views = aggregate(&text);

    if let Some(reason) = &views.malformed {
        tracing::warn!(name = %name, reason = %reason, "Result document is malformed");
    }
    if views.is_malformed() || views.is_empty() {
        println!("{}", INVALID_FORMAT);
        return Ok(None);
    }
    Ok(Some(views))
}

pub fn cmd_stats(
    store: &FsStore,
    name: &str,
    model: Option<&str>,
    task_source: Option<&str>,
) -> Result<()> {
    let Some(views) = load_views(store, name)? else {
        return Ok(());
    };

    let mut shown = 0;
    for current_model in views.models() {
        if model.map_or(false, |m| m != current_model) {
            continue;
        }
        for source in views.task_sources(current_model) {
            if task_source.map_or(false, |s| s != source) {
                continue;
            }
            shown += 1;

            println!("{} / {}", current_model, source);
            println!(
                "  {:<24} {:>8} {:>8} {:>8} {:>9}",
                "criteria", "complete", "skipped", "errors", "avg score"
            );
            for stats in views.stats_for(current_model, source) {
                println!(
                    "  {:<24} {:>8} {:>8} {:>8} {:>9}",
                    stats.criteria,
                    stats.complete,
                    stats.skipped,
                    stats.errors,
                    format_score(stats.avg_score)
                );
            }
            println!();
        }
    }

    if shown == 0 {
        println!("No results for the selected model and task source.");
    }
    Ok(())
}

/// Print the filtered table, or with `row` the details of one filtered row.
///
/// Rows are numbered across pages, starting at 1.
pub fn cmd_table(
    store: &FsStore,
    name: &str,
    filter: &RowFilter,
    page_number: usize,
    row: Option<usize>,
) -> Result<()> {
    let Some(views) = load_views(store, name)? else {
        return Ok(());
    };

    let rows = filter_rows(&views.rows, filter);

    if let Some(position) = row {
        let Some(selected) = position.checked_sub(1).and_then(|i| rows.get(i)) else {
            bail!("row {} out of range; {} tasks match", position, rows.len());
        };
        let Some(task) = views.task(selected) else {
            bail!("row {} does not point at a task in {}", position, name);
        };
        print_task_details(selected, task);
        return Ok(());
    }

    let pages = page_count(rows.len()).max(1);
    if page_number == 0 || page_number > pages {
        bail!("page {} out of range (1-{})", page_number, pages);
    }

    println!(
        "{:>5} {:<20} {:<28} {:<16} {:<16} {:<10} {:<8} {:<6}",
        "#", "task source", "task", "languages", "domain", "difficulty", "skipped", "errors"
    );
    let offset = (page_number - 1) * PAGE_SIZE;
    for (i, row) in page(&rows, page_number - 1).iter().enumerate() {
        println!(
            "{:>5} {:<20} {:<28} {:<16} {:<16} {:<10} {:<8} {:<6}",
            offset + i + 1,
            row.task_source_name,
            row.task_name,
            row.languages.join(","),
            row.domain,
            row.difficulty,
            yes_no(row.is_skipped),
            yes_no(row.has_errors)
        );
    }
    println!();
    println!(
        "{} of {} tasks, page {}/{}",
        rows.len(),
        views.rows.len(),
        page_number,
        pages
    );
    Ok(())
}

fn print_task_details(row: &TaskRow, task: &TaskResult) {
    println!("Task:        {}", task.name);
    println!("Task source: {}", row.task_source_name);
    println!("Domain:      {}", task.domain());
    println!("Difficulty:  {}", task.difficulty());
    if task.is_filtered_out() {
        println!("Skipped:     {}", task.details.skip_reasons.join("; "));
    }

    let attempts = &task.details.task_results;
    println!();
    println!("Attempts ({})", attempts.len());
    for (i, attempt) in attempts.iter().enumerate() {
        println!(
            "{:>4}. {} / {} ({})",
            i + 1,
            attempt.language,
            attempt.model_name,
            attempt.provider_name
        );
        if attempt.evaluation_result.is_empty() {
            println!("        no criteria results");
        }
        for result in &attempt.evaluation_result {
            println!("        {}", criteria_line(result));
        }
    }
}

fn criteria_line(result: &CriteriaResult) -> String {
    let outcome = result.outcome();
    match outcome {
        Outcome::Errored => format!(
            "{:<16} {:<8} {}",
            result.criteria,
            outcome.display_name(),
            error_preview(result.error.as_deref().unwrap_or_default())
        ),
        _ => format!(
            "{:<16} {:<8} score {} {} in {} ms",
            result.criteria,
            outcome.display_name(),
            format_score(result.score),
            result.unit,
            format_millis(result.time_millis)
        ),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

/// Which criteria bucket to browse.
pub struct BucketKey<'a> {
    pub model: &'a str,
    pub task_source: &'a str,
    pub criteria: &'a str,
}

pub fn cmd_browse(
    store: &FsStore,
    name: &str,
    key: BucketKey<'_>,
    status: Outcome,
    entry: Option<usize>,
) -> Result<()> {
    let Some(views) = load_views(store, name)? else {
        return Ok(());
    };

    let all_stats = views.stats_for(key.model, key.task_source);
    let Some(stats) = all_stats.iter().find(|s| s.criteria == key.criteria) else {
        let known: Vec<_> = all_stats.iter().map(|s| s.criteria.as_str()).collect();
        bail!(
            "no '{}' results for {} / {} (criteria: {})",
            key.criteria,
            key.model,
            key.task_source,
            if known.is_empty() {
                "none".to_string()
            } else {
                known.join(", ")
            }
        );
    };

    let mut browser = StatusBrowser::new(stats, status);

    let titles: Vec<_> = Outcome::ALL
        .iter()
        .map(|outcome| browser.tab_title(*outcome))
        .collect();
    println!("{}  [{}]", browser.criteria(), titles.join("  "));
    println!();

    match entry {
        Some(position) => {
            let Some(selected) = position.checked_sub(1).and_then(|i| browser.select(i)) else {
                bail!(
                    "entry {} out of range; {} has {} entries",
                    position,
                    browser.tab().display_name(),
                    browser.visible().len()
                );
            };
            print_entry_details(selected);
        }
        None => {
            if browser.visible().is_empty() {
                println!("No {} results.", browser.tab().as_str());
            }
            for (i, entry) in browser.visible().iter().enumerate() {
                print_entry_line(i + 1, entry);
            }
        }
    }
    Ok(())
}

fn print_entry_line(position: usize, entry: &CriteriaEntry) {
    let result = entry.result();
    match entry.outcome() {
        Outcome::Errored => println!(
            "{:>4}. {} [{}] {}",
            position,
            entry.task_name,
            entry.attempt.language,
            error_preview(result.error.as_deref().unwrap_or_default())
        ),
        _ => println!(
            "{:>4}. {} [{}] score {} {} in {} ms",
            position,
            entry.task_name,
            entry.attempt.language,
            format_score(result.score),
            result.unit,
            format_millis(result.time_millis)
        ),
    }
}

fn print_entry_details(entry: &CriteriaEntry) {
    let result = entry.result();
    let attempt = &entry.attempt;

    println!("Task:      {}", entry.task_name);
    println!("Language:  {}", attempt.language);
    println!("Model:     {} ({})", attempt.model_name, attempt.provider_name);
    println!("Outcome:   {}", entry.outcome().display_name());
    println!("Score:     {} {}", format_score(result.score), result.unit);
    println!("Time (ms): {}", format_millis(result.time_millis));
    if let Some(executor) = &result.executor_class {
        println!("Executor:  {}", executor);
    }

    print_section("Error", result.error.as_deref());
    print_section("Output", result.output.as_deref());
    print_section("Prepared code", result.prepared_code.as_deref());

    if let Some(response) = &attempt.llm_response {
        println!();
        println!(
            "LLM response: {} tokens ({} prompt), {} ms",
            response.token_count, response.prompt_token_count, response.time_millis
        );
        print_section("Prompt", Some(response.prompt.as_str()));
        print_section("Response", Some(response.response_text.as_str()));
    }
}

fn print_section(title: &str, body: Option<&str>) {
    let Some(body) = body.filter(|b| !b.is_empty()) else {
        return;
    };
    println!();
    println!("--- {} ---", title);
    println!("{}", body.trim_end());
}
