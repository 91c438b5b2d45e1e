//! Launch a benchmark run and follow it until every task source settles.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use benchdesk_core::config::RunServiceConfig;
use benchdesk_core::format::format_progress;
use benchdesk_core::runs::{default_result_name, TaskSourceProgress};
use benchdesk_core::{Collection, FsStore, RunClient, RunStatus, StatusPoller};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::sync::Notify;

use crate::documents::read_document;

pub struct RunRequest {
    pub exec_config: String,
    pub tasks: Vec<String>,
    pub result_file: Option<String>,
    /// Follow progress until the run finishes
    pub wait: bool,
}

pub fn cmd_run(store: &FsStore, runs: &RunServiceConfig, request: RunRequest) -> Result<()> {
    // Fail early on documents the server would not find either
    read_document(store, Collection::ExecConfigs, &request.exec_config)?;
    for task in &request.tasks {
        read_document(store, Collection::TaskSources, task)?;
    }

    let result_file = request
        .result_file
        .clone()
        .unwrap_or_else(|| default_result_name(&request.exec_config, chrono::Utc::now()));

    let client = RunClient::new(runs).context("invalid run service configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async move {
        let handle = client
            .start(&request.exec_config, &request.tasks, &result_file)
            .await
            .context("failed to start run")?;

        println!("Run {} started on {}", handle.id, client.base_url());
        println!("Results: {}/{}", Collection::BenchResults, result_file);

        if !request.wait {
            return Ok(());
        }

        let poller = StatusPoller::for_run(Arc::new(client), handle, runs.poll_interval());
        follow(poller).await
    })
}

/// Render progress until the run finishes or the user interrupts.
async fn follow(poller: StatusPoller) -> Result<()> {
    let interrupted = Arc::new(Notify::new());
    let notify = Arc::clone(&interrupted);
    ctrlc::set_handler(move || {
        eprintln!("\nStopping...");
        notify.notify_one();
    })
    .context("failed to set Ctrl+C handler")?;

    let style = ProgressStyle::default_bar()
        .template("{prefix:<24} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .context("invalid progress template")?
        .progress_chars("#>-");
    let bars = MultiProgress::new();
    let mut by_source: BTreeMap<String, ProgressBar> = BTreeMap::new();

    let mut updates = poller.subscribe();
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                if let Some(status) = &snapshot.status {
                    render(status, &bars, &style, &mut by_source);
                }
                if snapshot.finished {
                    break;
                }
            }
            _ = interrupted.notified() => {
                poller.stop();
                break;
            }
        }
    }

    let snapshot = poller.latest();
    for bar in by_source.values() {
        bar.finish();
    }

    if snapshot.finished {
        let totals = snapshot
            .status
            .as_ref()
            .map(RunStatus::totals)
            .unwrap_or_default();
        println!(
            "Run finished: {} completed, {} errors, {} filtered out",
            totals.completed, totals.error, totals.filtered_out
        );
    } else {
        println!("Stopped following the run; it keeps running on the server.");
    }
    if snapshot.failures > 0 {
        tracing::info!(failures = snapshot.failures, "Some status polls failed");
    }
    Ok(())
}

fn render(
    status: &RunStatus,
    bars: &MultiProgress,
    style: &ProgressStyle,
    by_source: &mut BTreeMap<String, ProgressBar>,
) {
    for (source, progress) in &status.progress {
        let bar = by_source.entry(source.clone()).or_insert_with(|| {
            let bar = bars.add(ProgressBar::new(progress.total));
            bar.set_style(style.clone());
            bar.set_prefix(source.clone());
            bar
        });
        bar.set_length(progress.total);
        bar.set_position(progress.settled());
        bar.set_message(progress_message(progress));
    }
}

fn progress_message(progress: &TaskSourceProgress) -> String {
    format!(
        "{} running, {} errors, {} filtered {}",
        progress.in_progress,
        progress.error,
        progress.filtered_out,
        format_progress(progress.settled(), progress.total)
    )
}
