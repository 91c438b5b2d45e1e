//! benchdesk - Benchmark Operator Console
//!
//! Browse and edit execution configs, task sources and benchmark results,
//! and launch and monitor benchmark runs.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Documents: $XDG_DATA_HOME/benchdesk/documents (~/.local/share/benchdesk/documents)
//! - Logs: $XDG_STATE_HOME/benchdesk/benchdesk.YYYY-MM-DD.log (~/.local/state/benchdesk/)
//! - Config: $XDG_CONFIG_HOME/benchdesk/config.toml (~/.config/benchdesk/config.toml)

mod documents;
mod report;
mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use benchdesk_core::{Collection, Config, FsStore, Outcome};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "benchdesk")]
#[command(about = "Benchmark operator console")]
#[command(version)]
struct Args {
    /// Document store root (default: from config)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List documents in a collection (exec_configs, task_sources, bench_results)
    List { collection: Collection },

    /// Print a document
    Show { collection: Collection, name: String },

    /// Replace a document's text with raw text from a file or stdin
    Edit {
        collection: Collection,
        name: String,

        /// Read the new text from this file instead of stdin
        #[arg(long)]
        from_file: Option<PathBuf>,

        /// Print the new text instead of saving it
        #[arg(long)]
        dry_run: bool,
    },

    /// Create a document from a file or stdin
    New {
        collection: Collection,
        name: String,

        /// Read the text from this file instead of stdin
        #[arg(long)]
        from_file: Option<PathBuf>,
    },

    /// Delete a document
    Delete { collection: Collection, name: String },

    /// Criteria statistics per model and task source
    Stats {
        /// Result document name
        result: String,

        /// Only this model
        #[arg(long)]
        model: Option<String>,

        /// Only this task source
        #[arg(long)]
        task_source: Option<String>,
    },

    /// Flat per-task table with filters
    Table {
        /// Result document name
        result: String,

        #[arg(long, default_value = "")]
        task_source: String,

        #[arg(long, default_value = "")]
        task: String,

        #[arg(long, default_value = "")]
        language: String,

        #[arg(long, default_value = "")]
        domain: String,

        #[arg(long, default_value = "")]
        difficulty: String,

        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: usize,

        /// Show attempts and criteria outcomes of the row with this number
        #[arg(long)]
        row: Option<usize>,
    },

    /// Browse the results of one criteria bucket by outcome
    Browse {
        /// Result document name
        result: String,

        #[arg(long)]
        model: String,

        #[arg(long)]
        task_source: String,

        #[arg(long)]
        criteria: String,

        /// Outcome tab to show (complete, skipped, errors)
        #[arg(long, default_value = "complete")]
        status: Outcome,

        /// Show full details of the entry at this position (starting at 1)
        #[arg(long)]
        entry: Option<usize>,
    },

    /// Edit execution configs through their form fields
    EditConfig {
        /// Execution config document names; each gets the same edits
        #[arg(required = true)]
        names: Vec<String>,

        /// Replace a list field, e.g. `languages=java,python`
        #[arg(long = "set", value_name = "FIELD=VALUES")]
        sets: Vec<String>,

        /// Enable an item, e.g. `criteria:pmd`
        #[arg(long = "enable", value_name = "SECTION:NAME")]
        enables: Vec<String>,

        /// Disable an item, e.g. `parameters:temperature`
        #[arg(long = "disable", value_name = "SECTION:NAME")]
        disables: Vec<String>,

        /// Print the edited document instead of saving it
        #[arg(long)]
        dry_run: bool,
    },

    /// List the tasks of a task source, or edit them through the form
    EditTasks {
        /// Task source document name
        name: String,

        /// Set a task field, e.g. `two-sum:difficulty=hard` or `2:source=custom`
        #[arg(long = "set", value_name = "TASK:FIELD=VALUE")]
        sets: Vec<String>,

        /// Append a new task with this name
        #[arg(long = "add", value_name = "NAME")]
        adds: Vec<String>,

        /// Remove a task by position or name
        #[arg(long = "remove", value_name = "TASK")]
        removes: Vec<String>,

        /// Print the edited document instead of saving it
        #[arg(long)]
        dry_run: bool,
    },

    /// Launch a benchmark run and follow its progress
    Run {
        /// Execution config document name
        #[arg(long)]
        config: String,

        /// Task source document names
        #[arg(long, value_delimiter = ',', required = true)]
        tasks: Vec<String>,

        /// Result document name (default: derived from config name and time)
        #[arg(long)]
        result_file: Option<String>,

        /// Run service URL (default: from config)
        #[arg(long)]
        server: Option<String>,

        /// Poll interval in milliseconds (default: from config)
        #[arg(long)]
        poll: Option<u64>,

        /// Start the run and exit without following it
        #[arg(long)]
        no_wait: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Ensure XDG environment variables are set before using core library
    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let log_guard =
        benchdesk_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let root = args.store.clone().unwrap_or_else(|| config.store_root());
    tracing::info!(store = %root.display(), "benchdesk starting");
    let store = FsStore::new(root);

    let result = match args.command {
        Command::List { collection } => documents::cmd_list(&store, collection),
        Command::Show { collection, name } => documents::cmd_show(&store, collection, &name),
        Command::Edit {
            collection,
            name,
            from_file,
            dry_run,
        } => documents::cmd_edit(&store, collection, &name, from_file.as_deref(), dry_run),
        Command::New {
            collection,
            name,
            from_file,
        } => documents::cmd_new(&store, collection, &name, from_file.as_deref()),
        Command::Delete { collection, name } => documents::cmd_delete(&store, collection, &name),
        Command::Stats {
            result,
            model,
            task_source,
        } => report::cmd_stats(&store, &result, model.as_deref(), task_source.as_deref()),
        Command::Table {
            result,
            task_source,
            task,
            language,
            domain,
            difficulty,
            page,
            row,
        } => {
            let filter = benchdesk_core::results::RowFilter {
                task_source,
                task_name: task,
                language,
                domain,
                difficulty,
            };
            report::cmd_table(&store, &result, &filter, page, row)
        }
        Command::Browse {
            result,
            model,
            task_source,
            criteria,
            status,
            entry,
        } => report::cmd_browse(
            &store,
            &result,
            report::BucketKey {
                model: &model,
                task_source: &task_source,
                criteria: &criteria,
            },
            status,
            entry,
        ),
        Command::EditConfig {
            names,
            sets,
            enables,
            disables,
            dry_run,
        } => documents::cmd_edit_config(
            &store,
            &names,
            &documents::FormEdits {
                sets,
                enables,
                disables,
            },
            dry_run,
        ),
        Command::EditTasks {
            name,
            sets,
            adds,
            removes,
            dry_run,
        } => documents::cmd_edit_tasks(
            &store,
            &name,
            &documents::TaskEdits {
                sets,
                adds,
                removes,
            },
            dry_run,
        ),
        Command::Run {
            config: exec_config,
            tasks,
            result_file,
            server,
            poll,
            no_wait,
        } => {
            let mut runs = config.runs.clone();
            if let Some(server) = server {
                runs.server_url = server;
            }
            if let Some(poll) = poll {
                runs.poll_interval_ms = poll;
            }
            run::cmd_run(
                &store,
                &runs,
                run::RunRequest {
                    exec_config,
                    tasks,
                    result_file,
                    wait: !no_wait,
                },
            )
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %format!("{:#}", e), "Command failed");
        eprintln!("Log: {}", log_guard.current_file().display());
    }
    result
}
