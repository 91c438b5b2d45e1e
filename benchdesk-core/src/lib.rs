//! # benchdesk-core
//!
//! Core library for benchdesk - an operator console for a benchmark
//! execution platform.
//!
//! This library provides:
//! - Domain types for result documents, attempts and criteria results
//! - Result aggregation into statistics, a filterable task table and a
//!   status browser
//! - A draft overlay that keeps unsaved edits across editing surfaces
//! - A file-backed document store
//! - A run service client with a cancellable status poller
//! - Configuration management and logging infrastructure
//!
//! ## Example
//!
//! ```rust,no_run
//! use benchdesk_core::{aggregate, Collection, Config, DocumentStore, FsStore};
//!
//! let config = Config::load().expect("failed to load config");
//! let store = FsStore::new(config.store_root());
//!
//! let text = store
//!     .read(Collection::BenchResults, "nightly.yaml")
//!     .expect("failed to read result");
//! let views = aggregate(&text);
//! for model in views.models() {
//!     println!("{}", model);
//! }
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use drafts::{DocumentSession, DraftOverlay};
pub use error::{Error, Result};
pub use results::{aggregate, ResultViews, StatusBrowser};
pub use runs::{RunClient, RunHandle, RunStatus, StatusPoller};
pub use store::{DocumentStore, FsStore};
pub use types::*;

// Public modules
pub mod config;
pub mod drafts;
pub mod error;
pub mod format;
pub mod forms;
pub mod logging;
pub mod results;
pub mod runs;
pub mod store;
pub mod types;
