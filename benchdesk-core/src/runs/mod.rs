//! Benchmark run launching and monitoring.
//!
//! A run is started through [`RunClient::start`], which returns a
//! [`RunHandle`]. Progress is then fetched repeatedly by a [`StatusPoller`]
//! until every task source reports all of its attempts as completed,
//! errored or filtered out.

mod client;
mod poller;
mod status;
#[cfg(test)]
pub(crate) mod test_server;

pub use client::{default_result_name, RunClient, RunHandle};
pub use poller::{PollSnapshot, StatusPoller};
pub use status::{RunStatus, TaskSourceProgress};
