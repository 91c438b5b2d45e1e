//! HTTP client for the benchmark run service
//!
//! Launches runs with `POST /api/benchmark/run` and reads their progress
//! with `GET /api/benchmark/status/{id}`.

use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use crate::config::RunServiceConfig;
use crate::error::{Error, Result};

use super::status::RunStatus;

/// Identifier of a launched run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunHandle {
    pub id: String,
}

/// HTTP client for the run service
pub struct RunClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl RunClient {
    /// Create a new run client from configuration
    pub fn new(config: &RunServiceConfig) -> Result<Self> {
        config.validate()?;

        let base_url = config.server_url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Launch a run of `task_sources` with the execution config `exec_config`.
    ///
    /// Results are written by the server to `result_file` in the results collection.
    pub async fn start(
        &self,
        exec_config: &str,
        task_sources: &[String],
        result_file: &str,
    ) -> Result<RunHandle> {
        let url = format!("{}/api/benchmark/run", self.base_url);

        let request = StartRunRequest {
            config: exec_config,
            tasks: task_sources,
            result_file,
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::RunService(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            let handle: RunHandle = response
                .json()
                .await
                .map_err(|e| Error::RunService(format!("failed to parse response: {}", e)))?;
            tracing::info!(
                run_id = %handle.id,
                config = exec_config,
                result_file,
                "Run started"
            );
            Ok(handle)
        } else {
            Err(api_error(response).await)
        }
    }

    /// Fetch the current status of a run.
    pub async fn poll(&self, handle: &RunHandle) -> Result<RunStatus> {
        let url = format!(
            "{}/api/benchmark/status/{}",
            self.base_url,
            urlencoding::encode(&handle.id)
        );

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::RunService(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            let run_status: RunStatus = response
                .json()
                .await
                .map_err(|e| Error::RunService(format!("failed to parse response: {}", e)))?;
            run_status.validate()?;
            Ok(run_status)
        } else {
            Err(api_error(response).await)
        }
    }
}

async fn api_error(response: reqwest::Response) -> Error {
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown".to_string());
    Error::RunService(format!("API error ({}): {}", status, error_text))
}

/// Request body for POST /api/benchmark/run
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartRunRequest<'a> {
    config: &'a str,
    tasks: &'a [String],
    result_file: &'a str,
}

/// Default result document name for a run of `config_name` started at `now`.
///
/// The config's extension is dropped and the timestamp uses `-` in place of
/// `:` and `.` so the name is safe on every filesystem.
pub fn default_result_name(config_name: &str, now: DateTime<Utc>) -> String {
    let stem = config_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(config_name);
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{}_{}.yaml", stem, stamp)
}
