//! Overlord task API client.
//!
//! [`IndexingEngine`] is the seam the job monitor is written against;
//! [`DruidClient`] implements it over HTTP with basic auth.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use repan_core::config::DruidConfig;

use crate::error::DruidError;

const TASK_PATH: &str = "druid/indexer/v1/task";

/// Status of an indexing task as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Success,
    Failed,
    /// Any other status code, e.g. `RUNNING` or `WAITING`.
    InProgress(String),
}

impl TaskStatus {
    pub fn from_code(code: &str) -> Self {
        match code {
            "SUCCESS" => TaskStatus::Success,
            "FAILED" => TaskStatus::Failed,
            other => TaskStatus::InProgress(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskStatus::InProgress(_))
    }
}

/// An engine that accepts ingestion tasks and reports on them.
#[async_trait]
pub trait IndexingEngine: Send + Sync {
    /// Submit a task spec and return the engine-assigned task id.
    async fn submit_task(&self, spec: &Value) -> Result<String, DruidError>;

    /// Fetch the current status of a task.
    async fn task_status(&self, task_id: &str) -> Result<TaskStatus, DruidError>;
}

#[derive(Deserialize)]
struct SubmitResponse {
    task: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    status: StatusBody,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusBody {
    status_code: String,
}

pub struct DruidClient {
    client: reqwest::Client,
    task_url: String,
    user: String,
    password: Option<String>,
}

impl DruidClient {
    pub fn new(coordinator_url: &str, user: impl Into<String>, password: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            task_url: format!("{}/{TASK_PATH}", coordinator_url.trim_end_matches('/')),
            user: user.into(),
            password,
        }
    }

    pub fn from_config(config: &DruidConfig) -> Result<Self, DruidError> {
        let coordinator = config.coordinator()?;
        info!(coordinator = %coordinator, user = %config.admin_user, "Druid client initialised");
        Ok(Self::new(
            coordinator,
            config.admin_user.clone(),
            config.admin_password.clone(),
        ))
    }

    pub fn task_url(&self) -> &str {
        &self.task_url
    }

    fn status_url(&self, task_id: &str) -> String {
        format!("{}/{}/status", self.task_url, task_id)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, DruidError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(DruidError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl IndexingEngine for DruidClient {
    async fn submit_task(&self, spec: &Value) -> Result<String, DruidError> {
        let response = self
            .client
            .post(&self.task_url)
            .basic_auth(&self.user, self.password.as_deref())
            .json(spec)
            .send()
            .await?;

        let response = Self::check(response).await.inspect_err(|e| {
            warn!(url = %self.task_url, error = %e, "task submission rejected");
        })?;

        let body: Value = response.json().await?;
        let parsed: SubmitResponse = serde_json::from_value(body.clone())
            .map_err(|_| DruidError::Malformed(format!("no task id in {body}")))?;

        debug!(task_id = %parsed.task, "task submitted");
        Ok(parsed.task)
    }

    async fn task_status(&self, task_id: &str) -> Result<TaskStatus, DruidError> {
        let response = self
            .client
            .get(self.status_url(task_id))
            .basic_auth(&self.user, self.password.as_deref())
            .send()
            .await?;

        let body: Value = Self::check(response).await?.json().await?;
        let parsed: StatusResponse = serde_json::from_value(body.clone())
            .map_err(|_| DruidError::Malformed(format!("no status code in {body}")))?;

        Ok(TaskStatus::from_code(&parsed.status.status_code))
    }
}
