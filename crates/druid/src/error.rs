use thiserror::Error;

/// Transport-level failures talking to the indexer or reading input.
#[derive(Error, Debug)]
pub enum DruidError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("indexer returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed indexer response: {0}")]
    Malformed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("configuration error: {0}")]
    Config(#[from] repan_core::CoreError),
}

/// Job-level outcomes other than success.
#[derive(Error, Debug)]
pub enum IngestionError {
    /// The indexer refused the task, or could not be reached to submit it.
    #[error("ingestion submission failed: {0}")]
    Submission(#[source] DruidError),

    #[error("ingestion task {task_id} failed after {polls} polls")]
    JobFailed { task_id: String, polls: u32 },

    #[error("gave up on ingestion task {task_id}: {reason}")]
    PollBudgetExhausted { task_id: String, reason: String },

    #[error("monitoring of ingestion task {task_id} was cancelled")]
    Cancelled { task_id: String },

    #[error("monitor for ingestion task {task_id} aborted: {reason}")]
    Aborted { task_id: String, reason: String },
}

impl IngestionError {
    pub fn task_id(&self) -> Option<&str> {
        match self {
            IngestionError::Submission(_) => None,
            IngestionError::JobFailed { task_id, .. }
            | IngestionError::PollBudgetExhausted { task_id, .. }
            | IngestionError::Cancelled { task_id }
            | IngestionError::Aborted { task_id, .. } => Some(task_id),
        }
    }
}
