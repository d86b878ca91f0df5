use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;

/// Lifecycle: `Pending -> Running -> {Success | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Pending,
    Running,
    Success,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Success | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Pending => "PENDING",
            JobState::Running => "RUNNING",
            JobState::Success => "SUCCESS",
            JobState::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// A submitted ingestion task, owned by the monitor until it is terminal.
#[derive(Debug, Clone)]
pub struct IngestionJob {
    pub id: String,
    pub state: JobState,
    pub submitted_spec: Value,
    pub poll_interval_secs: u64,
    /// Status requests made so far.
    pub polls: u32,
    /// Consecutive transport failures; reset by any recognised status.
    pub transport_errors: u32,
    /// Last non-terminal status code the engine reported.
    pub last_status: Option<String>,
    pub submitted_at: Instant,
}

impl IngestionJob {
    pub fn new(id: impl Into<String>, submitted_spec: Value, poll_interval: Duration) -> Self {
        Self {
            id: id.into(),
            state: JobState::Pending,
            submitted_spec,
            poll_interval_secs: poll_interval.as_secs(),
            polls: 0,
            transport_errors: 0,
            last_status: None,
            submitted_at: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.submitted_at.elapsed()
    }
}

/// Result of one poll step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Succeeded,
    Failed,
    /// Not terminal yet; poll again after the delay.
    Retry { after: Duration },
    /// A configured cap was hit; the job is marked failed locally.
    GaveUp { reason: String },
}

/// Summary handed back when a job succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub task_id: String,
    pub polls: u32,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Success.is_terminal());
        assert!(JobState::Failed.is_terminal());
    }

    #[test]
    fn state_renders_upper_case() {
        assert_eq!(JobState::Running.to_string(), "RUNNING");
        assert_eq!(serde_json::to_value(JobState::Success).unwrap(), "SUCCESS");
    }

    #[tokio::test]
    async fn new_job_is_pending() {
        let job = IngestionJob::new("t1", Value::Null, Duration::from_secs(5));
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.poll_interval_secs, 5);
        assert_eq!(job.polls, 0);
    }
}
