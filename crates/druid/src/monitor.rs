//! Ingestion job monitor.
//!
//! A job is submitted once, then polled one request at a time. Between
//! polls the driving task sleeps on the tokio timer, so no worker thread
//! is held while the indexer works. Polling is unbounded unless the
//! [`PollPolicy`] sets a cap.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use repan_core::config::DruidConfig;
use repan_core::CoreError;

use crate::client::{IndexingEngine, TaskStatus};
use crate::error::{DruidError, IngestionError};
use crate::job::{IngestionJob, JobReport, JobState, PollOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_polls: Option<u32>,
    /// Measured from submission.
    pub deadline: Option<Duration>,
    /// Consecutive transport failures tolerated before giving up.
    pub max_transport_errors: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_polls: None,
            deadline: None,
            max_transport_errors: None,
        }
    }
}

impl PollPolicy {
    pub fn from_config(config: &DruidConfig) -> Result<Self, CoreError> {
        let cap = |value: Option<u64>| value.map(|v| u32::try_from(v).unwrap_or(u32::MAX));
        Ok(Self {
            interval: config.poll_interval()?,
            max_polls: cap(config.max_polls),
            deadline: config.deadline_secs.map(Duration::from_secs),
            max_transport_errors: cap(config.max_transport_errors),
        })
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = Some(max_polls);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_max_transport_errors(mut self, max: u32) -> Self {
        self.max_transport_errors = Some(max);
        self
    }

    /// The cap, if any, this job has run into.
    fn exhausted(&self, job: &IngestionJob) -> Option<String> {
        if let Some(max) = self.max_transport_errors {
            if job.transport_errors >= max {
                return Some(format!("{} consecutive transport errors", job.transport_errors));
            }
        }
        if let Some(max) = self.max_polls {
            if job.polls >= max {
                return Some(format!("still not terminal after {} polls", job.polls));
            }
        }
        if let Some(deadline) = self.deadline {
            let elapsed = job.elapsed();
            if elapsed >= deadline {
                return Some(format!(
                    "still not terminal after {}s (deadline {}s)",
                    elapsed.as_secs(),
                    deadline.as_secs()
                ));
            }
        }
        None
    }
}

#[derive(Clone)]
pub struct IngestionJobMonitor {
    engine: Arc<dyn IndexingEngine>,
    policy: PollPolicy,
}

impl IngestionJobMonitor {
    pub fn new(engine: Arc<dyn IndexingEngine>, policy: PollPolicy) -> Self {
        Self { engine, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Send a task spec to the engine. Rejections are not retried.
    pub async fn submit<S: Serialize + ?Sized>(
        &self,
        spec: &S,
    ) -> Result<IngestionJob, IngestionError> {
        let spec = serde_json::to_value(spec)
            .map_err(|e| IngestionError::Submission(DruidError::Json(e)))?;

        let task_id = self.engine.submit_task(&spec).await.map_err(|e| {
            error!(error = %e, "ingestion submission failed");
            IngestionError::Submission(e)
        })?;

        info!(task_id = %task_id, "ingestion task submitted");
        Ok(IngestionJob::new(task_id, spec, self.policy.interval))
    }

    /// One status request. Terminal jobs are never polled again.
    pub async fn poll(&self, job: &mut IngestionJob) -> PollOutcome {
        match job.state {
            JobState::Success => return PollOutcome::Succeeded,
            JobState::Failed => return PollOutcome::Failed,
            JobState::Pending | JobState::Running => {}
        }

        job.polls += 1;
        match self.engine.task_status(&job.id).await {
            Ok(TaskStatus::Success) => {
                job.state = JobState::Success;
                info!(task_id = %job.id, polls = job.polls, "ingestion task succeeded");
                return PollOutcome::Succeeded;
            }
            Ok(TaskStatus::Failed) => {
                job.state = JobState::Failed;
                error!(task_id = %job.id, polls = job.polls, "ingestion task failed");
                return PollOutcome::Failed;
            }
            Ok(TaskStatus::InProgress(code)) => {
                debug!(task_id = %job.id, status = %code, polls = job.polls, "ingestion task still running");
                job.state = JobState::Running;
                job.transport_errors = 0;
                job.last_status = Some(code);
            }
            Err(e) => {
                job.transport_errors += 1;
                warn!(
                    task_id = %job.id,
                    error = %e,
                    streak = job.transport_errors,
                    "status poll failed, will retry"
                );
            }
        }

        if let Some(reason) = self.policy.exhausted(job) {
            job.state = JobState::Failed;
            warn!(task_id = %job.id, reason = %reason, "giving up on ingestion task");
            return PollOutcome::GaveUp { reason };
        }

        PollOutcome::Retry {
            after: self.policy.interval,
        }
    }

    /// Drive `job` to a terminal state on a background task. The first poll
    /// happens one interval after submission.
    pub fn spawn(&self, mut job: IngestionJob) -> JobHandle {
        let monitor = self.clone();
        let cancel = Arc::new(Notify::new());
        let task_id = job.id.clone();

        let stop = cancel.clone();
        let task = tokio::spawn(async move {
            let mut delay = monitor.policy.interval;
            loop {
                tokio::select! {
                    biased;
                    _ = stop.notified() => {
                        info!(task_id = %job.id, polls = job.polls, "ingestion monitoring cancelled");
                        return Err(IngestionError::Cancelled { task_id: job.id });
                    }
                    _ = tokio::time::sleep(delay) => {}
                }

                match monitor.poll(&mut job).await {
                    PollOutcome::Succeeded => {
                        return Ok(JobReport {
                            elapsed: job.elapsed(),
                            polls: job.polls,
                            task_id: job.id,
                        });
                    }
                    PollOutcome::Failed => {
                        return Err(IngestionError::JobFailed {
                            task_id: job.id,
                            polls: job.polls,
                        });
                    }
                    PollOutcome::GaveUp { reason } => {
                        return Err(IngestionError::PollBudgetExhausted {
                            task_id: job.id,
                            reason,
                        });
                    }
                    PollOutcome::Retry { after } => delay = after,
                }
            }
        });

        JobHandle {
            task_id,
            cancel,
            task,
        }
    }

    /// Submit, then wait for a terminal state.
    pub async fn run<S: Serialize + ?Sized>(&self, spec: &S) -> Result<JobReport, IngestionError> {
        let job = self.submit(spec).await?;
        self.spawn(job).wait().await
    }
}

/// Handle to a job being monitored in the background.
///
/// Dropping the handle detaches the monitor; call [`JobHandle::cancel`] to
/// stop polling.
pub struct JobHandle {
    task_id: String,
    cancel: Arc<Notify>,
    task: JoinHandle<Result<JobReport, IngestionError>>,
}

impl JobHandle {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Stop scheduling polls. A poll already in flight completes first. The
    /// task keeps running on the engine side.
    pub fn cancel(&self) {
        self.cancel.notify_one();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn wait(self) -> Result<JobReport, IngestionError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(IngestionError::Aborted {
                task_id: self.task_id,
                reason: e.to_string(),
            }),
        }
    }
}
