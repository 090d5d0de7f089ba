//! Blocking until a workflow reaches a terminal state.
//!
//! Each iteration re-fetches the workflow, sleeps for the poll interval, and
//! then reports one tick of progress. Waiting can be bounded by wall-clock
//! time or by the number of status checks; both are unbounded by default.
//! Cancellation is cooperative: dropping the future stops polling at the next
//! await point.

use std::time::Duration;

use terminus_util::TerminusConfig;
use terminus_util::config::{DEFAULT_POLL_INTERVAL_SECS, DEFAULT_TRANSPORT_RETRIES};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use super::Workflow;
use super::progress::{ProgressSink, WriterProgress};
use crate::WorkflowError;

/// Tuning for [`Workflow::wait_with`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitOptions {
    /// Pause between consecutive status checks.
    pub poll_interval: Duration,
    /// Give up once this much time has passed.
    pub max_duration: Option<Duration>,
    /// Give up after this many status checks.
    pub max_attempts: Option<u32>,
    /// Consecutive transient transport failures tolerated before giving up.
    pub transport_retries: u32,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_duration: None,
            max_attempts: None,
            transport_retries: DEFAULT_TRANSPORT_RETRIES,
        }
    }
}

impl WaitOptions {
    pub fn from_config(config: &TerminusConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            max_duration: config.max_wait(),
            max_attempts: None,
            transport_retries: config.transport_retries,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = Some(max_duration);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_transport_retries(mut self, transport_retries: u32) -> Self {
        self.transport_retries = transport_retries;
        self
    }
}

impl Workflow {
    /// Wait with default options, printing progress dots to stderr.
    pub async fn wait(&mut self) -> Result<&Self, WorkflowError> {
        let mut progress = WriterProgress::stderr();
        self.wait_with(&WaitOptions::default(), &mut progress).await
    }

    /// Poll until the workflow finishes.
    ///
    /// Returns the handle when the workflow succeeded. A failed workflow
    /// yields [`WorkflowError::Failed`] carrying the first message of its
    /// final task, or [`WorkflowError::FailedWithoutDetail`] when there is
    /// none. A workflow that is already finished is not re-fetched.
    pub async fn wait_with(&mut self, options: &WaitOptions, progress: &mut dyn ProgressSink) -> Result<&Self, WorkflowError> {
        let outcome = self.poll_until_finished(options, progress).await;
        progress.finish();
        outcome?;

        match self.failure() {
            Some(failure) => {
                info!(workflow_id = %self.id(), status = %self.status(), "workflow failed");
                Err(failure)
            }
            None => {
                info!(workflow_id = %self.id(), "workflow succeeded");
                Ok(&*self)
            }
        }
    }

    async fn poll_until_finished(&mut self, options: &WaitOptions, progress: &mut dyn ProgressSink) -> Result<(), WorkflowError> {
        let started = Instant::now();
        let mut attempts: u32 = 0;
        let mut consecutive_failures: u32 = 0;

        while !self.is_finished() {
            if let Some(max_attempts) = options.max_attempts
                && attempts >= max_attempts
            {
                return Err(WorkflowError::AttemptsExhausted {
                    workflow_id: self.id().to_string(),
                    attempts,
                });
            }
            if let Some(limit) = options.max_duration
                && started.elapsed() >= limit
            {
                return Err(WorkflowError::TimedOut {
                    workflow_id: self.id().to_string(),
                    limit,
                });
            }

            attempts += 1;
            let refreshed = self.fetch().await.map(|_| ());
            match refreshed {
                Ok(()) => consecutive_failures = 0,
                Err(error) if error.is_transient() && consecutive_failures < options.transport_retries => {
                    consecutive_failures += 1;
                    warn!(
                        workflow_id = %self.id(),
                        attempt = consecutive_failures,
                        error = %error,
                        "transient error while polling workflow; retrying"
                    );
                }
                Err(error) => return Err(error),
            }
            debug!(workflow_id = %self.id(), attempts, status = %self.status(), "polled workflow");

            sleep(options.poll_interval).await;
            progress.tick();
        }

        Ok(())
    }
}
