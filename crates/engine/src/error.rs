use std::time::Duration;

use terminus_api::ApiError;
use terminus_types::OwnerError;
use thiserror::Error;

/// Failure tracking a workflow.
///
/// `Failed` and `FailedWithoutDetail` describe the remote workflow; every
/// other variant describes a problem observing it.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// No owner was supplied when building the handle.
    #[error(transparent)]
    MissingOwner(#[from] OwnerError),

    #[error("invalid workflow payload: {0}")]
    InvalidPayload(String),

    /// A re-fetch returned a different workflow than the one being tracked.
    #[error("workflow {workflow_id} came back as {received} on refresh")]
    IdentityMismatch { workflow_id: String, received: String },

    /// Polling a specific workflow failed.
    #[error("failed to refresh workflow {workflow_id}: {source}")]
    Transport {
        workflow_id: String,
        #[source]
        source: ApiError,
    },

    /// A request not tied to a single workflow failed, such as a listing.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The workflow finished unsuccessfully and reported why.
    #[error("{message}")]
    Failed {
        workflow_id: String,
        result: String,
        message: String,
    },

    /// The workflow finished unsuccessfully without any message.
    #[error("workflow {workflow_id} {result} with no further detail")]
    FailedWithoutDetail { workflow_id: String, result: String },

    #[error("workflow {workflow_id} still running after {}s", .limit.as_secs())]
    TimedOut { workflow_id: String, limit: Duration },

    #[error("workflow {workflow_id} still running after {attempts} status checks")]
    AttemptsExhausted { workflow_id: String, attempts: u32 },
}

impl WorkflowError {
    /// Whether the error came from a transport failure worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            WorkflowError::Transport { source, .. } | WorkflowError::Api(source) => source.is_transient(),
            _ => false,
        }
    }

    /// Whether the remote workflow itself failed, as opposed to observing it.
    pub fn is_workflow_failure(&self) -> bool {
        matches!(self, WorkflowError::Failed { .. } | WorkflowError::FailedWithoutDetail { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_message_is_shown_verbatim() {
        let error = WorkflowError::Failed {
            workflow_id: "W1".into(),
            result: "failed".into(),
            message: "disk full".into(),
        };
        assert_eq!(error.to_string(), "disk full");
        assert!(error.is_workflow_failure());
        assert!(!error.is_transient());
    }

    #[test]
    fn transport_errors_inherit_transience() {
        let error = WorkflowError::Transport {
            workflow_id: "W1".into(),
            source: ApiError::Status {
                status: 502,
                message: "Bad Gateway".into(),
            },
        };
        assert!(error.is_transient());
        assert!(!error.is_workflow_failure());
        assert!(error.to_string().contains("W1"));
    }

    #[test]
    fn timeout_reports_the_limit_in_seconds() {
        let error = WorkflowError::TimedOut {
            workflow_id: "W1".into(),
            limit: Duration::from_secs(90),
        };
        assert_eq!(error.to_string(), "workflow W1 still running after 90s");
    }
}
