//! Handle for a single platform workflow.
//!
//! A [`Workflow`] holds the most recent server snapshot and the resource path
//! it was resolved to at construction. Re-fetching replaces the snapshot
//! wholesale, so readers always observe one consistent server state.

pub mod progress;
pub mod wait;

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use terminus_api::{ApiTransport, HYDRATE_OPERATION_LOGS};
use terminus_types::{OwnerContext, WorkflowOperation, WorkflowOwner, WorkflowRecord, WorkflowSnapshot, WorkflowStatus};
use tracing::debug;

use crate::WorkflowError;

/// A workflow being observed through the platform API.
///
/// Methods that talk to the server take `&mut self`; a handle is never
/// refreshed by two callers at once.
pub struct Workflow {
    snapshot: WorkflowSnapshot,
    owner: WorkflowOwner,
    path: String,
    transport: Arc<dyn ApiTransport>,
}

impl fmt::Debug for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("id", &self.snapshot.id)
            .field("path", &self.path)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl Workflow {
    /// Build a handle from a server payload and the context it was found in.
    ///
    /// The owner is resolved once here; an empty context is rejected before
    /// the payload is inspected.
    pub fn new(attributes: Value, owner: &OwnerContext, transport: Arc<dyn ApiTransport>) -> Result<Self, WorkflowError> {
        let owner = owner.resolve()?;
        let snapshot = WorkflowSnapshot::from_value(attributes).map_err(|error| WorkflowError::InvalidPayload(error.to_string()))?;
        Ok(Self::from_snapshot(snapshot, owner, transport))
    }

    pub fn from_snapshot(snapshot: WorkflowSnapshot, owner: WorkflowOwner, transport: Arc<dyn ApiTransport>) -> Self {
        let path = owner.workflow_path(&snapshot.id);
        Self {
            snapshot,
            owner,
            path,
            transport,
        }
    }

    pub fn id(&self) -> &str {
        &self.snapshot.id
    }

    /// Resource path every refresh is issued against.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn owner(&self) -> &WorkflowOwner {
        &self.owner
    }

    pub fn snapshot(&self) -> &WorkflowSnapshot {
        &self.snapshot
    }

    pub fn status(&self) -> WorkflowStatus {
        self.snapshot.status()
    }

    /// True once the server has recorded any result.
    pub fn is_finished(&self) -> bool {
        self.snapshot.is_finished()
    }

    pub fn is_successful(&self) -> bool {
        self.snapshot.is_successful()
    }

    /// Operation views rebuilt from the current snapshot.
    pub fn operations(&self) -> Vec<WorkflowOperation> {
        self.snapshot.operations()
    }

    /// Display record computed against the current wall clock.
    pub fn serialize(&self) -> WorkflowRecord {
        self.serialize_at(Utc::now().timestamp())
    }

    pub fn serialize_at(&self, now_epoch_secs: i64) -> WorkflowRecord {
        self.snapshot.to_record(now_epoch_secs)
    }

    /// Replace the snapshot with the server's current state.
    pub async fn fetch(&mut self) -> Result<&mut Self, WorkflowError> {
        self.refresh(&[]).await?;
        Ok(self)
    }

    /// Like [`Workflow::fetch`], asking the server to include operation logs.
    pub async fn fetch_with_logs(&mut self) -> Result<&mut Self, WorkflowError> {
        self.refresh(&[HYDRATE_OPERATION_LOGS]).await?;
        Ok(self)
    }

    async fn refresh(&mut self, query: &[(&str, &str)]) -> Result<(), WorkflowError> {
        let payload = self
            .transport
            .get_json(&self.path, query)
            .await
            .map_err(|source| WorkflowError::Transport {
                workflow_id: self.snapshot.id.clone(),
                source,
            })?;
        let next = WorkflowSnapshot::from_value(payload).map_err(|error| WorkflowError::InvalidPayload(error.to_string()))?;
        if next.id != self.snapshot.id {
            return Err(WorkflowError::IdentityMismatch {
                workflow_id: self.snapshot.id.clone(),
                received: next.id,
            });
        }

        debug!(workflow_id = %next.id, status = %next.status(), "refreshed workflow");
        self.snapshot = next;
        Ok(())
    }

    /// Error describing why a finished workflow did not succeed, if it didn't.
    pub(crate) fn failure(&self) -> Option<WorkflowError> {
        if !self.is_finished() || self.is_successful() {
            return None;
        }
        let workflow_id = self.snapshot.id.clone();
        let result = self.snapshot.result.clone().unwrap_or_default();
        let failure = match self.snapshot.final_task.as_ref().and_then(|task| task.failure_message()) {
            Some(message) => WorkflowError::Failed {
                workflow_id,
                result,
                message,
            },
            None => WorkflowError::FailedWithoutDetail { workflow_id, result },
        };
        Some(failure)
    }
}
