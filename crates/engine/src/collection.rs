//! Workflows listed under one owner.

use std::sync::Arc;

use serde_json::Value;
use terminus_api::{ApiTransport, HYDRATE_OPERATION_LOGS};
use terminus_types::{OwnerContext, WorkflowOwner};
use tracing::debug;

use crate::{Workflow, WorkflowError};

/// Entry point for workflows belonging to a site, environment,
/// organization, or user.
///
/// Every workflow produced here is addressed through the collection's owner.
pub struct WorkflowCollection {
    owner: WorkflowOwner,
    transport: Arc<dyn ApiTransport>,
}

impl WorkflowCollection {
    pub fn new(owner: WorkflowOwner, transport: Arc<dyn ApiTransport>) -> Self {
        Self { owner, transport }
    }

    /// Build a collection from a context, failing when it names no owner.
    pub fn from_context(context: &OwnerContext, transport: Arc<dyn ApiTransport>) -> Result<Self, WorkflowError> {
        Ok(Self::new(context.resolve()?, transport))
    }

    pub fn owner(&self) -> &WorkflowOwner {
        &self.owner
    }

    /// Adopt a payload returned by a trigger request.
    pub fn wrap(&self, attributes: Value) -> Result<Workflow, WorkflowError> {
        let context = OwnerContext::from(self.owner.clone());
        Workflow::new(attributes, &context, self.transport.clone())
    }

    /// All workflows the server reports for this owner, in server order.
    pub async fn list(&self) -> Result<Vec<Workflow>, WorkflowError> {
        let path = self.owner.collection_path();
        let payload = self.transport.get_json(&path, &[]).await?;
        let entries = match payload {
            Value::Array(entries) => entries,
            Value::Object(entries) => entries.into_iter().map(|(_, entry)| entry).collect(),
            other => {
                return Err(WorkflowError::InvalidPayload(format!(
                    "expected a list of workflows from {path}, got {}",
                    json_kind(&other)
                )));
            }
        };
        debug!(owner = %self.owner, kind = self.owner.kind(), count = entries.len(), "listed workflows");

        entries.into_iter().map(|entry| self.wrap(entry)).collect()
    }

    /// Fetch one workflow by id.
    pub async fn get(&self, workflow_id: &str) -> Result<Workflow, WorkflowError> {
        self.get_with_query(workflow_id, &[]).await
    }

    /// Fetch one workflow by id with per-operation logs included.
    pub async fn get_with_logs(&self, workflow_id: &str) -> Result<Workflow, WorkflowError> {
        self.get_with_query(workflow_id, &[HYDRATE_OPERATION_LOGS]).await
    }

    async fn get_with_query(&self, workflow_id: &str, query: &[(&str, &str)]) -> Result<Workflow, WorkflowError> {
        let payload = self
            .transport
            .get_json(&self.owner.workflow_path(workflow_id), query)
            .await
            .map_err(|source| WorkflowError::Transport {
                workflow_id: workflow_id.to_string(),
                source,
            })?;
        self.wrap(payload)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use terminus_types::WorkflowStatus;

    use super::*;
    use crate::test_support::ScriptedTransport;

    fn site_owner() -> WorkflowOwner {
        WorkflowOwner::Site { site_id: "S123".into() }
    }

    #[tokio::test]
    async fn list_wraps_every_entry_under_the_collection_owner() {
        let transport = ScriptedTransport::new(vec![Ok(json!([
            {"id": "W1", "result": "succeeded"},
            {"id": "W2", "result": null}
        ]))]);
        let collection = WorkflowCollection::new(site_owner(), transport.clone());

        let workflows = collection.list().await.unwrap();

        assert_eq!(transport.calls()[0].path, "sites/S123/workflows");
        let ids: Vec<&str> = workflows.iter().map(Workflow::id).collect();
        assert_eq!(ids, ["W1", "W2"]);
        assert_eq!(workflows[1].status(), WorkflowStatus::Running);
        assert_eq!(workflows[1].path(), "sites/S123/workflows/W2");
    }

    #[tokio::test]
    async fn list_accepts_keyed_objects() {
        let transport = ScriptedTransport::new(vec![Ok(json!({"W9": {"id": "W9", "result": "failed"}}))]);
        let collection = WorkflowCollection::new(site_owner(), transport);

        let workflows = collection.list().await.unwrap();

        assert_eq!(workflows.len(), 1);
        assert_eq!(workflows[0].status(), WorkflowStatus::Failed);
    }

    #[tokio::test]
    async fn list_rejects_scalars() {
        let transport = ScriptedTransport::new(vec![Ok(json!("nope"))]);
        let collection = WorkflowCollection::new(site_owner(), transport);

        let error = collection.list().await.unwrap_err();
        assert!(matches!(error, WorkflowError::InvalidPayload(ref message) if message.contains("a string")));
    }

    #[tokio::test]
    async fn get_with_logs_hydrates_operations() {
        let transport = ScriptedTransport::new(vec![Ok(json!({"id": "W1", "result": "succeeded", "operations": []}))]);
        let owner = OwnerContext::new().with_organization("O1", "U1");
        let collection = WorkflowCollection::from_context(&owner, transport.clone()).unwrap();

        let workflow = collection.get_with_logs("W1").await.unwrap();

        let call = &transport.calls()[0];
        assert_eq!(call.path, "users/U1/organizations/O1/workflows/W1");
        assert_eq!(call.query, vec![("hydrate".to_string(), "operations_with_logs".to_string())]);
        assert!(workflow.is_successful());
    }

    #[test]
    fn wrap_uses_the_collection_owner() {
        let collection = WorkflowCollection::new(
            WorkflowOwner::Environment {
                site_id: "S123".into(),
                environment_id: "live".into(),
            },
            ScriptedTransport::empty(),
        );

        let workflow = collection.wrap(json!({"id": "W5"})).unwrap();
        assert_eq!(workflow.path(), "sites/S123/workflows/W5");
    }

    #[test]
    fn empty_context_is_rejected() {
        let error = WorkflowCollection::from_context(&OwnerContext::new(), ScriptedTransport::empty()).err();
        assert!(matches!(error, Some(WorkflowError::MissingOwner(_))));
    }
}
