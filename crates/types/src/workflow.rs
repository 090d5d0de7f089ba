//! Workflow snapshots and display records.
//!
//! A workflow is a server-side asynchronous task. The client only ever holds a
//! [`WorkflowSnapshot`]: the complete attribute set returned by the most recent
//! fetch. Snapshots are replaced wholesale, never patched, so a failed or
//! partial re-fetch cannot leave a half-updated view behind.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::lenient;
use crate::operation::{OperationRecord, WorkflowOperation};

/// Result marker reported by the platform for a successful workflow.
pub const SUCCEEDED_RESULT: &str = "succeeded";

/// Label shown in place of a user email for platform-initiated workflows.
pub const PLATFORM_USER_LABEL: &str = "Pantheon";

/// Derived lifecycle state of a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Running,
    Succeeded,
    Failed,
}

impl WorkflowStatus {
    /// Derive the status from a terminal-result marker.
    ///
    /// `succeeded` is the only successful marker; any other non-empty value,
    /// recognised or not, is a failure.
    pub fn from_result(result: Option<&str>) -> Self {
        match result {
            None => WorkflowStatus::Running,
            Some(SUCCEEDED_RESULT) => WorkflowStatus::Succeeded,
            Some(_) => WorkflowStatus::Failed,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, WorkflowStatus::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStatus::Running => "running",
            WorkflowStatus::Succeeded => "succeeded",
            WorkflowStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete attribute set of a workflow as last reported by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    #[serde(deserialize_with = "lenient::identifier")]
    pub id: String,
    /// Terminal marker; `None` while the workflow is still running.
    #[serde(default, deserialize_with = "lenient::optional_result")]
    pub result: Option<String>,
    /// Total run time in seconds, reported once the workflow finishes.
    #[serde(default, deserialize_with = "lenient::optional_seconds")]
    pub total_time: Option<f64>,
    /// Creation time in epoch seconds.
    #[serde(default, deserialize_with = "lenient::optional_seconds")]
    pub created_at: Option<f64>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub environment: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_object")]
    pub user: Option<WorkflowUser>,
    #[serde(default, deserialize_with = "optional_final_task")]
    pub final_task: Option<FinalTask>,
    /// Raw operation log; may be absent or not an array.
    #[serde(default)]
    pub operations: Option<Value>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl WorkflowSnapshot {
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn status(&self) -> WorkflowStatus {
        WorkflowStatus::from_result(self.result.as_deref())
    }

    pub fn is_finished(&self) -> bool {
        self.result.is_some()
    }

    pub fn is_successful(&self) -> bool {
        self.result.as_deref() == Some(SUCCEEDED_RESULT)
    }

    /// Rebuild operation views from the raw `operations` attribute.
    pub fn operations(&self) -> Vec<WorkflowOperation> {
        match &self.operations {
            Some(Value::Array(entries)) => entries.iter().map(WorkflowOperation::from_value).collect(),
            _ => Vec::new(),
        }
    }

    /// Email of the initiating user, or the platform label.
    pub fn user_label(&self) -> &str {
        self.user
            .as_ref()
            .and_then(|user| user.email.as_deref())
            .filter(|email| !email.is_empty())
            .unwrap_or(PLATFORM_USER_LABEL)
    }

    /// Elapsed seconds: `total_time` when reported, otherwise time since creation.
    ///
    /// A missing `created_at` yields zero rather than the full epoch.
    pub fn elapsed_seconds(&self, now_epoch_secs: i64) -> f64 {
        match self.total_time {
            Some(total) if total > 0.0 => total,
            _ => match self.created_at {
                Some(created) => (now_epoch_secs as f64 - created).max(0.0),
                None => 0.0,
            },
        }
    }

    /// Display record for this snapshot at the given wall-clock time.
    pub fn to_record(&self, now_epoch_secs: i64) -> WorkflowRecord {
        WorkflowRecord {
            id: self.id.clone(),
            env: self.environment.clone(),
            workflow: self.description.clone(),
            user: self.user_label().to_string(),
            status: self.status(),
            time: format_elapsed(self.elapsed_seconds(now_epoch_secs)),
            operations: self.operations().iter().map(WorkflowOperation::serialize).collect(),
        }
    }
}

/// User that initiated a workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowUser {
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Final task of a workflow, carrying failure detail when it failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalTask {
    #[serde(default, deserialize_with = "task_messages")]
    pub messages: Vec<TaskMessage>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub reason: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl FinalTask {
    /// Human-readable failure text.
    ///
    /// The first non-empty message wins; `reason` is used when no message
    /// carries any text.
    pub fn failure_message(&self) -> Option<String> {
        self.messages
            .iter()
            .map(TaskMessage::text)
            .find(|text| !text.trim().is_empty())
            .or_else(|| self.reason.clone().filter(|reason| !reason.trim().is_empty()))
    }
}

/// One message attached to a final task.
///
/// The `message` payload is usually a string but may be an arbitrary nested
/// structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskMessage {
    #[serde(default)]
    pub message: Value,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub level: Option<String>,
}

impl TaskMessage {
    pub fn text(&self) -> String {
        lenient::value_to_text(&self.message)
    }
}

/// Messages arrive as an array, as an object keyed by arbitrary labels, or as
/// a bare value. Order is preserved in every case.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawMessages {
    Keyed(IndexMap<String, Value>),
    Sequence(Vec<Value>),
    Single(Value),
}

fn task_messages<'de, D>(deserializer: D) -> Result<Vec<TaskMessage>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries: Vec<Value> = match RawMessages::deserialize(deserializer)? {
        RawMessages::Keyed(entries) => entries.into_values().collect(),
        RawMessages::Sequence(entries) => entries,
        RawMessages::Single(Value::Null | Value::Bool(false)) => Vec::new(),
        RawMessages::Single(other) => vec![other],
    };
    Ok(entries.into_iter().map(task_message_from_value).collect())
}

/// A final task normally arrives as an object. A bare list is read as its
/// messages and any other scalar as its reason, so failure detail survives
/// whatever shape the server used.
fn optional_final_task<'de, D>(deserializer: D) -> Result<Option<FinalTask>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => None,
        Value::Array(entries) if entries.is_empty() => None,
        Value::String(text) if text.trim().is_empty() => None,
        Value::Object(map) => {
            let value = Value::Object(map);
            Some(serde_json::from_value(value.clone()).unwrap_or_else(|_| FinalTask {
                reason: Some(lenient::value_to_text(&value)),
                ..FinalTask::default()
            }))
        }
        Value::Array(entries) => Some(FinalTask {
            messages: entries.into_iter().map(task_message_from_value).collect(),
            ..FinalTask::default()
        }),
        other => Some(FinalTask {
            reason: Some(lenient::value_to_text(&other)),
            ..FinalTask::default()
        }),
    })
}

fn task_message_from_value(value: Value) -> TaskMessage {
    match value {
        Value::Object(ref map) if map.contains_key("message") => {
            serde_json::from_value(value.clone()).unwrap_or(TaskMessage { message: value, level: None })
        }
        other => TaskMessage { message: other, level: None },
    }
}

/// Display record for a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowRecord {
    pub id: String,
    pub env: Option<String>,
    pub workflow: Option<String>,
    pub user: String,
    pub status: WorkflowStatus,
    pub time: String,
    pub operations: Vec<OperationRecord>,
}

/// Format a duration in seconds as `"{n}s"`, truncating fractions.
pub fn format_elapsed(seconds: f64) -> String {
    let whole = if seconds.is_finite() { seconds.trunc() as i64 } else { 0 };
    format!("{whole}s")
}
