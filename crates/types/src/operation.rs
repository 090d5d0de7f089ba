//! View objects over the individual steps recorded in a workflow's operation log.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::lenient;
use crate::workflow::format_elapsed;

/// One discrete step inside a workflow.
///
/// Operations are rebuilt from the parent workflow's raw `operations` array on
/// every access and are never mutated afterwards. Equality is structural.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowOperation {
    #[serde(default, deserialize_with = "lenient::optional_identifier")]
    pub id: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "lenient::optional_text")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::optional_result")]
    pub result: Option<String>,
    /// Wall-clock run time in seconds.
    #[serde(default, deserialize_with = "lenient::optional_seconds")]
    pub duration: Option<f64>,
    /// Present only when the workflow was fetched with `hydrate=operations_with_logs`.
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub log_output: Option<String>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Display record for a single operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationRecord {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub description: Option<String>,
    pub result: Option<String>,
    pub duration: Option<String>,
    pub log_output: Option<String>,
}

impl WorkflowOperation {
    /// Build an operation from one raw entry of the `operations` array.
    ///
    /// Entries that are not objects still produce an operation: the raw value
    /// is kept under `extra["value"]` so nothing reported by the server is lost.
    pub fn from_value(raw: &Value) -> Self {
        match serde_json::from_value::<WorkflowOperation>(raw.clone()) {
            Ok(operation) => operation,
            Err(_) => {
                let mut extra = IndexMap::new();
                extra.insert("value".to_string(), raw.clone());
                WorkflowOperation {
                    description: Some(lenient::value_to_text(raw)),
                    extra,
                    ..WorkflowOperation::default()
                }
            }
        }
    }

    pub fn serialize(&self) -> OperationRecord {
        OperationRecord {
            id: self.id.clone(),
            kind: self.kind.clone(),
            description: self.description.clone(),
            result: self.result.clone(),
            duration: self.duration.map(format_elapsed),
            log_output: self.log_output.clone(),
        }
    }

    /// Best label for the operation: description, then type, then id.
    pub fn label(&self) -> &str {
        self.description
            .as_deref()
            .or(self.kind.as_deref())
            .or(self.id.as_deref())
            .unwrap_or("unnamed operation")
    }
}

impl fmt::Display for WorkflowOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Operation: {}", self.label())?;
        write!(f, " {}", self.result.as_deref().unwrap_or("running"))?;
        if let Some(duration) = self.duration {
            write!(f, " in {}", format_elapsed(duration))?;
        }
        if let Some(log) = self.log_output.as_deref().filter(|log| !log.trim().is_empty()) {
            write!(f, "\n{}", log.trim_end())?;
        }
        Ok(())
    }
}
