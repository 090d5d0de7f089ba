use async_trait::async_trait;
use serde_json::Value;

use crate::ApiError;

/// Query parameter asking the server to include per-operation logs.
pub const HYDRATE_OPERATION_LOGS: (&str, &str) = ("hydrate", "operations_with_logs");

/// Authenticated read access to platform resources.
///
/// This is the seam the workflow poller re-fetches through. Implementations
/// perform exactly one GET per call and return the decoded JSON body.
#[async_trait]
pub trait ApiTransport: Send + Sync {
    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ApiError>;
}
