use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use terminus_api::{ApiError, ApiTransport};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub path: String,
    pub query: Vec<(String, String)>,
}

/// Transport that replays canned responses in order and records each call.
///
/// Once the script runs out, the last successful payload is repeated.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<Value, ApiError>>>,
    last_payload: Mutex<Option<Value>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<Result<Value, ApiError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        })
    }

    pub fn empty() -> Arc<Self> {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ApiTransport for ScriptedTransport {
    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push(RecordedCall {
            path: path.to_string(),
            query: query.iter().map(|(key, value)| (key.to_string(), value.to_string())).collect(),
        });

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(payload)) => {
                *self.last_payload.lock().unwrap() = Some(payload.clone());
                Ok(payload)
            }
            Some(Err(error)) => Err(error),
            None => self.last_payload.lock().unwrap().clone().ok_or(ApiError::Status {
                status: 404,
                message: "no scripted response".into(),
            }),
        }
    }
}

pub fn unavailable() -> ApiError {
    ApiError::Status {
        status: 503,
        message: "Service Unavailable".into(),
    }
}
