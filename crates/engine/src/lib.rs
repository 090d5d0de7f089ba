//! # Terminus Engine
//!
//! Tracks long-running platform workflows. A [`Workflow`] wraps the latest
//! server snapshot of one workflow, re-fetches it through an
//! [`ApiTransport`](terminus_api::ApiTransport), and can block until the
//! workflow reaches a terminal state.
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use terminus_api::TerminusClient;
//! use terminus_engine::{Workflow, WorkflowError};
//! use terminus_types::OwnerContext;
//!
//! async fn deploy_and_wait(client: Arc<TerminusClient>, attributes: serde_json::Value) -> Result<(), WorkflowError> {
//!     let owner = OwnerContext::new().with_environment("S123", "live");
//!     let mut workflow = Workflow::new(attributes, &owner, client)?;
//!     workflow.wait().await?;
//!     println!("{}", serde_json::to_string_pretty(&workflow.serialize()).unwrap());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **`workflow`**: the workflow handle, re-fetching, and the wait loop
//! - **`collection`**: listing and looking up workflows under one owner
//! - **`error`**: the failure taxonomy surfaced to callers

pub mod collection;
pub mod error;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_support;

pub use collection::WorkflowCollection;
pub use error::WorkflowError;
pub use workflow::{
    Workflow,
    progress::{ProgressSink, SilentProgress, WriterProgress},
    wait::WaitOptions,
};
