//! Shared types for the Terminus CLI.
//!
//! These are plain data: workflow snapshots as decoded from the platform API,
//! the operations recorded inside them, the owner variant that addresses a
//! workflow, and the records rendered for display. Nothing here performs I/O.

mod lenient;
pub mod operation;
pub mod owner;
pub mod workflow;

pub use lenient::value_to_text;
pub use operation::{OperationRecord, WorkflowOperation};
pub use owner::{OwnerContext, OwnerError, WorkflowOwner};
pub use workflow::{
    FinalTask, PLATFORM_USER_LABEL, SUCCEEDED_RESULT, TaskMessage, WorkflowRecord, WorkflowSnapshot, WorkflowStatus, WorkflowUser,
    format_elapsed,
};
