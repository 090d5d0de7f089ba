//! Ownership and addressing of workflows.
//!
//! Every workflow is reached through exactly one parent entity. The owner is
//! resolved once, when the workflow handle is built, and determines the
//! resource path used for every subsequent poll.

use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Characters escaped when an identifier is placed in a path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn segment(identifier: &str) -> String {
    utf8_percent_encode(identifier, PATH_SEGMENT).to_string()
}

/// The parent entity through which a workflow's status resource is addressed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkflowOwner {
    /// Environment workflows are addressed through their site.
    Environment { site_id: String, environment_id: String },
    /// Organization workflows are addressed through the signed-in user.
    Organization { organization_id: String, current_user_id: String },
    Site { site_id: String },
    User { user_id: String },
}

impl WorkflowOwner {
    /// Listing endpoint for workflows belonging to this owner.
    pub fn collection_path(&self) -> String {
        match self {
            WorkflowOwner::Environment { site_id, .. } | WorkflowOwner::Site { site_id } => {
                format!("sites/{}/workflows", segment(site_id))
            }
            WorkflowOwner::Organization {
                organization_id,
                current_user_id,
            } => format!(
                "users/{}/organizations/{}/workflows",
                segment(current_user_id),
                segment(organization_id)
            ),
            WorkflowOwner::User { user_id } => format!("users/{}/workflows", segment(user_id)),
        }
    }

    /// Canonical poll path for one workflow of this owner.
    pub fn workflow_path(&self, workflow_id: &str) -> String {
        format!("{}/{}", self.collection_path(), segment(workflow_id))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowOwner::Environment { .. } => "environment",
            WorkflowOwner::Organization { .. } => "organization",
            WorkflowOwner::Site { .. } => "site",
            WorkflowOwner::User { .. } => "user",
        }
    }
}

impl fmt::Display for WorkflowOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowOwner::Environment { site_id, environment_id } => write!(f, "{site_id}.{environment_id}"),
            WorkflowOwner::Organization { organization_id, .. } => write!(f, "organization {organization_id}"),
            WorkflowOwner::Site { site_id } => write!(f, "site {site_id}"),
            WorkflowOwner::User { user_id } => write!(f, "user {user_id}"),
        }
    }
}

/// Raised when a workflow handle is built without any owner.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OwnerError {
    #[error("workflow owner context is empty; supply an environment, organization, site, or user")]
    Missing,
}

/// Construction-time bundle naming the entity that owns a workflow.
///
/// Callers normally supply exactly one entry. When several are present the
/// first in the order collection, environment, organization, site, user wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerContext {
    collection: Option<WorkflowOwner>,
    environment: Option<(String, String)>,
    organization: Option<(String, String)>,
    site: Option<String>,
    user: Option<String>,
}

impl OwnerContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Owner configured on the collection the workflow was loaded through.
    pub fn with_collection(mut self, owner: WorkflowOwner) -> Self {
        self.collection = Some(owner);
        self
    }

    pub fn with_environment(mut self, site_id: impl Into<String>, environment_id: impl Into<String>) -> Self {
        self.environment = Some((site_id.into(), environment_id.into()));
        self
    }

    /// The current user's id is needed to address organization workflows.
    pub fn with_organization(mut self, organization_id: impl Into<String>, current_user_id: impl Into<String>) -> Self {
        self.organization = Some((organization_id.into(), current_user_id.into()));
        self
    }

    pub fn with_site(mut self, site_id: impl Into<String>) -> Self {
        self.site = Some(site_id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user = Some(user_id.into());
        self
    }

    pub fn resolve(&self) -> Result<WorkflowOwner, OwnerError> {
        if let Some(owner) = &self.collection {
            return Ok(owner.clone());
        }
        if let Some((site_id, environment_id)) = &self.environment {
            return Ok(WorkflowOwner::Environment {
                site_id: site_id.clone(),
                environment_id: environment_id.clone(),
            });
        }
        if let Some((organization_id, current_user_id)) = &self.organization {
            return Ok(WorkflowOwner::Organization {
                organization_id: organization_id.clone(),
                current_user_id: current_user_id.clone(),
            });
        }
        if let Some(site_id) = &self.site {
            return Ok(WorkflowOwner::Site { site_id: site_id.clone() });
        }
        if let Some(user_id) = &self.user {
            return Ok(WorkflowOwner::User { user_id: user_id.clone() });
        }
        Err(OwnerError::Missing)
    }
}

impl From<WorkflowOwner> for OwnerContext {
    fn from(owner: WorkflowOwner) -> Self {
        OwnerContext::new().with_collection(owner)
    }
}
