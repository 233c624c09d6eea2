// Copyright 2025 Cowboy AI, LLC.

//! Submitted requests and their externally visible representation

use crate::entity::{AggregateRoot, AttachmentId, InstanceId, StepId, TemplateId, UserId};
use crate::errors::DomainResult;
use crate::state_machine::InstanceStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Urgency hint chosen by the submitter or a reviewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Can wait
    Low,
    /// Normal handling
    Medium,
    /// Should be handled soon
    High,
    /// Needs immediate attention
    Urgent,
}

/// One submitted, tracked request against a template
///
/// `submitted_at` is set once by [`WorkflowInstance::submit`]. `updated_at`
/// stays `None` until the first status change or assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowInstance {
    /// Request identifier
    pub id: InstanceId,
    /// Template this request was submitted against
    pub template_id: TemplateId,
    /// The submitting user; never changes
    pub submitter_id: UserId,
    /// Current status
    pub status: InstanceStatus,
    /// Reviewer remarks from the latest decision
    pub remarks: Option<String>,
    /// Submitter's free-text description
    pub description: String,
    /// When the request was submitted
    pub submitted_at: DateTime<Utc>,
    /// When the request was last decided or assigned
    pub updated_at: Option<DateTime<Utc>>,
    /// User currently responsible for the request
    pub assignee_id: Option<UserId>,
    /// Optional urgency
    pub priority: Option<Priority>,
    /// Optional due date
    pub due_date: Option<DateTime<Utc>>,
    /// Current template step; informational only
    pub current_step: Option<StepId>,
    /// Store version for optimistic concurrency
    #[serde(default)]
    pub version: u64,
}

impl WorkflowInstance {
    /// Create a new PENDING request
    pub fn submit(
        template_id: TemplateId,
        submitter_id: UserId,
        description: impl Into<String>,
        priority: Option<Priority>,
        due_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: InstanceId::new(),
            template_id,
            submitter_id,
            status: InstanceStatus::Pending,
            remarks: None,
            description: description.into(),
            submitted_at: now,
            updated_at: None,
            assignee_id: None,
            priority,
            due_date,
            current_step: None,
            version: 0,
        }
    }

    /// Refresh `updated_at`, never moving it backwards
    pub fn touch(&mut self, now: DateTime<Utc>) {
        let floor = self.updated_at.unwrap_or(self.submitted_at);
        self.updated_at = Some(now.max(floor));
    }

    /// Elapsed time between submission and the last update, if any
    pub fn turnaround(&self) -> Option<chrono::Duration> {
        self.updated_at.map(|updated| updated - self.submitted_at)
    }
}

impl AggregateRoot for WorkflowInstance {
    type Id = InstanceId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn increment_version(&mut self) {
        self.version += 1;
    }
}

/// Summary of a file attached to a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentSummary {
    /// Attachment identifier
    pub id: AttachmentId,
    /// Original file name
    pub file_name: String,
    /// MIME type
    pub file_type: String,
    /// Size in bytes
    pub file_size: u64,
    /// Display name of the uploader
    pub uploaded_by: String,
    /// Upload time
    pub uploaded_at: DateTime<Utc>,
}

/// Lists attachments for a request; read-only from the engine's standpoint
#[async_trait]
pub trait AttachmentIndex: Send + Sync {
    /// Attachments of one request, in upload order
    async fn list_for_instance(&self, instance_id: InstanceId) -> DomainResult<Vec<AttachmentSummary>>;
}

/// In-memory attachment index
#[derive(Clone, Default)]
pub struct InMemoryAttachmentIndex {
    attachments: Arc<RwLock<HashMap<InstanceId, Vec<AttachmentSummary>>>>,
}

impl InMemoryAttachmentIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an uploaded file against a request
    pub async fn attach(&self, instance_id: InstanceId, summary: AttachmentSummary) {
        self.attachments
            .write()
            .await
            .entry(instance_id)
            .or_default()
            .push(summary);
    }
}

#[async_trait]
impl AttachmentIndex for InMemoryAttachmentIndex {
    async fn list_for_instance(&self, instance_id: InstanceId) -> DomainResult<Vec<AttachmentSummary>> {
        Ok(self
            .attachments
            .read()
            .await
            .get(&instance_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// A request as shown to callers, with names resolved and attachments merged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceView {
    /// The request itself
    #[serde(flatten)]
    pub instance: WorkflowInstance,
    /// Title of the template
    pub template_title: String,
    /// Display name of the submitter
    pub applicant_name: String,
    /// Display name of the assignee
    pub assignee_name: Option<String>,
    /// Name of the current step
    pub current_step_name: Option<String>,
    /// Attached files
    pub attachments: Vec<AttachmentSummary>,
}
