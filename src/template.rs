// Copyright 2025 Cowboy AI, LLC.

//! Workflow templates: named, reusable request types
//!
//! Templates are authored once per deployment. Steps are carried as data only;
//! no transition logic routes an instance between steps.

use crate::entity::{StepId, TemplateId, UserId};
use crate::errors::{DomainError, DomainResult};
use crate::identity::{IdentityDirectory, Role};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A named request type, e.g. "Leave Application"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    /// Template identifier
    pub id: TemplateId,
    /// Title shown to submitters and used to group analytics
    pub title: String,
    /// Free-text description
    pub description: String,
    /// The user who created the template
    pub created_by: UserId,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Ordered review steps
    pub steps: Vec<WorkflowStep>,
}

impl WorkflowTemplate {
    /// Find a step by id
    pub fn step(&self, id: StepId) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.id == id)
    }
}

/// One review step of a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Step identifier
    pub id: StepId,
    /// Position within the template, starting at 1
    pub order: u32,
    /// Step name
    pub name: String,
    /// Role expected to act on this step
    pub required_role: Role,
}

/// Read access to templates
#[async_trait]
pub trait TemplateCatalog: Send + Sync {
    /// Look a template up by id
    async fn find_by_id(&self, id: TemplateId) -> DomainResult<Option<WorkflowTemplate>>;

    /// Every template
    async fn all(&self) -> DomainResult<Vec<WorkflowTemplate>>;

    /// Resolve a template or fail with NotFound
    async fn resolve(&self, id: TemplateId) -> DomainResult<WorkflowTemplate> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("WorkflowTemplate", id))
    }
}

/// In-memory template catalog, insertion ordered
#[derive(Clone, Default)]
pub struct InMemoryTemplateCatalog {
    templates: Arc<RwLock<Vec<WorkflowTemplate>>>,
}

impl InMemoryTemplateCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a template owned by `creator_handle`
    pub async fn create(
        &self,
        directory: &dyn IdentityDirectory,
        title: impl Into<String>,
        description: impl Into<String>,
        creator_handle: &str,
    ) -> DomainResult<WorkflowTemplate> {
        let creator = directory.resolve_handle(creator_handle).await?;
        let template = WorkflowTemplate {
            id: TemplateId::new(),
            title: title.into(),
            description: description.into(),
            created_by: creator.id,
            created_at: Utc::now(),
            steps: Vec::new(),
        };
        self.insert(template.clone()).await;
        Ok(template)
    }

    /// Append a step to an existing template
    pub async fn add_step(
        &self,
        template_id: TemplateId,
        name: impl Into<String>,
        required_role: Role,
    ) -> DomainResult<WorkflowStep> {
        let mut templates = self.templates.write().await;
        let template = templates
            .iter_mut()
            .find(|t| t.id == template_id)
            .ok_or_else(|| DomainError::not_found("WorkflowTemplate", template_id))?;
        let step = WorkflowStep {
            id: StepId::new(),
            order: template.steps.len() as u32 + 1,
            name: name.into(),
            required_role,
        };
        template.steps.push(step.clone());
        Ok(step)
    }

    /// Insert a fully formed template
    pub async fn insert(&self, template: WorkflowTemplate) {
        self.templates.write().await.push(template);
    }

    /// Find a template by exact title
    pub async fn find_by_title(&self, title: &str) -> Option<WorkflowTemplate> {
        self.templates
            .read()
            .await
            .iter()
            .find(|t| t.title == title)
            .cloned()
    }
}

#[async_trait]
impl TemplateCatalog for InMemoryTemplateCatalog {
    async fn find_by_id(&self, id: TemplateId) -> DomainResult<Option<WorkflowTemplate>> {
        Ok(self
            .templates
            .read()
            .await
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn all(&self) -> DomainResult<Vec<WorkflowTemplate>> {
        Ok(self.templates.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{InMemoryIdentityDirectory, User};

    #[tokio::test]
    async fn test_create_requires_known_creator() {
        let directory = InMemoryIdentityDirectory::new();
        let catalog = InMemoryTemplateCatalog::new();

        let err = catalog
            .create(&directory, "Leave Application", "Annual or sick leave", "nobody")
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let manager = directory
            .register(User::new("manager", "Workflow Manager", Role::Manager))
            .await
            .unwrap();
        let template = catalog
            .create(&directory, "Leave Application", "Annual or sick leave", "manager")
            .await
            .unwrap();
        assert_eq!(template.created_by, manager.id);
        assert_eq!(catalog.resolve(template.id).await.unwrap().title, "Leave Application");
    }

    #[tokio::test]
    async fn test_steps_are_numbered_in_order() {
        let directory = InMemoryIdentityDirectory::new();
        directory
            .register(User::new("admin", "Admin", Role::Admin))
            .await
            .unwrap();
        let catalog = InMemoryTemplateCatalog::new();
        let template = catalog
            .create(&directory, "Grievance Report", "Formal complaint", "admin")
            .await
            .unwrap();

        let first = catalog
            .add_step(template.id, "Manager review", Role::Manager)
            .await
            .unwrap();
        let second = catalog
            .add_step(template.id, "Admin sign-off", Role::Admin)
            .await
            .unwrap();
        assert_eq!(first.order, 1);
        assert_eq!(second.order, 2);

        let stored = catalog.resolve(template.id).await.unwrap();
        assert_eq!(stored.step(second.id).map(|s| s.name.as_str()), Some("Admin sign-off"));
    }
}
