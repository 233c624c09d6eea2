// Copyright 2025 Cowboy AI, LLC.

//! Lifecycle engine
//!
//! The engine is the only component that mutates requests. Each operation
//! resolves its references, checks policy and the transition table, saves the
//! request through the [`InstanceStore`] and then dispatches its
//! [`SideEffect`]s through the [`EffectDispatcher`] itself. Callers get the
//! saved request back, not the intents. All checks run before the save, so a
//! failed call leaves the stored request untouched.
//!
//! The engine holds no request state of its own. Concurrent writes to the
//! same request are detected by the store's version check and surface as
//! [`DomainError::ConcurrencyConflict`].

use crate::analytics::{AnalyticsEngine, AnalyticsReport, InstanceFacts};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::effects::{AuditIntent, EffectDispatcher, NotificationIntent, SideEffect};
use crate::entity::{InstanceId, TemplateId, UserId};
use crate::errors::{DomainError, DomainResult};
use crate::identity::{IdentityDirectory, User};
use crate::instance::{AttachmentIndex, InstanceView, Priority, WorkflowInstance};
use crate::query::InstanceFilter;
use crate::state_machine::{InstanceStatus, TransitionTable};
use crate::store::InstanceStore;
use crate::template::{TemplateCatalog, WorkflowTemplate};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Audit action recorded on submission
pub const ACTION_SUBMIT: &str = "SUBMIT_WORKFLOW";
/// Audit action recorded on a status change
pub const ACTION_UPDATE_STATUS: &str = "UPDATE_STATUS";
/// Audit action recorded on assignment
pub const ACTION_ASSIGN: &str = "ASSIGN_TASK";

/// Drives requests through their lifecycle
#[derive(Clone)]
pub struct LifecycleEngine {
    directory: Arc<dyn IdentityDirectory>,
    catalog: Arc<dyn TemplateCatalog>,
    store: Arc<dyn InstanceStore>,
    attachments: Arc<dyn AttachmentIndex>,
    effects: EffectDispatcher,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    transitions: TransitionTable,
    analytics: AnalyticsEngine,
}

impl LifecycleEngine {
    /// Create an engine with the system clock and default configuration
    pub fn new(
        directory: Arc<dyn IdentityDirectory>,
        catalog: Arc<dyn TemplateCatalog>,
        store: Arc<dyn InstanceStore>,
        attachments: Arc<dyn AttachmentIndex>,
        effects: EffectDispatcher,
    ) -> Self {
        let config = EngineConfig::default();
        Self {
            directory,
            catalog,
            store,
            attachments,
            effects,
            clock: Arc::new(SystemClock),
            transitions: config.transition_table(),
            analytics: AnalyticsEngine::new(config.analytics.clone()),
            config,
        }
    }

    /// Use a different time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Apply a configuration; the transition table and analytics thresholds
    /// are rebuilt from it
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.transitions = config.transition_table();
        self.analytics = AnalyticsEngine::new(config.analytics.clone());
        self.config = config;
        self
    }

    /// Replace the transition table derived from the configuration
    pub fn with_transitions(mut self, transitions: TransitionTable) -> Self {
        self.transitions = transitions;
        self
    }

    /// Configuration in force
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Transition table in force
    pub fn transitions(&self) -> &TransitionTable {
        &self.transitions
    }

    /// Submit a new request against a template
    ///
    /// The request starts PENDING with no `updated_at`. Only an audit entry is
    /// produced; nobody is notified of a submission.
    pub async fn submit(
        &self,
        template_id: TemplateId,
        submitter_handle: &str,
        description: impl Into<String>,
        priority: Option<Priority>,
        due_date: Option<DateTime<Utc>>,
    ) -> DomainResult<WorkflowInstance> {
        let submitter = self.directory.resolve_handle(submitter_handle).await?;
        let template = self.catalog.resolve(template_id).await?;

        let now = self.clock.now();
        let instance = WorkflowInstance::submit(
            template.id,
            submitter.id,
            description,
            priority,
            due_date,
            now,
        );
        let saved = self.store.save(instance).await?;

        info!(
            instance_id = %saved.id,
            template = %template.title,
            actor = %submitter.handle,
            "Request submitted"
        );

        self.effects
            .dispatch(&[audit(
                ACTION_SUBMIT,
                &submitter,
                now,
                format!(
                    "Submitted request for workflow: {} (Instance ID: {})",
                    template.title, saved.id
                ),
            )])
            .await;

        Ok(saved)
    }

    /// Decide a request
    ///
    /// Fails with NotFound for an unknown request or actor, Forbidden when
    /// the actor's role may not decide this submitter's requests, and
    /// InvalidStateTransition when the transition table denies the move.
    /// On success the submitter is notified whatever the new status.
    pub async fn update_status(
        &self,
        instance_id: InstanceId,
        new_status: InstanceStatus,
        remarks: impl Into<String>,
        actor_handle: &str,
    ) -> DomainResult<WorkflowInstance> {
        let mut instance = self.load(instance_id).await?;
        let actor = self.directory.resolve_handle(actor_handle).await?;
        let submitter = self.directory.resolve_id(instance.submitter_id).await?;

        if let Err(e) = self.config.policy.authorize_status_update(&actor, &submitter) {
            warn!(
                instance_id = %instance_id,
                actor = %actor.handle,
                role = %actor.role,
                "Status update denied"
            );
            return Err(e);
        }
        self.transitions.check(instance.status, new_status)?;
        let template = self.catalog.resolve(instance.template_id).await?;

        let remarks = remarks.into();
        let previous = instance.status;
        instance.status = new_status;
        instance.remarks = Some(remarks.clone());
        let now = self.clock.now();
        instance.touch(now);
        let saved = self.store.save(instance).await?;

        info!(
            instance_id = %saved.id,
            from = %previous,
            to = %new_status,
            actor = %actor.handle,
            "Request status updated"
        );

        self.effects
            .dispatch(&[
                audit(
                    ACTION_UPDATE_STATUS,
                    &actor,
                    now,
                    format!(
                        "Updated status of Instance ID {} to {}. Remarks: {}",
                        saved.id, new_status, remarks
                    ),
                ),
                SideEffect::Notify(NotificationIntent {
                    recipient: saved.submitter_id,
                    message: format!("Update on '{}': {}", template.title, remarks),
                    at: now,
                }),
            ])
            .await;

        Ok(saved)
    }

    /// [`LifecycleEngine::update_status`] with the status given as text
    ///
    /// An unrecognised status fails with InvalidArgument before anything is
    /// looked up.
    pub async fn update_status_str(
        &self,
        instance_id: InstanceId,
        new_status: &str,
        remarks: impl Into<String>,
        actor_handle: &str,
    ) -> DomainResult<WorkflowInstance> {
        let status: InstanceStatus = new_status.parse()?;
        self.update_status(instance_id, status, remarks, actor_handle)
            .await
    }

    /// Make `assignee_handle` responsible for a request
    ///
    /// USER actors are refused. There is no check that the assignee is
    /// qualified for the template.
    pub async fn assign_task(
        &self,
        instance_id: InstanceId,
        assignee_handle: &str,
        actor_handle: &str,
    ) -> DomainResult<WorkflowInstance> {
        let mut instance = self.load(instance_id).await?;
        let actor = self.directory.resolve_handle(actor_handle).await?;

        if let Err(e) = self.config.policy.authorize_assignment(&actor) {
            warn!(
                instance_id = %instance_id,
                actor = %actor.handle,
                role = %actor.role,
                "Assignment denied"
            );
            return Err(e);
        }

        let assignee = self.directory.resolve_handle(assignee_handle).await?;
        let template = self.catalog.resolve(instance.template_id).await?;

        instance.assignee_id = Some(assignee.id);
        let now = self.clock.now();
        instance.touch(now);
        let saved = self.store.save(instance).await?;

        info!(
            instance_id = %saved.id,
            assignee = %assignee.handle,
            actor = %actor.handle,
            "Request assigned"
        );

        self.effects
            .dispatch(&[
                audit(
                    ACTION_ASSIGN,
                    &actor,
                    now,
                    format!(
                        "Assigned Instance ID {} to {}",
                        saved.id, assignee.display_name
                    ),
                ),
                SideEffect::Notify(NotificationIntent {
                    recipient: assignee.id,
                    message: format!(
                        "You have been assigned the task '{}' by {}.",
                        template.title, actor.display_name
                    ),
                    at: now,
                }),
            ])
            .await;

        Ok(saved)
    }

    /// Change the due date and/or priority of a request
    ///
    /// `None` leaves a field unchanged. No role check is made and
    /// `updated_at` is not refreshed.
    pub async fn update_task_details(
        &self,
        instance_id: InstanceId,
        due_date: Option<DateTime<Utc>>,
        priority: Option<Priority>,
        actor_handle: &str,
    ) -> DomainResult<WorkflowInstance> {
        let mut instance = self.load(instance_id).await?;

        if let Some(due_date) = due_date {
            instance.due_date = Some(due_date);
        }
        if let Some(priority) = priority {
            instance.priority = Some(priority);
        }
        let saved = self.store.save(instance).await?;

        info!(
            instance_id = %saved.id,
            actor = %actor_handle,
            "Request details updated"
        );
        Ok(saved)
    }

    /// Requests assigned to a user, newest submission first
    pub async fn list_assigned_to(&self, user_handle: &str) -> DomainResult<Vec<InstanceView>> {
        let user = self.directory.resolve_handle(user_handle).await?;
        let instances = self.store.find_by_assignee(user.id).await?;
        debug!(user = %user.handle, count = instances.len(), "Listed assigned requests");
        self.views(instances).await
    }

    /// Requests submitted by a user, newest submission first
    pub async fn list_submitted_by(&self, user_handle: &str) -> DomainResult<Vec<InstanceView>> {
        let user = self.directory.resolve_handle(user_handle).await?;
        let instances = self.store.find_by_submitter(user.id).await?;
        debug!(user = %user.handle, count = instances.len(), "Listed submitted requests");
        self.views(instances).await
    }

    /// Requests submitted against a template, newest submission first
    pub async fn list_for_template(&self, template_id: TemplateId) -> DomainResult<Vec<InstanceView>> {
        let template = self.catalog.resolve(template_id).await?;
        let instances = self.store.find_by_template(template.id).await?;
        debug!(template = %template.title, count = instances.len(), "Listed template requests");
        self.views(instances).await
    }

    /// Every request matching `filter`
    ///
    /// Results keep store order. Nothing matching yields an empty list.
    pub async fn query_all(&self, filter: &InstanceFilter) -> DomainResult<Vec<InstanceView>> {
        let candidates = self
            .store
            .query(&|instance: &WorkflowInstance| filter.matches_record(instance))
            .await?;

        let mut names = NameCache::default();
        let mut views = Vec::with_capacity(candidates.len());
        for instance in candidates {
            let view = self.view_with(instance, &mut names).await?;
            if filter.matches_resolved(&view.instance, &view.applicant_name, &view.template_title) {
                views.push(view);
            }
        }

        debug!(filter = ?filter, count = views.len(), "Queried requests");
        Ok(views)
    }

    /// Recompute analytics over the current snapshot
    pub async fn get_analytics(&self) -> DomainResult<AnalyticsReport> {
        let snapshot = self.store.all().await?;
        let mut names = NameCache::default();
        let mut facts = Vec::with_capacity(snapshot.len());
        for instance in &snapshot {
            let template = names.template(self.catalog.as_ref(), instance.template_id).await?;
            facts.push(InstanceFacts::from_instance(instance, template.title.clone()));
        }

        let report = self.analytics.compute(&facts, self.clock.now());
        debug!(
            total = report.summary.total_workflows,
            pending = report.summary.total_pending,
            "Computed analytics"
        );
        Ok(report)
    }

    /// A single request with names resolved and attachments merged
    pub async fn describe(&self, instance_id: InstanceId) -> DomainResult<InstanceView> {
        let instance = self.load(instance_id).await?;
        self.view_with(instance, &mut NameCache::default()).await
    }

    async fn load(&self, instance_id: InstanceId) -> DomainResult<WorkflowInstance> {
        self.store
            .find_by_id(instance_id)
            .await?
            .ok_or_else(|| DomainError::not_found("WorkflowInstance", instance_id))
    }

    async fn views(&self, instances: Vec<WorkflowInstance>) -> DomainResult<Vec<InstanceView>> {
        let mut names = NameCache::default();
        let mut views = Vec::with_capacity(instances.len());
        for instance in instances {
            views.push(self.view_with(instance, &mut names).await?);
        }
        Ok(views)
    }

    async fn view_with(
        &self,
        instance: WorkflowInstance,
        names: &mut NameCache,
    ) -> DomainResult<InstanceView> {
        let template = names.template(self.catalog.as_ref(), instance.template_id).await?;
        let template_title = template.title.clone();
        let current_step_name = instance
            .current_step
            .and_then(|step| template.step(step))
            .map(|step| step.name.clone());

        let applicant_name = names
            .user(self.directory.as_ref(), instance.submitter_id)
            .await?
            .display_name
            .clone();
        let assignee_name = match instance.assignee_id {
            Some(id) => Some(names.user(self.directory.as_ref(), id).await?.display_name.clone()),
            None => None,
        };
        let attachments = self.attachments.list_for_instance(instance.id).await?;

        Ok(InstanceView {
            instance,
            template_title,
            applicant_name,
            assignee_name,
            current_step_name,
            attachments,
        })
    }
}

fn audit(action: &str, actor: &User, at: DateTime<Utc>, detail: String) -> SideEffect {
    SideEffect::Audit(AuditIntent {
        action: action.to_string(),
        actor_name: actor.display_name.clone(),
        actor_role: actor.role.to_string(),
        detail,
        at,
    })
}

/// Per-call memo of resolved users and templates
#[derive(Default)]
struct NameCache {
    users: HashMap<UserId, User>,
    templates: HashMap<TemplateId, WorkflowTemplate>,
}

impl NameCache {
    async fn user(&mut self, directory: &dyn IdentityDirectory, id: UserId) -> DomainResult<&User> {
        if !self.users.contains_key(&id) {
            let user = directory.resolve_id(id).await?;
            self.users.insert(id, user);
        }
        self.users
            .get(&id)
            .ok_or_else(|| DomainError::not_found("User", id))
    }

    async fn template(
        &mut self,
        catalog: &dyn TemplateCatalog,
        id: TemplateId,
    ) -> DomainResult<&WorkflowTemplate> {
        if !self.templates.contains_key(&id) {
            let template = catalog.resolve(id).await?;
            self.templates.insert(id, template);
        }
        self.templates
            .get(&id)
            .ok_or_else(|| DomainError::not_found("WorkflowTemplate", id))
    }
}
