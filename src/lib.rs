// Copyright 2025 Cowboy AI, LLC.

//! # CIM Approval Workflow
//!
//! Lifecycle and analytics core for approval-style business requests.
//!
//! A user submits a request against a named template. Reviewers move it
//! between statuses under role-gated control, and administrators read
//! throughput and bottleneck metrics over every request.
//!
//! - **Lifecycle Engine**: submit, decide, assign and edit requests
//! - **Transition Table**: the explicit `(current, target)` status policy
//! - **Access Policy**: which roles may decide or assign which requests
//! - **Query Builder**: optional status, owner, day and text filters
//! - **Analytics**: summary, per-template performance, status distribution
//!   and daily trend
//!
//! Identity, templates, storage, attachments, audit and notifications are
//! collaborators behind async traits, each with an in-memory implementation.
//!
//! ```no_run
//! use cim_approval_workflow::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let directory = InMemoryIdentityDirectory::new();
//! let catalog = InMemoryTemplateCatalog::new();
//! let audit = Arc::new(AuditTrail::new());
//! let notifications = Arc::new(NotificationCenter::new());
//! seed_defaults(&directory, &catalog, audit.as_ref()).await?;
//!
//! let leave = catalog
//!     .find_by_title("Leave Application")
//!     .await
//!     .ok_or_else(|| anyhow::anyhow!("missing template"))?;
//!
//! let engine = LifecycleEngine::new(
//!     Arc::new(directory),
//!     Arc::new(catalog),
//!     Arc::new(InMemoryInstanceStore::new()),
//!     Arc::new(InMemoryAttachmentIndex::new()),
//!     EffectDispatcher::new(audit, notifications),
//! );
//!
//! let request = engine
//!     .submit(leave.id, "user", "Two days in March", Some(Priority::Low), None)
//!     .await?;
//! engine
//!     .update_status(request.id, InstanceStatus::Approved, "Enjoy", "manager")
//!     .await?;
//! let report = engine.get_analytics().await?;
//! assert_eq!(report.summary.total_workflows, 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod analytics;
mod bootstrap;
mod clock;
mod config;
mod effects;
mod engine;
mod entity;
mod errors;
mod identity;
mod instance;
mod policy;
mod query;
mod state_machine;
mod store;
mod template;

// Re-export core types
pub use analytics::{
    AnalyticsEngine, AnalyticsReport, BottleneckRisk, DailyTrend, InstanceFacts, SummaryStats,
    TemplatePerformance,
};
pub use bootstrap::{seed_defaults, SeedSummary, ACTION_STARTUP, DEFAULT_TEMPLATES, DEFAULT_USERS};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AnalyticsConfig, EngineConfig, MAX_TREND_WINDOW_DAYS};
pub use effects::{
    AuditEntry, AuditIntent, AuditSink, AuditTrail, EffectDispatcher, Notification,
    NotificationCenter, NotificationIntent, NotificationSink, SideEffect,
};
pub use engine::{LifecycleEngine, ACTION_ASSIGN, ACTION_SUBMIT, ACTION_UPDATE_STATUS};
pub use entity::{
    AggregateRoot, AttachmentId, AttachmentMarker, EntityId, InstanceId, InstanceMarker,
    NotificationId, NotificationMarker, StepId, StepMarker, TemplateId, TemplateMarker, UserId,
    UserMarker,
};
pub use errors::{DomainError, DomainResult};
pub use identity::{IdentityDirectory, InMemoryIdentityDirectory, Role, User};
pub use instance::{
    AttachmentIndex, AttachmentSummary, InMemoryAttachmentIndex, InstanceView, Priority,
    WorkflowInstance,
};
pub use policy::AccessPolicy;
pub use query::{InstanceFilter, QueryBuilder};
pub use state_machine::{InstanceStatus, State, TransitionTable};
pub use store::{newest_first, InMemoryInstanceStore, InstancePredicate, InstanceStore};
pub use template::{InMemoryTemplateCatalog, TemplateCatalog, WorkflowStep, WorkflowTemplate};
