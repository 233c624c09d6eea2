// Copyright 2025 Cowboy AI, LLC.

//! Startup seeding
//!
//! Creates the standard identities and templates a fresh deployment needs.
//! The host calls [`seed_defaults`] once at process start; the lifecycle
//! engine never does. Seeding is idempotent: existing handles and titles are
//! left alone.

use crate::effects::{AuditIntent, AuditSink};
use crate::identity::{IdentityDirectory, InMemoryIdentityDirectory, Role, User};
use crate::template::InMemoryTemplateCatalog;
use anyhow::Context;
use chrono::Utc;
use tracing::info;

/// Audit action recorded once seeding completes
pub const ACTION_STARTUP: &str = "SYSTEM_STARTUP";

/// Handle of the template owner
const TEMPLATE_OWNER: &str = "manager";

/// `(handle, display name, role)` of the seeded identities
pub const DEFAULT_USERS: [(&str, &str, Role); 3] = [
    ("admin", "System Administrator", Role::Admin),
    ("manager", "Workflow Manager", Role::Manager),
    ("user", "Standard User", Role::User),
];

/// `(title, description)` of the seeded templates
pub const DEFAULT_TEMPLATES: [(&str, &str); 4] = [
    (
        "Project Assignment Request",
        "Request to be assigned to a new project.",
    ),
    (
        "Training Session Enrollment",
        "Request enrollment in upcoming technical training.",
    ),
    ("Leave Application", "Request for annual or sick leave."),
    (
        "Grievance Report",
        "Raise a formal complaint or issue to management.",
    ),
];

/// What a seeding run created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Identities registered by this run
    pub users_created: usize,
    /// Templates created by this run
    pub templates_created: usize,
}

/// Seed the default identities and templates, then record a startup entry
pub async fn seed_defaults(
    directory: &InMemoryIdentityDirectory,
    catalog: &InMemoryTemplateCatalog,
    audit: &dyn AuditSink,
) -> anyhow::Result<SeedSummary> {
    let mut summary = SeedSummary::default();

    for (handle, display_name, role) in DEFAULT_USERS {
        if directory.find_by_handle(handle).await?.is_none() {
            directory
                .register(User::new(handle, display_name, role))
                .await
                .with_context(|| format!("registering default user '{handle}'"))?;
            summary.users_created += 1;
        }
    }

    for (title, description) in DEFAULT_TEMPLATES {
        if catalog.find_by_title(title).await.is_none() {
            catalog
                .create(directory, title, description, TEMPLATE_OWNER)
                .await
                .with_context(|| format!("creating default template '{title}'"))?;
            info!(template = %title, "Created default template");
            summary.templates_created += 1;
        }
    }

    let admin = directory
        .resolve_handle("admin")
        .await
        .context("resolving the startup actor")?;
    audit
        .record(AuditIntent {
            action: ACTION_STARTUP.to_string(),
            actor_name: admin.display_name,
            actor_role: admin.role.to_string(),
            detail: "System initialized and ready.".to_string(),
            at: Utc::now(),
        })
        .await
        .context("recording the startup audit entry")?;

    info!(
        users_created = summary.users_created,
        templates_created = summary.templates_created,
        "Data initialization complete"
    );
    Ok(summary)
}
