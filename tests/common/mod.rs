//! Shared fixtures for integration tests.
//! Every harness starts from the seeded defaults plus a few named users.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use cim_approval_workflow::*;
use std::sync::Arc;

/// Extra USER-role identities registered on top of the seeded ones.
pub const EXTRA_USERS: [(&str, &str); 3] = [
    ("ann", "Ann Smith"),
    ("bob", "Bob Jones"),
    ("joanna", "Joanna Reyes"),
];

/// Everything a test needs to drive and observe the engine.
pub struct Harness {
    pub engine: LifecycleEngine,
    pub directory: InMemoryIdentityDirectory,
    pub catalog: InMemoryTemplateCatalog,
    pub store: InMemoryInstanceStore,
    pub attachments: InMemoryAttachmentIndex,
    pub audit: Arc<AuditTrail>,
    pub notifications: Arc<NotificationCenter>,
    pub clock: FixedClock,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_config(EngineConfig::default()).await
    }

    pub async fn with_config(config: EngineConfig) -> Self {
        init_tracing();

        let directory = InMemoryIdentityDirectory::new();
        let catalog = InMemoryTemplateCatalog::new();
        let store = InMemoryInstanceStore::new();
        let attachments = InMemoryAttachmentIndex::new();
        let audit = Arc::new(AuditTrail::new());
        let notifications = Arc::new(NotificationCenter::new());
        let clock = FixedClock::at(jan(5, 9));

        seed_defaults(&directory, &catalog, audit.as_ref())
            .await
            .expect("seeding defaults");
        for (handle, name) in EXTRA_USERS {
            directory
                .register(User::new(handle, name, Role::User))
                .await
                .expect("registering test user");
        }

        let engine = LifecycleEngine::new(
            Arc::new(directory.clone()),
            Arc::new(catalog.clone()),
            Arc::new(store.clone()),
            Arc::new(attachments.clone()),
            EffectDispatcher::new(audit.clone(), notifications.clone()),
        )
        .with_clock(Arc::new(clock.clone()))
        .with_config(config);

        Self {
            engine,
            directory,
            catalog,
            store,
            attachments,
            audit,
            notifications,
            clock,
        }
    }

    pub async fn template(&self, title: &str) -> WorkflowTemplate {
        self.catalog
            .find_by_title(title)
            .await
            .unwrap_or_else(|| panic!("template '{title}' not seeded"))
    }

    pub async fn user(&self, handle: &str) -> User {
        self.directory.resolve_handle(handle).await.unwrap()
    }

    /// Submit against a seeded template at the current clock time.
    pub async fn submit(&self, title: &str, handle: &str, description: &str) -> WorkflowInstance {
        let template = self.template(title).await;
        self.engine
            .submit(template.id, handle, description, None, None)
            .await
            .unwrap()
    }

    /// Submit at a given time, leaving the clock there.
    pub async fn submit_at(
        &self,
        at: DateTime<Utc>,
        title: &str,
        handle: &str,
        description: &str,
    ) -> WorkflowInstance {
        self.clock.set(at);
        self.submit(title, handle, description).await
    }

    pub async fn stored(&self, id: InstanceId) -> WorkflowInstance {
        self.store.find_by_id(id).await.unwrap().unwrap()
    }
}

/// A time on a January 2024 day, UTC.
pub fn jan(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
