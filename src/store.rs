// Copyright 2025 Cowboy AI, LLC.

//! Instance store: the single source of truth for submitted requests
//!
//! The engine reads a record, mutates it and saves it back. Stores must
//! reject a save whose version no longer matches the stored one so that
//! concurrent decisions on the same request cannot silently overwrite each
//! other.

use crate::entity::{AggregateRoot, InstanceId, TemplateId, UserId};
use crate::errors::{DomainError, DomainResult};
use crate::instance::WorkflowInstance;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::cmp::Reverse;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Predicate evaluated by [`InstanceStore::query`]
pub type InstancePredicate<'a> = dyn Fn(&WorkflowInstance) -> bool + Send + Sync + 'a;

/// Durable keyed storage for requests
#[async_trait]
pub trait InstanceStore: Send + Sync {
    /// Persist a request, returning it with its new version
    async fn save(&self, instance: WorkflowInstance) -> DomainResult<WorkflowInstance>;

    /// Load a request by id
    async fn find_by_id(&self, id: InstanceId) -> DomainResult<Option<WorkflowInstance>>;

    /// Requests matching a predicate; no ordering guarantee
    async fn query(&self, predicate: &InstancePredicate<'_>) -> DomainResult<Vec<WorkflowInstance>>;

    /// Snapshot of every request
    async fn all(&self) -> DomainResult<Vec<WorkflowInstance>> {
        self.query(&|_| true).await
    }

    /// Requests submitted by a user, newest submission first
    async fn find_by_submitter(&self, user_id: UserId) -> DomainResult<Vec<WorkflowInstance>> {
        let found = self.query(&move |i| i.submitter_id == user_id).await?;
        Ok(newest_first(found))
    }

    /// Requests assigned to a user, newest submission first
    async fn find_by_assignee(&self, user_id: UserId) -> DomainResult<Vec<WorkflowInstance>> {
        let found = self.query(&move |i| i.assignee_id == Some(user_id)).await?;
        Ok(newest_first(found))
    }

    /// Requests against a template, newest submission first
    async fn find_by_template(&self, template_id: TemplateId) -> DomainResult<Vec<WorkflowInstance>> {
        let found = self.query(&move |i| i.template_id == template_id).await?;
        Ok(newest_first(found))
    }
}

/// Sort by submission time descending; ties keep their incoming order
pub fn newest_first(mut instances: Vec<WorkflowInstance>) -> Vec<WorkflowInstance> {
    instances.sort_by_key(|i| Reverse(i.submitted_at));
    instances
}

/// In-memory instance store with per-record optimistic concurrency
#[derive(Clone, Default)]
pub struct InMemoryInstanceStore {
    storage: Arc<RwLock<IndexMap<InstanceId, WorkflowInstance>>>,
}

impl InMemoryInstanceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored requests
    pub async fn len(&self) -> usize {
        self.storage.read().await.len()
    }

    /// Whether the store holds no requests
    pub async fn is_empty(&self) -> bool {
        self.storage.read().await.is_empty()
    }
}

#[async_trait]
impl InstanceStore for InMemoryInstanceStore {
    async fn save(&self, mut instance: WorkflowInstance) -> DomainResult<WorkflowInstance> {
        let mut storage = self.storage.write().await;
        if let Some(stored) = storage.get(&instance.id) {
            if stored.version() != instance.version() {
                return Err(DomainError::ConcurrencyConflict {
                    expected: instance.version(),
                    actual: stored.version(),
                });
            }
        }
        instance.increment_version();
        debug!(instance_id = %instance.id, version = instance.version, "Saved instance");
        storage.insert(instance.id, instance.clone());
        Ok(instance)
    }

    async fn find_by_id(&self, id: InstanceId) -> DomainResult<Option<WorkflowInstance>> {
        Ok(self.storage.read().await.get(&id).cloned())
    }

    async fn query(&self, predicate: &InstancePredicate<'_>) -> DomainResult<Vec<WorkflowInstance>> {
        Ok(self
            .storage
            .read()
            .await
            .values()
            .filter(|i| predicate(i))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn instance(submitter: UserId, hour: u32) -> WorkflowInstance {
        WorkflowInstance::submit(
            TemplateId::new(),
            submitter,
            format!("submitted at {hour}"),
            None,
            None,
            Utc.with_ymd_and_hms(2024, 1, 5, hour, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_save_and_load_blocking() {
        let store = InMemoryInstanceStore::new();
        let saved = tokio_test::block_on(store.save(instance(UserId::new(), 9))).unwrap();
        assert_eq!(saved.version, 1);

        let loaded = tokio_test::block_on(store.find_by_id(saved.id)).unwrap();
        assert_eq!(loaded, Some(saved));
    }

    #[tokio::test]
    async fn test_stale_save_is_rejected() {
        let store = InMemoryInstanceStore::new();
        let saved = store.save(instance(UserId::new(), 9)).await.unwrap();

        let mut first = saved.clone();
        first.remarks = Some("first".into());
        let mut second = saved;
        second.remarks = Some("second".into());

        store.save(first).await.unwrap();
        let err = store.save(second).await.unwrap_err();
        assert!(err.is_concurrency_error());

        let stored = store.all().await.unwrap();
        assert_eq!(stored[0].remarks.as_deref(), Some("first"));
        assert_eq!(stored[0].version, 2);
    }

    #[tokio::test]
    async fn test_find_by_submitter_newest_first() {
        let store = InMemoryInstanceStore::new();
        let ann = UserId::new();
        for hour in [9, 14, 11] {
            store.save(instance(ann, hour)).await.unwrap();
        }
        store.save(instance(UserId::new(), 12)).await.unwrap();

        let found = store.find_by_submitter(ann).await.unwrap();
        let descriptions: Vec<_> = found.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(
            descriptions,
            vec!["submitted at 14", "submitted at 11", "submitted at 9"]
        );
    }

    #[tokio::test]
    async fn test_find_by_assignee() {
        let store = InMemoryInstanceStore::new();
        let reviewer = UserId::new();
        let mut assigned = instance(UserId::new(), 9);
        assigned.assignee_id = Some(reviewer);
        store.save(assigned).await.unwrap();
        store.save(instance(UserId::new(), 10)).await.unwrap();

        assert_eq!(store.find_by_assignee(reviewer).await.unwrap().len(), 1);
        assert_eq!(store.len().await, 2);
    }
}
