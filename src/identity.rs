// Copyright 2025 Cowboy AI, LLC.

//! Identity directory: resolves caller handles to roles and display names
//!
//! The directory is an external collaborator. [`InMemoryIdentityDirectory`]
//! is the reference implementation used by hosts without a user database
//! and by the test suites.

use crate::entity::UserId;
use crate::errors::{DomainError, DomainResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Role carried by every user; exactly one per identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Unrestricted operator
    Admin,
    /// Reviewer of requests submitted by plain users
    Manager,
    /// Request submitter
    User,
}

impl Role {
    /// Canonical upper-case name, as recorded in audit entries
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::User => "USER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier
    pub id: UserId,
    /// Unique login handle; immutable
    pub handle: String,
    /// Human readable name; may change over time
    pub display_name: String,
    /// The single role assigned to this user
    pub role: Role,
}

impl User {
    /// Create a user with a fresh identifier
    pub fn new(handle: impl Into<String>, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId::new(),
            handle: handle.into(),
            display_name: display_name.into(),
            role,
        }
    }
}

/// Resolves callers to identities
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Look a user up by login handle
    async fn find_by_handle(&self, handle: &str) -> DomainResult<Option<User>>;

    /// Look a user up by identifier
    async fn find_by_id(&self, id: UserId) -> DomainResult<Option<User>>;

    /// Resolve a handle or fail with NotFound
    async fn resolve_handle(&self, handle: &str) -> DomainResult<User> {
        self.find_by_handle(handle)
            .await?
            .ok_or_else(|| DomainError::not_found("User", handle))
    }

    /// Resolve an identifier or fail with NotFound
    async fn resolve_id(&self, id: UserId) -> DomainResult<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id))
    }
}

/// In-memory identity directory
#[derive(Clone, Default)]
pub struct InMemoryIdentityDirectory {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryIdentityDirectory {
    /// Create an empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user; handles are unique
    pub async fn register(&self, user: User) -> DomainResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.handle == user.handle) {
            return Err(DomainError::AlreadyExists(format!("user '{}'", user.handle)));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    /// Change a user's display name
    pub async fn rename(&self, id: UserId, display_name: impl Into<String>) -> DomainResult<User> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("User", id))?;
        user.display_name = display_name.into();
        Ok(user.clone())
    }

    /// All registered users, ordered by handle
    pub async fn all(&self) -> Vec<User> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.handle.cmp(&b.handle));
        users
    }
}

#[async_trait]
impl IdentityDirectory for InMemoryIdentityDirectory {
    async fn find_by_handle(&self, handle: &str) -> DomainResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.handle == handle)
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> DomainResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }
}
