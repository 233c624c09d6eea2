// Copyright 2025 Cowboy AI, LLC.

//! Typed identifiers for users, templates, requests and their satellites

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use uuid::Uuid;

/// A typed entity ID using phantom types for type safety
///
/// The phantom type parameter keeps a [`UserId`] from being passed where an
/// [`InstanceId`] is expected.
///
/// # Examples
///
/// ```rust
/// use cim_approval_workflow::{InstanceId, UserId};
///
/// let user_id = UserId::new();
/// let instance_id = InstanceId::new();
///
/// // These are different types - won't compile if mixed up:
/// // let _: UserId = instance_id; // ERROR!
/// assert_ne!(user_id.as_uuid(), instance_id.as_uuid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId<T> {
    id: Uuid,
    #[serde(skip)]
    _phantom: PhantomData<T>,
}

impl<T> EntityId<T> {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            _phantom: PhantomData,
        }
    }

    /// Create an entity ID from a UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.id
    }
}

impl<T> fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> Default for EntityId<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromStr for EntityId<T> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self::from_uuid)
    }
}

impl<T> From<EntityId<T>> for Uuid {
    fn from(id: EntityId<T>) -> Self {
        id.id
    }
}

/// Marker trait for aggregate roots
///
/// Aggregate roots carry a version used for optimistic concurrency at the
/// store boundary.
pub trait AggregateRoot: Sized {
    /// The type of ID for this aggregate
    type Id: Copy + Eq + Send + Sync;

    /// Get the aggregate's ID
    fn id(&self) -> Self::Id;

    /// Get the aggregate's version for optimistic concurrency
    fn version(&self) -> u64;

    /// Increment the version
    fn increment_version(&mut self);
}

// Marker types for entity IDs
/// Marker for user identities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserMarker;

/// Marker for workflow templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateMarker;

/// Marker for template steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepMarker;

/// Marker for workflow instances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceMarker;

/// Marker for notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationMarker;

/// Marker for file attachments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttachmentMarker;

/// Identity of a user
pub type UserId = EntityId<UserMarker>;
/// Identity of a workflow template
pub type TemplateId = EntityId<TemplateMarker>;
/// Identity of a step within a template
pub type StepId = EntityId<StepMarker>;
/// Identity of a submitted request
pub type InstanceId = EntityId<InstanceMarker>;
/// Identity of a notification
pub type NotificationId = EntityId<NotificationMarker>;
/// Identity of a file attachment
pub type AttachmentId = EntityId<AttachmentMarker>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_creation() {
        let id1 = InstanceId::new();
        let id2 = InstanceId::new();
        assert_ne!(id1, id2);

        let uuid = Uuid::new_v4();
        let id = UserId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
        assert_eq!(Uuid::from(id), uuid);
    }

    #[test]
    fn test_entity_id_parse_and_display() {
        let id = TemplateId::new();
        let parsed: TemplateId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<TemplateId>().is_err());
    }

    #[test]
    fn test_entity_id_serializes_as_bare_uuid() {
        let uuid = Uuid::new_v4();
        let id = NotificationId::from_uuid(uuid);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));

        let back: NotificationId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
