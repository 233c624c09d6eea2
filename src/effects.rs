// Copyright 2025 Cowboy AI, LLC.

//! Side-effect intents and the sinks that deliver them
//!
//! The lifecycle engine never writes audit entries or notifications itself.
//! After saving, each mutating operation builds [`SideEffect`] intents and
//! passes them to the [`EffectDispatcher`], which hands them to the
//! configured sinks. Intents carry the engine's clock reading, so sinks do
//! not consult a clock of their own. Delivery is fire-and-forget: a failing
//! sink is logged and the already persisted request is left as it is.

use crate::entity::{NotificationId, UserId};
use crate::errors::{DomainError, DomainResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Instruction to append an audit entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditIntent {
    /// Action name, e.g. `UPDATE_STATUS`
    pub action: String,
    /// Display name of the acting user
    pub actor_name: String,
    /// Role of the acting user
    pub actor_role: String,
    /// Free-text detail
    pub detail: String,
    /// When the action happened
    pub at: DateTime<Utc>,
}

/// Instruction to notify a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationIntent {
    /// Recipient
    pub recipient: UserId,
    /// Message text
    pub message: String,
    /// When the notification was raised
    pub at: DateTime<Utc>,
}

/// Side effect produced by a lifecycle operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideEffect {
    /// Append to the audit trail
    Audit(AuditIntent),
    /// Notify a user
    Notify(NotificationIntent),
}

impl SideEffect {
    /// Get the effect type name
    pub fn effect_type(&self) -> &'static str {
        match self {
            SideEffect::Audit(_) => "Audit",
            SideEffect::Notify(_) => "Notify",
        }
    }
}

/// Append-only audit destination
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record one audit entry
    async fn record(&self, intent: AuditIntent) -> DomainResult<()>;
}

/// Notification destination
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Create an unread notification for the recipient
    async fn record(&self, intent: NotificationIntent) -> DomainResult<()>;
}

/// A persisted audit entry; never mutated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Action name
    pub action: String,
    /// Display name of the acting user
    pub actor_name: String,
    /// Role of the acting user
    pub actor_role: String,
    /// Free-text detail
    pub detail: String,
    /// When the entry was appended
    pub timestamp: DateTime<Utc>,
}

/// In-memory audit trail
#[derive(Clone, Default)]
pub struct AuditTrail {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl AuditTrail {
    /// Create an empty trail
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries, newest first
    pub async fn entries(&self) -> Vec<AuditEntry> {
        let mut entries = self.entries.read().await.clone();
        entries.reverse();
        entries
    }

    /// Entries with the given action name, newest first
    pub async fn entries_for_action(&self, action: &str) -> Vec<AuditEntry> {
        self.entries()
            .await
            .into_iter()
            .filter(|e| e.action == action)
            .collect()
    }
}

#[async_trait]
impl AuditSink for AuditTrail {
    async fn record(&self, intent: AuditIntent) -> DomainResult<()> {
        self.entries.write().await.push(AuditEntry {
            action: intent.action,
            actor_name: intent.actor_name,
            actor_role: intent.actor_role,
            detail: intent.detail,
            timestamp: intent.at,
        });
        Ok(())
    }
}

/// A one-way message to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification identifier
    pub id: NotificationId,
    /// Recipient
    pub user_id: UserId,
    /// Message text
    pub message: String,
    /// Whether the recipient has read it
    pub read: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// In-memory notification store
#[derive(Clone, Default)]
pub struct NotificationCenter {
    notifications: Arc<RwLock<Vec<Notification>>>,
}

impl NotificationCenter {
    /// Create an empty notification store
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications for one user, newest first
    pub async fn list_for_user(&self, user_id: UserId) -> Vec<Notification> {
        self.notifications
            .read()
            .await
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Number of unread notifications for one user
    pub async fn unread_count(&self, user_id: UserId) -> usize {
        self.notifications
            .read()
            .await
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count()
    }

    /// Mark a notification as read
    pub async fn mark_read(&self, id: NotificationId) -> DomainResult<Notification> {
        let mut notifications = self.notifications.write().await;
        let notification = notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| DomainError::not_found("Notification", id))?;
        notification.read = true;
        Ok(notification.clone())
    }
}

#[async_trait]
impl NotificationSink for NotificationCenter {
    async fn record(&self, intent: NotificationIntent) -> DomainResult<()> {
        self.notifications.write().await.push(Notification {
            id: NotificationId::new(),
            user_id: intent.recipient,
            message: intent.message,
            read: false,
            created_at: intent.at,
        });
        Ok(())
    }
}

/// Hands intents to sinks without letting delivery failures escape
#[derive(Clone)]
pub struct EffectDispatcher {
    audit: Arc<dyn AuditSink>,
    notifications: Arc<dyn NotificationSink>,
}

impl EffectDispatcher {
    /// Create a dispatcher over the given sinks
    pub fn new(audit: Arc<dyn AuditSink>, notifications: Arc<dyn NotificationSink>) -> Self {
        Self {
            audit,
            notifications,
        }
    }

    /// Deliver every effect in order; returns how many were delivered
    pub async fn dispatch(&self, effects: &[SideEffect]) -> usize {
        let mut delivered = 0;
        for effect in effects {
            let result = match effect {
                SideEffect::Audit(intent) => self.audit.record(intent.clone()).await,
                SideEffect::Notify(intent) => self.notifications.record(intent.clone()).await,
            };
            match result {
                Ok(()) => {
                    delivered += 1;
                    debug!(effect = effect.effect_type(), "Delivered side effect");
                }
                Err(e) => {
                    warn!(
                        effect = effect.effect_type(),
                        error = %e,
                        "Side effect delivery failed; request state is unchanged"
                    );
                }
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct BrokenSink;

    #[async_trait]
    impl AuditSink for BrokenSink {
        async fn record(&self, _intent: AuditIntent) -> DomainResult<()> {
            Err(DomainError::ExternalServiceError {
                service: "audit".into(),
                message: "unavailable".into(),
            })
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 5, 9, 0, 0).unwrap()
    }

    fn audit(action: &str) -> AuditIntent {
        AuditIntent {
            action: action.into(),
            actor_name: "System Administrator".into(),
            actor_role: "ADMIN".into(),
            detail: "detail".into(),
            at: at(),
        }
    }

    #[tokio::test]
    async fn test_audit_trail_is_newest_first() {
        let trail = AuditTrail::new();
        trail.record(audit("FIRST")).await.unwrap();
        trail.record(audit("SECOND")).await.unwrap();

        let entries = trail.entries().await;
        assert_eq!(entries[0].action, "SECOND");
        assert_eq!(entries[1].action, "FIRST");
        assert_eq!(entries[0].timestamp, at());
        assert_eq!(trail.entries_for_action("FIRST").await.len(), 1);
    }

    #[tokio::test]
    async fn test_notifications_listed_per_user_and_marked_read() {
        let center = NotificationCenter::new();
        let ann = UserId::new();
        let bob = UserId::new();
        for (recipient, message) in [(ann, "one"), (bob, "other"), (ann, "two")] {
            center
                .record(NotificationIntent {
                    recipient,
                    message: message.into(),
                    at: at(),
                })
                .await
                .unwrap();
        }

        let anns = center.list_for_user(ann).await;
        assert_eq!(anns.len(), 2);
        assert_eq!(anns[0].message, "two");
        assert!(anns.iter().all(|n| !n.read && n.created_at == at()));
        assert_eq!(center.unread_count(ann).await, 2);

        let read = center.mark_read(anns[1].id).await.unwrap();
        assert!(read.read);
        assert_eq!(center.unread_count(ann).await, 1);
    }

    #[tokio::test]
    async fn test_mark_read_unknown_is_not_found() {
        let center = NotificationCenter::new();
        let err = center.mark_read(NotificationId::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_dispatcher_swallows_sink_failures() {
        let center = NotificationCenter::new();
        let dispatcher = EffectDispatcher::new(Arc::new(BrokenSink), Arc::new(center.clone()));
        let recipient = UserId::new();

        let delivered = dispatcher
            .dispatch(&[
                SideEffect::Audit(audit("UPDATE_STATUS")),
                SideEffect::Notify(NotificationIntent {
                    recipient,
                    message: "Update on 'Leave Application': ok".into(),
                    at: at(),
                }),
            ])
            .await;

        assert_eq!(delivered, 1);
        assert_eq!(center.list_for_user(recipient).await.len(), 1);
    }
}
