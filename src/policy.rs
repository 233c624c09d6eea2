// Copyright 2025 Cowboy AI, LLC.

//! Role-gated authorization for deciding and assigning requests
//!
//! | actor   | decide a request                    | assign a request |
//! |---------|-------------------------------------|------------------|
//! | ADMIN   | any submitter                       | yes              |
//! | MANAGER | only requests submitted by a USER   | yes              |
//! | USER    | not blocked unless `strict_reviewers` | no             |
//!
//! Detail updates (due date, priority) carry no role check.

use crate::errors::{DomainError, DomainResult};
use crate::identity::{Role, User};
use serde::{Deserialize, Serialize};

/// Authorization rules applied by the lifecycle engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccessPolicy {
    /// Reject status updates from USER actors. Off by default: plain users
    /// have historically not been stopped from deciding requests.
    #[serde(default)]
    pub strict_reviewers: bool,
}

impl AccessPolicy {
    /// Policy with USER actors barred from deciding requests
    pub fn strict() -> Self {
        Self {
            strict_reviewers: true,
        }
    }

    /// May `actor` change the status of a request submitted by `submitter`?
    pub fn authorize_status_update(&self, actor: &User, submitter: &User) -> DomainResult<()> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::Manager if submitter.role != Role::User => Err(DomainError::forbidden(format!(
                "managers can only decide requests submitted by users; '{}' submitted as {}",
                submitter.handle, submitter.role
            ))),
            Role::Manager => Ok(()),
            Role::User if self.strict_reviewers => Err(DomainError::forbidden(format!(
                "'{}' is not a reviewer",
                actor.handle
            ))),
            Role::User => Ok(()),
        }
    }

    /// May `actor` assign requests to other users?
    pub fn authorize_assignment(&self, actor: &User) -> DomainResult<()> {
        match actor.role {
            Role::Admin | Role::Manager => Ok(()),
            Role::User => Err(DomainError::forbidden(
                "only managers and admins can assign tasks",
            )),
        }
    }
}
