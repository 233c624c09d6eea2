// Copyright 2025 Cowboy AI, LLC.

//! Request status state machine
//!
//! Status changes are governed by an explicit [`TransitionTable`] keyed by
//! `(current, target)`. A pair that is absent from the table is denied, so
//! the policy in force can be listed and tested rather than inferred from
//! missing guards.
//!
//! ```text
//! submit --> PENDING --+--> APPROVED
//!                      +--> REJECTED
//!                      +--> CHANGES_REQUESTED
//!
//! Any status may move to any other, PENDING included. The no-reopen table
//! drops every `* -> PENDING` pair.
//! ```

use crate::errors::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Debug};
use std::str::FromStr;

/// Trait for types that can be used as states in a state machine
pub trait State: Debug + Clone + PartialEq + Eq + Send + Sync {
    /// Get the name of this state for logging/debugging
    fn name(&self) -> &'static str;

    /// Check if this is a terminal state
    fn is_terminal(&self) -> bool {
        false
    }
}

/// Status of a submitted request; a closed set
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstanceStatus {
    /// Awaiting a decision; the only initial state
    Pending,
    /// Accepted by a reviewer
    Approved,
    /// Declined by a reviewer
    Rejected,
    /// Sent back to the submitter for rework
    ChangesRequested,
}

impl InstanceStatus {
    /// Every status value
    pub const ALL: [InstanceStatus; 4] = [
        InstanceStatus::Pending,
        InstanceStatus::Approved,
        InstanceStatus::Rejected,
        InstanceStatus::ChangesRequested,
    ];

    /// Canonical upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Pending => "PENDING",
            InstanceStatus::Approved => "APPROVED",
            InstanceStatus::Rejected => "REJECTED",
            InstanceStatus::ChangesRequested => "CHANGES_REQUESTED",
        }
    }

    /// APPROVED and REJECTED count as completed work in analytics
    pub fn is_completed(&self) -> bool {
        matches!(self, InstanceStatus::Approved | InstanceStatus::Rejected)
    }
}

impl State for InstanceStatus {
    fn name(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceStatus {
    type Err = DomainError;

    /// Accepts the canonical names case-insensitively; `-` and spaces may
    /// stand in for `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        InstanceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| DomainError::InvalidArgument(format!("unknown status '{s}'")))
    }
}

/// Explicit `(current, target) -> allowed` policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    allowed: BTreeSet<(InstanceStatus, InstanceStatus)>,
}

impl TransitionTable {
    /// A table that denies everything
    pub fn empty() -> Self {
        Self {
            allowed: BTreeSet::new(),
        }
    }

    /// The policy reviewers operate under: any recognised status may be set
    /// from any status, including a return to PENDING.
    pub fn standard() -> Self {
        let mut table = Self::empty();
        for from in InstanceStatus::ALL {
            for to in InstanceStatus::ALL {
                table.allow(from, to);
            }
        }
        table
    }

    /// [`TransitionTable::standard`] without any transition back to PENDING
    pub fn without_reopen() -> Self {
        let mut table = Self::standard();
        for from in InstanceStatus::ALL {
            table.deny(from, InstanceStatus::Pending);
        }
        table
    }

    /// Permit a transition
    pub fn allow(&mut self, from: InstanceStatus, to: InstanceStatus) -> &mut Self {
        self.allowed.insert((from, to));
        self
    }

    /// Forbid a transition
    pub fn deny(&mut self, from: InstanceStatus, to: InstanceStatus) -> &mut Self {
        self.allowed.remove(&(from, to));
        self
    }

    /// Check if a transition to the target state is valid
    pub fn can_transition(&self, from: InstanceStatus, to: InstanceStatus) -> bool {
        self.allowed.contains(&(from, to))
    }

    /// Get all valid target states from this state
    pub fn valid_transitions(&self, from: InstanceStatus) -> Vec<InstanceStatus> {
        self.allowed
            .iter()
            .filter(|(f, _)| *f == from)
            .map(|(_, to)| *to)
            .collect()
    }

    /// Fail with [`DomainError::InvalidStateTransition`] unless allowed
    pub fn check(&self, from: InstanceStatus, to: InstanceStatus) -> DomainResult<()> {
        if self.can_transition(from, to) {
            Ok(())
        } else {
            Err(DomainError::InvalidStateTransition {
                from: from.name().to_string(),
                to: to.name().to_string(),
            })
        }
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("PENDING", InstanceStatus::Pending)]
    #[test_case("approved", InstanceStatus::Approved)]
    #[test_case(" Rejected ", InstanceStatus::Rejected)]
    #[test_case("changes-requested", InstanceStatus::ChangesRequested)]
    #[test_case("Changes Requested", InstanceStatus::ChangesRequested)]
    fn test_parse_status(input: &str, expected: InstanceStatus) {
        assert_eq!(input.parse::<InstanceStatus>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_status_is_invalid_argument() {
        let err = "ARCHIVED".parse::<InstanceStatus>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
    }

    #[test]
    fn test_standard_table_permits_every_pair() {
        let table = TransitionTable::standard();
        for from in InstanceStatus::ALL {
            assert_eq!(table.valid_transitions(from), InstanceStatus::ALL.to_vec());
        }
        assert!(table.check(InstanceStatus::Approved, InstanceStatus::Pending).is_ok());
    }

    #[test]
    fn test_without_reopen_never_targets_pending() {
        let table = TransitionTable::without_reopen();
        for from in InstanceStatus::ALL {
            let err = table.check(from, InstanceStatus::Pending).unwrap_err();
            assert!(matches!(err, DomainError::InvalidStateTransition { .. }));
            assert_eq!(
                table.valid_transitions(from),
                vec![
                    InstanceStatus::Approved,
                    InstanceStatus::Rejected,
                    InstanceStatus::ChangesRequested
                ]
            );
        }
        assert!(table.can_transition(InstanceStatus::Rejected, InstanceStatus::Approved));
    }

    #[test]
    fn test_deny_removes_rule() {
        let mut table = TransitionTable::standard();
        table.deny(InstanceStatus::Approved, InstanceStatus::Rejected);
        assert!(!table.can_transition(InstanceStatus::Approved, InstanceStatus::Rejected));
        assert!(table.can_transition(InstanceStatus::Pending, InstanceStatus::Rejected));
    }

    #[test]
    fn test_completed_statuses() {
        assert!(InstanceStatus::Approved.is_completed());
        assert!(InstanceStatus::Rejected.is_completed());
        assert!(!InstanceStatus::Pending.is_completed());
        assert!(!InstanceStatus::ChangesRequested.is_completed());
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&InstanceStatus::ChangesRequested).unwrap(),
            "\"CHANGES_REQUESTED\""
        );
    }
}
