// Copyright 2025 Cowboy AI, LLC.

//! Multi-criteria request listing
//!
//! Every filter is optional; provided filters combine with AND. Status and
//! submission day only look at the stored record, so they are pushed down to
//! [`InstanceStore::query`](crate::store::InstanceStore::query). Owner and
//! free-text filters need the submitter's display name and the template
//! title and are applied once those are resolved.

use crate::instance::WorkflowInstance;
use crate::state_machine::InstanceStatus;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Filters accepted by `query_all`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceFilter {
    /// Exact status match
    pub status: Option<InstanceStatus>,
    /// Case-insensitive substring of the submitter's display name
    pub owner: Option<String>,
    /// Calendar day (UTC) of submission
    pub date: Option<NaiveDate>,
    /// Case-insensitive substring of the template title OR the description
    pub text: Option<String>,
}

impl InstanceFilter {
    /// A filter with no constraints
    pub fn any() -> Self {
        Self::default()
    }

    /// Whether no filter is set
    pub fn is_unconstrained(&self) -> bool {
        self.status.is_none()
            && self.owner_needle().is_none()
            && self.date.is_none()
            && self.text_needle().is_none()
    }

    /// Inclusive bounds of the submission day window
    pub fn day_window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        self.date.map(|day| {
            let start = day.and_time(NaiveTime::MIN).and_utc();
            let end = start + TimeDelta::days(1) - TimeDelta::nanoseconds(1);
            (start, end)
        })
    }

    /// The part of the filter that needs only the stored record
    pub fn matches_record(&self, instance: &WorkflowInstance) -> bool {
        if let Some(status) = self.status {
            if instance.status != status {
                return false;
            }
        }
        if let Some((start, end)) = self.day_window() {
            if instance.submitted_at < start || instance.submitted_at > end {
                return false;
            }
        }
        true
    }

    /// The part of the filter that needs resolved names
    pub fn matches_resolved(&self, instance: &WorkflowInstance, submitter_name: &str, template_title: &str) -> bool {
        if let Some(owner) = self.owner_needle() {
            if !contains_ignore_case(submitter_name, &owner) {
                return false;
            }
        }
        if let Some(text) = self.text_needle() {
            if !contains_ignore_case(template_title, &text)
                && !contains_ignore_case(&instance.description, &text)
            {
                return false;
            }
        }
        true
    }

    /// Full evaluation
    pub fn matches(&self, instance: &WorkflowInstance, submitter_name: &str, template_title: &str) -> bool {
        self.matches_record(instance) && self.matches_resolved(instance, submitter_name, template_title)
    }

    /// Whether evaluation needs the submitter name or template title
    pub fn needs_resolution(&self) -> bool {
        self.owner_needle().is_some() || self.text_needle().is_some()
    }

    fn owner_needle(&self) -> Option<String> {
        needle(self.owner.as_deref())
    }

    fn text_needle(&self) -> Option<String> {
        needle(self.text.as_deref())
    }
}

// Empty strings impose no constraint
fn needle(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_lowercase)
}

fn contains_ignore_case(haystack: &str, lowercase_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowercase_needle)
}

/// Builder for [`InstanceFilter`]
///
/// ```rust
/// use cim_approval_workflow::{InstanceStatus, QueryBuilder};
/// use chrono::NaiveDate;
///
/// let filter = QueryBuilder::new()
///     .status(InstanceStatus::Pending)
///     .owner("ann")
///     .date(NaiveDate::from_ymd_opt(2024, 1, 5).unwrap())
///     .text("leave")
///     .build();
/// assert!(!filter.is_unconstrained());
/// ```
#[derive(Debug, Default)]
pub struct QueryBuilder {
    filter: InstanceFilter,
}

impl QueryBuilder {
    /// Create a new query builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Require an exact status
    pub fn status(mut self, status: InstanceStatus) -> Self {
        self.filter.status = Some(status);
        self
    }

    /// Require the submitter's name to contain `owner`
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.filter.owner = Some(owner.into());
        self
    }

    /// Require submission on the given day
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.filter.date = Some(date);
        self
    }

    /// Require the template title or description to contain `text`
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.filter.text = Some(text.into());
        self
    }

    /// Build the filter
    pub fn build(self) -> InstanceFilter {
        self.filter
    }
}
