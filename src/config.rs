// Copyright 2025 Cowboy AI, LLC.

//! Engine configuration
//!
//! ```toml
//! deny_reopen = false
//!
//! [policy]
//! strict_reviewers = false
//!
//! [analytics]
//! trend_window_days = 7
//! medium_risk_hours = 24.0
//! high_risk_hours = 48.0
//! trend_label_format = "%b %d"
//! ```

use crate::errors::{DomainError, DomainResult};
use crate::policy::AccessPolicy;
use crate::state_machine::TransitionTable;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::Path;

/// Longest trend window accepted, in days
pub const MAX_TREND_WINDOW_DAYS: u32 = 3650;

/// Lifecycle engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Refuse every status change back to PENDING
    pub deny_reopen: bool,
    /// Authorization rules
    pub policy: AccessPolicy,
    /// Analytics thresholds and window
    pub analytics: AnalyticsConfig,
}

impl EngineConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> DomainResult<Self> {
        let config: EngineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file; a missing file yields the defaults
    pub fn load(path: impl AsRef<Path>) -> DomainResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }

    /// The transition table implied by this configuration
    pub fn transition_table(&self) -> TransitionTable {
        if self.deny_reopen {
            TransitionTable::without_reopen()
        } else {
            TransitionTable::standard()
        }
    }

    fn validate(&self) -> DomainResult<()> {
        let a = &self.analytics;
        if a.trend_window_days == 0 || a.trend_window_days > MAX_TREND_WINDOW_DAYS {
            return Err(DomainError::Configuration(format!(
                "analytics.trend_window_days must be between 1 and {MAX_TREND_WINDOW_DAYS}, got {}",
                a.trend_window_days
            )));
        }
        if a.medium_risk_hours > a.high_risk_hours {
            return Err(DomainError::Configuration(format!(
                "analytics.medium_risk_hours ({}) exceeds high_risk_hours ({})",
                a.medium_risk_hours, a.high_risk_hours
            )));
        }
        if a.format_label(NaiveDate::default()).is_none() {
            return Err(DomainError::Configuration(format!(
                "analytics.trend_label_format '{}' cannot format a calendar date",
                a.trend_label_format
            )));
        }
        Ok(())
    }
}

/// Analytics thresholds and trend window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Days covered by the daily trend, ending now
    pub trend_window_days: u32,
    /// Average turnaround at or above this is MEDIUM risk
    pub medium_risk_hours: f64,
    /// Average turnaround strictly above this is HIGH risk
    pub high_risk_hours: f64,
    /// chrono format string for trend day labels
    pub trend_label_format: String,
}

impl AnalyticsConfig {
    /// Render a trend day label; `None` when the format needs more than a date
    pub fn format_label(&self, date: NaiveDate) -> Option<String> {
        let mut label = String::new();
        write!(label, "{}", date.format(&self.trend_label_format)).ok()?;
        Some(label)
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            trend_window_days: 7,
            medium_risk_hours: 24.0,
            high_risk_hours: 48.0,
            trend_label_format: "%b %d".to_string(),
        }
    }
}
