// Copyright 2025 Cowboy AI, LLC.

//! Throughput and bottleneck analytics over a snapshot of all requests
//!
//! Every report is recomputed from the snapshot it is given; nothing is
//! cached between calls. Turnaround is measured in whole elapsed hours per
//! request (partial hours are truncated) and then averaged.

use crate::config::AnalyticsConfig;
use crate::instance::WorkflowInstance;
use crate::state_machine::InstanceStatus;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The facts analytics needs about one request
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceFacts {
    /// Current status
    pub status: InstanceStatus,
    /// Title of the request's template
    pub template_title: String,
    /// Submission time
    pub submitted_at: DateTime<Utc>,
    /// Last decision or assignment time
    pub updated_at: Option<DateTime<Utc>>,
}

impl InstanceFacts {
    /// Project a stored request
    pub fn from_instance(instance: &WorkflowInstance, template_title: impl Into<String>) -> Self {
        Self {
            status: instance.status,
            template_title: template_title.into(),
            submitted_at: instance.submitted_at,
            updated_at: instance.updated_at,
        }
    }

    /// Whole hours from submission to decision, for decided requests only
    pub fn completion_hours(&self) -> Option<i64> {
        if !self.status.is_completed() {
            return None;
        }
        self.updated_at
            .map(|updated| (updated - self.submitted_at).num_hours())
    }
}

/// System-wide headline numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SummaryStats {
    /// Number of requests
    pub total_workflows: u64,
    /// Share of requests that are APPROVED, in percent
    pub completion_rate: f64,
    /// Mean turnaround of decided requests, in hours
    pub average_completion_time_hours: f64,
    /// Number of requests still PENDING
    pub total_pending: u64,
}

/// Turnaround risk of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BottleneckRisk {
    /// Under the medium threshold
    Low,
    /// At or above the medium threshold, at or under the high threshold
    Medium,
    /// Above the high threshold
    High,
}

impl BottleneckRisk {
    /// Classify an average turnaround
    ///
    /// The high threshold is exclusive and the medium threshold inclusive,
    /// so with the defaults 48.0 and 24.0 both classify as MEDIUM.
    pub fn classify(average_hours: f64, config: &AnalyticsConfig) -> Self {
        if average_hours > config.high_risk_hours {
            BottleneckRisk::High
        } else if average_hours >= config.medium_risk_hours {
            BottleneckRisk::Medium
        } else {
            BottleneckRisk::Low
        }
    }
}

impl fmt::Display for BottleneckRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BottleneckRisk::Low => "LOW",
            BottleneckRisk::Medium => "MEDIUM",
            BottleneckRisk::High => "HIGH",
        })
    }
}

/// Throughput of one template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TemplatePerformance {
    /// Template title
    pub workflow_title: String,
    /// Number of APPROVED or REJECTED requests
    pub completed_count: u64,
    /// Mean turnaround of those requests, in hours
    pub average_time_hours: f64,
    /// Risk derived from the mean turnaround
    pub bottleneck_risk: BottleneckRisk,
}

/// Activity on one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DailyTrend {
    /// The day (UTC)
    pub date: NaiveDate,
    /// Short label, e.g. `Jan 05`
    pub label: String,
    /// Requests decided that day
    pub completed_count: u64,
    /// Requests submitted that day
    pub submitted_count: u64,
}

/// Full analytics report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalyticsReport {
    /// When the report was computed
    pub generated_at: DateTime<Utc>,
    /// Headline numbers
    pub summary: SummaryStats,
    /// Per-template throughput, slowest first
    pub performance: Vec<TemplatePerformance>,
    /// Requests per status; statuses with no requests are absent
    pub status_distribution: BTreeMap<InstanceStatus, u64>,
    /// Daily activity within the trailing window, oldest first
    pub trends: Vec<DailyTrend>,
}

/// Computes [`AnalyticsReport`]s
#[derive(Debug, Clone, Default)]
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
}

impl AnalyticsEngine {
    /// Create an engine with the given thresholds
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    /// Thresholds in use
    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Compute every section of the report
    pub fn compute(&self, facts: &[InstanceFacts], now: DateTime<Utc>) -> AnalyticsReport {
        AnalyticsReport {
            generated_at: now,
            summary: self.summary(facts),
            performance: self.performance(facts),
            status_distribution: self.status_distribution(facts),
            trends: self.daily_trend(facts, now),
        }
    }

    /// Headline numbers
    pub fn summary(&self, facts: &[InstanceFacts]) -> SummaryStats {
        let total = facts.len() as u64;
        let approved = count_status(facts, InstanceStatus::Approved);
        let completion_rate = if total == 0 {
            0.0
        } else {
            approved as f64 / total as f64 * 100.0
        };

        SummaryStats {
            total_workflows: total,
            completion_rate,
            average_completion_time_hours: average_completion_hours(facts.iter()),
            total_pending: count_status(facts, InstanceStatus::Pending),
        }
    }

    /// Per-template throughput, sorted by mean turnaround descending
    pub fn performance(&self, facts: &[InstanceFacts]) -> Vec<TemplatePerformance> {
        let mut groups: IndexMap<&str, Vec<&InstanceFacts>> = IndexMap::new();
        for fact in facts {
            groups.entry(fact.template_title.as_str()).or_default().push(fact);
        }

        let mut performance: Vec<TemplatePerformance> = groups
            .into_iter()
            .map(|(title, group)| {
                let completed_count = group.iter().filter(|f| f.status.is_completed()).count() as u64;
                let average_time_hours = average_completion_hours(group.iter().copied());
                TemplatePerformance {
                    workflow_title: title.to_string(),
                    completed_count,
                    average_time_hours,
                    bottleneck_risk: BottleneckRisk::classify(average_time_hours, &self.config),
                }
            })
            .collect();

        performance.sort_by(|a, b| b.average_time_hours.total_cmp(&a.average_time_hours));
        performance
    }

    /// Requests per status present in the data
    pub fn status_distribution(&self, facts: &[InstanceFacts]) -> BTreeMap<InstanceStatus, u64> {
        let mut distribution = BTreeMap::new();
        for fact in facts {
            *distribution.entry(fact.status).or_insert(0) += 1;
        }
        distribution
    }

    /// Submissions and decisions per day over the trailing window
    ///
    /// Only days with at least one submission or decision appear.
    pub fn daily_trend(&self, facts: &[InstanceFacts], now: DateTime<Utc>) -> Vec<DailyTrend> {
        let window_start = Duration::try_days(i64::from(self.config.trend_window_days))
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut days: BTreeMap<NaiveDate, (u64, u64)> = BTreeMap::new();

        for fact in facts {
            if fact.status.is_completed() {
                if let Some(updated) = fact.updated_at.filter(|t| *t > window_start) {
                    days.entry(updated.date_naive()).or_default().0 += 1;
                }
            }
            if fact.submitted_at > window_start {
                days.entry(fact.submitted_at.date_naive()).or_default().1 += 1;
            }
        }

        days.into_iter()
            .map(|(date, (completed_count, submitted_count))| DailyTrend {
                date,
                label: self
                    .config
                    .format_label(date)
                    .unwrap_or_else(|| date.to_string()),
                completed_count,
                submitted_count,
            })
            .collect()
    }
}

fn count_status(facts: &[InstanceFacts], status: InstanceStatus) -> u64 {
    facts.iter().filter(|f| f.status == status).count() as u64
}

// Mean over an empty set is 0
fn average_completion_hours<'a>(facts: impl Iterator<Item = &'a InstanceFacts>) -> f64 {
    let (sum, count) = facts
        .filter_map(InstanceFacts::completion_hours)
        .fold((0i64, 0u64), |(sum, count), hours| (sum + hours, count + 1));
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}
