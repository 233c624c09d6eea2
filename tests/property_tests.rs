//! Property tests for status closure, policy atomicity and trend shape.

mod common;

use chrono::{DateTime, Duration, Utc};
use cim_approval_workflow::*;
use common::{jan, Harness};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Decide { status: &'static str, actor: &'static str },
    Assign { assignee: &'static str, actor: &'static str },
    Details { priority: Option<Priority> },
}

const HANDLES: [&str; 5] = ["admin", "manager", "user", "ann", "bob"];
const STATUS_TEXT: [&str; 6] = [
    "APPROVED",
    "REJECTED",
    "CHANGES_REQUESTED",
    "PENDING",
    "approved",
    "ARCHIVED",
];

fn handle() -> impl Strategy<Value = &'static str> {
    prop::sample::select(HANDLES.to_vec())
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (prop::sample::select(STATUS_TEXT.to_vec()), handle())
            .prop_map(|(status, actor)| Op::Decide { status, actor }),
        (handle(), handle()).prop_map(|(assignee, actor)| Op::Assign { assignee, actor }),
        prop::option::of(prop_oneof![
            Just(Priority::Low),
            Just(Priority::Medium),
            Just(Priority::High),
            Just(Priority::Urgent),
        ])
        .prop_map(|priority| Op::Details { priority }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn status_stays_in_the_closed_set(
        submitter in handle(),
        ops in prop::collection::vec(op(), 1..12),
    ) {
        tokio_test::block_on(async {
            let h = Harness::new().await;
            let instance = h.submit("Leave Application", submitter, "x").await;

            for op in ops {
                let before = h.stored(instance.id).await;
                h.clock.advance(Duration::minutes(7));

                let result = match op {
                    Op::Decide { status, actor } => h
                        .engine
                        .update_status_str(instance.id, status, "r", actor)
                        .await,
                    Op::Assign { assignee, actor } => h
                        .engine
                        .assign_task(instance.id, assignee, actor)
                        .await,
                    Op::Details { priority } => h
                        .engine
                        .update_task_details(instance.id, None, priority, "user")
                        .await,
                };

                let after = h.stored(instance.id).await;
                assert!(InstanceStatus::ALL.contains(&after.status));
                assert_eq!(after.submitted_at, before.submitted_at);
                if let (Some(b), Some(a)) = (before.updated_at, after.updated_at) {
                    assert!(a >= b);
                }
                if let Some(a) = after.updated_at {
                    assert!(a >= after.submitted_at);
                }
                if result.is_err() {
                    assert_eq!(after, before);
                }
            }
        });
    }
}

fn fact_strategy(now: DateTime<Utc>) -> impl Strategy<Value = InstanceFacts> {
    (
        prop::sample::select(InstanceStatus::ALL.to_vec()),
        prop::sample::select(vec!["Leave", "Training", "Grievance"]),
        0i64..(20 * 24 * 60),
        prop::option::of(0i64..(10 * 24 * 60)),
    )
        .prop_map(move |(status, title, age_minutes, decided_after)| {
            let submitted_at = now - Duration::minutes(age_minutes);
            InstanceFacts {
                status,
                template_title: title.to_string(),
                submitted_at,
                updated_at: decided_after.map(|m| submitted_at + Duration::minutes(m)),
            }
        })
}

proptest! {
    #[test]
    fn trend_days_are_sorted_nonempty_and_complete(
        facts in prop::collection::vec(fact_strategy(jan(20, 12)), 0..60),
    ) {
        let now = jan(20, 12);
        let engine = AnalyticsEngine::default();
        let trend = engine.daily_trend(&facts, now);
        let window_start = now - Duration::days(7);

        for pair in trend.windows(2) {
            prop_assert!(pair[0].date < pair[1].date);
        }
        for day in &trend {
            prop_assert!(day.submitted_count + day.completed_count > 0);
        }

        let submitted: u64 = trend.iter().map(|d| d.submitted_count).sum();
        let expected_submitted = facts
            .iter()
            .filter(|f| f.submitted_at > window_start)
            .count() as u64;
        prop_assert_eq!(submitted, expected_submitted);

        let completed: u64 = trend.iter().map(|d| d.completed_count).sum();
        let expected_completed = facts
            .iter()
            .filter(|f| f.status.is_completed())
            .filter(|f| f.updated_at.is_some_and(|t| t > window_start))
            .count() as u64;
        prop_assert_eq!(completed, expected_completed);
    }

    #[test]
    fn summary_and_distribution_agree(
        facts in prop::collection::vec(fact_strategy(jan(20, 12)), 0..60),
    ) {
        let engine = AnalyticsEngine::default();
        let report = engine.compute(&facts, jan(20, 12));

        let distributed: u64 = report.status_distribution.values().sum();
        prop_assert_eq!(distributed, report.summary.total_workflows);
        prop_assert!(report.status_distribution.values().all(|count| *count > 0));
        prop_assert!((0.0..=100.0).contains(&report.summary.completion_rate));

        let completed: u64 = report.performance.iter().map(|p| p.completed_count).sum();
        let expected = facts.iter().filter(|f| f.status.is_completed()).count() as u64;
        prop_assert_eq!(completed, expected);

        for pair in report.performance.windows(2) {
            prop_assert!(pair[0].average_time_hours >= pair[1].average_time_hours);
        }
    }
}
