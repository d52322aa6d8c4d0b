//! Integration tests for the metrics aggregator.

use chrono::{DateTime, FixedOffset, Utc};
use taskflow::fixtures::Fixtures;
use taskflow::metrics::{behavioral_summary, compute_productivity, weekly_series};
use taskflow::query::WeekStart;
use taskflow::types::{BehaviorAction, TaskStatus};

fn at(s: &str) -> DateTime<Utc> {
    s.parse().expect("timestamp")
}

#[test]
fn no_completed_tasks_gives_zero_average() {
    let fixtures = Fixtures::seed().expect("seed");
    let metrics = compute_productivity(
        &fixtures.tasks,
        &fixtures.behavioral_data,
        "user-3",
        &at("2024-12-23T12:00:00Z"),
        WeekStart::Sunday,
    );

    assert_eq!(metrics.total_tasks, 2);
    assert_eq!(metrics.completed_tasks, 0);
    assert_eq!(metrics.average_completion_time, 0.0);
    assert!(!metrics.average_completion_time.is_nan());
}

#[test]
fn week_without_completions_is_all_zero() {
    let tasks = Fixtures::seed().expect("seed").tasks;

    let series = weekly_series(&tasks, "user-3", &at("2024-12-23T12:00:00Z"), WeekStart::Sunday);
    assert_eq!(series.counts, [0; 7]);

    // user-2 finished task-4 in December, not in this week
    let series = weekly_series(&tasks, "user-2", &at("2025-03-12T12:00:00Z"), WeekStart::Monday);
    assert_eq!(series.counts, [0; 7]);
    assert_eq!(series.total(), 0);
    assert_eq!(series.days[0].to_string(), "2025-03-10");
}

#[test]
fn metrics_for_seed_user() {
    let fixtures = Fixtures::seed().expect("seed");
    let metrics = compute_productivity(
        &fixtures.tasks,
        &fixtures.behavioral_data,
        "user-2",
        &at("2024-12-19T18:00:00Z"),
        WeekStart::Sunday,
    );

    assert_eq!(metrics.total_tasks, 2);
    assert_eq!(metrics.completed_tasks, 1);
    assert_eq!(metrics.average_completion_time, 8.0);
    assert_eq!(metrics.tasks_completed_today, 1);
    assert_eq!(metrics.most_productive_hour, Some(8));
    assert_eq!(metrics.productivity_trend.total(), 1);
    assert_eq!(metrics.time_spent_by_project.len(), 3);
}

#[test]
fn local_timezone_shifts_completion_day() {
    let mut tasks = Fixtures::seed().expect("seed").tasks;
    let task = tasks.iter_mut().find(|t| t.id == "task-4").expect("task-4");
    task.status = TaskStatus::Done;
    // 23:30 UTC on the 19th is already the 20th at UTC+2
    task.updated_at = at("2024-12-19T23:30:00Z");

    let plus_two = FixedOffset::east_opt(2 * 3600).expect("offset");
    let now = at("2024-12-20T10:00:00Z").with_timezone(&plus_two);
    let metrics = compute_productivity(&tasks, &[], "user-2", &now, WeekStart::Sunday);

    assert_eq!(metrics.tasks_completed_today, 1);
    assert_eq!(metrics.productivity_trend.counts, [0, 0, 0, 0, 0, 1, 0]);
}

#[test]
fn behavior_summary_counts_actions() {
    let behavior = Fixtures::seed().expect("seed").behavioral_data;
    let summary = behavioral_summary(&behavior, "user-2", &Utc);

    assert_eq!(summary.total_sessions, 2);
    assert_eq!(summary.average_session_minutes, 7.5);
    assert_eq!(summary.action_counts.get(&BehaviorAction::View), Some(&1));
    assert_eq!(summary.action_counts.get(&BehaviorAction::Edit), Some(&1));
    assert_eq!(summary.most_active_hour, Some(8));
}
