//! Productivity and behavioral analytics.
//!
//! Every function here is a pure linear scan over record slices. Local
//! calendar dates and hours are taken in the timezone of the `now` / `tz`
//! argument so callers (and tests) decide what "today" means.

use crate::query::WeekStart;
use crate::types::{BehaviorAction, BehavioralData, Task, TaskStatus};
use chrono::{DateTime, NaiveDate, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const MS_PER_MINUTE: f64 = 60_000.0;

/// Headline numbers for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductivityMetrics {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// Mean hours per completed task; 0 when nothing is completed.
    pub average_completion_time: f64,
    pub most_productive_hour: Option<u32>,
    pub tasks_completed_today: usize,
    /// Completed tasks per day of the current week.
    pub productivity_trend: WeeklySeries,
    /// Project id to summed actual hours across all users.
    pub time_spent_by_project: BTreeMap<String, f64>,
}

/// Seven daily counts aligned to the configured week start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySeries {
    pub days: [NaiveDate; 7],
    pub counts: [usize; 7],
}

impl WeeklySeries {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Summary of tracked interactions for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehavioralSummary {
    pub total_sessions: usize,
    pub average_session_minutes: f64,
    pub action_counts: BTreeMap<BehaviorAction, usize>,
    /// Mode of the local hour across all entries; the earliest hour wins ties.
    pub most_active_hour: Option<u32>,
    /// Local hour of the chronologically first entry.
    pub first_activity_hour: Option<u32>,
}

/// Per-status counts and hour totals for the analytics dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusBreakdown {
    pub total_tasks: usize,
    pub todo: usize,
    pub in_progress: usize,
    pub review: usize,
    pub done: usize,
    /// Estimated hours over all of the user's tasks.
    pub total_estimated_hours: f64,
    /// Actual hours over the user's completed tasks.
    pub total_actual_hours: f64,
    /// Percentage of tasks done; 0 with no tasks.
    pub completion_rate: f64,
}

/// Compute the headline metrics for `user_id` as of `now`.
pub fn compute_productivity<Tz: TimeZone>(
    tasks: &[Task],
    behavior: &[BehavioralData],
    user_id: &str,
    now: &DateTime<Tz>,
    week_start: WeekStart,
) -> ProductivityMetrics {
    let tz = now.timezone();
    let today = now.date_naive();

    let user_tasks: Vec<&Task> = tasks.iter().filter(|t| t.assignee_id == user_id).collect();
    let completed: Vec<&Task> = user_tasks
        .iter()
        .copied()
        .filter(|t| t.status == TaskStatus::Done)
        .collect();

    let average_completion_time = if completed.is_empty() {
        0.0
    } else {
        let hours: f64 = completed
            .iter()
            .map(|t| t.actual_hours.or(t.estimated_hours).unwrap_or(0.0))
            .sum();
        hours / completed.len() as f64
    };

    let tasks_completed_today = completed
        .iter()
        .filter(|t| t.updated_at.with_timezone(&tz).date_naive() == today)
        .count();

    ProductivityMetrics {
        total_tasks: user_tasks.len(),
        completed_tasks: completed.len(),
        average_completion_time,
        most_productive_hour: behavioral_summary(behavior, user_id, &tz).most_active_hour,
        tasks_completed_today,
        productivity_trend: weekly_series(tasks, user_id, now, week_start),
        time_spent_by_project: time_spent_by_project(tasks),
    }
}

/// Completed tasks per day of the week containing `now`.
///
/// A task counts on the local date of its `updated_at`, which is when it
/// was last moved (typically into `done`).
pub fn weekly_series<Tz: TimeZone>(
    tasks: &[Task],
    user_id: &str,
    now: &DateTime<Tz>,
    week_start: WeekStart,
) -> WeeklySeries {
    let tz = now.timezone();
    let today = now.date_naive();
    let mut counts = [0usize; 7];
    // Only fails at the ends of the representable calendar.
    let Some(days) = week_start.week_of(today) else {
        return WeeklySeries {
            days: [today; 7],
            counts,
        };
    };

    for task in tasks
        .iter()
        .filter(|t| t.assignee_id == user_id && t.status == TaskStatus::Done)
    {
        let completed_on = task.updated_at.with_timezone(&tz).date_naive();
        if let Some(i) = days.iter().position(|d| *d == completed_on) {
            counts[i] += 1;
        }
    }

    WeeklySeries { days, counts }
}

/// Summed actual hours per project, over every task regardless of assignee.
pub fn time_spent_by_project(tasks: &[Task]) -> BTreeMap<String, f64> {
    let mut by_project = BTreeMap::new();
    for task in tasks {
        *by_project.entry(task.project_id.clone()).or_insert(0.0) +=
            task.actual_hours.unwrap_or(0.0);
    }
    by_project
}

/// Actual hours per project for one user's tasks.
pub fn hours_by_project_for_user(tasks: &[Task], user_id: &str) -> BTreeMap<String, f64> {
    let mut by_project = BTreeMap::new();
    for task in tasks.iter().filter(|t| t.assignee_id == user_id) {
        *by_project.entry(task.project_id.clone()).or_insert(0.0) +=
            task.actual_hours.unwrap_or(0.0);
    }
    by_project
}

/// Status counts and hours for a user, optionally scoped to one project.
pub fn status_breakdown(tasks: &[Task], user_id: &str, project_id: Option<&str>) -> StatusBreakdown {
    let user_tasks: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.assignee_id == user_id)
        .filter(|t| project_id.is_none_or(|p| t.project_id == p))
        .collect();

    let count = |status: TaskStatus| user_tasks.iter().filter(|t| t.status == status).count();
    let done = count(TaskStatus::Done);

    let total_estimated_hours = user_tasks
        .iter()
        .map(|t| t.estimated_hours.unwrap_or(0.0))
        .sum();
    let total_actual_hours = user_tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Done)
        .map(|t| t.actual_hours.unwrap_or(0.0))
        .sum();
    let completion_rate = if user_tasks.is_empty() {
        0.0
    } else {
        done as f64 / user_tasks.len() as f64 * 100.0
    };

    StatusBreakdown {
        total_tasks: user_tasks.len(),
        todo: count(TaskStatus::Todo),
        in_progress: count(TaskStatus::InProgress),
        review: count(TaskStatus::Review),
        done,
        total_estimated_hours,
        total_actual_hours,
        completion_rate,
    }
}

/// Summarise a user's tracked interactions.
///
/// Entries without a duration count as zero-length sessions.
pub fn behavioral_summary<Tz: TimeZone>(
    behavior: &[BehavioralData],
    user_id: &str,
    tz: &Tz,
) -> BehavioralSummary {
    let entries: Vec<&BehavioralData> = behavior.iter().filter(|b| b.user_id == user_id).collect();

    let average_session_minutes = if entries.is_empty() {
        0.0
    } else {
        // Durations come from clients; summing as f64 cannot overflow.
        let total_ms: f64 = entries
            .iter()
            .map(|b| b.duration_ms.unwrap_or(0) as f64)
            .sum();
        total_ms / entries.len() as f64 / MS_PER_MINUTE
    };

    let mut action_counts = BTreeMap::new();
    let mut hour_counts = [0usize; 24];
    for entry in &entries {
        *action_counts.entry(entry.action).or_insert(0) += 1;
        hour_counts[entry.timestamp.with_timezone(tz).hour() as usize] += 1;
    }

    // max_by_key keeps the last maximum, so scan hours in reverse to let the
    // earliest hour win ties.
    let most_active_hour = (!entries.is_empty())
        .then(|| {
            (0..24u32)
                .rev()
                .max_by_key(|h| hour_counts[*h as usize])
        })
        .flatten();

    let first_activity_hour = entries
        .iter()
        .min_by_key(|b| b.timestamp)
        .map(|b| b.timestamp.with_timezone(tz).hour());

    BehavioralSummary {
        total_sessions: entries.len(),
        average_session_minutes,
        action_counts,
        most_active_hour,
        first_activity_hour,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixtures;
    use chrono::Utc;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn entry(user: &str, ts: &str, duration_ms: Option<u64>) -> BehavioralData {
        BehavioralData {
            user_id: user.into(),
            task_id: "task-1".into(),
            action: BehaviorAction::View,
            timestamp: at(ts),
            duration_ms,
            metadata: None,
        }
    }

    #[test]
    fn average_completion_falls_back_to_estimate() {
        let mut tasks = Fixtures::seed().unwrap().tasks;
        // user-2 has task-4 done with 8 actual hours; finish task-2 with no actual
        tasks[1].status = TaskStatus::Done;
        tasks[1].actual_hours = None;

        let metrics = compute_productivity(&tasks, &[], "user-2", &at("2024-12-23T12:00:00Z"), WeekStart::Sunday);
        assert_eq!(metrics.completed_tasks, 2);
        assert!((metrics.average_completion_time - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn completed_today_uses_local_date() {
        let tasks = Fixtures::seed().unwrap().tasks;
        let metrics = compute_productivity(&tasks, &[], "user-2", &at("2024-12-19T20:00:00Z"), WeekStart::Sunday);
        assert_eq!(metrics.tasks_completed_today, 1);

        let metrics = compute_productivity(&tasks, &[], "user-2", &at("2024-12-20T00:00:01Z"), WeekStart::Sunday);
        assert_eq!(metrics.tasks_completed_today, 0);
    }

    #[test]
    fn time_by_project_ignores_user() {
        let tasks = Fixtures::seed().unwrap().tasks;
        let by_project = time_spent_by_project(&tasks);
        assert_eq!(by_project.get("project-1"), Some(&28.0));
        assert_eq!(by_project.get("project-2"), Some(&8.0));
        assert_eq!(by_project.get("project-3"), Some(&0.0));
    }

    #[test]
    fn weekly_series_counts_completion_day() {
        let tasks = Fixtures::seed().unwrap().tasks;
        // task-4 (user-2) was completed on Thursday 2024-12-19
        let series = weekly_series(&tasks, "user-2", &at("2024-12-20T10:00:00Z"), WeekStart::Sunday);
        assert_eq!(series.counts, [0, 0, 0, 0, 1, 0, 0]);

        let series = weekly_series(&tasks, "user-2", &at("2024-12-20T10:00:00Z"), WeekStart::Monday);
        assert_eq!(series.counts, [0, 0, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn most_active_hour_is_a_true_mode() {
        let behavior = vec![
            entry("u", "2024-12-23T08:00:00Z", Some(60_000)),
            entry("u", "2024-12-23T14:10:00Z", None),
            entry("u", "2024-12-24T14:40:00Z", None),
            entry("other", "2024-12-24T09:00:00Z", None),
        ];
        let summary = behavioral_summary(&behavior, "u", &Utc);
        assert_eq!(summary.most_active_hour, Some(14));
        assert_eq!(summary.first_activity_hour, Some(8));
        assert_eq!(summary.total_sessions, 3);
        assert!((summary.average_session_minutes - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn most_active_hour_ties_pick_earliest() {
        let behavior = vec![
            entry("u", "2024-12-23T16:00:00Z", None),
            entry("u", "2024-12-23T09:00:00Z", None),
        ];
        assert_eq!(behavioral_summary(&behavior, "u", &Utc).most_active_hour, Some(9));
    }

    #[test]
    fn huge_durations_do_not_overflow() {
        let behavior = vec![
            entry("u", "2024-12-23T08:00:00Z", Some(u64::MAX)),
            entry("u", "2024-12-23T09:00:00Z", Some(u64::MAX)),
        ];
        let summary = behavioral_summary(&behavior, "u", &Utc);
        let expected = u64::MAX as f64 / MS_PER_MINUTE;
        assert!(summary.average_session_minutes.is_finite());
        assert!((summary.average_session_minutes - expected).abs() / expected < 1e-9);
    }

    #[test]
    fn weekly_series_at_calendar_edge_is_empty() {
        let tasks = Fixtures::seed().unwrap().tasks;
        let edge = NaiveDate::MAX.and_hms_opt(12, 0, 0).unwrap().and_utc();
        let series = weekly_series(&tasks, "user-2", &edge, WeekStart::Sunday);
        assert_eq!(series.total(), 0);
    }

    #[test]
    fn empty_behavior_summary_is_zeroed() {
        let summary = behavioral_summary(&[], "nobody", &Utc);
        assert_eq!(summary.total_sessions, 0);
        assert_eq!(summary.average_session_minutes, 0.0);
        assert_eq!(summary.most_active_hour, None);
        assert_eq!(summary.first_activity_hour, None);
    }

    #[test]
    fn breakdown_scopes_to_project() {
        let tasks = Fixtures::seed().unwrap().tasks;
        let all = status_breakdown(&tasks, "user-3", None);
        assert_eq!(all.total_tasks, 2);
        assert_eq!(all.completion_rate, 0.0);
        assert_eq!(all.total_estimated_hours, 28.0);

        let scoped = status_breakdown(&tasks, "user-2", Some("project-1"));
        assert_eq!(scoped.done, 1);
        assert_eq!(scoped.in_progress, 1);
        assert_eq!(scoped.completion_rate, 50.0);
        assert_eq!(scoped.total_actual_hours, 8.0);
    }
}
