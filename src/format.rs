//! Output formatting utilities for markdown and JSON.

use crate::query::{CalendarDay, StatusColumns};
use crate::types::{Project, Task, TaskPriority, User};
use crate::workspace::AnalyticsReport;
use chrono::{Datelike, Weekday};
use clap::ValueEnum;
use serde::Serialize;

/// Output format for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    Json,
    #[default]
    Markdown,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

/// Pretty JSON, falling back to an error object if serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

/// Format a task list as markdown, in the given order.
pub fn format_tasks_markdown(tasks: &[Task]) -> String {
    let mut md = format!("# Tasks ({})\n\n", tasks.len());
    for task in tasks {
        md.push_str(&format_task_short(task));
    }
    md
}

fn format_task_short(task: &Task) -> String {
    let priority_marker = match task.priority {
        TaskPriority::Urgent => "!!! ",
        TaskPriority::High => "!! ",
        TaskPriority::Medium | TaskPriority::Low => "",
    };

    let due = task
        .due_date
        .map(|d| format!(" (due {})", d.format("%Y-%m-%d")))
        .unwrap_or_default();

    format!(
        "- {}{} `{}` [{}] @{}{}\n",
        priority_marker, task.title, task.id, task.status, task.assignee_id, due,
    )
}

/// Format kanban columns as markdown, one section per status.
pub fn format_board_markdown(columns: &StatusColumns) -> String {
    let mut md = String::new();
    for (status, tasks) in columns.iter() {
        md.push_str(&format!("## {} ({})\n\n", status.label(), tasks.len()));
        for task in tasks {
            md.push_str(&format_task_short(task));
        }
        md.push('\n');
    }
    md
}

/// Format projects, marking the selected one.
pub fn format_projects_markdown(projects: &[&Project], selected: Option<&str>) -> String {
    let mut md = format!("# Projects ({})\n\n", projects.len());
    for project in projects {
        let marker = if Some(project.id.as_str()) == selected {
            " (selected)"
        } else {
            ""
        };
        md.push_str(&format!(
            "- **{}** `{}`{}: {}\n",
            project.name, project.id, marker, project.description
        ));
    }
    md
}

pub fn format_user_markdown(user: &User) -> String {
    format!(
        "{} <{}> `{}` ({:?})\n",
        user.name, user.email, user.id, user.role
    )
}

/// Format a month grid as a week-per-row table.
pub fn format_calendar_markdown(days: &[CalendarDay]) -> String {
    let mut md = String::new();
    let Some(first) = days.first() else {
        return md;
    };

    let header: Vec<&str> = (0..7)
        .map(|i| weekday_abbrev(first.date.weekday(), i))
        .collect();
    md.push_str(&format!("| {} |\n", header.join(" | ")));
    md.push_str(&format!("|{}\n", "---|".repeat(7)));

    for week in days.chunks(7) {
        let cells: Vec<String> = week
            .iter()
            .map(|day| {
                let label = if day.in_month {
                    day.date.day().to_string()
                } else {
                    format!("_{}_", day.date.day())
                };
                if day.task_ids.is_empty() {
                    label
                } else {
                    format!("{} ({})", label, day.task_ids.join(", "))
                }
            })
            .collect();
        md.push_str(&format!("| {} |\n", cells.join(" | ")));
    }
    md
}

fn weekday_abbrev(start: Weekday, offset: u32) -> &'static str {
    let mut day = start;
    for _ in 0..offset {
        day = day.succ();
    }
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Format the analytics report as markdown.
pub fn format_metrics_markdown(report: &AnalyticsReport) -> String {
    let p = &report.productivity;
    let mut md = String::from("# Productivity\n\n");

    md.push_str(&format!("- **tasks**: {}\n", p.total_tasks));
    md.push_str(&format!("- **completed**: {}\n", p.completed_tasks));
    md.push_str(&format!("- **completed today**: {}\n", p.tasks_completed_today));
    md.push_str(&format!(
        "- **avg completion**: {:.1}h\n",
        p.average_completion_time
    ));
    match p.most_productive_hour {
        Some(hour) => md.push_str(&format!("- **most productive hour**: {:02}:00\n", hour)),
        None => md.push_str("- **most productive hour**: n/a\n"),
    }

    md.push_str("\n## This week\n\n");
    for (day, count) in p.productivity_trend.days.iter().zip(p.productivity_trend.counts) {
        md.push_str(&format!("- {}: {}\n", day.format("%a %Y-%m-%d"), count));
    }

    let b = &report.breakdown;
    md.push_str("\n## Status\n\n");
    md.push_str(&format!(
        "- todo {} / in progress {} / review {} / done {}\n",
        b.todo, b.in_progress, b.review, b.done
    ));
    md.push_str(&format!("- **completion rate**: {:.0}%\n", b.completion_rate));
    md.push_str(&format!(
        "- **hours**: {} estimated, {} actual\n",
        b.total_estimated_hours, b.total_actual_hours
    ));

    md.push_str("\n## Time by project\n\n");
    for (project, hours) in &p.time_spent_by_project {
        md.push_str(&format!("- `{}`: {}h\n", project, hours));
    }

    let s = &report.behavior;
    md.push_str("\n## Activity\n\n");
    md.push_str(&format!("- **sessions**: {}\n", s.total_sessions));
    md.push_str(&format!(
        "- **avg session**: {:.1} min\n",
        s.average_session_minutes
    ));
    for (action, count) in &s.action_counts {
        md.push_str(&format!("- {}: {}\n", action.as_str(), count));
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixtures;
    use crate::query::{WeekStart, calendar_month, group_by_status};
    use chrono::Utc;

    #[test]
    fn board_lists_every_column() {
        let tasks = Fixtures::seed().unwrap().tasks;
        let md = format_board_markdown(&group_by_status(&tasks));
        assert!(md.contains("## To Do (2)"));
        assert!(md.contains("## In Progress (2)"));
        assert!(md.contains("## Done (1)"));
        assert!(md.contains("!!! Implement user authentication"));
    }

    #[test]
    fn calendar_header_follows_week_start() {
        let days = calendar_month(&[], 2024, 12, WeekStart::Monday, &Utc).unwrap();
        let md = format_calendar_markdown(&days);
        assert!(md.starts_with("| Mon | Tue |"));
        assert!(md.contains("_25_"));
    }

    #[test]
    fn parses_format_names() {
        assert_eq!(OutputFormat::from_str("MD"), Some(OutputFormat::Markdown));
        assert_eq!(OutputFormat::from_str("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("html"), None);
    }
}
