//! Task query engine: filtering, sorting and grouping for the list, board
//! and calendar views.

pub mod board;
pub mod calendar;
pub mod sort;

pub use board::{BoardFilter, StatusColumns, group_by_status};
pub use calendar::{CalendarDay, WeekStart, calendar_month, tasks_due_on};
pub use sort::{SortDirection, SortKey, TaskSort, sort_tasks};

use crate::types::{Project, Task, TaskPriority, TaskStatus};
use serde::{Deserialize, Serialize};

/// Conjunctive list filter. `None` means "all" for that attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    /// Case-insensitive substring matched against title or description.
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub assignee_id: Option<String>,
}

impl TaskFilter {
    /// Whether a task passes every active predicate. The project check is
    /// separate; see [`query_tasks`].
    pub fn matches(&self, task: &Task) -> bool {
        let term = self.search.trim();
        if !term.is_empty() {
            let needle = term.to_lowercase();
            if !task.title.to_lowercase().contains(&needle)
                && !task.description.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        if self.status.is_some_and(|s| task.status != s) {
            return false;
        }
        if self.priority.is_some_and(|p| task.priority != p) {
            return false;
        }
        if let Some(ref assignee) = self.assignee_id {
            if &task.assignee_id != assignee {
                return false;
            }
        }
        true
    }
}

/// Filter the tasks of one project and sort them.
///
/// With no project selected the result is empty. The input order is the
/// tie-breaker for the (stable) sort.
pub fn query_tasks(
    tasks: &[Task],
    project_id: Option<&str>,
    filter: &TaskFilter,
    sort: TaskSort,
) -> Vec<Task> {
    let Some(project_id) = project_id else {
        return Vec::new();
    };
    let mut result: Vec<Task> = tasks
        .iter()
        .filter(|t| t.project_id == project_id && filter.matches(t))
        .cloned()
        .collect();
    sort_tasks(&mut result, sort);
    result
}

/// Projects a user may open: those they belong to or run.
pub fn visible_projects<'a>(projects: &'a [Project], user_id: &str) -> Vec<&'a Project> {
    projects.iter().filter(|p| p.is_visible_to(user_id)).collect()
}
