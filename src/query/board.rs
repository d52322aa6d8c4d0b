//! Kanban column grouping.

use super::TaskFilter;
use crate::types::{Task, TaskPriority, TaskStatus};
use serde::{Deserialize, Serialize};

/// The board view only filters by assignee and priority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardFilter {
    #[serde(default)]
    pub assignee_id: Option<String>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
}

impl From<BoardFilter> for TaskFilter {
    fn from(filter: BoardFilter) -> Self {
        TaskFilter {
            assignee_id: filter.assignee_id,
            priority: filter.priority,
            ..Default::default()
        }
    }
}

/// Tasks split into the four fixed status columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusColumns {
    pub todo: Vec<Task>,
    pub in_progress: Vec<Task>,
    pub review: Vec<Task>,
    pub done: Vec<Task>,
}

impl StatusColumns {
    pub fn column(&self, status: TaskStatus) -> &[Task] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::Review => &self.review,
            TaskStatus::Done => &self.done,
        }
    }

    fn column_mut(&mut self, status: TaskStatus) -> &mut Vec<Task> {
        match status {
            TaskStatus::Todo => &mut self.todo,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::Review => &mut self.review,
            TaskStatus::Done => &mut self.done,
        }
    }

    /// Columns in board order with their status.
    pub fn iter(&self) -> impl Iterator<Item = (TaskStatus, &[Task])> {
        TaskStatus::ALL.into_iter().map(|s| (s, self.column(s)))
    }

    pub fn len(&self) -> usize {
        self.iter().map(|(_, tasks)| tasks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bucket tasks by status, keeping their relative order within each column.
pub fn group_by_status<'a, I>(tasks: I) -> StatusColumns
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut columns = StatusColumns::default();
    for task in tasks {
        columns.column_mut(task.status).push(task.clone());
    }
    columns
}
