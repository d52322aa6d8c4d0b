//! Task creation and partial updates.

use super::{RecordStore, new_id, now};
use crate::error::StoreError;
use crate::types::{BehaviorAction, NewTask, Task, TaskPatch, TaskStatus};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

/// Outcome of a successful [`RecordStore::update_task`].
#[derive(Debug, Clone, Serialize)]
pub struct TaskUpdate {
    /// The task after the patch was merged.
    pub task: Task,
    /// `(from, to)` when the patch moved the task to a different column.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_change: Option<(TaskStatus, TaskStatus)>,
}

impl RecordStore {
    /// Create a task with a fresh id and current timestamps.
    ///
    /// Project, assignee and creator must exist. Title content is the
    /// caller's concern.
    pub fn create_task(&mut self, new: NewTask) -> Result<Task, StoreError> {
        self.require_project(&new.project_id)?;
        self.require_user(&new.assignee_id)?;
        self.require_user(&new.creator_id)?;
        check_hours("estimated_hours", new.estimated_hours)?;
        check_hours("actual_hours", new.actual_hours)?;

        let now = now();
        let task = Task {
            id: new_id("task"),
            title: new.title,
            description: new.description,
            status: new.status,
            priority: new.priority,
            assignee_id: new.assignee_id,
            creator_id: new.creator_id,
            project_id: new.project_id,
            due_date: new.due_date,
            estimated_hours: new.estimated_hours,
            actual_hours: new.actual_hours,
            created_at: now,
            updated_at: now,
            tags: new.tags,
        };

        self.tasks.push(task.clone());
        let creator = task.creator_id.clone();
        self.add_activity_log(&creator, &task.id, "created", "Created the task", None);

        info!(task_id = %task.id, project_id = %task.project_id, "Task created");
        Ok(task)
    }

    /// Merge a patch into a task and refresh `updated_at`.
    ///
    /// The patch is validated in full before anything is written, so a
    /// rejected patch leaves the store untouched. A status change (new value
    /// differs from the current one) appends one activity log and one
    /// `status_change` behavioral entry attributed to `actor`.
    pub fn update_task(
        &mut self,
        actor: &str,
        task_id: &str,
        patch: TaskPatch,
    ) -> Result<TaskUpdate, StoreError> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == task_id)
            .ok_or_else(|| StoreError::TaskNotFound(task_id.to_string()))?;

        if let Some(ref project_id) = patch.project_id {
            self.require_project(project_id)?;
        }
        if let Some(ref assignee_id) = patch.assignee_id {
            self.require_user(assignee_id)?;
        }
        if let Some(hours) = patch.estimated_hours {
            check_hours("estimated_hours", hours)?;
        }
        if let Some(hours) = patch.actual_hours {
            check_hours("actual_hours", hours)?;
        }

        let task = &mut self.tasks[index];
        let previous_status = task.status;
        apply_patch(task, patch);
        task.updated_at = now();
        let task = task.clone();

        let status_change = (task.status != previous_status).then_some((previous_status, task.status));
        if let Some((from, to)) = status_change {
            self.add_activity_log(
                actor,
                task_id,
                "status_change",
                &format!("Changed status from \"{}\" to \"{}\"", from, to),
                Some(json!({ "from": from, "to": to })),
            );
            self.track_behavior(actor, task_id, BehaviorAction::StatusChange, None);
            info!(task_id, from = %from, to = %to, "Task status changed");
        } else {
            debug!(task_id, "Task updated");
        }

        Ok(TaskUpdate {
            task,
            status_change,
        })
    }

    fn require_project(&self, project_id: &str) -> Result<(), StoreError> {
        match self.project(project_id) {
            Some(_) => Ok(()),
            None => Err(StoreError::ProjectNotFound(project_id.to_string())),
        }
    }

    fn require_user(&self, user_id: &str) -> Result<(), StoreError> {
        match self.user(user_id) {
            Some(_) => Ok(()),
            None => Err(StoreError::UserNotFound(user_id.to_string())),
        }
    }
}

fn check_hours(field: &'static str, hours: Option<f64>) -> Result<(), StoreError> {
    match hours {
        Some(h) if h.is_nan() || h < 0.0 => Err(StoreError::InvalidHours { field }),
        _ => Ok(()),
    }
}

fn apply_patch(task: &mut Task, patch: TaskPatch) {
    if let Some(title) = patch.title {
        task.title = title;
    }
    if let Some(description) = patch.description {
        task.description = description;
    }
    if let Some(status) = patch.status {
        task.status = status;
    }
    if let Some(priority) = patch.priority {
        task.priority = priority;
    }
    if let Some(assignee_id) = patch.assignee_id {
        task.assignee_id = assignee_id;
    }
    if let Some(project_id) = patch.project_id {
        task.project_id = project_id;
    }
    if let Some(due_date) = patch.due_date {
        task.due_date = due_date;
    }
    if let Some(hours) = patch.estimated_hours {
        task.estimated_hours = hours;
    }
    if let Some(hours) = patch.actual_hours {
        task.actual_hours = hours;
    }
    if let Some(tags) = patch.tags {
        task.tags = tags;
    }
}
