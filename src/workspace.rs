//! The signed-in view over a record store.
//!
//! [`Workspace`] owns the [`RecordStore`], the active user, the selected
//! project and the session persistence. Every user-facing action goes
//! through here so actions are always attributed to the active user.

use crate::error::StoreError;
use crate::metrics::{self, BehavioralSummary, ProductivityMetrics, StatusBreakdown};
use crate::query::{
    self, BoardFilter, CalendarDay, StatusColumns, TaskFilter, TaskSort, WeekStart,
};
use crate::session::SessionStore;
use crate::store::{RecordStore, TaskUpdate};
use crate::types::{
    ActivityLog, BehaviorAction, BehavioralData, Comment, NewTask, Project, Task, TaskPatch,
    TaskPriority, TaskStatus, User,
};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Everything the analytics dashboard shows for the active user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub productivity: ProductivityMetrics,
    pub behavior: BehavioralSummary,
    /// Scoped to the selected project when one is selected.
    pub breakdown: StatusBreakdown,
    pub hours_by_project: BTreeMap<String, f64>,
}

/// Task creation input from a signed-in user; the creator is implied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    /// Defaults to the creator.
    #[serde(default)]
    pub assignee_id: Option<String>,
    /// Defaults to the selected project.
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub struct Workspace {
    store: RecordStore,
    sessions: Box<dyn SessionStore>,
    user: Option<User>,
    selected_project: Option<String>,
    week_start: WeekStart,
}

impl Workspace {
    pub fn new(store: RecordStore, sessions: Box<dyn SessionStore>) -> Self {
        Self {
            store,
            sessions,
            user: None,
            selected_project: None,
            week_start: WeekStart::default(),
        }
    }

    pub fn with_week_start(mut self, week_start: WeekStart) -> Self {
        self.week_start = week_start;
        self
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn week_start(&self) -> WeekStart {
        self.week_start
    }

    /// Re-establish the persisted session, if any.
    ///
    /// A record that cannot be read, or whose user is no longer in the
    /// store, is discarded.
    pub fn restore_session(&mut self) -> Option<&User> {
        let stored = match self.sessions.load() {
            Ok(stored) => stored?,
            Err(e) => {
                warn!("Discarding unreadable session record: {}", e);
                self.clear_session();
                return None;
            }
        };

        match self.store.user(&stored.id).cloned() {
            Some(user) => {
                info!(user_id = %user.id, "Session restored");
                self.activate(user);
                self.user.as_ref()
            }
            None => {
                warn!(user_id = %stored.id, "Discarding session for unknown user");
                self.clear_session();
                None
            }
        }
    }

    /// Make `user` the active user and persist the session.
    pub fn sign_in(&mut self, user: User) {
        if let Err(e) = self.sessions.save(&user) {
            warn!("Failed to persist session: {}", e);
        }
        self.activate(user);
    }

    /// Drop the active user, the selection and the persisted session.
    pub fn logout(&mut self) {
        if let Some(user) = self.user.take() {
            info!(user_id = %user.id, "Signed out");
        }
        self.selected_project = None;
        self.clear_session();
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.selected_project
            .as_deref()
            .and_then(|id| self.store.project(id))
    }

    /// Select a project the active user can see, or clear the selection.
    pub fn set_selected_project(&mut self, project_id: Option<&str>) -> Result<(), StoreError> {
        let user_id = self.require_user()?.id.clone();
        match project_id {
            None => self.selected_project = None,
            Some(id) => {
                self.require_visible_project(&user_id, id)?;
                self.selected_project = Some(id.to_string());
            }
        }
        Ok(())
    }

    pub fn visible_projects(&self) -> Result<Vec<&Project>, StoreError> {
        let user = self.require_user()?;
        Ok(query::visible_projects(self.store.projects(), &user.id))
    }

    /// Filtered, sorted tasks of the selected project.
    pub fn visible_tasks(&self, filter: &TaskFilter, sort: TaskSort) -> Result<Vec<Task>, StoreError> {
        self.require_user()?;
        Ok(query::query_tasks(
            self.store.tasks(),
            self.selected_project.as_deref(),
            filter,
            sort,
        ))
    }

    /// Kanban columns for the selected project. Each column keeps store order.
    pub fn board(&self, filter: BoardFilter) -> Result<StatusColumns, StoreError> {
        self.require_user()?;
        let filter = TaskFilter::from(filter);
        let Some(project_id) = self.selected_project.as_deref() else {
            return Ok(StatusColumns::default());
        };
        Ok(query::group_by_status(
            self.store
                .tasks()
                .iter()
                .filter(|t| t.project_id == project_id && filter.matches(t)),
        ))
    }

    /// Month grid of the selected project's due dates; `None` for an
    /// invalid month.
    pub fn calendar<Tz: TimeZone>(
        &self,
        year: i32,
        month: u32,
        tz: &Tz,
    ) -> Result<Option<Vec<CalendarDay>>, StoreError> {
        self.require_user()?;
        let tasks: Vec<Task> = match self.selected_project.as_deref() {
            Some(project_id) => self
                .store
                .tasks()
                .iter()
                .filter(|t| t.project_id == project_id)
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        Ok(query::calendar_month(&tasks, year, month, self.week_start, tz))
    }

    /// Analytics for the active user as of `now`.
    pub fn analytics<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<AnalyticsReport, StoreError> {
        let user_id = self.require_user()?.id.as_str();
        let tasks = self.store.tasks();
        let behavior = self.store.behavioral_data();
        Ok(AnalyticsReport {
            productivity: metrics::compute_productivity(
                tasks,
                behavior,
                user_id,
                now,
                self.week_start,
            ),
            behavior: metrics::behavioral_summary(behavior, user_id, &now.timezone()),
            breakdown: metrics::status_breakdown(tasks, user_id, self.selected_project.as_deref()),
            hours_by_project: metrics::hours_by_project_for_user(tasks, user_id),
        })
    }

    /// Create a task as the active user.
    pub fn create_task(&mut self, draft: TaskDraft) -> Result<Task, StoreError> {
        let creator_id = self.require_user()?.id.clone();
        if draft.title.trim().is_empty() {
            return Err(StoreError::EmptyTitle);
        }
        let project_id = draft
            .project_id
            .or_else(|| self.selected_project.clone())
            .ok_or(StoreError::NoProjectSelected)?;
        self.require_visible_project(&creator_id, &project_id)?;

        self.store.create_task(NewTask {
            title: draft.title.trim().to_string(),
            description: draft.description,
            status: draft.status.unwrap_or(TaskStatus::Todo),
            priority: draft.priority.unwrap_or(TaskPriority::Medium),
            assignee_id: draft.assignee_id.unwrap_or_else(|| creator_id.clone()),
            creator_id,
            project_id,
            due_date: draft.due_date,
            estimated_hours: draft.estimated_hours,
            actual_hours: None,
            tags: draft.tags,
        })
    }

    /// Patch a task in a project the active user can see. Moving it is only
    /// allowed into another visible project.
    pub fn update_task(&mut self, task_id: &str, patch: TaskPatch) -> Result<TaskUpdate, StoreError> {
        let actor = self.require_user()?.id.clone();
        self.require_visible_task(&actor, task_id)?;
        if let Some(project_id) = patch.project_id.as_deref() {
            self.require_visible_project(&actor, project_id)?;
        }
        self.store.update_task(&actor, task_id, patch)
    }

    pub fn add_comment(&mut self, task_id: &str, content: &str) -> Result<Option<Comment>, StoreError> {
        let actor = self.require_user()?.id.clone();
        self.require_visible_task(&actor, task_id)?;
        self.store.add_comment(&actor, task_id, content)
    }

    pub fn add_activity_log(
        &mut self,
        task_id: &str,
        action: &str,
        description: &str,
    ) -> Result<ActivityLog, StoreError> {
        let actor = self.require_user()?.id.clone();
        self.require_visible_task(&actor, task_id)?;
        Ok(self
            .store
            .add_activity_log(&actor, task_id, action, description, None))
    }

    pub fn track_behavior(
        &mut self,
        task_id: &str,
        action: BehaviorAction,
        duration_ms: Option<u64>,
    ) -> Result<BehavioralData, StoreError> {
        let actor = self.require_user()?.id.clone();
        self.require_visible_task(&actor, task_id)?;
        Ok(self.store.track_behavior(&actor, task_id, action, duration_ms))
    }

    pub fn comments_for(&self, task_id: &str) -> Result<Vec<&Comment>, StoreError> {
        let user = self.require_user()?;
        self.require_visible_task(&user.id, task_id)?;
        Ok(self.store.comments_for(task_id))
    }

    pub fn activity_for(&self, task_id: &str) -> Result<Vec<&ActivityLog>, StoreError> {
        let user = self.require_user()?;
        self.require_visible_task(&user.id, task_id)?;
        Ok(self.store.activity_for(task_id))
    }

    fn activate(&mut self, user: User) {
        self.selected_project = query::visible_projects(self.store.projects(), &user.id)
            .first()
            .map(|p| p.id.clone());
        self.user = Some(user);
    }

    fn clear_session(&self) {
        if let Err(e) = self.sessions.clear() {
            warn!("Failed to clear session record: {}", e);
        }
    }

    fn require_user(&self) -> Result<&User, StoreError> {
        self.user.as_ref().ok_or(StoreError::NotSignedIn)
    }

    /// Tasks in projects the user cannot see are reported as missing.
    fn require_visible_task(&self, user_id: &str, task_id: &str) -> Result<&Task, StoreError> {
        self.store
            .task(task_id)
            .filter(|t| {
                self.store
                    .project(&t.project_id)
                    .is_some_and(|p| p.is_visible_to(user_id))
            })
            .ok_or_else(|| StoreError::TaskNotFound(task_id.to_string()))
    }

    fn require_visible_project(&self, user_id: &str, project_id: &str) -> Result<&Project, StoreError> {
        self.store
            .project(project_id)
            .filter(|p| p.is_visible_to(user_id))
            .ok_or_else(|| StoreError::ProjectNotFound(project_id.to_string()))
    }
}
