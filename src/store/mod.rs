//! In-memory record store.
//!
//! [`RecordStore`] exclusively owns every collection. Mutations go through
//! the entry points in [`tasks`] and [`activity`]; historical entries are
//! only ever appended.

pub mod activity;
pub mod tasks;

pub use tasks::TaskUpdate;

use crate::fixtures::Fixtures;
use crate::types::{ActivityLog, BehavioralData, Comment, Credential, Project, Task, User};
use chrono::{DateTime, Utc};

/// Owned container for all records of one workspace.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    users: Vec<User>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    comments: Vec<Comment>,
    activity_logs: Vec<ActivityLog>,
    behavioral_data: Vec<BehavioralData>,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from a fixture dataset. Credentials are not records and
    /// stay with the caller.
    pub fn from_fixtures(fixtures: Fixtures) -> Self {
        Self {
            users: fixtures.users,
            projects: fixtures.projects,
            tasks: fixtures.tasks,
            comments: fixtures.comments,
            activity_logs: fixtures.activity_logs,
            behavioral_data: fixtures.behavioral_data,
        }
    }

    /// Split a dataset into a seeded store and its credential table.
    pub fn seeded(fixtures: Fixtures) -> (Self, Vec<Credential>) {
        let credentials = fixtures.credentials.clone();
        (Self::from_fixtures(fixtures), credentials)
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn user(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == user_id)
    }

    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users.iter().find(|u| u.email == email)
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project(&self, project_id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == project_id)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn activity_logs(&self) -> &[ActivityLog] {
        &self.activity_logs
    }

    pub fn behavioral_data(&self) -> &[BehavioralData] {
        &self.behavioral_data
    }

    /// Comments on a task, oldest first.
    pub fn comments_for(&self, task_id: &str) -> Vec<&Comment> {
        self.comments.iter().filter(|c| c.task_id == task_id).collect()
    }

    /// Activity entries for a task, in append order.
    pub fn activity_for(&self, task_id: &str) -> Vec<&ActivityLog> {
        self.activity_logs
            .iter()
            .filter(|l| l.task_id == task_id)
            .collect()
    }

    /// Behavioral entries recorded for a user, in append order.
    pub fn behavior_for(&self, user_id: &str) -> Vec<&BehavioralData> {
        self.behavioral_data
            .iter()
            .filter(|b| b.user_id == user_id)
            .collect()
    }
}

/// Current timestamp used for every mutation.
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Fresh identity for a new record, e.g. `task-3f2a…`.
pub fn new_id(kind: &str) -> String {
    format!("{}-{}", kind, uuid::Uuid::new_v4().simple())
}
