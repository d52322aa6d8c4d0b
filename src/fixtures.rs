//! Bootstrap dataset loading.
//!
//! The record store is seeded from a [`Fixtures`] value. The default dataset
//! is embedded at build time from `fixtures/seed.yaml`; any other YAML or
//! JSON file with the same shape can be swapped in.

use crate::error::FixtureError;
use crate::types::{ActivityLog, BehavioralData, Comment, Credential, Project, Task, User};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Embedded default dataset.
const SEED_YAML: &str = include_str!("../fixtures/seed.yaml");

/// Every collection the record store is seeded with, plus the credential table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub activity_logs: Vec<ActivityLog>,
    #[serde(default)]
    pub behavioral_data: Vec<BehavioralData>,
    #[serde(default)]
    pub credentials: Vec<Credential>,
}

impl Fixtures {
    /// The embedded demo dataset.
    pub fn seed() -> Result<Self, FixtureError> {
        Self::from_yaml(SEED_YAML)
    }

    pub fn from_yaml(content: &str) -> Result<Self, FixtureError> {
        let fixtures: Fixtures = serde_yaml::from_str(content)?;
        fixtures.validate()?;
        Ok(fixtures)
    }

    pub fn from_json(content: &str) -> Result<Self, FixtureError> {
        let fixtures: Fixtures = serde_json::from_str(content)?;
        fixtures.validate()?;
        Ok(fixtures)
    }

    /// Load a dataset from disk. `.json` files are parsed as JSON, anything
    /// else as YAML.
    pub fn from_file(path: &Path) -> Result<Self, FixtureError> {
        let content = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loading fixtures");
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Load from `path` when given, otherwise the embedded dataset.
    pub fn load(path: Option<&Path>) -> Result<Self, FixtureError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::seed(),
        }
    }

    /// Check referential integrity of the dataset.
    ///
    /// Ids and emails are unique, project members are unique and known, and
    /// every task, comment and log points at records that exist.
    pub fn validate(&self) -> Result<(), FixtureError> {
        let mut user_ids = HashSet::new();
        let mut emails = HashSet::new();
        for user in &self.users {
            if !user_ids.insert(user.id.as_str()) {
                return Err(integrity(format!("duplicate user id '{}'", user.id)));
            }
            if !emails.insert(user.email.to_lowercase()) {
                return Err(integrity(format!("duplicate email '{}'", user.email)));
            }
        }

        let mut project_ids = HashSet::new();
        for project in &self.projects {
            if !project_ids.insert(project.id.as_str()) {
                return Err(integrity(format!("duplicate project id '{}'", project.id)));
            }
            if !user_ids.contains(project.scrum_master_id.as_str()) {
                return Err(integrity(format!(
                    "project '{}' has unknown scrum master '{}'",
                    project.id, project.scrum_master_id
                )));
            }
            let mut members = HashSet::new();
            for member in &project.member_ids {
                if !members.insert(member.as_str()) {
                    return Err(integrity(format!(
                        "project '{}' lists member '{}' twice",
                        project.id, member
                    )));
                }
                if !user_ids.contains(member.as_str()) {
                    return Err(integrity(format!(
                        "project '{}' has unknown member '{}'",
                        project.id, member
                    )));
                }
            }
        }

        let mut task_ids = HashSet::new();
        for task in &self.tasks {
            if !task_ids.insert(task.id.as_str()) {
                return Err(integrity(format!("duplicate task id '{}'", task.id)));
            }
            if !project_ids.contains(task.project_id.as_str()) {
                return Err(integrity(format!(
                    "task '{}' references unknown project '{}'",
                    task.id, task.project_id
                )));
            }
            for user in [&task.assignee_id, &task.creator_id] {
                if !user_ids.contains(user.as_str()) {
                    return Err(integrity(format!(
                        "task '{}' references unknown user '{}'",
                        task.id, user
                    )));
                }
            }
            if !valid_hours(task.estimated_hours) || !valid_hours(task.actual_hours) {
                return Err(integrity(format!(
                    "task '{}' has negative or NaN hours",
                    task.id
                )));
            }
        }

        for comment in &self.comments {
            if !task_ids.contains(comment.task_id.as_str()) {
                return Err(integrity(format!(
                    "comment '{}' references unknown task '{}'",
                    comment.id, comment.task_id
                )));
            }
            if !user_ids.contains(comment.user_id.as_str()) {
                return Err(integrity(format!(
                    "comment '{}' references unknown user '{}'",
                    comment.id, comment.user_id
                )));
            }
        }
        for log in &self.activity_logs {
            if !task_ids.contains(log.task_id.as_str()) {
                return Err(integrity(format!(
                    "activity log '{}' references unknown task '{}'",
                    log.id, log.task_id
                )));
            }
            if !user_ids.contains(log.user_id.as_str()) {
                return Err(integrity(format!(
                    "activity log '{}' references unknown user '{}'",
                    log.id, log.user_id
                )));
            }
        }
        for entry in &self.behavioral_data {
            if !user_ids.contains(entry.user_id.as_str()) {
                return Err(integrity(format!(
                    "behavioral entry references unknown user '{}'",
                    entry.user_id
                )));
            }
            if !task_ids.contains(entry.task_id.as_str()) {
                return Err(integrity(format!(
                    "behavioral entry references unknown task '{}'",
                    entry.task_id
                )));
            }
        }

        Ok(())
    }
}

/// Same rule the store applies to patches.
fn valid_hours(hours: Option<f64>) -> bool {
    hours.is_none_or(|h| !h.is_nan() && h >= 0.0)
}

fn integrity(message: String) -> FixtureError {
    FixtureError::Integrity(message)
}
