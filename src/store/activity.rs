//! Append-only side collections: comments, activity logs and behavioral data.

use super::{RecordStore, new_id, now};
use crate::error::StoreError;
use crate::types::{ActivityLog, BehaviorAction, BehavioralData, Comment};
use serde_json::Value;
use tracing::debug;

impl RecordStore {
    /// Append a comment by `actor` on a task.
    ///
    /// Blank content is ignored and returns `Ok(None)`. A stored comment is
    /// accompanied by a `comment` activity log and behavioral entry.
    pub fn add_comment(
        &mut self,
        actor: &str,
        task_id: &str,
        content: &str,
    ) -> Result<Option<Comment>, StoreError> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }
        if self.task(task_id).is_none() {
            return Err(StoreError::TaskNotFound(task_id.to_string()));
        }

        let comment = Comment {
            id: new_id("comment"),
            task_id: task_id.to_string(),
            user_id: actor.to_string(),
            content: content.to_string(),
            created_at: now(),
        };
        self.comments.push(comment.clone());
        self.add_activity_log(actor, task_id, "comment", "Added a comment", None);
        self.track_behavior(actor, task_id, BehaviorAction::Comment, None);

        debug!(task_id, comment_id = %comment.id, "Comment added");
        Ok(Some(comment))
    }

    /// Append an informational activity entry.
    pub fn add_activity_log(
        &mut self,
        actor: &str,
        task_id: &str,
        action: &str,
        description: &str,
        metadata: Option<Value>,
    ) -> ActivityLog {
        let log = ActivityLog {
            id: new_id("log"),
            task_id: task_id.to_string(),
            user_id: actor.to_string(),
            action: action.to_string(),
            description: description.to_string(),
            timestamp: now(),
            metadata,
        };
        self.activity_logs.push(log.clone());
        log
    }

    /// Record a user interaction for analytics.
    pub fn track_behavior(
        &mut self,
        actor: &str,
        task_id: &str,
        action: BehaviorAction,
        duration_ms: Option<u64>,
    ) -> BehavioralData {
        let entry = BehavioralData {
            user_id: actor.to_string(),
            task_id: task_id.to_string(),
            action,
            timestamp: now(),
            duration_ms,
            metadata: None,
        };
        self.behavioral_data.push(entry.clone());
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixtures;

    fn seeded() -> RecordStore {
        RecordStore::from_fixtures(Fixtures::seed().unwrap())
    }

    #[test]
    fn whitespace_comment_is_ignored() {
        let mut store = seeded();
        let comments = store.comments().len();
        let logs = store.activity_logs().len();

        assert_eq!(store.add_comment("user-1", "task-1", "   \n\t").unwrap(), None);
        assert_eq!(store.comments().len(), comments);
        assert_eq!(store.activity_logs().len(), logs);
    }

    #[test]
    fn comment_appends_correlated_entries() {
        let mut store = seeded();
        let comment = store
            .add_comment("user-3", "task-1", "  Wireframes uploaded  ")
            .unwrap()
            .unwrap();

        assert_eq!(comment.content, "Wireframes uploaded");
        assert_eq!(comment.user_id, "user-3");

        let log = store.activity_logs().last().unwrap();
        assert_eq!(log.action, "comment");
        assert_eq!(log.task_id, "task-1");

        let behavior = store.behavioral_data().last().unwrap();
        assert_eq!(behavior.action, BehaviorAction::Comment);
        assert_eq!(behavior.user_id, "user-3");
        assert!(behavior.duration_ms.is_none());
    }

    #[test]
    fn comment_on_unknown_task_fails() {
        let mut store = seeded();
        assert_eq!(
            store.add_comment("user-1", "task-404", "hello"),
            Err(StoreError::TaskNotFound("task-404".into()))
        );
    }

    #[test]
    fn track_behavior_keeps_duration() {
        let mut store = seeded();
        let entry = store.track_behavior("user-4", "task-6", BehaviorAction::View, Some(90_000));
        assert_eq!(entry.duration_ms, Some(90_000));
        assert_eq!(store.behavior_for("user-4").len(), 2);
    }
}
