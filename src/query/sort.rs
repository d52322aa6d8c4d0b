//! Stable single-key ordering of task lists.

use crate::types::Task;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Attribute a list is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    DueDate,
    Priority,
    Status,
    Created,
    Updated,
}

impl SortKey {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "due_date" | "duedate" | "due" => Some(SortKey::DueDate),
            "priority" => Some(SortKey::Priority),
            "status" => Some(SortKey::Status),
            "created" | "created_at" => Some(SortKey::Created),
            "updated" | "updated_at" => Some(SortKey::Updated),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::DueDate => "due_date",
            SortKey::Priority => "priority",
            SortKey::Status => "status",
            SortKey::Created => "created",
            SortKey::Updated => "updated",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Asc),
            "desc" | "descending" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    /// The opposite direction; selecting the active key again flips it.
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// A sort key with its direction. Defaults to due date, ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskSort {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl TaskSort {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    pub fn asc(key: SortKey) -> Self {
        Self::new(key, SortDirection::Asc)
    }

    pub fn desc(key: SortKey) -> Self {
        Self::new(key, SortDirection::Desc)
    }

    /// Next sort after the user picks `key`: same key flips the direction,
    /// a different key starts ascending.
    pub fn select(self, key: SortKey) -> Self {
        if self.key == key {
            Self::new(key, self.direction.toggled())
        } else {
            Self::asc(key)
        }
    }

    /// Ascending comparison for the active key.
    ///
    /// Missing due dates compare as +infinity. Priority ascends from the
    /// most urgent, so an ascending list starts with `urgent` tasks.
    fn compare(&self, a: &Task, b: &Task) -> Ordering {
        match self.key {
            SortKey::DueDate => match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
            SortKey::Priority => b.priority.rank().cmp(&a.priority.rank()),
            SortKey::Status => a.status.rank().cmp(&b.status.rank()),
            SortKey::Created => a.created_at.cmp(&b.created_at),
            SortKey::Updated => a.updated_at.cmp(&b.updated_at),
        }
    }
}

/// Sort in place. `sort_by` is stable, and descending order reverses the
/// comparison rather than the output, so equal tasks keep their input order
/// in both directions.
pub fn sort_tasks(tasks: &mut [Task], sort: TaskSort) {
    tasks.sort_by(|a, b| match sort.direction {
        SortDirection::Asc => sort.compare(a, b),
        SortDirection::Desc => sort.compare(b, a),
    });
}
