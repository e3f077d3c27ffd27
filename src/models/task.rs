use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TaskError;
use crate::models::{Attachment, Comment, User};

/// Board column a task sits in. The variant order is the column order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "Work In Progress")]
    WorkInProgress,
    #[serde(rename = "Under Review")]
    UnderReview,
    #[serde(rename = "Completed")]
    Completed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::ToDo,
        TaskStatus::WorkInProgress,
        TaskStatus::UnderReview,
        TaskStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::WorkInProgress => "Work In Progress",
            TaskStatus::UnderReview => "Under Review",
            TaskStatus::Completed => "Completed",
        }
    }

    /// Position of the column on the board.
    pub fn column_index(&self) -> usize {
        match self {
            TaskStatus::ToDo => 0,
            TaskStatus::WorkInProgress => 1,
            TaskStatus::UnderReview => 2,
            TaskStatus::Completed => 3,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TaskError;

    /// Guarded parse of a status as sent over the wire.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == trimmed)
            .ok_or_else(|| TaskError::validation(format!("unknown task status: {:?}", raw)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
    Backlog,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::Urgent,
        Priority::High,
        Priority::Medium,
        Priority::Low,
        Priority::Backlog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "Urgent",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
            Priority::Backlog => "Backlog",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TaskError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        Priority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == trimmed)
            .ok_or_else(|| TaskError::validation(format!("unknown task priority: {:?}", raw)))
    }
}

/// The persisted task record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Option<Priority>,
    /// Comma-delimited, see [`split_tags`].
    pub tags: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub points: Option<i32>,
    pub project_id: String,
    pub author_user_id: String,
    pub assigned_user_id: Option<String>,
}

impl Task {
    pub fn tag_list(&self) -> Vec<String> {
        self.tags.as_deref().map(split_tags).unwrap_or_default()
    }
}

/// A task as the board consumes it, with its relations joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub author: Option<User>,
    pub assignee: Option<User>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl TaskDetail {
    /// A freshly created task has no comments or attachments yet.
    pub fn bare(task: Task) -> Self {
        TaskDetail {
            task,
            author: None,
            assignee: None,
            comments: Vec::new(),
            attachments: Vec::new(),
        }
    }
}

/// POST /tasks payload. Status and priority arrive as plain strings and are
/// parsed by the service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub tags: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub points: Option<i32>,
    pub project_id: String,
    pub author_user_id: String,
    pub assigned_user_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTaskStatusRequest {
    pub status: String,
}

/// Splits a stored tag string into its display set: order kept, entries
/// trimmed, empty entries dropped.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

/// Canonical stored form of a tag string. `None` when no tags remain.
pub fn normalize_tags(raw: &str) -> Option<String> {
    let tags = split_tags(raw);
    if tags.is_empty() {
        None
    } else {
        Some(tags.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parse_accepts_only_closed_set() {
        assert_eq!("To Do".parse::<TaskStatus>().unwrap(), TaskStatus::ToDo);
        assert_eq!(
            " Work In Progress ".parse::<TaskStatus>().unwrap(),
            TaskStatus::WorkInProgress
        );
        assert_eq!("Completed".parse::<TaskStatus>().unwrap(), TaskStatus::Completed);

        for bad in ["", "done", "to do", "Blocked", "COMPLETED"] {
            let err = bad.parse::<TaskStatus>().unwrap_err();
            assert_eq!(err.kind(), "ValidationError", "accepted {:?}", bad);
        }
    }

    #[test]
    fn status_serializes_as_column_label() {
        let json = serde_json::to_string(&TaskStatus::UnderReview).unwrap();
        assert_eq!(json, "\"Under Review\"");
        let back: TaskStatus = serde_json::from_str("\"Work In Progress\"").unwrap();
        assert_eq!(back, TaskStatus::WorkInProgress);
    }

    #[test]
    fn column_order_is_fixed() {
        let labels: Vec<&str> = TaskStatus::ALL.iter().map(|s| s.as_str()).collect();
        assert_eq!(labels, ["To Do", "Work In Progress", "Under Review", "Completed"]);
        for (idx, status) in TaskStatus::ALL.iter().enumerate() {
            assert_eq!(status.column_index(), idx);
        }
    }

    #[test]
    fn priority_parse() {
        assert_eq!("Backlog".parse::<Priority>().unwrap(), Priority::Backlog);
        assert!("Critical".parse::<Priority>().is_err());
    }

    #[test]
    fn split_tags_trims_and_drops_empty_entries() {
        assert_eq!(split_tags("backend,urgent, ui"), ["backend", "urgent", "ui"]);
        assert_eq!(split_tags("backend,urgent, ui,"), ["backend", "urgent", "ui"]);
        assert!(split_tags("").is_empty());
        assert!(split_tags(" , ").is_empty());
    }

    #[test]
    fn normalize_tags_joins_without_spaces() {
        assert_eq!(normalize_tags(" a , b,,c ").as_deref(), Some("a,b,c"));
        assert_eq!(normalize_tags(","), None);
    }

    #[test]
    fn task_detail_flattens_task_fields() {
        let detail = TaskDetail::bare(Task {
            id: "t1".into(),
            title: "Write docs".into(),
            description: None,
            status: TaskStatus::ToDo,
            priority: Some(Priority::High),
            tags: Some("docs".into()),
            start_date: None,
            due_date: None,
            points: Some(3),
            project_id: "p1".into(),
            author_user_id: "u1".into(),
            assigned_user_id: None,
        });
        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["id"], "t1");
        assert_eq!(value["status"], "To Do");
        assert_eq!(value["projectId"], "p1");
        assert_eq!(value["comments"], serde_json::json!([]));
    }
}
