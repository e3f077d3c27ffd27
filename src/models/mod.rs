pub mod task;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use task::{CreateTaskRequest, Priority, Task, TaskDetail, TaskStatus, UpdateTaskStatusRequest};

/// A project owns tasks and is linked to teams through `ProjectTeam`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub team_name: String,
    pub product_owner_user_id: Option<String>,
    pub project_manager_user_id: Option<String>,
}

/// Users are referenced by tasks as author and assignee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub profile_picture_url: Option<String>,
    pub team_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub task_id: String,
    pub user_id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub task_id: String,
    pub uploaded_by_id: String,
    #[serde(rename = "fileURL")]
    pub file_url: String,
    pub file_name: Option<String>,
}

/// Join row for users associated with a task beyond the single assignee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskAssignment {
    pub id: String,
    pub task_id: String,
    pub user_id: String,
}

/// Join row between a project and a team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTeam {
    pub id: String,
    pub project_id: String,
    pub team_id: String,
}
