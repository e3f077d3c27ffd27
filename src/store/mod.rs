// src/store/mod.rs

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::models::{
    Attachment, Comment, Project, ProjectTeam, Task, TaskAssignment, TaskDetail, TaskStatus, Team,
    User,
};

/// Persistence seam for the task tracker.
///
/// Implementations enforce referential integrity on every insert: a row whose
/// foreign keys point at missing rows is rejected with `TaskError::NotFound`,
/// never stored with the reference dropped. Deleting a project cascades to its
/// tasks (and their comments, attachments and assignments) and to its team
/// links. Deleting a task cascades to its comments, attachments and
/// assignments.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>, TaskError>;

    async fn get_project(&self, project_id: &str) -> Result<Option<Project>, TaskError>;

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, TaskError>;

    async fn get_task(&self, task_id: &str) -> Result<Option<Task>, TaskError>;

    async fn insert_project(&self, project: &Project) -> Result<(), TaskError>;

    async fn insert_team(&self, team: &Team) -> Result<(), TaskError>;

    /// Rejects a user whose `team_id` names a missing team.
    async fn insert_user(&self, user: &User) -> Result<(), TaskError>;

    /// Rejects a task whose project, author or assignee does not exist.
    async fn insert_task(&self, task: &Task) -> Result<(), TaskError>;

    async fn insert_comment(&self, comment: &Comment) -> Result<(), TaskError>;

    async fn insert_attachment(&self, attachment: &Attachment) -> Result<(), TaskError>;

    async fn insert_task_assignment(&self, assignment: &TaskAssignment) -> Result<(), TaskError>;

    async fn insert_project_team(&self, link: &ProjectTeam) -> Result<(), TaskError>;

    /// All tasks of a project in insertion order, each joined with author,
    /// assignee, comments and attachments. Does not check the project exists.
    async fn list_task_details(&self, project_id: &str) -> Result<Vec<TaskDetail>, TaskError>;

    /// Replaces the status of one task as a single atomic write and returns
    /// the updated record, or `None` when the task does not exist.
    async fn set_task_status(
        &self,
        task_id: &str,
        status: TaskStatus,
    ) -> Result<Option<Task>, TaskError>;

    /// Returns `false` when there was no such task.
    async fn delete_task(&self, task_id: &str) -> Result<bool, TaskError>;

    /// Returns `false` when there was no such project.
    async fn delete_project(&self, project_id: &str) -> Result<bool, TaskError>;

    /// Releases backend resources. Called once on shutdown.
    async fn shutdown(&self) {}
}

/// Joins already-fetched rows into board records, keeping task order.
/// Comments and attachments keep their fetch order within each task.
pub(crate) fn assemble_details(
    tasks: Vec<Task>,
    users: Vec<User>,
    comments: Vec<Comment>,
    attachments: Vec<Attachment>,
) -> Vec<TaskDetail> {
    let users: HashMap<String, User> = users.into_iter().map(|u| (u.id.clone(), u)).collect();

    let mut comments_by_task: HashMap<String, Vec<Comment>> = HashMap::new();
    for comment in comments {
        comments_by_task
            .entry(comment.task_id.clone())
            .or_default()
            .push(comment);
    }

    let mut attachments_by_task: HashMap<String, Vec<Attachment>> = HashMap::new();
    for attachment in attachments {
        attachments_by_task
            .entry(attachment.task_id.clone())
            .or_default()
            .push(attachment);
    }

    tasks
        .into_iter()
        .map(|task| {
            let author = users.get(&task.author_user_id).cloned();
            let assignee = task
                .assigned_user_id
                .as_ref()
                .and_then(|id| users.get(id))
                .cloned();
            let comments = comments_by_task.remove(&task.id).unwrap_or_default();
            let attachments = attachments_by_task.remove(&task.id).unwrap_or_default();
            TaskDetail {
                task,
                author,
                assignee,
                comments,
                attachments,
            }
        })
        .collect()
}

/// Ids of every user a task list refers to, without duplicates.
pub(crate) fn referenced_user_ids(tasks: &[Task]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for task in tasks {
        for id in std::iter::once(&task.author_user_id).chain(task.assigned_user_id.as_ref()) {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
    }
    ids
}
