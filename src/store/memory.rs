// src/store/memory.rs

use async_trait::async_trait;
use log::debug;
use tokio::sync::RwLock;

use super::{assemble_details, TaskStore};
use crate::error::TaskError;
use crate::models::{
    Attachment, Comment, Project, ProjectTeam, Task, TaskAssignment, TaskDetail, TaskStatus, Team,
    User,
};

#[derive(Default)]
struct Tables {
    projects: Vec<Project>,
    teams: Vec<Team>,
    users: Vec<User>,
    tasks: Vec<Task>,
    comments: Vec<Comment>,
    attachments: Vec<Attachment>,
    task_assignments: Vec<TaskAssignment>,
    project_teams: Vec<ProjectTeam>,
}

impl Tables {
    fn has_project(&self, id: &str) -> bool {
        self.projects.iter().any(|p| p.id == id)
    }

    fn has_team(&self, id: &str) -> bool {
        self.teams.iter().any(|t| t.id == id)
    }

    fn has_user(&self, id: &str) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    fn has_task(&self, id: &str) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    fn require_project(&self, id: &str) -> Result<(), TaskError> {
        if self.has_project(id) {
            Ok(())
        } else {
            Err(TaskError::not_found("project", id))
        }
    }

    fn require_user(&self, id: &str) -> Result<(), TaskError> {
        if self.has_user(id) {
            Ok(())
        } else {
            Err(TaskError::not_found("user", id))
        }
    }

    fn require_task(&self, id: &str) -> Result<(), TaskError> {
        if self.has_task(id) {
            Ok(())
        } else {
            Err(TaskError::not_found("task", id))
        }
    }

    /// Drops everything hanging off the given tasks, then the tasks.
    fn remove_tasks(&mut self, task_ids: &[String]) {
        self.comments.retain(|c| !task_ids.contains(&c.task_id));
        self.attachments.retain(|a| !task_ids.contains(&a.task_id));
        self.task_assignments.retain(|a| !task_ids.contains(&a.task_id));
        self.tasks.retain(|t| !task_ids.contains(&t.id));
    }
}

fn duplicate(entity: &str, id: &str) -> TaskError {
    TaskError::ConflictOrTransient(format!("duplicate {} id: {}", entity, id))
}

/// In-process store. Every operation takes the table lock once, so each
/// write is applied whole or not at all.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_projects(&self) -> Result<Vec<Project>, TaskError> {
        Ok(self.tables.read().await.projects.clone())
    }

    async fn get_project(&self, project_id: &str) -> Result<Option<Project>, TaskError> {
        let tables = self.tables.read().await;
        Ok(tables.projects.iter().find(|p| p.id == project_id).cloned())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, TaskError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn get_task(&self, task_id: &str) -> Result<Option<Task>, TaskError> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.iter().find(|t| t.id == task_id).cloned())
    }

    async fn insert_project(&self, project: &Project) -> Result<(), TaskError> {
        let mut tables = self.tables.write().await;
        if tables.has_project(&project.id) {
            return Err(duplicate("project", &project.id));
        }
        tables.projects.push(project.clone());
        Ok(())
    }

    async fn insert_team(&self, team: &Team) -> Result<(), TaskError> {
        let mut tables = self.tables.write().await;
        if tables.has_team(&team.id) {
            return Err(duplicate("team", &team.id));
        }
        for user_id in [&team.product_owner_user_id, &team.project_manager_user_id]
            .into_iter()
            .flatten()
        {
            tables.require_user(user_id)?;
        }
        tables.teams.push(team.clone());
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<(), TaskError> {
        let mut tables = self.tables.write().await;
        if tables.has_user(&user.id) {
            return Err(duplicate("user", &user.id));
        }
        if let Some(team_id) = &user.team_id {
            if !tables.has_team(team_id) {
                return Err(TaskError::not_found("team", team_id.as_str()));
            }
        }
        tables.users.push(user.clone());
        Ok(())
    }

    async fn insert_task(&self, task: &Task) -> Result<(), TaskError> {
        let mut tables = self.tables.write().await;
        if tables.has_task(&task.id) {
            return Err(duplicate("task", &task.id));
        }
        tables.require_project(&task.project_id)?;
        tables.require_user(&task.author_user_id)?;
        if let Some(assignee) = &task.assigned_user_id {
            tables.require_user(assignee)?;
        }
        debug!("memory store: inserting task {}", task.id);
        tables.tasks.push(task.clone());
        Ok(())
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), TaskError> {
        let mut tables = self.tables.write().await;
        tables.require_task(&comment.task_id)?;
        tables.require_user(&comment.user_id)?;
        tables.comments.push(comment.clone());
        Ok(())
    }

    async fn insert_attachment(&self, attachment: &Attachment) -> Result<(), TaskError> {
        let mut tables = self.tables.write().await;
        tables.require_task(&attachment.task_id)?;
        tables.require_user(&attachment.uploaded_by_id)?;
        tables.attachments.push(attachment.clone());
        Ok(())
    }

    async fn insert_task_assignment(&self, assignment: &TaskAssignment) -> Result<(), TaskError> {
        let mut tables = self.tables.write().await;
        tables.require_task(&assignment.task_id)?;
        tables.require_user(&assignment.user_id)?;
        tables.task_assignments.push(assignment.clone());
        Ok(())
    }

    async fn insert_project_team(&self, link: &ProjectTeam) -> Result<(), TaskError> {
        let mut tables = self.tables.write().await;
        tables.require_project(&link.project_id)?;
        if !tables.has_team(&link.team_id) {
            return Err(TaskError::not_found("team", link.team_id.as_str()));
        }
        tables.project_teams.push(link.clone());
        Ok(())
    }

    async fn list_task_details(&self, project_id: &str) -> Result<Vec<TaskDetail>, TaskError> {
        let tables = self.tables.read().await;
        let tasks: Vec<Task> = tables
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect();
        let task_ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        let comments = tables
            .comments
            .iter()
            .filter(|c| task_ids.contains(&c.task_id.as_str()))
            .cloned()
            .collect();
        let attachments = tables
            .attachments
            .iter()
            .filter(|a| task_ids.contains(&a.task_id.as_str()))
            .cloned()
            .collect();
        Ok(assemble_details(
            tasks,
            tables.users.clone(),
            comments,
            attachments,
        ))
    }

    async fn set_task_status(
        &self,
        task_id: &str,
        status: TaskStatus,
    ) -> Result<Option<Task>, TaskError> {
        let mut tables = self.tables.write().await;
        Ok(tables.tasks.iter_mut().find(|t| t.id == task_id).map(|task| {
            task.status = status;
            task.clone()
        }))
    }

    async fn delete_task(&self, task_id: &str) -> Result<bool, TaskError> {
        let mut tables = self.tables.write().await;
        if !tables.has_task(task_id) {
            return Ok(false);
        }
        tables.remove_tasks(&[task_id.to_string()]);
        Ok(true)
    }

    async fn delete_project(&self, project_id: &str) -> Result<bool, TaskError> {
        let mut tables = self.tables.write().await;
        if !tables.has_project(project_id) {
            return Ok(false);
        }
        let task_ids: Vec<String> = tables
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .map(|t| t.id.clone())
            .collect();
        tables.remove_tasks(&task_ids);
        tables.project_teams.retain(|l| l.project_id != project_id);
        tables.projects.retain(|p| p.id != project_id);
        Ok(true)
    }
}
