// src/service.rs

use std::sync::Arc;

use log::{debug, info, warn};
use uuid::Uuid;

use crate::error::TaskError;
use crate::models::task::normalize_tags;
use crate::models::{CreateTaskRequest, Priority, Project, Task, TaskDetail, TaskStatus};
use crate::store::TaskStore;

/// Server-side task operations on top of a [`TaskStore`].
///
/// Holds no per-request state; every call stands alone. Status writes are
/// last-write-wins with no version check.
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, TaskError> {
        self.store.list_projects().await
    }

    /// Every task of the project with author, assignee, comments and
    /// attachments joined.
    pub async fn list_tasks_by_project(&self, project_id: &str) -> Result<Vec<TaskDetail>, TaskError> {
        if self.store.get_project(project_id).await?.is_none() {
            return Err(TaskError::not_found("project", project_id));
        }
        let tasks = self.store.list_task_details(project_id).await?;
        debug!("Listed {} task(s) for project {}", tasks.len(), project_id);
        Ok(tasks)
    }

    pub async fn create_task(&self, req: CreateTaskRequest) -> Result<Task, TaskError> {
        let title = req.title.trim();
        if title.is_empty() {
            return Err(TaskError::validation("title is required"));
        }
        if req.project_id.trim().is_empty() {
            return Err(TaskError::validation("projectId is required"));
        }
        if req.author_user_id.trim().is_empty() {
            return Err(TaskError::validation("authorUserId is required"));
        }

        let status = match req.status.as_deref() {
            Some(raw) => raw.parse::<TaskStatus>()?,
            None => TaskStatus::default(),
        };
        let priority = req
            .priority
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(str::parse::<Priority>)
            .transpose()?;

        if let Some(points) = req.points {
            if points < 0 {
                return Err(TaskError::validation("points must not be negative"));
            }
        }
        if let (Some(start), Some(due)) = (req.start_date, req.due_date) {
            if due < start {
                return Err(TaskError::validation("dueDate must not be before startDate"));
            }
        }

        let assigned_user_id = req.assigned_user_id.filter(|id| !id.trim().is_empty());

        let task = Task {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: req.description,
            status,
            priority,
            tags: req.tags.as_deref().and_then(normalize_tags),
            start_date: req.start_date,
            due_date: req.due_date,
            points: req.points,
            project_id: req.project_id,
            author_user_id: req.author_user_id,
            assigned_user_id,
        };

        // The store checks project, author and assignee before writing.
        self.store.insert_task(&task).await?;
        info!("Task created: {} in project {}", task.id, task.project_id);
        Ok(task)
    }

    /// Moves a task to another column. `status` is the raw wire string.
    pub async fn update_task_status(&self, task_id: &str, status: &str) -> Result<Task, TaskError> {
        let status = status.parse::<TaskStatus>().map_err(|e| {
            warn!("Rejected status update for task {}: {}", task_id, e);
            e
        })?;
        match self.store.set_task_status(task_id, status).await? {
            Some(task) => {
                info!("Task {} moved to {}", task.id, task.status);
                Ok(task)
            }
            None => Err(TaskError::not_found("task", task_id)),
        }
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<(), TaskError> {
        if self.store.delete_task(task_id).await? {
            info!("Task deleted: {}", task_id);
            Ok(())
        } else {
            Err(TaskError::not_found("task", task_id))
        }
    }

    /// Deletes the project together with its tasks and their children.
    pub async fn delete_project(&self, project_id: &str) -> Result<(), TaskError> {
        if self.store.delete_project(project_id).await? {
            info!("Project deleted: {}", project_id);
            Ok(())
        } else {
            Err(TaskError::not_found("project", project_id))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Attachment, Comment, User};
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};

    /// A service over a memory store holding project `p1`, users `u1`/`u2`
    /// and nothing else.
    pub(crate) async fn seeded_service() -> TaskService {
        let store = MemoryStore::new();
        store
            .insert_project(&Project {
                id: "p1".into(),
                name: "Apollo".into(),
                description: Some("Moon shot".into()),
                start_date: None,
                end_date: None,
            })
            .await
            .unwrap();
        for (id, name) in [("u1", "alice"), ("u2", "bob")] {
            store
                .insert_user(&User {
                    id: id.into(),
                    username: name.into(),
                    profile_picture_url: Some(format!("{}.jpg", name)),
                    team_id: None,
                })
                .await
                .unwrap();
        }
        TaskService::new(Arc::new(store))
    }

    pub(crate) fn new_task(title: &str) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.into(),
            project_id: "p1".into(),
            author_user_id: "u1".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_task_defaults_status_and_normalizes_tags() {
        let service = seeded_service().await;
        let mut req = new_task("  Design schema ");
        req.tags = Some("backend,urgent, ui,".into());
        req.priority = Some("High".into());

        let task = service.create_task(req).await.unwrap();

        assert_eq!(task.title, "Design schema");
        assert_eq!(task.status, TaskStatus::ToDo);
        assert_eq!(task.priority, Some(Priority::High));
        assert_eq!(task.tags.as_deref(), Some("backend,urgent,ui"));
        assert_eq!(task.tag_list(), ["backend", "urgent", "ui"]);
        assert!(!task.id.is_empty());
    }

    #[tokio::test]
    async fn create_task_validates_input() {
        let service = seeded_service().await;

        let err = service.create_task(new_task("   ")).await.unwrap_err();
        assert_eq!(err.kind(), "ValidationError");

        let mut bad_status = new_task("x");
        bad_status.status = Some("Done".into());
        assert_eq!(service.create_task(bad_status).await.unwrap_err().kind(), "ValidationError");

        let mut bad_points = new_task("x");
        bad_points.points = Some(-1);
        assert!(service.create_task(bad_points).await.is_err());

        let mut bad_dates = new_task("x");
        bad_dates.start_date = Some(Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap());
        bad_dates.due_date = Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
        assert!(service.create_task(bad_dates).await.is_err());

        assert!(service.list_tasks_by_project("p1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_task_with_unknown_project_persists_nothing() {
        let service = seeded_service().await;
        let mut req = new_task("Orphan");
        req.project_id = "missing".into();

        let err = service.create_task(req).await.unwrap_err();

        assert_eq!(err, TaskError::not_found("project", "missing"));
        assert!(service.list_tasks_by_project("p1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_task_with_unknown_assignee_is_not_found() {
        let service = seeded_service().await;
        let mut req = new_task("Assigned");
        req.assigned_user_id = Some("ghost".into());
        assert_eq!(
            service.create_task(req).await.unwrap_err(),
            TaskError::not_found("user", "ghost")
        );
    }

    #[tokio::test]
    async fn list_tasks_by_project_joins_relations() {
        let service = seeded_service().await;
        let mut req = new_task("Joined");
        req.assigned_user_id = Some("u2".into());
        let task = service.create_task(req).await.unwrap();
        service
            .store()
            .insert_comment(&Comment {
                id: "c1".into(),
                task_id: task.id.clone(),
                user_id: "u2".into(),
                text: "on it".into(),
            })
            .await
            .unwrap();
        service
            .store()
            .insert_attachment(&Attachment {
                id: "a1".into(),
                task_id: task.id.clone(),
                uploaded_by_id: "u1".into(),
                file_url: "i1.jpg".into(),
                file_name: Some("mockup".into()),
            })
            .await
            .unwrap();

        let tasks = service.list_tasks_by_project("p1").await.unwrap();

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].author.as_ref().unwrap().username, "alice");
        assert_eq!(tasks[0].assignee.as_ref().unwrap().username, "bob");
        assert_eq!(tasks[0].comments.len(), 1);
        assert_eq!(tasks[0].attachments[0].file_url, "i1.jpg");
    }

    #[tokio::test]
    async fn list_tasks_for_unknown_project_is_not_found() {
        let service = seeded_service().await;
        let err = service.list_tasks_by_project("nope").await.unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }

    #[tokio::test]
    async fn update_status_persists_every_valid_status() {
        let service = seeded_service().await;
        let task = service.create_task(new_task("Move me")).await.unwrap();

        for status in TaskStatus::ALL {
            let updated = service
                .update_task_status(&task.id, status.as_str())
                .await
                .unwrap();
            assert_eq!(updated.status, status);
            let listed = service.list_tasks_by_project("p1").await.unwrap();
            assert_eq!(listed[0].task.status, status);
        }
    }

    #[tokio::test]
    async fn update_status_rejects_unknown_status_and_keeps_stored_value() {
        let service = seeded_service().await;
        let task = service.create_task(new_task("Stay")).await.unwrap();

        let err = service.update_task_status(&task.id, "Archived").await.unwrap_err();

        assert_eq!(err.kind(), "ValidationError");
        let stored = service.store().get_task(&task.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::ToDo);
    }

    #[tokio::test]
    async fn update_status_of_unknown_task_is_not_found() {
        let service = seeded_service().await;
        let err = service.update_task_status("nope", "Completed").await.unwrap_err();
        assert_eq!(err, TaskError::not_found("task", "nope"));
    }

    #[tokio::test]
    async fn update_status_is_idempotent() {
        let service = seeded_service().await;
        let task = service.create_task(new_task("Twice")).await.unwrap();

        let once = service.update_task_status(&task.id, "Under Review").await.unwrap();
        let twice = service.update_task_status(&task.id, "Under Review").await.unwrap();

        assert_eq!(once, twice);
        assert_eq!(
            service.store().get_task(&task.id).await.unwrap().unwrap(),
            once
        );
    }

    #[tokio::test]
    async fn concurrent_status_updates_end_on_one_target() {
        let service = seeded_service().await;
        let task = service.create_task(new_task("Race")).await.unwrap();

        let a = service.clone();
        let b = service.clone();
        let id_a = task.id.clone();
        let id_b = task.id.clone();
        let (ra, rb) = tokio::join!(
            tokio::spawn(async move { a.update_task_status(&id_a, "Completed").await }),
            tokio::spawn(async move { b.update_task_status(&id_b, "Work In Progress").await }),
        );
        ra.unwrap().unwrap();
        rb.unwrap().unwrap();

        let stored = service.store().get_task(&task.id).await.unwrap().unwrap();
        assert!(matches!(
            stored.status,
            TaskStatus::Completed | TaskStatus::WorkInProgress
        ));
    }

    #[tokio::test]
    async fn delete_project_cascades_and_then_reports_not_found() {
        let service = seeded_service().await;
        let task = service.create_task(new_task("Doomed")).await.unwrap();

        service.delete_project("p1").await.unwrap();

        assert!(service.store().get_task(&task.id).await.unwrap().is_none());
        assert_eq!(service.list_tasks_by_project("p1").await.unwrap_err().kind(), "NotFound");
        assert_eq!(service.delete_project("p1").await.unwrap_err().kind(), "NotFound");
    }

    #[tokio::test]
    async fn delete_task_removes_it_from_the_board() {
        let service = seeded_service().await;
        let task = service.create_task(new_task("Gone")).await.unwrap();

        service.delete_task(&task.id).await.unwrap();

        assert!(service.list_tasks_by_project("p1").await.unwrap().is_empty());
        assert!(service.delete_task(&task.id).await.is_err());
    }
}
