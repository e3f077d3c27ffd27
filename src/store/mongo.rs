// src/store/mongo.rs

use async_trait::async_trait;
use futures_util::TryStreamExt;
use log::{info, warn};
use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, IndexOptions, ReturnDocument};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::de::DeserializeOwned;

use super::{assemble_details, referenced_user_ids, TaskStore};
use crate::error::TaskError;
use crate::models::{
    Attachment, Comment, Project, ProjectTeam, Task, TaskAssignment, TaskDetail, TaskStatus, Team,
    User,
};

const PROJECTS: &str = "projects";
const TEAMS: &str = "teams";
const USERS: &str = "users";
const TASKS: &str = "tasks";
const COMMENTS: &str = "comments";
const ATTACHMENTS: &str = "attachments";
const TASK_ASSIGNMENTS: &str = "task_assignments";
const PROJECT_TEAMS: &str = "project_teams";

/// MongoDB-backed store. Rows are addressed by their `id` field; the
/// driver-assigned `_id` only provides insertion order.
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Connects once at startup, verifies the server answers and makes sure
    /// the lookup indexes exist.
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, TaskError> {
        let client_options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(client_options)?;
        let db = client.database(db_name);
        db.run_command(doc! { "ping": 1 }).await?;

        let store = MongoStore { client, db };
        store.ensure_indexes().await?;
        info!("Connected to MongoDB database {}", db_name);
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<(), TaskError> {
        for name in [
            PROJECTS,
            TEAMS,
            USERS,
            TASKS,
            COMMENTS,
            ATTACHMENTS,
            TASK_ASSIGNMENTS,
            PROJECT_TEAMS,
        ] {
            let unique_id = IndexModel::builder()
                .keys(doc! { "id": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build();
            self.db
                .collection::<Document>(name)
                .create_index(unique_id)
                .await?;
        }

        let lookups = [
            (TASKS, "projectId"),
            (COMMENTS, "taskId"),
            (ATTACHMENTS, "taskId"),
            (TASK_ASSIGNMENTS, "taskId"),
            (PROJECT_TEAMS, "projectId"),
        ];
        for (name, field) in lookups {
            let mut keys = Document::new();
            keys.insert(field, 1);
            let index = IndexModel::builder().keys(keys).build();
            self.db.collection::<Document>(name).create_index(index).await?;
        }
        Ok(())
    }

    fn projects(&self) -> Collection<Project> {
        self.db.collection(PROJECTS)
    }

    fn teams(&self) -> Collection<Team> {
        self.db.collection(TEAMS)
    }

    fn users(&self) -> Collection<User> {
        self.db.collection(USERS)
    }

    fn tasks(&self) -> Collection<Task> {
        self.db.collection(TASKS)
    }

    fn comments(&self) -> Collection<Comment> {
        self.db.collection(COMMENTS)
    }

    fn attachments(&self) -> Collection<Attachment> {
        self.db.collection(ATTACHMENTS)
    }

    fn task_assignments(&self) -> Collection<TaskAssignment> {
        self.db.collection(TASK_ASSIGNMENTS)
    }

    fn project_teams(&self) -> Collection<ProjectTeam> {
        self.db.collection(PROJECT_TEAMS)
    }

    /// Runs a find in insertion order and drains the cursor.
    async fn find_all<T>(coll: Collection<T>, filter: Document) -> Result<Vec<T>, TaskError>
    where
        T: DeserializeOwned + Unpin + Send + Sync,
    {
        let cursor = coll.find(filter).sort(doc! { "_id": 1 }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn exists(&self, collection: &str, id: &str) -> Result<bool, TaskError> {
        let count = self
            .db
            .collection::<Document>(collection)
            .count_documents(doc! { "id": id })
            .limit(1)
            .await?;
        Ok(count > 0)
    }

    async fn require(&self, collection: &str, entity: &'static str, id: &str) -> Result<(), TaskError> {
        if self.exists(collection, id).await? {
            Ok(())
        } else {
            Err(TaskError::not_found(entity, id))
        }
    }

    /// Removes comments, attachments and assignments of the given tasks, then
    /// the tasks. Children go first so no orphan is left if a step fails.
    async fn remove_tasks(&self, task_ids: Vec<String>) -> Result<(), TaskError> {
        if task_ids.is_empty() {
            return Ok(());
        }
        let children = doc! { "taskId": { "$in": task_ids.clone() } };
        self.comments().delete_many(children.clone()).await?;
        self.attachments().delete_many(children.clone()).await?;
        self.task_assignments().delete_many(children).await?;
        self.tasks()
            .delete_many(doc! { "id": { "$in": task_ids } })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TaskStore for MongoStore {
    async fn list_projects(&self) -> Result<Vec<Project>, TaskError> {
        Self::find_all(self.projects(), doc! {}).await
    }

    async fn get_project(&self, project_id: &str) -> Result<Option<Project>, TaskError> {
        Ok(self.projects().find_one(doc! { "id": project_id }).await?)
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, TaskError> {
        Ok(self.users().find_one(doc! { "id": user_id }).await?)
    }

    async fn get_task(&self, task_id: &str) -> Result<Option<Task>, TaskError> {
        Ok(self.tasks().find_one(doc! { "id": task_id }).await?)
    }

    async fn insert_project(&self, project: &Project) -> Result<(), TaskError> {
        self.projects().insert_one(project).await?;
        Ok(())
    }

    async fn insert_team(&self, team: &Team) -> Result<(), TaskError> {
        for user_id in [&team.product_owner_user_id, &team.project_manager_user_id]
            .into_iter()
            .flatten()
        {
            self.require(USERS, "user", user_id).await?;
        }
        self.teams().insert_one(team).await?;
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<(), TaskError> {
        if let Some(team_id) = &user.team_id {
            self.require(TEAMS, "team", team_id).await?;
        }
        self.users().insert_one(user).await?;
        Ok(())
    }

    async fn insert_task(&self, task: &Task) -> Result<(), TaskError> {
        self.require(PROJECTS, "project", &task.project_id).await?;
        self.require(USERS, "user", &task.author_user_id).await?;
        if let Some(assignee) = &task.assigned_user_id {
            self.require(USERS, "user", assignee).await?;
        }
        self.tasks().insert_one(task).await?;
        Ok(())
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), TaskError> {
        self.require(TASKS, "task", &comment.task_id).await?;
        self.require(USERS, "user", &comment.user_id).await?;
        self.comments().insert_one(comment).await?;
        Ok(())
    }

    async fn insert_attachment(&self, attachment: &Attachment) -> Result<(), TaskError> {
        self.require(TASKS, "task", &attachment.task_id).await?;
        self.require(USERS, "user", &attachment.uploaded_by_id).await?;
        self.attachments().insert_one(attachment).await?;
        Ok(())
    }

    async fn insert_task_assignment(&self, assignment: &TaskAssignment) -> Result<(), TaskError> {
        self.require(TASKS, "task", &assignment.task_id).await?;
        self.require(USERS, "user", &assignment.user_id).await?;
        self.task_assignments().insert_one(assignment).await?;
        Ok(())
    }

    async fn insert_project_team(&self, link: &ProjectTeam) -> Result<(), TaskError> {
        self.require(PROJECTS, "project", &link.project_id).await?;
        self.require(TEAMS, "team", &link.team_id).await?;
        self.project_teams().insert_one(link).await?;
        Ok(())
    }

    async fn list_task_details(&self, project_id: &str) -> Result<Vec<TaskDetail>, TaskError> {
        let tasks = Self::find_all(self.tasks(), doc! { "projectId": project_id }).await?;
        if tasks.is_empty() {
            return Ok(Vec::new());
        }

        // One query per relation for the whole board.
        let task_ids: Vec<String> = tasks.iter().map(|t| t.id.clone()).collect();
        let user_ids = referenced_user_ids(&tasks);
        let by_task = doc! { "taskId": { "$in": task_ids } };

        let users = Self::find_all(self.users(), doc! { "id": { "$in": user_ids } }).await?;
        let comments = Self::find_all(self.comments(), by_task.clone()).await?;
        let attachments = Self::find_all(self.attachments(), by_task).await?;

        Ok(assemble_details(tasks, users, comments, attachments))
    }

    async fn set_task_status(
        &self,
        task_id: &str,
        status: TaskStatus,
    ) -> Result<Option<Task>, TaskError> {
        let updated = self
            .tasks()
            .find_one_and_update(
                doc! { "id": task_id },
                doc! { "$set": { "status": status.as_str() } },
            )
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated)
    }

    async fn delete_task(&self, task_id: &str) -> Result<bool, TaskError> {
        if !self.exists(TASKS, task_id).await? {
            return Ok(false);
        }
        self.remove_tasks(vec![task_id.to_string()]).await?;
        Ok(true)
    }

    async fn delete_project(&self, project_id: &str) -> Result<bool, TaskError> {
        if !self.exists(PROJECTS, project_id).await? {
            return Ok(false);
        }
        let task_ids: Vec<String> = Self::find_all(self.tasks(), doc! { "projectId": project_id })
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();
        info!(
            "Cascading delete of project {} over {} task(s)",
            project_id,
            task_ids.len()
        );
        self.remove_tasks(task_ids).await?;
        self.project_teams()
            .delete_many(doc! { "projectId": project_id })
            .await?;
        self.projects().delete_one(doc! { "id": project_id }).await?;
        Ok(true)
    }

    async fn shutdown(&self) {
        warn!("Shutting down MongoDB client");
        self.client.clone().shutdown().await;
    }
}
