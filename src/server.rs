// src/server.rs

use actix_cors::Cors;
use actix_web::{http, middleware::Logger, web, App, HttpServer};
use log::{error, info};

use crate::app_state::AppState;
use crate::routes;

/// Binds and runs the HTTP server until it stops. The store is shut down on
/// every exit path, including a failed bind.
pub async fn serve(state: AppState) -> std::io::Result<()> {
    let config = state.config.clone();
    let frontend_origin = config.frontend_origin.clone();
    info!("Server running at http://{}:{}", config.bind_addr, config.port);
    info!("Allowed CORS Origin: {}", frontend_origin);
    info!("Store backend: {:?}", config.store_backend);

    let app_state = web::Data::new(state.clone());
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![http::header::CONTENT_TYPE, http::header::ACCEPT])
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(app_state.clone())
            .configure(routes::configure)
    })
    .bind((config.bind_addr.as_str(), config.port));

    let result = match server {
        Ok(server) => server.run().await,
        Err(e) => {
            error!("Could not bind {}:{}: {}", config.bind_addr, config.port, e);
            Err(e)
        }
    };

    state.shutdown().await;
    info!("Server stopped");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, StoreBackend};
    use crate::error::TaskError;
    use crate::models::{
        Attachment, Comment, Project, ProjectTeam, Task, TaskAssignment, TaskDetail, TaskStatus,
        Team, User,
    };
    use crate::service::TaskService;
    use crate::store::{MemoryStore, TaskStore};
    use async_trait::async_trait;
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Memory store that records whether it was shut down.
    #[derive(Default)]
    struct ClosingStore {
        inner: MemoryStore,
        closed: AtomicBool,
    }

    #[async_trait]
    impl TaskStore for ClosingStore {
        async fn list_projects(&self) -> Result<Vec<Project>, TaskError> {
            self.inner.list_projects().await
        }

        async fn get_project(&self, project_id: &str) -> Result<Option<Project>, TaskError> {
            self.inner.get_project(project_id).await
        }

        async fn get_user(&self, user_id: &str) -> Result<Option<User>, TaskError> {
            self.inner.get_user(user_id).await
        }

        async fn get_task(&self, task_id: &str) -> Result<Option<Task>, TaskError> {
            self.inner.get_task(task_id).await
        }

        async fn insert_project(&self, project: &Project) -> Result<(), TaskError> {
            self.inner.insert_project(project).await
        }

        async fn insert_team(&self, team: &Team) -> Result<(), TaskError> {
            self.inner.insert_team(team).await
        }

        async fn insert_user(&self, user: &User) -> Result<(), TaskError> {
            self.inner.insert_user(user).await
        }

        async fn insert_task(&self, task: &Task) -> Result<(), TaskError> {
            self.inner.insert_task(task).await
        }

        async fn insert_comment(&self, comment: &Comment) -> Result<(), TaskError> {
            self.inner.insert_comment(comment).await
        }

        async fn insert_attachment(&self, attachment: &Attachment) -> Result<(), TaskError> {
            self.inner.insert_attachment(attachment).await
        }

        async fn insert_task_assignment(
            &self,
            assignment: &TaskAssignment,
        ) -> Result<(), TaskError> {
            self.inner.insert_task_assignment(assignment).await
        }

        async fn insert_project_team(&self, link: &ProjectTeam) -> Result<(), TaskError> {
            self.inner.insert_project_team(link).await
        }

        async fn list_task_details(&self, project_id: &str) -> Result<Vec<TaskDetail>, TaskError> {
            self.inner.list_task_details(project_id).await
        }

        async fn set_task_status(
            &self,
            task_id: &str,
            status: TaskStatus,
        ) -> Result<Option<Task>, TaskError> {
            self.inner.set_task_status(task_id, status).await
        }

        async fn delete_task(&self, task_id: &str) -> Result<bool, TaskError> {
            self.inner.delete_task(task_id).await
        }

        async fn delete_project(&self, project_id: &str) -> Result<bool, TaskError> {
            self.inner.delete_project(project_id).await
        }

        async fn shutdown(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    #[actix_web::test]
    async fn failed_bind_still_shuts_the_store_down() {
        // Hold the port so the server cannot take it.
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let store = Arc::new(ClosingStore::default());
        let state = AppState {
            tasks: TaskService::new(store.clone()),
            config: Config {
                store_backend: StoreBackend::Memory,
                mongo_uri: None,
                database_name: "taskline".into(),
                bind_addr: "127.0.0.1".into(),
                port,
                frontend_origin: "http://localhost:3000".into(),
            },
        };

        assert!(serve(state).await.is_err());
        assert!(store.closed.load(Ordering::SeqCst));
    }
}
