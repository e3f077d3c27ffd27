// src/routes.rs

use actix_web::web;

use crate::error::TaskError;
use crate::project::{delete_project, get_board, list_project_tasks, list_projects};
use crate::task::{create_task, delete_task, list_tasks, update_task_status};

/// Registers every route of the task tracker.
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Malformed bodies come back in the same `{kind, message}` shape as
    // service failures.
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        TaskError::validation(format!("invalid request body: {}", err)).into()
    }))
    .service(
        web::scope("/projects")
            .route("", web::get().to(list_projects))
            .route("/{project_id}", web::delete().to(delete_project))
            .route("/{project_id}/tasks", web::get().to(list_project_tasks))
            .route("/{project_id}/board", web::get().to(get_board)),
    )
    .service(
        web::scope("/tasks")
            .route("", web::get().to(list_tasks))
            .route("", web::post().to(create_task))
            .route("/{task_id}", web::delete().to(delete_task))
            .route("/{task_id}/status", web::patch().to(update_task_status)),
    );
}
