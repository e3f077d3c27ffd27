// src/task.rs

use actix_web::{web, HttpResponse, Responder, ResponseError};
use log::{error, info, warn};
use serde::Deserialize;

use crate::app_state::AppState;
use crate::error::TaskError;
use crate::models::{CreateTaskRequest, UpdateTaskStatusRequest};

/// Query string of `GET /tasks`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    pub project_id: Option<String>,
}

/// Logs a failed call and renders it as a `{kind, message}` body.
pub(crate) fn failure(context: &str, err: TaskError) -> HttpResponse {
    match &err {
        TaskError::ConflictOrTransient(_) => error!("{}: {}", context, err),
        _ => warn!("{}: {}", context, err),
    }
    err.error_response()
}

/// GET /tasks?projectId=...
/// List all tasks of a project with their relations joined.
pub async fn list_tasks(
    data: web::Data<AppState>,
    query: web::Query<TaskQuery>,
) -> impl Responder {
    let project_id = match query.project_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id,
        _ => {
            return failure(
                "Error retrieving tasks",
                TaskError::validation("projectId query parameter is required"),
            )
        }
    };

    match data.tasks.list_tasks_by_project(project_id).await {
        Ok(tasks) => HttpResponse::Ok().json(tasks),
        Err(e) => failure("Error retrieving tasks", e),
    }
}

/// POST /tasks
/// Create a new task.
pub async fn create_task(
    data: web::Data<AppState>,
    payload: web::Json<CreateTaskRequest>,
) -> impl Responder {
    match data.tasks.create_task(payload.into_inner()).await {
        Ok(task) => {
            info!("Task created via API: {}", task.id);
            HttpResponse::Ok().json(task)
        }
        Err(e) => failure("Error creating a task", e),
    }
}

/// PATCH /tasks/{task_id}/status
/// Move a task to another board column.
pub async fn update_task_status(
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<UpdateTaskStatusRequest>,
) -> impl Responder {
    let task_id = path.into_inner();
    match data.tasks.update_task_status(&task_id, &payload.status).await {
        Ok(task) => HttpResponse::Ok().json(task),
        Err(e) => failure("Error updating a task", e),
    }
}

/// DELETE /tasks/{task_id}
/// Delete a task together with its comments, attachments and assignments.
pub async fn delete_task(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let task_id = path.into_inner();
    match data.tasks.delete_task(&task_id).await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "deleted": task_id })),
        Err(e) => failure("Error deleting a task", e),
    }
}
