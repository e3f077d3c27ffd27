// src/project.rs

use actix_web::{web, HttpResponse, Responder};
use log::info;
use serde::Serialize;

use crate::app_state::AppState;
use crate::models::TaskStatus;
use crate::presentation::TaskCard;
use crate::task::failure;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
    pub status: TaskStatus,
    pub cards: Vec<TaskCard>,
}

/// Render-ready board: the four columns in board order.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub project_id: String,
    pub columns: Vec<BoardColumn>,
}

/// GET /projects
pub async fn list_projects(data: web::Data<AppState>) -> impl Responder {
    match data.tasks.list_projects().await {
        Ok(projects) => HttpResponse::Ok().json(projects),
        Err(e) => failure("Error retrieving projects", e),
    }
}

/// GET /projects/{project_id}/tasks
pub async fn list_project_tasks(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let project_id = path.into_inner();
    match data.tasks.list_tasks_by_project(&project_id).await {
        Ok(tasks) => HttpResponse::Ok().json(tasks),
        Err(e) => failure("Error retrieving tasks", e),
    }
}

/// GET /projects/{project_id}/board
/// The project's tasks as cards, grouped into status columns.
pub async fn get_board(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let project_id = path.into_inner();
    let tasks = match data.tasks.list_tasks_by_project(&project_id).await {
        Ok(tasks) => tasks,
        Err(e) => return failure("Error retrieving board", e),
    };

    let columns = TaskStatus::ALL
        .into_iter()
        .map(|status| BoardColumn {
            status,
            cards: tasks
                .iter()
                .filter(|detail| detail.task.status == status)
                .map(TaskCard::from_detail)
                .collect(),
        })
        .collect();

    HttpResponse::Ok().json(BoardView {
        project_id,
        columns,
    })
}

/// DELETE /projects/{project_id}
/// Cascades to the project's tasks, their children and its team links.
pub async fn delete_project(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let project_id = path.into_inner();
    match data.tasks.delete_project(&project_id).await {
        Ok(()) => {
            info!("Project {} deleted via API", project_id);
            HttpResponse::Ok().json(serde_json::json!({ "deleted": project_id }))
        }
        Err(e) => failure("Error deleting project", e),
    }
}
