// src/error.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Failure outcomes of the task service.
///
/// The three kinds stay distinct all the way to the caller: the board rolls
/// back on any of them, but only validation and not-found failures are shown
/// as blocking messages.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("{0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    ConflictOrTransient(String),
}

impl TaskError {
    pub fn validation(message: impl Into<String>) -> Self {
        TaskError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        TaskError::NotFound { entity, id: id.into() }
    }

    /// Wire name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskError::Validation(_) => "ValidationError",
            TaskError::NotFound { .. } => "NotFound",
            TaskError::ConflictOrTransient(_) => "ConflictOrTransient",
        }
    }

    /// Whether the failure should block the user until acknowledged.
    pub fn is_blocking(&self) -> bool {
        !matches!(self, TaskError::ConflictOrTransient(_))
    }
}

impl From<mongodb::error::Error> for TaskError {
    fn from(err: mongodb::error::Error) -> Self {
        TaskError::ConflictOrTransient(err.to_string())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
}

impl ResponseError for TaskError {
    fn status_code(&self) -> StatusCode {
        match self {
            TaskError::Validation(_) => StatusCode::BAD_REQUEST,
            TaskError::NotFound { .. } => StatusCode::NOT_FOUND,
            TaskError::ConflictOrTransient(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            kind: self.kind(),
            message: self.to_string(),
        })
    }
}
