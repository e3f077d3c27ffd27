//! Project/task tracker: task service over MongoDB or memory, an actix-web
//! HTTP surface, and the client-side board state machine.

pub mod app_state;
pub mod board;
pub mod config;
pub mod error;
pub mod models;
pub mod presentation;
pub mod project;
pub mod routes;
pub mod server;
pub mod service;
pub mod store;
pub mod task;

pub use app_state::AppState;
pub use board::{BoardController, BoardPhase, TaskApi};
pub use error::TaskError;
pub use service::TaskService;
