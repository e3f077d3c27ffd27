// src/board.rs

use async_trait::async_trait;
use log::{debug, info, warn};
use thiserror::Error;

use crate::error::TaskError;
use crate::models::{CreateTaskRequest, Task, TaskDetail, TaskStatus};
use crate::service::TaskService;

/// What the board needs from the task service. Implemented by the in-process
/// [`TaskService`]; a remote client would implement it over HTTP.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self, project_id: &str) -> Result<Vec<TaskDetail>, TaskError>;

    async fn create_task(&self, req: CreateTaskRequest) -> Result<Task, TaskError>;

    async fn update_task_status(&self, task_id: &str, status: TaskStatus) -> Result<Task, TaskError>;
}

#[async_trait]
impl TaskApi for TaskService {
    async fn list_tasks(&self, project_id: &str) -> Result<Vec<TaskDetail>, TaskError> {
        self.list_tasks_by_project(project_id).await
    }

    async fn create_task(&self, req: CreateTaskRequest) -> Result<Task, TaskError> {
        TaskService::create_task(self, req).await
    }

    async fn update_task_status(&self, task_id: &str, status: TaskStatus) -> Result<Task, TaskError> {
        TaskService::update_task_status(self, task_id, status.as_str()).await
    }
}

/// Where the board is in the drag-and-drop cycle. At most one task is ever
/// being dragged or awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardPhase {
    Idle,
    Dragging {
        task_id: String,
    },
    Reconciling {
        task_id: String,
        target: TaskStatus,
        previous: TaskStatus,
    },
}

/// Status write the caller must send after an optimistic move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub task_id: String,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Dropped outside any column.
    Cancelled,
    /// Dropped on its own column. Nothing is persisted for in-column order.
    Unchanged,
    /// Moved locally; the request is in flight.
    Pending(MoveRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    Unchanged,
    Confirmed(Task),
    RolledBack(TaskError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Must be acknowledged before continuing.
    Blocking,
    Dismissible,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoardError {
    #[error("task {0} is already being dragged")]
    DragInProgress(String),

    #[error("move of task {0} is still awaiting confirmation")]
    ReconcileInFlight(String),

    #[error("task {0} is not on this board")]
    UnknownTask(String),

    #[error("no drag in progress")]
    NotDragging,

    #[error("no move awaiting confirmation")]
    NotReconciling,

    #[error(transparent)]
    Service(#[from] TaskError),
}

/// Client-side board for one project.
///
/// Tasks are kept in fetch order and partitioned into columns by their
/// status, so every task sits in exactly one column. A drop on another column
/// moves the task locally right away; the server answer either confirms the
/// move or rolls it back.
#[derive(Debug)]
pub struct BoardController {
    project_id: String,
    tasks: Vec<TaskDetail>,
    phase: BoardPhase,
    notices: Vec<Notice>,
}

impl BoardController {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            tasks: Vec::new(),
            phase: BoardPhase::Idle,
            notices: Vec::new(),
        }
    }

    /// Fetches the project's tasks. Called once when the board mounts, and
    /// only while no drag or move is under way.
    pub async fn load(&mut self, api: &dyn TaskApi) -> Result<(), BoardError> {
        self.ensure_idle()?;
        match api.list_tasks(&self.project_id).await {
            Ok(tasks) => {
                debug!("Board {} loaded {} task(s)", self.project_id, tasks.len());
                self.tasks = tasks;
                Ok(())
            }
            Err(err) => {
                self.notify(NoticeLevel::Blocking, format!("Could not load tasks: {}", err));
                Err(err.into())
            }
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn phase(&self) -> &BoardPhase {
        &self.phase
    }

    pub fn tasks(&self) -> &[TaskDetail] {
        &self.tasks
    }

    /// Tasks shown under `status`, in fetch order.
    pub fn column(&self, status: TaskStatus) -> Vec<&TaskDetail> {
        self.tasks
            .iter()
            .filter(|detail| detail.task.status == status)
            .collect()
    }

    /// All four columns in board order.
    pub fn columns(&self) -> Vec<(TaskStatus, Vec<&TaskDetail>)> {
        TaskStatus::ALL
            .into_iter()
            .map(|status| (status, self.column(status)))
            .collect()
    }

    pub fn status_of(&self, task_id: &str) -> Option<TaskStatus> {
        self.find(task_id).map(|detail| detail.task.status)
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn dismiss(&mut self, index: usize) -> Option<Notice> {
        if index < self.notices.len() {
            Some(self.notices.remove(index))
        } else {
            None
        }
    }

    /// Picks up a task. Nothing changes on the board yet.
    pub fn begin_drag(&mut self, task_id: &str) -> Result<(), BoardError> {
        self.ensure_idle()?;
        if self.find(task_id).is_none() {
            return Err(BoardError::UnknownTask(task_id.to_string()));
        }
        self.phase = BoardPhase::Dragging {
            task_id: task_id.to_string(),
        };
        Ok(())
    }

    pub fn cancel_drag(&mut self) -> Result<(), BoardError> {
        match self.phase {
            BoardPhase::Dragging { .. } => {
                self.phase = BoardPhase::Idle;
                Ok(())
            }
            _ => Err(BoardError::NotDragging),
        }
    }

    /// Drops the dragged task on `target`, or outside any column for `None`.
    pub fn drop_on(&mut self, target: Option<TaskStatus>) -> Result<DropOutcome, BoardError> {
        let task_id = match &self.phase {
            BoardPhase::Dragging { task_id } => task_id.clone(),
            _ => return Err(BoardError::NotDragging),
        };

        let Some(target) = target else {
            self.phase = BoardPhase::Idle;
            return Ok(DropOutcome::Cancelled);
        };

        // The list may have changed under the drag; never stay stuck in it.
        let Some(previous) = self.status_of(&task_id) else {
            self.phase = BoardPhase::Idle;
            return Err(BoardError::UnknownTask(task_id));
        };
        if previous == target {
            self.phase = BoardPhase::Idle;
            return Ok(DropOutcome::Unchanged);
        }

        if let Some(detail) = self.find_mut(&task_id) {
            detail.task.status = target;
        }
        debug!("Task {} moved {} -> {} locally", task_id, previous, target);
        self.phase = BoardPhase::Reconciling {
            task_id: task_id.clone(),
            target,
            previous,
        };
        Ok(DropOutcome::Pending(MoveRequest {
            task_id,
            status: target,
        }))
    }

    /// Applies the server's answer to the move in flight.
    ///
    /// On success the returned record replaces the local fields (joined
    /// relations are kept). On failure the task goes back to the column it
    /// was dragged from and a dismissible notice is queued.
    pub fn reconcile(&mut self, result: Result<Task, TaskError>) -> Result<(), BoardError> {
        let (task_id, previous) = match &self.phase {
            BoardPhase::Reconciling {
                task_id, previous, ..
            } => (task_id.clone(), *previous),
            _ => return Err(BoardError::NotReconciling),
        };
        self.phase = BoardPhase::Idle;

        match result {
            Ok(task) => {
                if let Some(detail) = self.find_mut(&task_id) {
                    detail.task = task;
                }
                info!("Move of task {} confirmed", task_id);
            }
            Err(err) => {
                if let Some(detail) = self.find_mut(&task_id) {
                    detail.task.status = previous;
                }
                warn!("Move of task {} failed, rolled back: {}", task_id, err);
                self.notify(
                    NoticeLevel::Dismissible,
                    format!("Could not move task: {}", err),
                );
            }
        }
        Ok(())
    }

    /// Full drag, drop, request and reconcile cycle for one task.
    pub async fn move_task(
        &mut self,
        api: &dyn TaskApi,
        task_id: &str,
        target: TaskStatus,
    ) -> Result<MoveOutcome, BoardError> {
        self.begin_drag(task_id)?;
        let request = match self.drop_on(Some(target))? {
            DropOutcome::Pending(request) => request,
            _ => return Ok(MoveOutcome::Unchanged),
        };

        let result = api.update_task_status(&request.task_id, request.status).await;
        self.reconcile(result.clone())?;
        Ok(match result {
            Ok(task) => MoveOutcome::Confirmed(task),
            Err(err) => MoveOutcome::RolledBack(err),
        })
    }

    /// Creates a task and appends it, with its author and assignee joined,
    /// to its column. Failures are queued as notices, blocking unless the
    /// failure was transient.
    pub async fn create_task(
        &mut self,
        api: &dyn TaskApi,
        req: CreateTaskRequest,
    ) -> Result<Task, BoardError> {
        match api.create_task(req).await {
            Ok(task) => {
                if task.project_id == self.project_id {
                    let detail = self.joined(api, &task).await;
                    self.tasks.push(detail);
                }
                Ok(task)
            }
            Err(err) => {
                let level = if err.is_blocking() {
                    NoticeLevel::Blocking
                } else {
                    NoticeLevel::Dismissible
                };
                self.notify(level, format!("Could not create task: {}", err));
                Err(err.into())
            }
        }
    }

    /// Looks the created task up on the server so the board gets its joined
    /// relations. Falls back to the bare record if the fetch fails.
    async fn joined(&self, api: &dyn TaskApi, task: &Task) -> TaskDetail {
        match api.list_tasks(&self.project_id).await {
            Ok(details) => details
                .into_iter()
                .find(|detail| detail.task.id == task.id)
                .unwrap_or_else(|| TaskDetail::bare(task.clone())),
            Err(err) => {
                warn!("Could not join relations of task {}: {}", task.id, err);
                TaskDetail::bare(task.clone())
            }
        }
    }

    fn ensure_idle(&self) -> Result<(), BoardError> {
        match &self.phase {
            BoardPhase::Idle => Ok(()),
            BoardPhase::Dragging { task_id } => Err(BoardError::DragInProgress(task_id.clone())),
            BoardPhase::Reconciling { task_id, .. } => {
                Err(BoardError::ReconcileInFlight(task_id.clone()))
            }
        }
    }

    fn notify(&mut self, level: NoticeLevel, message: String) {
        self.notices.push(Notice { level, message });
    }

    fn find(&self, task_id: &str) -> Option<&TaskDetail> {
        self.tasks.iter().find(|detail| detail.task.id == task_id)
    }

    fn find_mut(&mut self, task_id: &str) -> Option<&mut TaskDetail> {
        self.tasks.iter_mut().find(|detail| detail.task.id == task_id)
    }
}
