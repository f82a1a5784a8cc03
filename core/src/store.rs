//! The signed-in user's task list.
//!
//! # Design
//! `TaskStore` owns the cached `TaskCollection` plus the small amount of UI
//! state around it: an in-flight counter behind `is_busy`, the last error,
//! and the server liveness status. Every operation is one `ApiClient::send`
//! followed by `collection::merge`; the cache is written only after the
//! server has answered, never ahead of it.
//!
//! Operations take `&self` and may run concurrently. The state lock is never
//! held across an await, so each merge sees the collection as left by the
//! previous completed operation. Dropping an operation's future abandons it
//! without touching the collection.
//!
//! `reset` starts a new generation. A response that arrives for an operation
//! begun in an earlier generation is dropped without touching the collection
//! or the error slot, so a request still in flight at logout cannot repopulate
//! the signed-out view.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::client::{ApiClient, ServerStatus};
use crate::collection::{merge, Operation, TaskCollection};
use crate::error::TaskError;
use crate::http::HttpRequest;
use crate::types::{Task, TaskDraft, TaskId, TaskRequest, TaskUpdate};

#[derive(Debug, Default)]
struct StoreState {
    tasks: TaskCollection,
    in_flight: usize,
    last_error: Option<TaskError>,
    server_status: ServerStatus,
    generation: u64,
}

#[derive(Debug)]
pub struct TaskStore {
    client: Arc<ApiClient>,
    state: Mutex<StoreState>,
}

/// Marks one operation as in flight until dropped.
struct BusyGuard<'a> {
    store: &'a TaskStore,
    generation: u64,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.store.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}

impl TaskStore {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            state: Mutex::new(StoreState::default()),
        }
    }

    pub fn tasks(&self) -> TaskCollection {
        self.lock().tasks.clone()
    }

    pub fn task(&self, id: TaskId) -> Option<Task> {
        self.lock().tasks.get(id).cloned()
    }

    pub fn is_busy(&self) -> bool {
        self.lock().in_flight > 0
    }

    pub fn last_error(&self) -> Option<TaskError> {
        self.lock().last_error.clone()
    }

    pub fn dismiss_error(&self) {
        self.lock().last_error = None;
    }

    pub fn server_status(&self) -> ServerStatus {
        self.lock().server_status
    }

    /// False once the session is gone, including after a 401 on any request.
    pub fn is_signed_in(&self) -> bool {
        self.client.session().is_authenticated()
    }

    /// Forget cached tasks, the last error and the server status, e.g. after
    /// logout. Operations still in flight keep `is_busy` set until they
    /// finish, but their responses are discarded.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.tasks = TaskCollection::new();
        state.last_error = None;
        state.server_status = ServerStatus::Checking;
        state.generation += 1;
    }

    /// Probe the server, then load tasks if it answered.
    pub async fn initialize(&self) -> Result<(), TaskError> {
        let generation = {
            let mut state = self.lock();
            state.server_status = ServerStatus::Checking;
            state.generation
        };
        let status = self.client.check_server().await;
        {
            let mut state = self.lock();
            if state.generation != generation {
                tracing::debug!("store was reset during the liveness probe");
                return Ok(());
            }
            state.server_status = status;
        }
        if status == ServerStatus::Offline {
            return Err(self.fail(TaskError::Network("backend server is not reachable".to_string())));
        }
        self.load().await
    }

    pub async fn load(&self) -> Result<(), TaskError> {
        self.run(Operation::Load, self.client.build_list_tasks()).await?;
        Ok(())
    }

    /// Create a task. A blank title is ignored and sends nothing.
    pub async fn create(&self, title: &str, description: &str) -> Result<Option<Task>, TaskError> {
        if title.trim().is_empty() {
            return Ok(None);
        }
        let request = self.client.build_create_task(&TaskRequest::new(title, description));
        self.run(Operation::Create, request).await
    }

    /// Send `update` overlaid on the cached copy of task `id`.
    pub async fn update(&self, id: TaskId, update: TaskUpdate) -> Result<Task, TaskError> {
        let current = self.task(id).ok_or_else(|| self.fail(TaskError::UnknownTask(id)))?;
        let request = self.client.build_update_task(id, &update.apply_to(&current));
        self.run(Operation::Update(id), request)
            .await?
            .ok_or(TaskError::EmptyResponse)
    }

    pub async fn delete(&self, id: TaskId) -> Result<(), TaskError> {
        if !self.lock().tasks.contains(id) {
            return Err(self.fail(TaskError::UnknownTask(id)));
        }
        self.run(Operation::Delete(id), self.client.build_delete_task(id)).await?;
        Ok(())
    }

    /// Flip PENDING and COMPLETED, echoing every other field.
    pub async fn toggle_complete(&self, id: TaskId) -> Result<Task, TaskError> {
        let current = self.task(id).ok_or_else(|| self.fail(TaskError::UnknownTask(id)))?;
        self.update(id, TaskUpdate::status(current.status.toggled())).await
    }

    /// Save an edit buffer. A blank title is ignored and sends nothing.
    pub async fn commit_draft(&self, draft: &TaskDraft) -> Result<Option<Task>, TaskError> {
        if draft.title.trim().is_empty() {
            return Ok(None);
        }
        self.update(draft.id, draft.to_update()).await.map(Some)
    }

    async fn run(&self, operation: Operation, request: HttpRequest) -> Result<Option<Task>, TaskError> {
        let busy = self.begin();
        let outcome = self.client.send(request).await;

        let mut state = self.lock();
        if state.generation != busy.generation {
            tracing::debug!(?operation, "store was reset while the request was in flight, response dropped");
            return merge(&state.tasks, operation, outcome).map(|merged| merged.task);
        }
        match merge(&state.tasks, operation, outcome) {
            Ok(merged) => {
                tracing::debug!(?operation, tasks = merged.tasks.len(), "merged server response");
                state.tasks = merged.tasks;
                Ok(merged.task)
            }
            Err(e) => {
                tracing::warn!(?operation, error = %e, "task operation failed");
                state.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    fn begin(&self) -> BusyGuard<'_> {
        let mut state = self.lock();
        state.in_flight += 1;
        state.last_error = None;
        BusyGuard {
            store: self,
            generation: state.generation,
        }
    }

    fn fail(&self, error: TaskError) -> TaskError {
        self.lock().last_error = Some(error.clone());
        error
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
