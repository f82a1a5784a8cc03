//! The client-side task cache and the rules for changing it.
//!
//! # Design
//! `TaskCollection` is an ordered list of tasks, unique by id. It only ever
//! changes through `merge`, a pure function of the current collection, the
//! operation that completed, and that operation's `RequestOutcome`. A failed
//! outcome produces an error and no new collection, so a rejected request
//! can never leave a trace in the cache.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::TaskError;
use crate::outcome::RequestOutcome;
use crate::types::{Task, TaskId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskCollection {
    tasks: Vec<Task>,
}

impl TaskCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a server listing, keeping server order. A repeated id keeps
    /// its first occurrence.
    pub fn from_server(tasks: Vec<Task>) -> Self {
        let mut collection = Self::new();
        for task in tasks {
            if !collection.contains(task.id) {
                collection.tasks.push(task);
            }
        }
        collection
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.get(id).is_some()
    }

    pub fn ids(&self) -> Vec<TaskId> {
        self.tasks.iter().map(|task| task.id).collect()
    }

    /// Append, or replace in place if the id is already cached.
    fn upsert(&mut self, task: Task) {
        if !self.replace(task.clone()) {
            self.tasks.push(task);
        }
    }

    fn replace(&mut self, task: Task) -> bool {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => {
                *slot = task;
                true
            }
            None => false,
        }
    }

    fn remove(&mut self, id: TaskId) {
        self.tasks.retain(|task| task.id != id);
    }
}

impl<'a> IntoIterator for &'a TaskCollection {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

/// The request whose outcome is being merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Load,
    Create,
    Update(TaskId),
    Delete(TaskId),
}

/// Next state after a favourable outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    pub tasks: TaskCollection,
    /// The task the server returned for create/update.
    pub task: Option<Task>,
}

pub fn merge(current: &TaskCollection, operation: Operation, outcome: RequestOutcome) -> Result<Merged, TaskError> {
    let payload = match outcome {
        RequestOutcome::Data(payload) => Some(payload),
        RequestOutcome::Empty => None,
        failure => return Err(TaskError::from_outcome(failure)),
    };

    match (operation, payload) {
        (Operation::Load, Some(payload)) => {
            let tasks: Vec<Task> = decode(payload)?;
            Ok(Merged {
                tasks: TaskCollection::from_server(tasks),
                task: None,
            })
        }
        (Operation::Load, None) => Ok(Merged {
            tasks: TaskCollection::new(),
            task: None,
        }),
        (Operation::Create, Some(payload)) => {
            let task: Task = decode(payload)?;
            let mut tasks = current.clone();
            tasks.upsert(task.clone());
            Ok(Merged { tasks, task: Some(task) })
        }
        (Operation::Update(id), Some(payload)) => {
            let task: Task = decode(payload)?;
            if task.id != id {
                return Err(TaskError::InvalidPayload(format!(
                    "update of task {id} answered with task {}",
                    task.id
                )));
            }
            let mut tasks = current.clone();
            // A task deleted while this update was in flight stays deleted.
            tasks.replace(task.clone());
            Ok(Merged { tasks, task: Some(task) })
        }
        (Operation::Create | Operation::Update(_), None) => Err(TaskError::EmptyResponse),
        (Operation::Delete(id), _) => {
            let mut tasks = current.clone();
            tasks.remove(id);
            Ok(Merged { tasks, task: None })
        }
    }
}

fn decode<T: DeserializeOwned>(payload: Value) -> Result<T, TaskError> {
    serde_json::from_value(payload).map_err(|e| TaskError::InvalidPayload(e.to_string()))
}
