//! Session and task-synchronisation core for the task tracker client.
//!
//! # Overview
//! Signs a user in against the task service, keeps the session token, and
//! maintains a local copy of the user's tasks that follows the server through
//! create, update, delete and toggle operations. Rendering is left to the
//! caller, which reads state from `SessionStore` / `TaskStore` and forwards
//! user intents into `AuthFlow` / `TaskStore`.
//!
//! # Design
//! - `ApiClient` builds requests as plain data and classifies every response
//!   into a `RequestOutcome`; the network itself sits behind `Transport`.
//! - A 401 anywhere clears the `SessionStore` inside `ApiClient::send`, and
//!   nowhere else.
//! - `TaskStore` changes its `TaskCollection` only through
//!   `collection::merge`, after the server has confirmed the change.
//! - DTOs are defined independently from the mock-server crate; the
//!   end-to-end tests catch schema drift.

pub mod auth;
pub mod client;
pub mod collection;
pub mod config;
pub mod error;
pub mod http;
pub mod outcome;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use auth::{AuthFlow, Session};
pub use client::{ApiClient, ServerStatus};
pub use collection::TaskCollection;
pub use config::ClientConfig;
pub use error::{AuthError, TaskError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use outcome::{classify, RequestOutcome};
pub use session::{FileStorage, MemoryStorage, SessionStore, TokenStorage};
pub use store::TaskStore;
pub use transport::{ReqwestTransport, Transport, TransportError};
pub use types::{Task, TaskDraft, TaskId, TaskPriority, TaskRequest, TaskStatus, TaskUpdate};
