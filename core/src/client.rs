//! Authenticated request layer for the task API.
//!
//! # Design
//! `ApiClient` keeps the split of its predecessor: `build_*` methods are pure
//! and produce an `HttpRequest` for one endpoint, while `send` performs the
//! round-trip through a `Transport` and hands back a `RequestOutcome`.
//!
//! `send` owns every cross-cutting rule: the no-token short circuit, default
//! headers, the timeout, and the reaction to 401. Dropping the future
//! returned by `send` cancels the request; nothing is written to the session
//! afterwards.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::config::ClientConfig;
use crate::http::{HttpMethod, HttpRequest};
use crate::outcome::{classify, RequestOutcome};
use crate::session::SessionStore;
use crate::transport::Transport;
use crate::types::{TaskId, TaskRequest};

/// Result of the liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ServerStatus {
    #[default]
    Checking,
    Online,
    Offline,
}

pub struct ApiClient {
    base_url: String,
    timeout: Duration,
    transport: Arc<dyn Transport>,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>, session: Arc<SessionStore>) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            transport,
            session,
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn build_sign_in(&self, username: &str, password: &str) -> HttpRequest {
        let body = json!({ "username": username, "password": password });
        self.request(HttpMethod::Post, "/api/auth/signin", Some(body.to_string()), false)
    }

    pub fn build_sign_up(&self, username: &str, email: &str, password: &str) -> HttpRequest {
        let body = json!({ "username": username, "email": email, "password": password });
        self.request(HttpMethod::Post, "/api/auth/signup", Some(body.to_string()), false)
    }

    pub fn build_health_check(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/api/auth/test", None, false)
    }

    pub fn build_list_tasks(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/api/tasks", None, true)
    }

    pub fn build_create_task(&self, input: &TaskRequest) -> HttpRequest {
        self.request(HttpMethod::Post, "/api/tasks", Some(task_body(input)), true)
    }

    pub fn build_update_task(&self, id: TaskId, input: &TaskRequest) -> HttpRequest {
        let path = format!("/api/tasks/{id}");
        self.request(HttpMethod::Put, &path, Some(task_body(input)), true)
    }

    pub fn build_delete_task(&self, id: TaskId) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/api/tasks/{id}"), None, true)
    }

    /// Perform one request and classify what came back. Never retries.
    pub async fn send(&self, request: HttpRequest) -> RequestOutcome {
        let token = self.session.get();
        if request.requires_auth && token.is_none() {
            tracing::debug!(url = %request.url, "no session token, request not sent");
            return RequestOutcome::NoSession;
        }

        let mut request = request.with_default_header("Content-Type", "application/json");
        if request.requires_auth {
            if let Some(token) = token {
                request = request.with_default_header("Authorization", format!("Bearer {token}"));
            }
        }

        let method = request.method.as_str();
        let url = request.url.clone();
        tracing::debug!(method, url = %url, "sending request");

        let response = match tokio::time::timeout(self.timeout, self.transport.execute(request)).await {
            Err(_) => {
                tracing::warn!(method, url = %url, timeout = ?self.timeout, "request timed out");
                return RequestOutcome::Timeout;
            }
            Ok(Err(e)) => {
                tracing::warn!(method, url = %url, error = %e, "request failed");
                return RequestOutcome::NetworkError(e.to_string());
            }
            Ok(Ok(response)) => response,
        };

        let outcome = classify(&response);
        tracing::debug!(method, url = %url, status = response.status, "response received");
        if matches!(outcome, RequestOutcome::AuthExpired { .. }) && self.session.clear() {
            tracing::info!("server rejected session token, signed out");
        }
        outcome
    }

    /// Probe `GET /api/auth/test`; any 2xx means the server is reachable.
    pub async fn check_server(&self) -> ServerStatus {
        let outcome = self.send(self.build_health_check()).await;
        if outcome.is_success() {
            ServerStatus::Online
        } else {
            tracing::warn!(?outcome, "server liveness probe failed");
            ServerStatus::Offline
        }
    }

    fn request(&self, method: HttpMethod, path: &str, body: Option<String>, requires_auth: bool) -> HttpRequest {
        HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            headers: Vec::new(),
            body,
            requires_auth,
        }
    }
}

fn task_body(input: &TaskRequest) -> String {
    json!({
        "title": input.title,
        "description": input.description,
        "status": input.status,
        "priority": input.priority,
    })
    .to_string()
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
