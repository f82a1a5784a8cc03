//! Scripted transports for unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::http::{HttpRequest, HttpResponse};
use crate::session::SessionStore;
use crate::transport::{Transport, TransportError};

type Handler = dyn Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync;

/// Answers every request from a closure and records what was sent.
pub(crate) struct MockTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub(crate) fn new(
        handler: impl Fn(&HttpRequest) -> Result<HttpResponse, TransportError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let result = (self.handler)(&request);
        self.requests.lock().unwrap().push(request);
        result
    }
}

/// Wraps a `MockTransport`, holding each request for a per-request delay.
pub(crate) struct DelayedTransport {
    inner: Arc<MockTransport>,
    delay: Box<dyn Fn(&HttpRequest) -> Duration + Send + Sync>,
}

impl DelayedTransport {
    pub(crate) fn new(
        inner: Arc<MockTransport>,
        delay: impl Fn(&HttpRequest) -> Duration + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            inner,
            delay: Box::new(delay),
        })
    }
}

#[async_trait]
impl Transport for DelayedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        tokio::time::sleep((self.delay)(&request)).await;
        self.inner.execute(request).await
    }
}

/// Answers after `delay`, or never when `delay` is `None`.
pub(crate) struct SlowTransport {
    delay: Option<Duration>,
    response: HttpResponse,
}

impl SlowTransport {
    pub(crate) fn never() -> Self {
        Self {
            delay: None,
            response: empty(200),
        }
    }

    pub(crate) fn after(delay: Duration, response: HttpResponse) -> Self {
        Self {
            delay: Some(delay),
            response,
        }
    }
}

#[async_trait]
impl Transport for SlowTransport {
    async fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, TransportError> {
        match self.delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => std::future::pending::<()>().await,
        }
        Ok(self.response.clone())
    }
}

pub(crate) fn json_response(status: u16, body: serde_json::Value) -> HttpResponse {
    let body = body.to_string();
    HttpResponse {
        status,
        headers: vec![
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Content-Length".to_string(), body.len().to_string()),
        ],
        body,
    }
}

pub(crate) fn empty(status: u16) -> HttpResponse {
    HttpResponse {
        status,
        headers: vec![("Content-Length".to_string(), "0".to_string())],
        body: String::new(),
    }
}

pub(crate) fn client_with(transport: Arc<dyn Transport>, session: Arc<SessionStore>) -> ApiClient {
    ApiClient::new(&ClientConfig::default(), transport, session)
}
