//! Outcome classification for completed requests.
//!
//! # Design
//! `RequestOutcome` is the only thing `ApiClient::send` hands back to its
//! callers. Auth and task logic match on it and never look at status codes or
//! headers themselves, so the rules below are the single place where a raw
//! response becomes a category.
//!
//! A 2xx response only counts as `Data` when its metadata says it carries
//! JSON: a declared `Content-Length` of zero, or a content type other than
//! JSON, yields `Empty` without looking at the body. A body that claims to be
//! JSON and fails to parse is a malformed response and lands in
//! `NetworkError`, never in `Empty`.

use serde_json::Value;

use crate::http::HttpResponse;

/// Result of one logical request, as seen by auth and task logic.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// 2xx with a JSON body.
    Data(Value),
    /// 2xx with no body, or a body that is not JSON.
    Empty,
    /// 401. The session has already been cleared when this is returned.
    AuthExpired { message: Option<String> },
    /// Any other non-2xx status. `message` is the server's `message` field.
    HttpError { status: u16, message: Option<String> },
    /// No response was received, or the response could not be decoded.
    NetworkError(String),
    /// No response within the configured bound.
    Timeout,
    /// An authorized request was attempted without a session token.
    NoSession,
}

impl RequestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Data(_) | RequestOutcome::Empty)
    }
}

/// Map a received response to its outcome category.
///
/// Pure: the session side effect of a 401 is applied by `ApiClient::send`.
pub fn classify(response: &HttpResponse) -> RequestOutcome {
    if response.status == 401 {
        return RequestOutcome::AuthExpired {
            message: server_message(&response.body),
        };
    }
    if !response.is_success() {
        return RequestOutcome::HttpError {
            status: response.status,
            message: server_message(&response.body),
        };
    }

    let declared_empty = response
        .header("content-length")
        .and_then(|len| len.trim().parse::<u64>().ok())
        == Some(0);
    let is_json = response
        .header("content-type")
        .is_some_and(|ct| ct.to_ascii_lowercase().contains("application/json"));

    if declared_empty || !is_json {
        return RequestOutcome::Empty;
    }

    match serde_json::from_str(&response.body) {
        Ok(value) => RequestOutcome::Data(value),
        Err(e) => RequestOutcome::NetworkError(format!("malformed response body: {e}")),
    }
}

/// Extract `{"message": "..."}` from an error body, if there is one.
fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
