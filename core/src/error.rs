//! Error types surfaced by `AuthFlow` and `TaskStore`.
//!
//! # Design
//! Each flow translates a `RequestOutcome` into its own error enum, so no raw
//! transport failure escapes uncategorised. The `Display` text is what the
//! presentation layer shows; only the variant is contractual.

use crate::outcome::RequestOutcome;
use crate::types::TaskId;

/// Sign-in / sign-up failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("please fill in all fields")]
    MissingFields,

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("password must be at least {} characters long", crate::auth::MIN_PASSWORD_LEN)]
    PasswordTooShort,

    /// The server refused the request.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    /// Success response without an `accessToken`.
    #[error("server did not return an access token")]
    MissingToken,

    /// Success response without a JSON body.
    #[error("unexpected empty response from server")]
    UnexpectedResponse,

    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out, please check if the server is running")]
    Timeout,
}

/// Task operation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("please login first")]
    NoSession,

    #[error("session expired, please login again")]
    AuthExpired,

    #[error("server error ({status}){}", message_suffix(.message))]
    Http { status: u16, message: Option<String> },

    #[error("cannot reach server: {0}")]
    Network(String),

    #[error("request timed out, please check if the server is running")]
    Timeout,

    /// Success without the task the operation needs back.
    #[error("server returned an empty response")]
    EmptyResponse,

    #[error("server returned an invalid task payload: {0}")]
    InvalidPayload(String),

    #[error("task {0} is not loaded")]
    UnknownTask(TaskId),
}

fn message_suffix(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

impl TaskError {
    /// Whether this belongs to the "server unreachable or response malformed"
    /// category.
    pub fn is_network_class(&self) -> bool {
        matches!(
            self,
            TaskError::Network(_) | TaskError::EmptyResponse | TaskError::InvalidPayload(_)
        )
    }

    /// The error for a failure-class outcome. Success outcomes have no error
    /// of their own and map to `EmptyResponse`; callers only reach for this
    /// after handling the outcomes they accept.
    pub(crate) fn from_outcome(outcome: RequestOutcome) -> Self {
        match outcome {
            RequestOutcome::NoSession => TaskError::NoSession,
            RequestOutcome::AuthExpired { .. } => TaskError::AuthExpired,
            RequestOutcome::HttpError { status, message } => TaskError::Http { status, message },
            RequestOutcome::NetworkError(cause) => TaskError::Network(cause),
            RequestOutcome::Timeout => TaskError::Timeout,
            RequestOutcome::Data(_) | RequestOutcome::Empty => TaskError::EmptyResponse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_message_includes_server_text() {
        let err = TaskError::Http {
            status: 404,
            message: Some("Task not found".to_string()),
        };
        assert_eq!(err.to_string(), "server error (404): Task not found");
        let bare = TaskError::Http { status: 500, message: None };
        assert_eq!(bare.to_string(), "server error (500)");
    }

    #[test]
    fn network_class_covers_malformed_responses() {
        assert!(TaskError::Network("refused".into()).is_network_class());
        assert!(TaskError::EmptyResponse.is_network_class());
        assert!(TaskError::InvalidPayload("bad".into()).is_network_class());
        assert!(!TaskError::Timeout.is_network_class());
        assert!(!TaskError::AuthExpired.is_network_class());
    }

    #[test]
    fn outcomes_map_one_to_one() {
        assert_eq!(TaskError::from_outcome(RequestOutcome::NoSession), TaskError::NoSession);
        assert_eq!(
            TaskError::from_outcome(RequestOutcome::AuthExpired { message: None }),
            TaskError::AuthExpired
        );
        assert_eq!(TaskError::from_outcome(RequestOutcome::Timeout), TaskError::Timeout);
        assert_eq!(
            TaskError::from_outcome(RequestOutcome::HttpError { status: 500, message: None }),
            TaskError::Http { status: 500, message: None }
        );
    }

    #[test]
    fn too_short_message_names_the_minimum() {
        assert_eq!(
            AuthError::PasswordTooShort.to_string(),
            "password must be at least 6 characters long"
        );
    }
}
