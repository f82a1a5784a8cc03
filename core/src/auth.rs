//! Sign-in and sign-up.
//!
//! Both flows validate their input locally first and issue no request when
//! validation fails. A successful sign-in writes the returned token into the
//! `SessionStore`; a successful sign-up does not sign the user in.

use std::sync::Arc;

use serde_json::Value;

use crate::client::ApiClient;
use crate::error::AuthError;
use crate::outcome::RequestOutcome;

pub const MIN_PASSWORD_LEN: usize = 6;

const SIGN_IN_FAILED: &str = "login failed, please check your credentials";
const SIGN_UP_FAILED: &str = "registration failed, please try again";

/// An authenticated session as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub username: Option<String>,
    pub email: Option<String>,
}

pub fn validate_sign_in(identifier: &str, secret: &str) -> Result<(), AuthError> {
    if identifier.is_empty() || secret.is_empty() {
        return Err(AuthError::MissingFields);
    }
    Ok(())
}

/// Checks run in order: all fields present, secrets match, secret length.
pub fn validate_sign_up(identifier: &str, secret: &str, confirm_secret: &str) -> Result<(), AuthError> {
    if identifier.is_empty() || secret.is_empty() || confirm_secret.is_empty() {
        return Err(AuthError::MissingFields);
    }
    if secret != confirm_secret {
        return Err(AuthError::PasswordMismatch);
    }
    if secret.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordTooShort);
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct AuthFlow {
    client: Arc<ApiClient>,
}

impl AuthFlow {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub fn is_signed_in(&self) -> bool {
        self.client.session().is_authenticated()
    }

    pub async fn sign_in(&self, identifier: &str, secret: &str) -> Result<Session, AuthError> {
        validate_sign_in(identifier, secret)?;

        let outcome = self.client.send(self.client.build_sign_in(identifier, secret)).await;
        let payload = match outcome {
            RequestOutcome::Data(payload) => payload,
            RequestOutcome::Empty => return Err(AuthError::UnexpectedResponse),
            failure => return Err(auth_failure(failure, SIGN_IN_FAILED)),
        };

        let token = payload
            .get("accessToken")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;
        self.client.session().set(token);
        tracing::info!("signed in");

        Ok(Session {
            token: token.to_string(),
            username: string_field(&payload, "username"),
            email: string_field(&payload, "email"),
        })
    }

    /// Register a new account. The identifier doubles as username and email.
    pub async fn sign_up(&self, identifier: &str, secret: &str, confirm_secret: &str) -> Result<(), AuthError> {
        validate_sign_up(identifier, secret, confirm_secret)?;

        let request = self.client.build_sign_up(identifier, identifier, secret);
        match self.client.send(request).await {
            RequestOutcome::Data(_) => {
                tracing::info!("account registered");
                Ok(())
            }
            RequestOutcome::Empty => Err(AuthError::UnexpectedResponse),
            failure => Err(auth_failure(failure, SIGN_UP_FAILED)),
        }
    }

    /// Drop the session. Returns `false` if no one was signed in.
    pub fn sign_out(&self) -> bool {
        let cleared = self.client.session().clear();
        if cleared {
            tracing::info!("signed out");
        }
        cleared
    }
}

fn auth_failure(outcome: RequestOutcome, generic: &str) -> AuthError {
    match outcome {
        RequestOutcome::HttpError { status, message } => AuthError::Rejected {
            status,
            message: message.unwrap_or_else(|| generic.to_string()),
        },
        RequestOutcome::AuthExpired { message } => AuthError::Rejected {
            status: 401,
            message: message.unwrap_or_else(|| generic.to_string()),
        },
        RequestOutcome::NoSession => AuthError::Rejected {
            status: 401,
            message: generic.to_string(),
        },
        RequestOutcome::NetworkError(cause) => AuthError::Network(cause),
        RequestOutcome::Timeout => AuthError::Timeout,
        RequestOutcome::Data(_) | RequestOutcome::Empty => AuthError::UnexpectedResponse,
    }
}

fn string_field(payload: &Value, name: &str) -> Option<String> {
    payload.get(name).and_then(Value::as_str).map(str::to_string)
}
