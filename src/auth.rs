//! Session context and registration form checks.
//!
//! Credentials are owned by the hosted identity provider. The gateway in front
//! of this service verifies the provider's token and forwards the resulting
//! identity as headers; handlers receive it as an explicit `Session` rather
//! than reading any global "logged in" state.

use crate::errors::AppError;
use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

const MIN_PASSWORD_LEN: usize = 6;

/// The authenticated caller of a protected operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let user_id = header(USER_ID_HEADER)
            .ok_or_else(|| AppError::unauthorized("sign in to continue"))?;
        validate_user_id(&user_id).map_err(|err| AppError::unauthorized(err.to_string()))?;

        Ok(Session {
            user_id,
            email: header(USER_EMAIL_HEADER),
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UserIdError {
    #[error("user id must not be empty")]
    Empty,
    #[error("user id `{0}` cannot own a storage prefix")]
    Unusable(String),
}

/// A user id names exactly one path segment under each storage category,
/// so it may not be a relative component or contain a separator.
pub fn validate_user_id(user_id: &str) -> Result<(), UserIdError> {
    if user_id.trim().is_empty() {
        return Err(UserIdError::Empty);
    }
    let unusable = user_id == "."
        || user_id == ".."
        || user_id
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control());
    if unusable {
        return Err(UserIdError::Unusable(user_id.to_string()));
    }
    Ok(())
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("You must consent to data processing to create an account")]
    ConsentRequired,
}

/// Sign-up form as submitted by the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub data_processing_consent: bool,
}

impl RegistrationForm {
    /// Checks run in order; the first failure is reported.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        if self.password != self.confirm_password {
            return Err(RegistrationError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(RegistrationError::PasswordTooShort);
        }
        if !self.data_processing_consent {
            return Err(RegistrationError::ConsentRequired);
        }
        Ok(())
    }
}
