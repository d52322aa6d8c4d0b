//! Error types for store, auth and fixture operations, plus the structured
//! error returned over HTTP.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of record store mutations and workspace actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Task not found: {0}")]
    TaskNotFound(String),
    #[error("Project not found: {0}")]
    ProjectNotFound(String),
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("Task title must not be empty")]
    EmptyTitle,
    #[error("{field} must be a non-negative number")]
    InvalidHours { field: &'static str },
    #[error("No user is signed in")]
    NotSignedIn,
    #[error("No project is selected")]
    NoProjectSelected,
}

/// Login failures. Deliberately generic: an unknown email and a wrong
/// password are the same error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Login attempt was superseded by a newer attempt")]
    Superseded,
}

/// Failures while loading or validating a fixture dataset.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("Failed to read fixtures from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid YAML fixtures: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid JSON fixtures: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Fixture integrity check failed: {0}")]
    Integrity(String),
}

/// Failures reading or writing the durable session record.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Corrupt session record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,

    // Not found errors
    TaskNotFound,
    ProjectNotFound,
    UserNotFound,

    // Session errors
    InvalidCredentials,
    LoginSuperseded,
    NotSignedIn,
    NoProjectSelected,

    // Internal errors
    InternalError,
}

impl ErrorCode {
    /// HTTP status the code maps to.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::MissingRequiredField
            | ErrorCode::InvalidFieldValue
            | ErrorCode::NoProjectSelected => 400,
            ErrorCode::InvalidCredentials | ErrorCode::NotSignedIn => 401,
            ErrorCode::TaskNotFound | ErrorCode::ProjectNotFound | ErrorCode::UserNotFound => 404,
            ErrorCode::LoginSuperseded => 409,
            ErrorCode::InternalError => 500,
        }
    }
}

/// Structured error for API responses.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            StoreError::TaskNotFound(_) => Self::new(ErrorCode::TaskNotFound, message),
            StoreError::ProjectNotFound(_) => {
                Self::new(ErrorCode::ProjectNotFound, message).with_field("project_id")
            }
            StoreError::UserNotFound(_) => Self::new(ErrorCode::UserNotFound, message),
            StoreError::EmptyTitle => Self::invalid_value("title", &message),
            StoreError::InvalidHours { field } => Self::invalid_value(field, &message),
            StoreError::NotSignedIn => Self::new(ErrorCode::NotSignedIn, message),
            StoreError::NoProjectSelected => Self::new(ErrorCode::NoProjectSelected, message),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let code = match err {
            AuthError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AuthError::Superseded => ErrorCode::LoginSuperseded,
        };
        Self::new(code, err.to_string())
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
