use thiserror::Error;

use super::validate::ValidationError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// No session id, or the server answered 401 (the session is cleared).
    #[error("User not authenticated")]
    Unauthenticated,
    /// The record exists but is not owned by the session user, or is gone.
    #[error("{kind} not found or access denied")]
    AccessDenied { kind: &'static str, id: i64 },
    #[error("{0}")]
    NotFound(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("server responded {status}: {message}")]
    Status { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}
