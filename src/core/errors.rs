// src/core/errors.rs

//! Defines the primary error type for the entire crate.

use thiserror::Error;

/// The main error enum, representing all possible failures within the gate.
/// Using `thiserror` allows for clean error definitions and automatic `From` trait implementations.
///
/// Policy: every variant resolves to a deny, an unauthenticated response, or a
/// retryable unavailable signal at the call site. Nothing here ever fails open.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FenceError {
    #[error("Missing or malformed credentials")]
    Unauthenticated,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("User registry is still initializing")]
    ServiceUnavailable,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Malformed request body: {0}")]
    BodyParse(String),

    #[error("Explicit index in {0} request is not allowed")]
    ExplicitIndexDisallowed(String),

    #[error("User store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Username '{0}' is already registered")]
    UserExists(String),

    #[error("Unknown user '{0}'")]
    UnknownUser(String),

    #[error("Username '{0}' is reserved")]
    ReservedUser(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

// --- From trait implementations for easy error conversion ---

impl From<serde_json::Error> for FenceError {
    fn from(e: serde_json::Error) -> Self {
        FenceError::BodyParse(e.to_string())
    }
}

impl From<reqwest::Error> for FenceError {
    fn from(e: reqwest::Error) -> Self {
        FenceError::StoreUnavailable(e.to_string())
    }
}

impl From<url::ParseError> for FenceError {
    fn from(e: url::ParseError) -> Self {
        FenceError::InvalidPath(e.to_string())
    }
}
