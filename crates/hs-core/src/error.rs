//! # AppError
//!
//! Centralized error handling for Hostel Solve.
//! Maps domain-specific failures to the handful of outcomes the HTTP layer
//! knows how to report.

use thiserror::Error;

/// The primary error type for all hs-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., issue, facility, user)
    #[error("{0} not found")]
    NotFound(String),

    /// Missing or malformed input (e.g., blank title, unknown status)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Credentials did not match
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Resource already exists (e.g., duplicate email on registration)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Infrastructure failure (e.g., database down, unreadable store file)
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    /// The message meant for the client, without the category prefix.
    pub fn message(&self) -> String {
        match self {
            Self::NotFound(what) => {
                let mut chars = what.chars();
                match chars.next() {
                    Some(first) => format!("{}{} not found", first.to_uppercase(), chars.as_str()),
                    None => "Not found".to_string(),
                }
            }
            Self::ValidationError(msg)
            | Self::Unauthorized(msg)
            | Self::Conflict(msg)
            | Self::Internal(msg) => msg.clone(),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

/// A specialized Result type for Hostel Solve logic.
pub type Result<T> = std::result::Result<T, AppError>;
