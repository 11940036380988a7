//! # ApiError
//!
//! Turns core errors into HTTP responses. Issue endpoints answer
//! `{"error": ...}`; account endpoints answer
//! `{"success": false, "message": ...}`.

use std::fmt;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use hs_core::AppError;
use serde_json::json;
use tracing::error;

const REDACTED: &str = "Internal server error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    Issue,
    Account,
}

impl Envelope {
    /// Account envelope for the login and register endpoints.
    pub fn for_path(path: &str) -> Self {
        if path.starts_with("/api/login") || path.starts_with("/api/register") {
            Self::Account
        } else {
            Self::Issue
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    inner: AppError,
    envelope: Envelope,
}

impl ApiError {
    pub fn issue(inner: AppError) -> Self {
        Self {
            inner,
            envelope: Envelope::Issue,
        }
    }

    pub fn account(inner: AppError) -> Self {
        Self {
            inner,
            envelope: Envelope::Account,
        }
    }

    pub fn with_envelope(inner: AppError, envelope: Envelope) -> Self {
        Self { inner, envelope }
    }

    pub fn inner(&self) -> &AppError {
        &self.inner
    }

    /// What the client gets to read.
    pub fn public_message(&self) -> String {
        match self.inner {
            AppError::Internal(_) => REDACTED.to_string(),
            _ => self.inner.message(),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(inner: AppError) -> Self {
        Self::issue(inner)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

pub fn status_of(err: &AppError) -> StatusCode {
    match err {
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
        AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        status_of(&self.inner)
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Internal(cause) = &self.inner {
            error!(%cause, "request failed");
        }

        let message = self.public_message();
        let body = match self.envelope {
            Envelope::Issue => json!({ "error": message }),
            Envelope::Account => json!({ "success": false, "message": message }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
