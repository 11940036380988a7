//! hostel-solve/crates/hs-api/src/middleware.rs Middleware
//!
//! Access logging, CORS, response headers, and extractor error handling.

use actix_cors::Cors;
use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{web, HttpRequest};
use hs_core::AppError;

use crate::error::{ApiError, Envelope};

/// Access log in the default format:
/// remote-ip "request-line" status-code response-size "referrer" "user-agent"
pub fn standard_middleware() -> Logger {
    Logger::default()
}

/// The JSON API is open to other origins; pages are same-origin anyway.
pub fn cors_policy() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT"])
        .allow_any_header()
        .max_age(3600)
}

pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"))
        .add(("X-Frame-Options", "DENY"))
}

/// Malformed JSON bodies answer 400 in the endpoint's own envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, req: &HttpRequest| {
        let envelope = Envelope::for_path(req.path());
        ApiError::with_envelope(
            AppError::ValidationError(format!("Invalid request body: {err}")),
            envelope,
        )
        .into()
    })
}

/// Bad query strings (e.g. `facility_id=abc`) answer 400 as well.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, req: &HttpRequest| {
        let envelope = Envelope::for_path(req.path());
        ApiError::with_envelope(
            AppError::ValidationError(format!("Invalid query string: {err}")),
            envelope,
        )
        .into()
    })
}

/// Non-numeric ids in the path (`/api/issues/abc`) are bad input, not a miss.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err: PathError, req: &HttpRequest| {
        let envelope = Envelope::for_path(req.path());
        ApiError::with_envelope(
            AppError::ValidationError(format!("Invalid path: {err}")),
            envelope,
        )
        .into()
    })
}
