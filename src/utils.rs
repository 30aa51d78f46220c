use std::sync::LazyLock;

use actix_web::{
    error::{InternalError, JsonPayloadError, QueryPayloadError},
    http::StatusCode,
    HttpRequest, HttpResponse, ResponseError,
};
use chrono::Utc;
use regex::Regex;
use serde::Serialize;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w\.+-]+@[a-zA-Z0-9\.-]+\.[a-zA-Z]{2,}$").expect("email pattern is valid")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

#[derive(Serialize)]
pub struct ErrorResponse {
    message: String,
    timestamp: String,
}

/// Builds the JSON error body shared by every route.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    let response = ErrorResponse {
        message: message.into(),
        timestamp: Utc::now().to_rfc3339(),
    };
    HttpResponse::build(status).json(response)
}

/// Replaces actix's plain text extractor rejection with the JSON error body.
/// The deserializer detail only goes to the log.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, "Rejected request body");
    let response = error_response(err.status_code(), "Invalid request body");
    InternalError::from_response(err, response).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, "Rejected query string");
    let response = error_response(StatusCode::BAD_REQUEST, "Invalid query string");
    InternalError::from_response(err, response).into()
}
