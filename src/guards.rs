//! Request gates applied to the single-user routes.
//!
//! The chain runs in this order and stops at the first failure:
//! [`require_numeric_id`], [`require_existing_user`],
//! [`TokenGuard`](crate::authentication::TokenGuard),
//! [`PermissionGuard`](crate::authentication::PermissionGuard).

use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    middleware::Next,
    web, Error, HttpResponse, ResponseError,
};

use crate::{services::UserService, utils::error_response};

#[derive(thiserror::Error, Debug)]
pub enum GuardError {
    #[error("Invalid user id")]
    InvalidUserId,

    #[error("User not found")]
    UserNotFound,

    #[error("Unauthorized: Invalid token")]
    InvalidToken,

    #[error("Unauthorized: Token has expired")]
    TokenExpired,

    #[error("Forbidden: Insufficient permissions")]
    Forbidden,

    #[error("Something went wrong")]
    UnexpectedError(#[from] anyhow::Error),
}

impl ResponseError for GuardError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidUserId => StatusCode::BAD_REQUEST,
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::InvalidToken | Self::TokenExpired => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Self::UnexpectedError(e) = self {
            tracing::error!(error = ?e, "Request guard failed");
        }
        error_response(self.status_code(), self.to_string())
    }
}

/// Accepts only a non-empty run of ASCII digits that fits an `i64`.
pub fn parse_user_id(raw: &str) -> Option<i64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn path_user_id(req: &ServiceRequest) -> Result<i64, GuardError> {
    req.match_info()
        .get("id")
        .and_then(parse_user_id)
        .ok_or(GuardError::InvalidUserId)
}

pub async fn require_numeric_id(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    path_user_id(&req)?;
    next.call(req).await
}

pub async fn require_existing_user(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let id = path_user_id(&req)?;
    let service = req
        .app_data::<web::Data<UserService>>()
        .cloned()
        .ok_or_else(|| GuardError::UnexpectedError(anyhow::anyhow!("UserService is not registered")))?;

    if service.get_user_by_id(id).await?.message.is_none() {
        return Err(GuardError::UserNotFound.into());
    }

    next.call(req).await
}
