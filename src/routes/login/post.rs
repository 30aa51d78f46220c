use actix_web::{
    http::StatusCode,
    web::{self, Json},
    HttpResponse, ResponseError,
};
use anyhow::Context;
use chrono::Utc;
use serde::Serialize;

use crate::{
    authentication::{validate_credentials, AuthError, Credentials, TokenKeys},
    services::UserService,
    utils::{error_response, is_valid_email},
};

#[derive(serde::Deserialize)]
pub struct LoginData {
    email: String,
    password: String,
}

#[derive(thiserror::Error, Debug)]
pub enum LoginError {
    #[error("Authentication failed")]
    AuthError(#[source] anyhow::Error),

    #[error("Invalid email format")]
    InvalidEmailFormatError,

    #[error("Something went wrong")]
    UnexpectedError(#[from] anyhow::Error),
}

impl ResponseError for LoginError {
    fn status_code(&self) -> StatusCode {
        match self {
            LoginError::InvalidEmailFormatError | LoginError::AuthError(_) => {
                StatusCode::BAD_REQUEST
            }
            LoginError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let LoginError::UnexpectedError(e) = self {
            tracing::error!(error = ?e, "Login failed unexpectedly");
        }
        error_response(self.status_code(), self.to_string())
    }
}

#[derive(Serialize)]
struct Token {
    access_token: String,
}

#[tracing::instrument(name = "Login", skip(login_data, service, keys), fields(email = %login_data.email))]
pub async fn login(
    login_data: Json<LoginData>,
    service: web::Data<UserService>,
    keys: web::Data<TokenKeys>,
) -> Result<HttpResponse, LoginError> {
    if !is_valid_email(&login_data.email) {
        return Err(LoginError::InvalidEmailFormatError);
    }

    let LoginData { email, password } = login_data.into_inner();
    let credentials = Credentials { email, password };

    let user = validate_credentials(credentials, service.repository())
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials(e) => LoginError::AuthError(e),
            AuthError::UnexpectedError(e) => LoginError::UnexpectedError(e),
        })?;

    service
        .repository()
        .record_login(user.id, Utc::now())
        .await
        .context("Failed to record the login time.")?;

    let access_token = keys.generate_token(user.id, &user.role)?;

    Ok(HttpResponse::Ok().json(Token { access_token }))
}
