use anyhow::{Context, Error};
use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};

use crate::{domain::User, persistence::UserRepository, telemetry::spawn_blocking_with_tracing};

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials.")]
    InvalidCredentials(#[source] anyhow::Error),

    #[error("Something went wrong")]
    UnexpectedError(#[from] anyhow::Error),
}

#[derive(serde::Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[tracing::instrument(name = "Get stored credentials", skip(email, repository))]
async fn get_stored_credentials(
    email: &str,
    repository: &dyn UserRepository,
) -> Result<Option<User>, anyhow::Error> {
    let user = repository
        .find_by_email(email)
        .await
        .context("Failed to performed a query to retrieve stored credentials.")?
        .filter(|user| user.status);
    Ok(user)
}

/// Returns the active user owning `credentials`.
#[tracing::instrument(name = "Validate credentials", skip(credentials, repository))]
pub async fn validate_credentials(
    credentials: Credentials,
    repository: &dyn UserRepository,
) -> Result<User, AuthError> {
    let Some(user) = get_stored_credentials(&credentials.email, repository).await? else {
        return Err(AuthError::InvalidCredentials(anyhow::anyhow!(
            "Unknown user."
        )));
    };

    let stored_password_hash = user.password.clone();
    spawn_blocking_with_tracing(move || {
        verify_password_hash(stored_password_hash, credentials.password)
    })
    .await
    .context("Failed to spawn blocking task.")??;

    Ok(user)
}

#[tracing::instrument(
    name = "Verify password hash",
    skip(expected_password_hash, password_candidate)
)]
fn verify_password_hash(
    expected_password_hash: String,
    password_candidate: String,
) -> Result<(), AuthError> {
    let expected_password_hash = PasswordHash::new(&expected_password_hash)
        .context("Failed to parse hash in PHC string format.")?;

    Argon2::default()
        .verify_password(password_candidate.as_bytes(), &expected_password_hash)
        .map_err(|e| AuthError::InvalidCredentials(anyhow::anyhow!("Invalid password: {e}")))
}

pub fn compute_password_hash(password: String) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(Error::msg)?
        .to_string();

    Ok(password_hash)
}
