use std::{fmt, sync::Arc};

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use anyhow::Context;
use serde::{Serialize, Serializer};

use super::Envelope;
use crate::{
    authentication::compute_password_hash,
    domain::{
        BulkUserPayload, InsertUser, LoginBound, NewUser, User, UserChanges, UserFilter,
        UserSearch, UserUpdate,
    },
    persistence::{RepositoryError, UserRepository},
    telemetry::spawn_blocking_with_tracing,
    utils::{error_response, is_valid_email},
};

#[derive(thiserror::Error, Debug)]
pub enum UserError {
    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Invalid email format")]
    InvalidEmailFormat,

    #[error("User already exists")]
    AlreadyExists,

    #[error("Invalid timestamp for {0}")]
    InvalidTimestamp(&'static str),

    #[error("Internal Server Error")]
    UnexpectedError(#[from] anyhow::Error),
}

impl ResponseError for UserError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::PasswordMismatch
            | Self::InvalidEmailFormat
            | Self::AlreadyExists
            | Self::InvalidTimestamp(_) => StatusCode::BAD_REQUEST,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let Self::UnexpectedError(e) = self {
            tracing::error!(error = ?e, "Failed to process user request");
        }
        error_response(self.status_code(), self.to_string())
    }
}

/// Outcome of a bulk creation. Serializes as a human readable sentence.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BulkCreateReport {
    pub successful: usize,
    pub failed: usize,
}

impl fmt::Display for BulkCreateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Successful records: {}. Failed records: {}",
            self.successful, self.failed
        )
    }
}

impl Serialize for BulkCreateReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &dyn UserRepository {
        self.repository.as_ref()
    }

    #[tracing::instrument(name = "Create user", skip(self, new_user), fields(email = %new_user.email))]
    pub async fn create_user(&self, new_user: NewUser) -> Result<Envelope<String>, UserError> {
        if new_user.password != new_user.password_second {
            return Err(UserError::PasswordMismatch);
        }

        if !is_valid_email(&new_user.email) {
            return Err(UserError::InvalidEmailFormat);
        }

        if self
            .repository
            .find_by_email(&new_user.email)
            .await
            .context("Failed to check whether the email is taken.")?
            .is_some()
        {
            return Err(UserError::AlreadyExists);
        }

        let password = new_user.password;
        let password_hash = spawn_blocking_with_tracing(move || compute_password_hash(password))
            .await
            .context("Failed to spawn blocking task.")??;

        let row = InsertUser {
            name: new_user.name,
            email: new_user.email,
            password_hash,
            cellphone: new_user.cellphone,
        };

        // The lookup above does not lock anything, so a concurrent insert of
        // the same email only shows up here.
        let user = match self.repository.insert(row).await {
            Ok(user) => user,
            Err(RepositoryError::DuplicateEmail) => return Err(UserError::AlreadyExists),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context("Failed to insert a new user.")
                    .into())
            }
        };

        Ok(Envelope::ok(format!(
            "User created successfully with ID: {}",
            user.id
        )))
    }

    /// Creates every payload in order. Items are independent: a failure is
    /// counted and the remaining items are still processed.
    #[tracing::instrument(name = "Bulk create users", skip(self, payloads), fields(count = payloads.len()))]
    pub async fn bulk_create_users(
        &self,
        payloads: Vec<BulkUserPayload>,
    ) -> Envelope<BulkCreateReport> {
        let mut report = BulkCreateReport::default();

        for payload in payloads {
            let BulkUserPayload::Valid(new_user) = payload else {
                report.failed += 1;
                continue;
            };

            match self.create_user(new_user).await {
                Ok(_) => report.successful += 1,
                Err(e) => {
                    tracing::warn!(error = %e, "Bulk item rejected");
                    report.failed += 1;
                }
            }
        }

        Envelope::ok(report)
    }

    /// The active user with `id`, or `None`.
    #[tracing::instrument(name = "Get user by id", skip(self))]
    pub async fn get_user_by_id(&self, id: i64) -> Result<Envelope<Option<User>>, UserError> {
        let user = self
            .repository
            .find_active_by_id(id)
            .await
            .context("Failed to fetch user.")?;

        Ok(Envelope::ok(user))
    }

    /// Applies the supplied fields to user `id`. Reports success whether or
    /// not a row was touched.
    #[tracing::instrument(name = "Update user", skip(self, changes))]
    pub async fn update_user(
        &self,
        id: i64,
        changes: UserChanges,
    ) -> Result<Envelope<String>, UserError> {
        // an empty password counts as not supplied
        let password_hash = match changes.password.filter(|p| !p.is_empty()) {
            Some(password) => Some(
                spawn_blocking_with_tracing(move || compute_password_hash(password))
                    .await
                    .context("Failed to spawn blocking task.")??,
            ),
            None => None,
        };

        let update = UserUpdate {
            name: changes.name,
            password_hash,
            cellphone: changes.cellphone,
        };

        let touched = self
            .repository
            .update(id, update)
            .await
            .context("Failed to update user.")?;
        tracing::debug!(touched, "User update applied");

        Ok(Envelope::ok("User updated successfully".to_string()))
    }

    /// Soft delete: flips `status` to false and keeps the row.
    #[tracing::instrument(name = "Delete user", skip(self))]
    pub async fn delete_user(&self, id: i64) -> Result<Envelope<String>, UserError> {
        let touched = self
            .repository
            .set_status(id, false)
            .await
            .context("Failed to deactivate user.")?;
        tracing::debug!(touched, "User deactivated");

        Ok(Envelope::ok("User deleted successfully".to_string()))
    }

    #[tracing::instrument(name = "Get all users", skip(self))]
    pub async fn get_all_users(&self) -> Result<Envelope<Vec<User>>, UserError> {
        let users = self
            .repository
            .find_all(&UserFilter::active())
            .await
            .context("Failed to fetch users.")?;

        Ok(Envelope::ok(users))
    }

    #[tracing::instrument(name = "Find users", skip(self))]
    pub async fn find_users(&self, search: UserSearch) -> Result<Envelope<Vec<User>>, UserError> {
        let filter = build_user_filter(search);
        let users = self
            .repository
            .find_all(&filter)
            .await
            .context("Failed to query users.")?;

        Ok(Envelope::ok(users))
    }
}

/// Translates search criteria into a repository filter.
///
/// The login timestamp is a single one-sided bound: when both ends are given,
/// `logged_in_after` wins and `logged_in_before` is dropped.
fn build_user_filter(search: UserSearch) -> UserFilter {
    let last_login = match (search.logged_in_before, search.logged_in_after) {
        (before, Some(after)) => {
            if before.is_some() {
                tracing::warn!("Both login bounds supplied, only loggedInAfter is applied");
            }
            Some(LoginBound::After(after))
        }
        (Some(before), None) => Some(LoginBound::Before(before)),
        (None, None) => None,
    };

    UserFilter {
        status: Some(!search.deleted),
        name: search.name.filter(|name| !name.is_empty()),
        last_login,
    }
}
