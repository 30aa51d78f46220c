mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{InsertUser, User, UserFilter, UserUpdate};

pub use memory::InMemoryUserRepository;
pub use postgres::PostgresUserRepository;

#[derive(thiserror::Error, Debug)]
pub enum RepositoryError {
    #[error("A user with this email already exists")]
    DuplicateEmail,

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

/// Data access for the `users` table.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Looks a user up by email regardless of status.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    async fn find_active_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError>;

    /// Stores a new active user. Fails with [`RepositoryError::DuplicateEmail`]
    /// when the email is taken.
    async fn insert(&self, user: InsertUser) -> Result<User, RepositoryError>;

    /// Applies the supplied fields to the row with `id`, whatever its status.
    /// Returns the number of rows touched.
    async fn update(&self, id: i64, update: UserUpdate) -> Result<u64, RepositoryError>;

    async fn set_status(&self, id: i64, status: bool) -> Result<u64, RepositoryError>;

    /// Users matching every constraint of `filter`, ordered by id.
    async fn find_all(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError>;

    async fn record_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), RepositoryError>;
}
