use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{RepositoryError, UserRepository};
use crate::domain::{InsertUser, User, UserFilter, UserUpdate, DEFAULT_ROLE};

/// Keeps users in process memory. Used by the test suites and for running the
/// API without a database.
#[derive(Default)]
pub struct InMemoryUserRepository {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    users: Vec<User>,
    last_id: i64,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the role of a stored user. There is no API for this; tests use
    /// it to create administrators.
    pub async fn set_role(&self, id: i64, role: &str) {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.iter_mut().find(|u| u.id == id) {
            user.role = role.to_string();
        }
    }

    /// Every stored user, including soft-deleted ones.
    pub async fn snapshot(&self) -> Vec<User> {
        self.state.lock().await.users.clone()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_active_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.id == id && u.status)
            .cloned())
    }

    async fn insert(&self, user: InsertUser) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::DuplicateEmail);
        }

        state.last_id += 1;
        let now = Utc::now();
        let user = User {
            id: state.last_id,
            name: user.name,
            email: user.email,
            password: user.password_hash,
            cellphone: user.cellphone,
            status: true,
            role: DEFAULT_ROLE.to_string(),
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());

        Ok(user)
    }

    async fn update(&self, id: i64, update: UserUpdate) -> Result<u64, RepositoryError> {
        let mut state = self.state.lock().await;
        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return Ok(0);
        };

        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(password_hash) = update.password_hash {
            user.password = password_hash;
        }
        if let Some(cellphone) = update.cellphone {
            user.cellphone = Some(cellphone);
        }
        user.updated_at = Utc::now();

        Ok(1)
    }

    async fn set_status(&self, id: i64, status: bool) -> Result<u64, RepositoryError> {
        let mut state = self.state.lock().await;
        let Some(user) = state.users.iter_mut().find(|u| u.id == id) else {
            return Ok(0);
        };

        user.status = status;
        user.updated_at = Utc::now();

        Ok(1)
    }

    async fn find_all(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .filter(|u| filter.matches(u))
            .cloned()
            .collect())
    }

    async fn record_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.users.iter_mut().find(|u| u.id == id) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }
}
