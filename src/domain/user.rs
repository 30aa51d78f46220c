use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_ROLE: &str = "member";

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub cellphone: Option<String>,
    pub status: bool,
    pub role: String,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of a create request. Also the shape of each `bulkCreate` item.
#[derive(Deserialize, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_second: String,
    #[serde(default)]
    pub cellphone: Option<String>,
}

/// One item of a `bulkCreate` request. Items that do not have the shape of a
/// [`NewUser`] are kept so they can be counted as failures.
#[derive(Deserialize, Clone)]
#[serde(untagged)]
pub enum BulkUserPayload {
    Valid(NewUser),
    Malformed(serde_json::Value),
}

/// A row ready to be stored; the password is already hashed.
#[derive(Debug, Clone)]
pub struct InsertUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub cellphone: Option<String>,
}

/// Body of an update request. Absent fields keep their stored value.
#[derive(Deserialize, Default, Clone)]
pub struct UserChanges {
    pub name: Option<String>,
    pub password: Option<String>,
    pub cellphone: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub cellphone: Option<String>,
}

/// Criteria accepted by `findUsers`, as received from the caller.
#[derive(Debug, Default, Clone)]
pub struct UserSearch {
    pub deleted: bool,
    pub name: Option<String>,
    pub logged_in_before: Option<DateTime<Utc>>,
    pub logged_in_after: Option<DateTime<Utc>>,
}

/// One-sided constraint on `last_login_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginBound {
    Before(DateTime<Utc>),
    After(DateTime<Utc>),
}

/// Conjunction of constraints understood by the repositories.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UserFilter {
    pub status: Option<bool>,
    pub name: Option<String>,
    pub last_login: Option<LoginBound>,
}

impl UserFilter {
    pub fn active() -> Self {
        Self {
            status: Some(true),
            ..Self::default()
        }
    }

    pub fn matches(&self, user: &User) -> bool {
        if let Some(status) = self.status {
            if user.status != status {
                return false;
            }
        }

        if let Some(ref name) = self.name {
            if !user.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }

        match self.last_login {
            Some(LoginBound::Before(bound)) => user.last_login_at.is_some_and(|at| at < bound),
            Some(LoginBound::After(bound)) => user.last_login_at.is_some_and(|at| at > bound),
            None => true,
        }
    }
}
