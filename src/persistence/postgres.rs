use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{RepositoryError, UserRepository};
use crate::domain::{InsertUser, LoginBound, User, UserFilter, UserUpdate, DEFAULT_ROLE};

const USER_COLUMNS: &str = "id, name, email, password, cellphone, status, role, last_login_at, created_at, updated_at";

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[tracing::instrument(name = "Find user by email", skip(self, email))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[tracing::instrument(name = "Find active user by id", skip(self))]
    async fn find_active_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND status = TRUE"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[tracing::instrument(name = "Insert user", skip(self, user), fields(email = %user.email))]
    async fn insert(&self, user: InsertUser) -> Result<User, RepositoryError> {
        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (name, email, password, cellphone, status, role)
            VALUES ($1, $2, $3, $4, TRUE, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.cellphone)
        .bind(DEFAULT_ROLE)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(RepositoryError::DuplicateEmail)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[tracing::instrument(name = "Update user", skip(self, update))]
    async fn update(&self, id: i64, update: UserUpdate) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                password = COALESCE($3, password),
                cellphone = COALESCE($4, cellphone),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.name)
        .bind(update.password_hash)
        .bind(update.cellphone)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(name = "Set user status", skip(self))]
    async fn set_status(&self, id: i64, status: bool) -> Result<u64, RepositoryError> {
        let result = sqlx::query("UPDATE users SET status = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(name = "Query users", skip(self))]
    async fn find_all(&self, filter: &UserFilter) -> Result<Vec<User>, RepositoryError> {
        let mut query = build_filter_query(filter);
        let users = query.build_query_as::<User>().fetch_all(&self.pool).await?;

        Ok(users)
    }

    #[tracing::instrument(name = "Record login", skip(self))]
    async fn record_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

fn build_filter_query(filter: &UserFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE TRUE"));

    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status);
    }

    if let Some(ref name) = filter.name {
        query
            .push(" AND name ILIKE ")
            .push_bind(format!("%{}%", escape_like(name)));
    }

    match filter.last_login {
        Some(LoginBound::Before(bound)) => {
            query.push(" AND last_login_at < ").push_bind(bound);
        }
        Some(LoginBound::After(bound)) => {
            query.push(" AND last_login_at > ").push_bind(bound);
        }
        None => {}
    }

    query.push(" ORDER BY id");
    query
}

/// Escapes `LIKE` wildcards so `input` matches literally. Postgres uses `\`
/// as the default escape character.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
