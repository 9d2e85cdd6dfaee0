use async_trait::async_trait;
use sqlx::PgPool;

use crate::auth::{
    errors::StoreError,
    repo_types::{NewUser, User},
};

/// Persistence capability the auth service depends on.
///
/// Implementations must reject duplicate emails atomically; the service never
/// pre-checks.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;
    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError>;
}

/// Postgres-backed store over the `users` table.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    /// Create a new user; the unique index on `email` decides duplicates.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let user = user.into_user();
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::DuplicateEmail
            }
            other => StoreError::Backend(anyhow::Error::new(other).context("insert user")),
        })?;
        Ok(created)
    }

    /// Find a user by email.
    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| StoreError::Backend(anyhow::Error::new(e).context("select user by email")))?;
        user.ok_or(StoreError::NotFound)
    }
}
