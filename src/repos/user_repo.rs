/*
 * Responsibility
 * - users table access via SQLx
 * - `UserStore`: the two operations the sign-in pipeline needs (upsert / lookup by email)
 * - DB errors are surfaced as RepoError; the caller decides whether they are fatal
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::repos::error::{RepoError, RepoResult};

/// Internal user record. `email` is the unique key; `id` is stable and provider-independent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, FromRow)]
pub struct UserRecord {
    #[sqlx(rename = "userId")]
    pub id: Uuid,
    pub email: String,
    #[sqlx(rename = "userName")]
    pub name: String,
    #[sqlx(rename = "imageUrl")]
    pub avatar_url: Option<String>,
    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Upsert input, keyed by `email`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// Persistence collaborator used by the sign-in pipeline.
///
/// Implementations own concurrency safety for upserts to the same email
/// (last write wins is fine).
#[async_trait]
pub trait UserStore: Send + Sync {
    // Returns the store name (for logging).
    fn backend_name(&self) -> &'static str;

    async fn create_or_update_user(&self, input: NewUser) -> RepoResult<UserRecord>;

    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>>;
}

#[derive(Clone, Debug)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserRepo {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn create_or_update_user(&self, input: NewUser) -> RepoResult<UserRecord> {
        let row = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users ("email", "userName", "imageUrl")
            VALUES ($1, $2, $3)
            ON CONFLICT ("email") DO UPDATE
            SET
                "userName" = EXCLUDED."userName",
                "imageUrl" = EXCLUDED."imageUrl",
                "updatedAt" = now()
            RETURNING "userId", "email", "userName", "imageUrl", "createdAt", "updatedAt"
            "#,
        )
        .bind(&input.email)
        .bind(&input.name)
        .bind(input.avatar_url.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::Db)?;

        Ok(row)
    }

    async fn get_user_by_email(&self, email: &str) -> RepoResult<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT "userId", "email", "userName", "imageUrl", "createdAt", "updatedAt"
            FROM users
            WHERE "email" = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::Db)?;

        Ok(row)
    }
}
