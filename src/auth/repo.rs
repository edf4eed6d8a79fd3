use anyhow::Context;
use axum::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{NewUser, RefreshToken, User};
use crate::db::map_write_error;

const USER_COLUMNS: &str = "id, name, email, password_hash, birth_date, profile_picture_url, \
                            cover_photo_url, created_at, updated_at";

/// Durable storage for users and refresh tokens.
///
/// Every method is a single statement. Writes that hit the unique index on
/// email fail with [`crate::db::UniqueViolation`].
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn create_user(&self, new: NewUser<'_>) -> anyhow::Result<User>;
    async fn update_profile(&self, id: Uuid, name: &str, email: &str)
        -> anyhow::Result<Option<User>>;
    async fn set_profile_picture_url(&self, id: Uuid, url: &str) -> anyhow::Result<Option<User>>;

    async fn insert_refresh_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<RefreshToken>;
    /// Only tokens that have not been revoked; expiry is the caller's concern.
    async fn find_active_refresh_token(&self, token: &str)
        -> anyhow::Result<Option<RefreshToken>>;
    /// Idempotent; unknown tokens are ignored.
    async fn revoke_refresh_token(&self, token: &str) -> anyhow::Result<()>;
}

#[derive(Clone)]
pub struct PgCredentialStore {
    db: PgPool,
}

impl PgCredentialStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn create_user(&self, new: NewUser<'_>) -> anyhow::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, birth_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.name)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.birth_date)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_write_error(e, "email"))
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: &str,
        email: &str,
    ) -> anyhow::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET name = $2, email = $3, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_write_error(e, "email"))
    }

    async fn set_profile_picture_url(&self, id: Uuid, url: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET profile_picture_url = $2, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(url)
        .fetch_optional(&self.db)
        .await
        .context("set profile picture url")?;
        Ok(user)
    }

    async fn insert_refresh_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<RefreshToken> {
        sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (id, user_id, token, expires_at, revoked)
            VALUES ($1, $2, $3, $4, false)
            RETURNING id, user_id, token, expires_at, revoked, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(token)
        .bind(expires_at)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_write_error(e, "refresh token"))
    }

    async fn find_active_refresh_token(
        &self,
        token: &str,
    ) -> anyhow::Result<Option<RefreshToken>> {
        let row = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, user_id, token, expires_at, revoked, created_at, updated_at
            FROM refresh_tokens
            WHERE token = $1 AND revoked = false
            "#,
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await
        .context("find refresh token")?;
        Ok(row)
    }

    async fn revoke_refresh_token(&self, token: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE refresh_tokens SET revoked = true, updated_at = now()
            WHERE token = $1
            "#,
        )
        .bind(token)
        .execute(&self.db)
        .await
        .context("revoke refresh token")?;
        Ok(())
    }
}
