//! In-memory [`CredentialStore`] for tests.

use std::sync::Mutex;

use axum::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{
    repo::CredentialStore,
    repo_types::{NewUser, RefreshToken, User},
};
use crate::db::UniqueViolation;

#[derive(Default)]
pub struct MemoryCredentialStore {
    users: Mutex<Vec<User>>,
    tokens: Mutex<Vec<RefreshToken>>,
}

impl MemoryCredentialStore {
    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn token(&self, token: &str) -> Option<RefreshToken> {
        self.tokens
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.token == token)
            .cloned()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, new: NewUser<'_>) -> anyhow::Result<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new.email) {
            return Err(UniqueViolation("email").into());
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: new.name.to_string(),
            email: new.email.to_string(),
            password_hash: new.password_hash.to_string(),
            birth_date: new.birth_date,
            profile_picture_url: None,
            cover_photo_url: None,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: &str,
        email: &str,
    ) -> anyhow::Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email && u.id != id) {
            return Err(UniqueViolation("email").into());
        }
        Ok(users.iter_mut().find(|u| u.id == id).map(|u| {
            u.name = name.to_string();
            u.email = email.to_string();
            u.updated_at = OffsetDateTime::now_utc();
            u.clone()
        }))
    }

    async fn set_profile_picture_url(&self, id: Uuid, url: &str) -> anyhow::Result<Option<User>> {
        let mut users = self.users.lock().unwrap();
        Ok(users.iter_mut().find(|u| u.id == id).map(|u| {
            u.profile_picture_url = Some(url.to_string());
            u.updated_at = OffsetDateTime::now_utc();
            u.clone()
        }))
    }

    async fn insert_refresh_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<RefreshToken> {
        anyhow::ensure!(
            self.users.lock().unwrap().iter().any(|u| u.id == user_id),
            "refresh token owner does not exist"
        );
        let mut tokens = self.tokens.lock().unwrap();
        if tokens.iter().any(|t| t.token == token) {
            return Err(UniqueViolation("refresh token").into());
        }
        let now = OffsetDateTime::now_utc();
        let row = RefreshToken {
            id: Uuid::new_v4(),
            user_id,
            token: token.to_string(),
            expires_at,
            revoked: false,
            created_at: now,
            updated_at: now,
        };
        tokens.push(row.clone());
        Ok(row)
    }

    async fn find_active_refresh_token(
        &self,
        token: &str,
    ) -> anyhow::Result<Option<RefreshToken>> {
        let tokens = self.tokens.lock().unwrap();
        Ok(tokens
            .iter()
            .find(|t| t.token == token && !t.revoked)
            .cloned())
    }

    async fn revoke_refresh_token(&self, token: &str) -> anyhow::Result<()> {
        let mut tokens = self.tokens.lock().unwrap();
        for t in tokens.iter_mut().filter(|t| t.token == token) {
            t.revoked = true;
            t.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }
}
