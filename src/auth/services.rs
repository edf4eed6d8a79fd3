use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{LoginRequest, RegisterRequest, TokenPair},
    jwt::JwtKeys,
    password::PasswordHasher,
    repo::CredentialStore,
    repo_types::NewUser,
    tokens::generate_refresh_token,
};
use crate::{db::is_unique_violation, error::AppError, state::AppState, users::dto::UserProfile};

/// Registration, login, refresh and logout.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    keys: JwtKeys,
    hasher: PasswordHasher,
    refresh_ttl: Duration,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(
            state.credentials.clone(),
            state.keys.clone(),
            state.hasher.clone(),
            Duration::minutes(state.config.jwt.refresh_ttl_minutes),
        )
    }
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        keys: JwtKeys,
        hasher: PasswordHasher,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            store,
            keys,
            hasher,
            refresh_ttl,
        }
    }

    pub async fn register(&self, mut req: RegisterRequest) -> Result<UserProfile, AppError> {
        req.validate()?;

        if self.store.find_user_by_email(&req.email).await?.is_some() {
            warn!(email = %req.email, "email already registered");
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = self.hash_password(req.password).await?;
        let created = self
            .store
            .create_user(NewUser {
                name: &req.name,
                email: &req.email,
                password_hash: &password_hash,
                birth_date: req.birth_date,
            })
            .await;
        let user = match created {
            Ok(user) => user,
            Err(e) if is_unique_violation(&e) => {
                warn!(email = %req.email, "email registered concurrently");
                return Err(AppError::DuplicateEmail);
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id = %user.id, "user registered");
        Ok(user.into())
    }

    pub async fn login(&self, req: LoginRequest) -> Result<TokenPair, AppError> {
        let email = req.email.trim().to_lowercase();
        let Some(user) = self.store.find_user_by_email(&email).await? else {
            self.verify_dummy(req.password).await?;
            warn!("login with unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !self
            .verify_password(req.password, user.password_hash.clone())
            .await?
        {
            warn!(user_id = %user.id, "login with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        let access_token = self.keys.sign_access(user.id)?;
        let refresh_token = self.issue_refresh_token(user.id).await?;

        info!(user_id = %user.id, "user logged in");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Exchanges a live refresh token for a new access token. The refresh
    /// token itself is left as is.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AppError> {
        let Some(stored) = self.store.find_active_refresh_token(refresh_token).await? else {
            warn!("refresh with unknown or revoked token");
            return Err(AppError::InvalidToken);
        };
        if stored.is_expired_at(OffsetDateTime::now_utc()) {
            warn!(user_id = %stored.user_id, "refresh with expired token");
            return Err(AppError::TokenExpired);
        }

        let access_token = self.keys.sign_access(stored.user_id)?;
        info!(user_id = %stored.user_id, "access token refreshed");
        Ok(access_token)
    }

    pub async fn logout(&self, refresh_token: &str) -> Result<(), AppError> {
        self.store.revoke_refresh_token(refresh_token).await?;
        info!("refresh token revoked");
        Ok(())
    }

    async fn issue_refresh_token(&self, user_id: Uuid) -> anyhow::Result<String> {
        let token = generate_refresh_token()?;
        let expires_at = OffsetDateTime::now_utc() + self.refresh_ttl;
        self.store
            .insert_refresh_token(user_id, &token, expires_at)
            .await?;
        Ok(token)
    }

    async fn hash_password(&self, plain: String) -> anyhow::Result<String> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .context("password hashing task")?
    }

    async fn verify_password(&self, plain: String, hash: String) -> anyhow::Result<bool> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash))
            .await
            .context("password verification task")?
    }

    async fn verify_dummy(&self, plain: String) -> anyhow::Result<()> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify_dummy(&plain))
            .await
            .context("password verification task")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        jwt::test_config, memory::MemoryCredentialStore, password::fast_hasher,
    };

    struct Harness {
        store: Arc<MemoryCredentialStore>,
        keys: JwtKeys,
        hasher: PasswordHasher,
        service: AuthService,
    }

    fn harness() -> Harness {
        let store = Arc::new(MemoryCredentialStore::default());
        let keys = JwtKeys::from_config(&test_config("service-secret"));
        let hasher = fast_hasher();
        let service = AuthService::new(
            store.clone(),
            keys.clone(),
            hasher.clone(),
            Duration::days(30),
        );
        Harness {
            store,
            keys,
            hasher,
            service,
        }
    }

    fn register_request(email: &str) -> RegisterRequest {
        serde_json::from_value(serde_json::json!({
            "name": "Alice",
            "email": email,
            "password": "password123",
            "birth_date": "1990-01-01",
        }))
        .unwrap()
    }

    fn login_request(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn register_then_login_issues_tokens() {
        let h = harness();
        let profile = h
            .service
            .register(register_request("alice@example.com"))
            .await
            .unwrap();
        assert_eq!(profile.email, "alice@example.com");

        let pair = h
            .service
            .login(login_request("alice@example.com", "password123"))
            .await
            .unwrap();
        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());
        assert_eq!(h.keys.verify(&pair.access_token).unwrap().sub, profile.id);
    }

    #[tokio::test]
    async fn login_normalizes_email() {
        let h = harness();
        h.service
            .register(register_request("alice@example.com"))
            .await
            .unwrap();
        assert!(h
            .service
            .login(login_request("  ALICE@example.com ", "password123"))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn duplicate_registration_adds_no_user() {
        let h = harness();
        h.service
            .register(register_request("alice@example.com"))
            .await
            .unwrap();
        let err = h
            .service
            .register(register_request("Alice@Example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
        assert_eq!(h.store.user_count(), 1);
    }

    #[tokio::test]
    async fn invalid_registration_is_rejected_before_storage() {
        let h = harness();
        let mut req = register_request("alice@example.com");
        req.password = "short".into();
        let err = h.service.register(req).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert_eq!(h.store.user_count(), 0);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let h = harness();
        h.service
            .register(register_request("alice@example.com"))
            .await
            .unwrap();

        let wrong_password = h
            .service
            .login(login_request("alice@example.com", "not-the-password"))
            .await
            .unwrap_err();
        let unknown_email = h
            .service
            .login(login_request("bob@example.com", "password123"))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert!(matches!(unknown_email, AppError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn unknown_email_still_runs_password_verification() {
        let h = harness();
        h.service
            .register(register_request("alice@example.com"))
            .await
            .unwrap();

        let before = h.hasher.verification_count();
        h.service
            .login(login_request("alice@example.com", "not-the-password"))
            .await
            .unwrap_err();
        let after_wrong_password = h.hasher.verification_count();
        h.service
            .login(login_request("bob@example.com", "password123"))
            .await
            .unwrap_err();
        let after_unknown_email = h.hasher.verification_count();

        assert_eq!(after_wrong_password - before, 1);
        assert_eq!(after_unknown_email - after_wrong_password, 1);
    }

    #[tokio::test]
    async fn refresh_returns_access_token_for_owner() {
        let h = harness();
        let profile = h
            .service
            .register(register_request("alice@example.com"))
            .await
            .unwrap();
        let pair = h
            .service
            .login(login_request("alice@example.com", "password123"))
            .await
            .unwrap();

        let access = h.service.refresh(&pair.refresh_token).await.unwrap();
        assert_eq!(h.keys.verify(&access).unwrap().sub, profile.id);

        let stored = h.store.token(&pair.refresh_token).unwrap();
        assert!(!stored.revoked);
        let ttl = stored.expires_at - stored.created_at;
        assert!(ttl > Duration::days(29) && ttl <= Duration::days(30));
    }

    #[tokio::test]
    async fn refresh_after_logout_is_invalid() {
        let h = harness();
        h.service
            .register(register_request("alice@example.com"))
            .await
            .unwrap();
        let pair = h
            .service
            .login(login_request("alice@example.com", "password123"))
            .await
            .unwrap();

        h.service.logout(&pair.refresh_token).await.unwrap();
        let err = h.service.refresh(&pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let h = harness();
        h.service
            .register(register_request("alice@example.com"))
            .await
            .unwrap();
        let pair = h
            .service
            .login(login_request("alice@example.com", "password123"))
            .await
            .unwrap();

        h.service.logout(&pair.refresh_token).await.unwrap();
        h.service.logout(&pair.refresh_token).await.unwrap();
        h.service.logout("never-issued").await.unwrap();
        assert!(h.store.token(&pair.refresh_token).unwrap().revoked);
    }

    #[tokio::test]
    async fn refresh_rejects_unknown_token() {
        let h = harness();
        let err = h.service.refresh("never-issued").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidToken));
    }

    #[tokio::test]
    async fn refresh_rejects_expired_token() {
        let h = harness();
        let profile = h
            .service
            .register(register_request("alice@example.com"))
            .await
            .unwrap();
        h.store
            .insert_refresh_token(
                profile.id,
                "stale-token",
                OffsetDateTime::now_utc() - Duration::minutes(1),
            )
            .await
            .unwrap();

        let err = h.service.refresh("stale-token").await.unwrap_err();
        assert!(matches!(err, AppError::TokenExpired));
    }

    #[tokio::test]
    async fn each_login_gets_its_own_refresh_token() {
        let h = harness();
        h.service
            .register(register_request("alice@example.com"))
            .await
            .unwrap();
        let first = h
            .service
            .login(login_request("alice@example.com", "password123"))
            .await
            .unwrap();
        let second = h
            .service
            .login(login_request("alice@example.com", "password123"))
            .await
            .unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);

        h.service.logout(&first.refresh_token).await.unwrap();
        assert!(h.service.refresh(&second.refresh_token).await.is_ok());
    }
}
