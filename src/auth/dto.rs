use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    common::{iso_date, normalize_email, required},
    error::AppError,
};

const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(with = "iso_date")]
    pub birth_date: Date,
}

impl RegisterRequest {
    /// Normalizes name and email in place and checks the remaining fields.
    pub fn validate(&mut self) -> Result<(), AppError> {
        self.name = required(&self.name, "name")?;
        self.email = normalize_email(&self.email)?;
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AppError::BadRequest(format!(
                "password must be at least {MIN_PASSWORD_CHARS} characters"
            )));
        }
        if self.birth_date > OffsetDateTime::now_utc().date() {
            return Err(AppError::BadRequest("birth_date is in the future".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(password: &str, birth_date: &str) -> RegisterRequest {
        serde_json::from_value(serde_json::json!({
            "name": "  Ada Lovelace ",
            "email": " Ada@Example.com",
            "password": password,
            "birth_date": birth_date,
        }))
        .unwrap()
    }

    #[test]
    fn validate_normalizes_fields() {
        let mut req = request("password123", "1815-12-10");
        req.validate().unwrap();
        assert_eq!(req.name, "Ada Lovelace");
        assert_eq!(req.email, "ada@example.com");
    }

    #[test]
    fn short_password_is_rejected() {
        let mut req = request("short", "1815-12-10");
        assert!(matches!(req.validate(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn future_birth_date_is_rejected() {
        let tomorrow = OffsetDateTime::now_utc().date().next_day().unwrap();
        let mut req = request("password123", "2000-01-01");
        req.birth_date = tomorrow;
        assert!(matches!(req.validate(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn token_pair_serializes_both_tokens() {
        let json = serde_json::to_value(TokenPair {
            access_token: "a".into(),
            refresh_token: "r".into(),
        })
        .unwrap();
        assert_eq!(json["access_token"], "a");
        assert_eq!(json["refresh_token"], "r");
    }
}
