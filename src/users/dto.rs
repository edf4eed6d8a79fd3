use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::{auth::repo_types::User, common::iso_date};

/// The caller's own account.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(with = "iso_date")]
    pub birth_date: Date,
    pub profile_picture_url: Option<String>,
    pub cover_photo_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            birth_date: u.birth_date,
            profile_picture_url: u.profile_picture_url,
            cover_photo_url: u.cover_photo_url,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// What other users may see.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserPublic {
    pub id: Uuid,
    pub name: String,
    pub profile_picture_url: Option<String>,
    pub cover_photo_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserPublic {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            profile_picture_url: u.profile_picture_url,
            cover_photo_url: u.cover_photo_url,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceProfileRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PatchProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}
