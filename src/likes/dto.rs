use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{resources::ResourceKind, users::dto::UserPublic};

#[derive(Debug, FromRow)]
pub struct LikeRow {
    pub resource_id: Uuid,
    pub created_at: OffsetDateTime,
    pub user_id: Uuid,
    pub user_name: String,
    pub user_profile_picture_url: Option<String>,
    pub user_cover_photo_url: Option<String>,
    pub user_created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct Like {
    pub resource_type: ResourceKind,
    pub resource_id: Uuid,
    pub user: UserPublic,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Like {
    pub fn from_row(kind: ResourceKind, r: LikeRow) -> Self {
        Self {
            resource_type: kind,
            resource_id: r.resource_id,
            created_at: r.created_at,
            user: UserPublic {
                id: r.user_id,
                name: r.user_name,
                profile_picture_url: r.user_profile_picture_url,
                cover_photo_url: r.user_cover_photo_url,
                created_at: r.user_created_at,
            },
        }
    }
}
