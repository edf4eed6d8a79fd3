use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::common::Privacy;

#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub privacy: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub author_name: String,
    pub author_profile_picture_url: Option<String>,
}

impl PostRow {
    pub fn privacy(&self) -> Privacy {
        Privacy::from_column(&self.privacy)
    }
}

#[derive(Debug, Serialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_profile_picture_url: Option<String>,
    pub content: String,
    pub privacy: Privacy,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<PostRow> for Post {
    fn from(r: PostRow) -> Self {
        let privacy = r.privacy();
        Self {
            id: r.id,
            author_id: r.author_id,
            author_name: r.author_name,
            author_profile_picture_url: r.author_profile_picture_url,
            content: r.content,
            privacy,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub content: String,
    #[serde(default)]
    pub privacy: Privacy,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub content: String,
    pub privacy: Privacy,
}
