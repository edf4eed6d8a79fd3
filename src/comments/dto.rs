use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{resources::ResourceKind, users::dto::UserPublic};

/// A comment joined with its author; author columns are prefixed.
#[derive(Debug, FromRow)]
pub struct CommentRow {
    pub id: Uuid,
    pub resource_type: String,
    pub resource_id: Uuid,
    pub content: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_profile_picture_url: Option<String>,
    pub author_cover_photo_url: Option<String>,
    pub author_created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct Comment {
    pub id: Uuid,
    pub resource_type: Option<ResourceKind>,
    pub resource_id: Uuid,
    pub content: String,
    pub author: UserPublic,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<CommentRow> for Comment {
    fn from(r: CommentRow) -> Self {
        Self {
            id: r.id,
            resource_type: ResourceKind::from_column(&r.resource_type),
            resource_id: r.resource_id,
            content: r.content,
            created_at: r.created_at,
            updated_at: r.updated_at,
            author: UserPublic {
                id: r.author_id,
                name: r.author_name,
                profile_picture_url: r.author_profile_picture_url,
                cover_photo_url: r.author_cover_photo_url,
                created_at: r.author_created_at,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_view_nests_author() {
        let now = OffsetDateTime::now_utc();
        let author_id = Uuid::new_v4();
        let comment: Comment = CommentRow {
            id: Uuid::new_v4(),
            resource_type: "album".into(),
            resource_id: Uuid::new_v4(),
            content: "nice".into(),
            created_at: now,
            updated_at: now,
            author_id,
            author_name: "Kim".into(),
            author_profile_picture_url: Some("https://cdn.test/k.png".into()),
            author_cover_photo_url: None,
            author_created_at: now,
        }
        .into();

        assert_eq!(comment.resource_type, Some(ResourceKind::Album));
        let json = serde_json::to_value(&comment).unwrap();
        assert_eq!(json["author"]["id"], author_id.to_string());
        assert_eq!(json["author"]["name"], "Kim");
        assert_eq!(json["resource_type"], "album");
        assert!(json.get("author_name").is_none());
    }
}
