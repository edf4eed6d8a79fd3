//! Things that can be liked and commented on.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{albums, comments, error::AppError, posts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Post,
    Photo,
    Album,
    Comment,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Post,
        ResourceKind::Photo,
        ResourceKind::Album,
        ResourceKind::Comment,
    ];

    /// Path segment under `/api/v1`.
    pub fn segment(self) -> &'static str {
        match self {
            ResourceKind::Post => "posts",
            ResourceKind::Photo => "photos",
            ResourceKind::Album => "albums",
            ResourceKind::Comment => "comments",
        }
    }

    /// Value stored in `resource_type` columns.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Post => "post",
            ResourceKind::Photo => "photo",
            ResourceKind::Album => "album",
            ResourceKind::Comment => "comment",
        }
    }

    pub fn from_column(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == value)
    }
}

/// Succeeds when the viewer may see the resource. Photos follow their album
/// and comments follow whatever they are attached to. Anything missing or
/// hidden is reported as `NotFound` for the requested kind.
pub async fn ensure_visible(
    db: &PgPool,
    viewer_id: Uuid,
    kind: ResourceKind,
    id: Uuid,
) -> Result<(), AppError> {
    let hidden = AppError::NotFound(kind.as_str());
    let (mut current, mut current_id) = (kind, id);
    loop {
        let checked = match current {
            ResourceKind::Post => posts::services::load_visible(db, viewer_id, current_id)
                .await
                .map(drop),
            ResourceKind::Album => albums::services::load_visible(db, viewer_id, current_id)
                .await
                .map(drop),
            ResourceKind::Photo => {
                let Some(photo) = albums::repo::find_photo_owner(db, current_id).await? else {
                    return Err(hidden);
                };
                albums::services::load_visible(db, viewer_id, photo.album_id)
                    .await
                    .map(drop)
            }
            ResourceKind::Comment => {
                let parent = comments::repo::find(db, current_id)
                    .await?
                    .and_then(|c| Some((ResourceKind::from_column(&c.resource_type)?, c.resource_id)));
                let Some((parent_kind, parent_id)) = parent else {
                    return Err(hidden);
                };
                current = parent_kind;
                current_id = parent_id;
                continue;
            }
        };
        return match checked {
            Ok(()) => Ok(()),
            Err(AppError::NotFound(_)) => Err(hidden),
            Err(e) => Err(e),
        };
    }
}
