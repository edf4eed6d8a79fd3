use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{dto::Like, repo};
use crate::{
    error::AppError,
    resources::{self, ResourceKind},
};

/// Liking twice leaves a single like.
pub async fn like(
    db: &PgPool,
    user_id: Uuid,
    kind: ResourceKind,
    id: Uuid,
) -> Result<Like, AppError> {
    resources::ensure_visible(db, user_id, kind, id).await?;
    repo::insert(db, user_id, kind, id).await?;
    let row = repo::find(db, user_id, kind, id)
        .await?
        .ok_or(AppError::NotFound(kind.as_str()))?;
    info!(%user_id, kind = kind.as_str(), resource_id = %id, "liked");
    Ok(Like::from_row(kind, row))
}

/// Unliking something never liked is not an error.
pub async fn unlike(
    db: &PgPool,
    user_id: Uuid,
    kind: ResourceKind,
    id: Uuid,
) -> Result<(), AppError> {
    repo::delete(db, user_id, kind, id).await?;
    info!(%user_id, kind = kind.as_str(), resource_id = %id, "unliked");
    Ok(())
}

pub async fn list(
    db: &PgPool,
    viewer_id: Uuid,
    kind: ResourceKind,
    id: Uuid,
) -> Result<Vec<Like>, AppError> {
    resources::ensure_visible(db, viewer_id, kind, id).await?;
    let rows = repo::list(db, kind, id).await?;
    Ok(rows.into_iter().map(|r| Like::from_row(kind, r)).collect())
}
