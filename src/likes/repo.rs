use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::dto::LikeRow;
use crate::resources::ResourceKind;

const LIKE_SELECT: &str = r#"
    SELECT l.resource_id, l.created_at,
           u.id AS user_id, u.name AS user_name,
           u.profile_picture_url AS user_profile_picture_url,
           u.cover_photo_url AS user_cover_photo_url,
           u.created_at AS user_created_at
    FROM likes l
    JOIN users u ON u.id = l.user_id
"#;

/// Records the like unless it already exists.
pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    kind: ResourceKind,
    resource_id: Uuid,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO likes (user_id, resource_type, resource_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, resource_type, resource_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(kind.as_str())
    .bind(resource_id)
    .execute(db)
    .await
    .context("insert like")?;
    Ok(())
}

pub async fn find(
    db: &PgPool,
    user_id: Uuid,
    kind: ResourceKind,
    resource_id: Uuid,
) -> anyhow::Result<Option<LikeRow>> {
    let row = sqlx::query_as::<_, LikeRow>(&format!(
        "{LIKE_SELECT} WHERE l.user_id = $1 AND l.resource_type = $2 AND l.resource_id = $3"
    ))
    .bind(user_id)
    .bind(kind.as_str())
    .bind(resource_id)
    .fetch_optional(db)
    .await
    .context("find like")?;
    Ok(row)
}

pub async fn delete(
    db: &PgPool,
    user_id: Uuid,
    kind: ResourceKind,
    resource_id: Uuid,
) -> anyhow::Result<()> {
    sqlx::query(
        "DELETE FROM likes WHERE user_id = $1 AND resource_type = $2 AND resource_id = $3",
    )
    .bind(user_id)
    .bind(kind.as_str())
    .bind(resource_id)
    .execute(db)
    .await
    .context("delete like")?;
    Ok(())
}

pub async fn list(
    db: &PgPool,
    kind: ResourceKind,
    resource_id: Uuid,
) -> anyhow::Result<Vec<LikeRow>> {
    let rows = sqlx::query_as::<_, LikeRow>(&format!(
        "{LIKE_SELECT} WHERE l.resource_type = $1 AND l.resource_id = $2 ORDER BY l.created_at DESC"
    ))
    .bind(kind.as_str())
    .bind(resource_id)
    .fetch_all(db)
    .await
    .context("list likes")?;
    Ok(rows)
}
