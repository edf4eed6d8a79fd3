use anyhow::Context;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::dto::CommentRow;
use crate::resources::ResourceKind;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.resource_type, c.resource_id, c.content, c.created_at, c.updated_at,
           u.id AS author_id, u.name AS author_name,
           u.profile_picture_url AS author_profile_picture_url,
           u.cover_photo_url AS author_cover_photo_url,
           u.created_at AS author_created_at
    FROM comments c
    JOIN users u ON u.id = c.author_id
"#;

pub async fn insert(
    db: &PgPool,
    author_id: Uuid,
    kind: ResourceKind,
    resource_id: Uuid,
    content: &str,
) -> anyhow::Result<CommentRow> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO comments (id, author_id, resource_type, resource_id, content)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(author_id)
    .bind(kind.as_str())
    .bind(resource_id)
    .bind(content)
    .execute(db)
    .await
    .context("insert comment")?;
    find(db, id)
        .await?
        .context("comment vanished after insert")
}

pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<CommentRow>> {
    let row = sqlx::query_as::<_, CommentRow>(&format!("{COMMENT_SELECT} WHERE c.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find comment")?;
    Ok(row)
}

pub async fn list(
    db: &PgPool,
    kind: ResourceKind,
    resource_id: Uuid,
) -> anyhow::Result<Vec<CommentRow>> {
    let rows = sqlx::query_as::<_, CommentRow>(&format!(
        "{COMMENT_SELECT} WHERE c.resource_type = $1 AND c.resource_id = $2 ORDER BY c.created_at DESC"
    ))
    .bind(kind.as_str())
    .bind(resource_id)
    .fetch_all(db)
    .await
    .context("list comments")?;
    Ok(rows)
}

/// Deletes every comment on the given resources, the replies below them at
/// any depth, and the likes on all of those comments.
pub async fn delete_threads(
    conn: &mut PgConnection,
    kind: ResourceKind,
    resource_ids: &[Uuid],
) -> anyhow::Result<u64> {
    if resource_ids.is_empty() {
        return Ok(0);
    }
    let removed = sqlx::query(
        r#"
        WITH RECURSIVE thread AS (
            SELECT id FROM comments WHERE resource_type = $1 AND resource_id = ANY($2)
            UNION ALL
            SELECT c.id FROM comments c
            JOIN thread t ON c.resource_type = 'comment' AND c.resource_id = t.id
        ),
        thread_likes AS (
            DELETE FROM likes
            WHERE resource_type = 'comment' AND resource_id IN (SELECT id FROM thread)
        )
        DELETE FROM comments WHERE id IN (SELECT id FROM thread)
        "#,
    )
    .bind(kind.as_str())
    .bind(resource_ids)
    .execute(&mut *conn)
    .await
    .with_context(|| format!("delete comment threads on {}", kind.as_str()))?
    .rows_affected();
    Ok(removed)
}

/// Deletes the comment, its replies, and the likes on all of them.
pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let mut tx = db.begin().await.context("begin delete comment")?;
    delete_threads(&mut tx, ResourceKind::Comment, &[id]).await?;
    sqlx::query("DELETE FROM likes WHERE resource_type = 'comment' AND resource_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("delete comment likes")?;
    let removed = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("delete comment")?
        .rows_affected();
    tx.commit().await.context("commit delete comment")?;
    Ok(removed > 0)
}
