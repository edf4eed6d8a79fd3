use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::dto::PostRow;
use crate::{
    comments,
    common::{visibility_clause, Privacy},
    resources::ResourceKind,
};

const POST_SELECT: &str = r#"
    SELECT p.id, p.author_id, p.content, p.privacy, p.created_at, p.updated_at,
           u.name AS author_name, u.profile_picture_url AS author_profile_picture_url
    FROM posts p
    JOIN users u ON u.id = p.author_id
"#;

pub async fn insert(
    db: &PgPool,
    author_id: Uuid,
    content: &str,
    privacy: Privacy,
) -> anyhow::Result<PostRow> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO posts (id, author_id, content, privacy) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(author_id)
        .bind(content)
        .bind(privacy.as_str())
        .execute(db)
        .await
        .context("insert post")?;
    find(db, id)
        .await?
        .context("post vanished after insert")
}

pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<PostRow>> {
    let row = sqlx::query_as::<_, PostRow>(&format!("{POST_SELECT} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("find post")?;
    Ok(row)
}

/// The viewer's own posts plus friends' posts that are not private.
pub async fn feed(
    db: &PgPool,
    viewer_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<PostRow>> {
    let rows = sqlx::query_as::<_, PostRow>(&format!(
        r#"{POST_SELECT}
        WHERE p.author_id = $1
           OR (p.privacy <> 'only_me' AND EXISTS (
                SELECT 1 FROM friends f WHERE f.user_id = $1 AND f.friend_id = p.author_id))
        ORDER BY p.created_at DESC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(viewer_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("load feed")?;
    Ok(rows)
}

pub async fn list_visible_by_author(
    db: &PgPool,
    viewer_id: Uuid,
    author_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<PostRow>> {
    let rows = sqlx::query_as::<_, PostRow>(&format!(
        r#"{POST_SELECT}
        WHERE p.author_id = $2 AND {}
        ORDER BY p.created_at DESC
        LIMIT $3 OFFSET $4
        "#,
        visibility_clause("p", "author_id", 1)
    ))
    .bind(viewer_id)
    .bind(author_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list posts by author")?;
    Ok(rows)
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    content: &str,
    privacy: Privacy,
) -> anyhow::Result<Option<PostRow>> {
    let updated = sqlx::query(
        "UPDATE posts SET content = $2, privacy = $3, updated_at = now() WHERE id = $1",
    )
    .bind(id)
    .bind(content)
    .bind(privacy.as_str())
    .execute(db)
    .await
    .context("update post")?
    .rows_affected();
    if updated == 0 {
        return Ok(None);
    }
    find(db, id).await
}

/// Deletes the post with its likes and comment threads.
pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let mut tx = db.begin().await.context("begin delete post")?;
    sqlx::query("DELETE FROM likes WHERE resource_type = 'post' AND resource_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("delete post likes")?;
    comments::repo::delete_threads(&mut tx, ResourceKind::Post, &[id]).await?;
    let removed = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("delete post")?
        .rows_affected();
    tx.commit().await.context("commit delete post")?;
    Ok(removed > 0)
}
