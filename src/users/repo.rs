use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::dto::UserPublic;

/// Escapes `%`, `_` and `\` so user input matches literally inside `ILIKE`.
pub(crate) fn like_pattern(q: &str) -> String {
    let mut escaped = String::with_capacity(q.len() + 2);
    escaped.push('%');
    for c in q.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

pub async fn search(
    db: &PgPool,
    q: &str,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<UserPublic>> {
    let rows = sqlx::query_as::<_, UserPublic>(
        r#"
        SELECT id, name, profile_picture_url, cover_photo_url, created_at
        FROM users
        WHERE name ILIKE $1 OR email ILIKE $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(like_pattern(q))
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("search users")?;
    Ok(rows)
}

pub async fn exists(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let found: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
        .bind(id)
        .fetch_one(db)
        .await
        .context("check user exists")?;
    Ok(found)
}
