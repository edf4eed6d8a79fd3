use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::dto::{AlbumRow, OwnedPhoto, Photo};
use crate::{
    comments,
    common::{visibility_clause, Privacy},
    resources::ResourceKind,
};

const ALBUM_COLUMNS: &str = "a.id, a.owner_id, a.name, a.description, a.privacy, a.created_at, a.updated_at";

pub async fn insert(
    db: &PgPool,
    owner_id: Uuid,
    name: &str,
    description: Option<&str>,
    privacy: Privacy,
) -> anyhow::Result<AlbumRow> {
    let row = sqlx::query_as::<_, AlbumRow>(
        r#"
        INSERT INTO albums (id, owner_id, name, description, privacy)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, owner_id, name, description, privacy, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(owner_id)
    .bind(name)
    .bind(description)
    .bind(privacy.as_str())
    .fetch_one(db)
    .await
    .context("insert album")?;
    Ok(row)
}

pub async fn find(db: &PgPool, id: Uuid) -> anyhow::Result<Option<AlbumRow>> {
    let row = sqlx::query_as::<_, AlbumRow>(&format!(
        "SELECT {ALBUM_COLUMNS} FROM albums a WHERE a.id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("find album")?;
    Ok(row)
}

pub async fn list_visible_by_owner(
    db: &PgPool,
    viewer_id: Uuid,
    owner_id: Uuid,
) -> anyhow::Result<Vec<AlbumRow>> {
    let rows = sqlx::query_as::<_, AlbumRow>(&format!(
        r#"
        SELECT {ALBUM_COLUMNS} FROM albums a
        WHERE a.owner_id = $2 AND {}
        ORDER BY a.created_at DESC
        "#,
        visibility_clause("a", "owner_id", 1)
    ))
    .bind(viewer_id)
    .bind(owner_id)
    .fetch_all(db)
    .await
    .context("list albums by owner")?;
    Ok(rows)
}

pub async fn photos_for(db: &PgPool, album_ids: &[Uuid]) -> anyhow::Result<Vec<Photo>> {
    if album_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = sqlx::query_as::<_, Photo>(
        r#"
        SELECT id, album_id, url, caption, created_at
        FROM photos
        WHERE album_id = ANY($1)
        ORDER BY created_at
        "#,
    )
    .bind(album_ids)
    .fetch_all(db)
    .await
    .context("list album photos")?;
    Ok(rows)
}

pub async fn update(
    db: &PgPool,
    id: Uuid,
    name: &str,
    description: Option<&str>,
    privacy: Privacy,
) -> anyhow::Result<Option<AlbumRow>> {
    let row = sqlx::query_as::<_, AlbumRow>(
        r#"
        UPDATE albums SET name = $2, description = $3, privacy = $4, updated_at = now()
        WHERE id = $1
        RETURNING id, owner_id, name, description, privacy, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(privacy.as_str())
    .fetch_optional(db)
    .await
    .context("update album")?;
    Ok(row)
}

/// Removes the album, its photos, and the likes and comment threads on either.
pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
    let mut tx = db.begin().await.context("begin delete album")?;

    let photo_ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM photos WHERE album_id = $1")
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .context("list album photos")?;

    sqlx::query(
        r#"
        DELETE FROM likes
        WHERE (resource_type = 'album' AND resource_id = $1)
           OR (resource_type = 'photo' AND resource_id = ANY($2))
        "#,
    )
    .bind(id)
    .bind(&photo_ids)
    .execute(&mut *tx)
    .await
    .context("delete album likes")?;

    comments::repo::delete_threads(&mut tx, ResourceKind::Album, &[id]).await?;
    comments::repo::delete_threads(&mut tx, ResourceKind::Photo, &photo_ids).await?;

    sqlx::query("DELETE FROM photos WHERE album_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("delete album photos")?;

    let removed = sqlx::query("DELETE FROM albums WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("delete album")?
        .rows_affected();

    tx.commit().await.context("commit delete album")?;
    Ok(removed > 0)
}

pub async fn insert_photo(
    db: &PgPool,
    album_id: Uuid,
    url: &str,
    caption: Option<&str>,
) -> anyhow::Result<Photo> {
    let row = sqlx::query_as::<_, Photo>(
        r#"
        INSERT INTO photos (id, album_id, url, caption)
        VALUES ($1, $2, $3, $4)
        RETURNING id, album_id, url, caption, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(album_id)
    .bind(url)
    .bind(caption)
    .fetch_one(db)
    .await
    .context("insert photo")?;
    Ok(row)
}

pub async fn find_photo_owner(db: &PgPool, photo_id: Uuid) -> anyhow::Result<Option<OwnedPhoto>> {
    let row = sqlx::query_as::<_, OwnedPhoto>(
        r#"
        SELECT p.id, p.album_id, a.owner_id
        FROM photos p
        JOIN albums a ON a.id = p.album_id
        WHERE p.id = $1
        "#,
    )
    .bind(photo_id)
    .fetch_optional(db)
    .await
    .context("find photo")?;
    Ok(row)
}

pub async fn delete_photo(db: &PgPool, photo_id: Uuid) -> anyhow::Result<bool> {
    let mut tx = db.begin().await.context("begin delete photo")?;
    sqlx::query("DELETE FROM likes WHERE resource_type = 'photo' AND resource_id = $1")
        .bind(photo_id)
        .execute(&mut *tx)
        .await
        .context("delete photo likes")?;
    comments::repo::delete_threads(&mut tx, ResourceKind::Photo, &[photo_id]).await?;
    let removed = sqlx::query("DELETE FROM photos WHERE id = $1")
        .bind(photo_id)
        .execute(&mut *tx)
        .await
        .context("delete photo")?
        .rows_affected();
    tx.commit().await.context("commit delete photo")?;
    Ok(removed > 0)
}
