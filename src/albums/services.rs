use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{
    dto::{
        group_photos, AddPhotoRequest, Album, AlbumRow, CreateAlbumRequest, Photo,
        UpdateAlbumRequest,
    },
    repo,
};
use crate::{
    common::{ensure_owner, required, Privacy},
    error::AppError,
    friends, users,
};

/// Trimmed optional text; blank becomes `None`.
fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

async fn load_owned(db: &PgPool, user_id: Uuid, id: Uuid, action: &str) -> Result<AlbumRow, AppError> {
    let album = repo::find(db, id).await?.ok_or(AppError::NotFound("album"))?;
    ensure_owner(
        album.owner_id,
        user_id,
        &format!("only the owner can {action} this album"),
    )?;
    Ok(album)
}

pub async fn create(
    db: &PgPool,
    owner_id: Uuid,
    req: CreateAlbumRequest,
) -> Result<Album, AppError> {
    let name = required(&req.name, "name")?;
    let description = optional_text(req.description.as_deref());
    let row = repo::insert(db, owner_id, &name, description.as_deref(), req.privacy).await?;
    info!(album_id = %row.id, %owner_id, "album created");
    Ok(Album::from_row(row, Vec::new()))
}

pub async fn list_for_owner(
    db: &PgPool,
    viewer_id: Uuid,
    owner_id: Uuid,
) -> Result<Vec<Album>, AppError> {
    if !users::repo::exists(db, owner_id).await? {
        return Err(AppError::NotFound("user"));
    }
    let albums = repo::list_visible_by_owner(db, viewer_id, owner_id).await?;
    let ids: Vec<Uuid> = albums.iter().map(|a| a.id).collect();
    let photos = repo::photos_for(db, &ids).await?;
    Ok(group_photos(albums, photos))
}

/// Loads an album the viewer may see. Invisible albums are reported as missing.
pub(crate) async fn load_visible(
    db: &PgPool,
    viewer_id: Uuid,
    id: Uuid,
) -> Result<AlbumRow, AppError> {
    let album = repo::find(db, id).await?.ok_or(AppError::NotFound("album"))?;
    let are_friends = album.owner_id != viewer_id
        && album.privacy() == Privacy::Friends
        && friends::repo::are_friends(db, viewer_id, album.owner_id).await?;
    if !album.privacy().visible_to(album.owner_id, viewer_id, are_friends) {
        return Err(AppError::NotFound("album"));
    }
    Ok(album)
}

pub async fn get(db: &PgPool, viewer_id: Uuid, id: Uuid) -> Result<Album, AppError> {
    let album = load_visible(db, viewer_id, id).await?;
    let photos = repo::photos_for(db, &[album.id]).await?;
    Ok(Album::from_row(album, photos))
}

pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    req: UpdateAlbumRequest,
) -> Result<Album, AppError> {
    let album = load_owned(db, user_id, id, "edit").await?;
    let name = required(&req.name, "name")?;
    let description = optional_text(req.description.as_deref());
    let privacy = req.privacy.unwrap_or_else(|| album.privacy());
    let row = repo::update(db, id, &name, description.as_deref(), privacy)
        .await?
        .ok_or(AppError::NotFound("album"))?;
    let photos = repo::photos_for(db, &[id]).await?;
    info!(album_id = %id, "album updated");
    Ok(Album::from_row(row, photos))
}

pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    load_owned(db, user_id, id, "delete").await?;
    if !repo::delete(db, id).await? {
        return Err(AppError::NotFound("album"));
    }
    info!(album_id = %id, "album deleted");
    Ok(())
}

pub async fn add_photo(
    db: &PgPool,
    user_id: Uuid,
    album_id: Uuid,
    req: AddPhotoRequest,
) -> Result<Photo, AppError> {
    load_owned(db, user_id, album_id, "add photos to").await?;
    let url = required(&req.url, "url")?;
    let caption = optional_text(req.caption.as_deref());
    let photo = repo::insert_photo(db, album_id, &url, caption.as_deref()).await?;
    info!(photo_id = %photo.id, %album_id, "photo added");
    Ok(photo)
}

pub async fn delete_photo(db: &PgPool, user_id: Uuid, photo_id: Uuid) -> Result<(), AppError> {
    let photo = repo::find_photo_owner(db, photo_id)
        .await?
        .ok_or(AppError::NotFound("photo"))?;
    ensure_owner(
        photo.owner_id,
        user_id,
        "only the album owner can delete this photo",
    )?;
    if !repo::delete_photo(db, photo.id).await? {
        return Err(AppError::NotFound("photo"));
    }
    info!(%photo_id, "photo deleted");
    Ok(())
}
