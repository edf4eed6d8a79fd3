use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::common::Privacy;

#[derive(Debug, Clone, FromRow)]
pub struct AlbumRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub privacy: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl AlbumRow {
    pub fn privacy(&self) -> Privacy {
        Privacy::from_column(&self.privacy)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Photo {
    pub id: Uuid,
    pub album_id: Uuid,
    pub url: String,
    pub caption: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct Album {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub privacy: Privacy,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub photos: Vec<Photo>,
}

impl Album {
    pub fn from_row(row: AlbumRow, photos: Vec<Photo>) -> Self {
        let privacy = row.privacy();
        Self {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            description: row.description,
            privacy,
            created_at: row.created_at,
            updated_at: row.updated_at,
            photos,
        }
    }
}

/// Pairs each album with its photos, preserving album order.
pub fn group_photos(albums: Vec<AlbumRow>, photos: Vec<Photo>) -> Vec<Album> {
    albums
        .into_iter()
        .map(|row| {
            let own = photos
                .iter()
                .filter(|p| p.album_id == row.id)
                .cloned()
                .collect();
            Album::from_row(row, own)
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct CreateAlbumRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub privacy: Privacy,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAlbumRequest {
    pub name: String,
    pub description: Option<String>,
    pub privacy: Option<Privacy>,
}

#[derive(Debug, Deserialize)]
pub struct AddPhotoRequest {
    pub url: String,
    pub caption: Option<String>,
}

/// A photo joined with the owner of its album.
#[derive(Debug, FromRow)]
pub struct OwnedPhoto {
    pub id: Uuid,
    pub album_id: Uuid,
    pub owner_id: Uuid,
}
