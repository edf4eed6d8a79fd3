use bytes::Bytes;
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    dto::{PatchProfileRequest, ReplaceProfileRequest, SearchQuery, UserProfile, UserPublic},
    repo,
};
use crate::{
    auth::{repo::CredentialStore, repo_types::User},
    common::{normalize_email, required, Pagination},
    db::is_unique_violation,
    error::AppError,
    storage::{public_url, StorageClient},
};

pub const MAX_PICTURE_BYTES: usize = 10 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// An uploaded profile picture as read from the multipart body.
pub struct PictureUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl PictureUpload {
    /// File extension for the stored object. A declared image content type
    /// decides it; without one, or with a generic binary type, the file name
    /// does. `None` when the upload is not an accepted image type.
    pub fn extension(&self) -> Option<&'static str> {
        match self.content_type.as_deref() {
            Some("image/jpeg") | Some("image/jpg") => return Some("jpg"),
            Some("image/png") => return Some("png"),
            Some("image/gif") => return Some("gif"),
            Some("image/webp") => return Some("webp"),
            None | Some("application/octet-stream") => {}
            Some(_) => return None,
        }
        let (_, ext) = self.file_name.as_deref()?.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        ALLOWED_EXTENSIONS
            .iter()
            .find(|allowed| **allowed == ext)
            .map(|allowed| if *allowed == "jpeg" { "jpg" } else { *allowed })
    }

    fn content_type_for(ext: &str) -> &'static str {
        match ext {
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            _ => "image/jpeg",
        }
    }
}

/// Users whose name or email contains `q`, newest first.
pub async fn search(db: &PgPool, query: &SearchQuery) -> Result<Vec<UserPublic>, AppError> {
    let page = Pagination {
        limit: query.limit,
        offset: query.offset,
    };
    Ok(repo::search(db, query.q.trim(), page.limit(), page.offset()).await?)
}

async fn load_user(store: &dyn CredentialStore, id: Uuid) -> Result<User, AppError> {
    store
        .find_user_by_id(id)
        .await?
        .ok_or(AppError::NotFound("user"))
}

pub async fn public_profile(
    store: &dyn CredentialStore,
    id: Uuid,
) -> Result<UserPublic, AppError> {
    Ok(load_user(store, id).await?.into())
}

pub async fn own_profile(
    store: &dyn CredentialStore,
    user_id: Uuid,
) -> Result<UserProfile, AppError> {
    Ok(load_user(store, user_id).await?.into())
}

async fn save_profile(
    store: &dyn CredentialStore,
    user_id: Uuid,
    name: &str,
    email: &str,
) -> Result<UserProfile, AppError> {
    match store.update_profile(user_id, name, email).await {
        Ok(Some(user)) => {
            info!(%user_id, "profile updated");
            Ok(user.into())
        }
        Ok(None) => Err(AppError::NotFound("user")),
        Err(e) if is_unique_violation(&e) => {
            warn!(%user_id, "profile update with taken email");
            Err(AppError::DuplicateEmail)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn replace_profile(
    store: &dyn CredentialStore,
    user_id: Uuid,
    req: ReplaceProfileRequest,
) -> Result<UserProfile, AppError> {
    let name = required(&req.name, "name")?;
    let email = normalize_email(&req.email)?;
    save_profile(store, user_id, &name, &email).await
}

pub async fn patch_profile(
    store: &dyn CredentialStore,
    user_id: Uuid,
    req: PatchProfileRequest,
) -> Result<UserProfile, AppError> {
    let current = load_user(store, user_id).await?;
    let name = match req.name.as_deref() {
        Some(name) => required(name, "name")?,
        None => current.name,
    };
    let email = match req.email.as_deref() {
        Some(email) => normalize_email(email)?,
        None => current.email,
    };
    save_profile(store, user_id, &name, &email).await
}

/// Stores the picture under `profile-pictures/<user>/<uuid>.<ext>` and records
/// its public URL. The object is removed again if the URL cannot be saved.
pub async fn upload_profile_picture(
    store: &dyn CredentialStore,
    storage: &dyn StorageClient,
    media_base_url: &str,
    user_id: Uuid,
    upload: PictureUpload,
) -> Result<UserProfile, AppError> {
    let ext = upload.extension().ok_or_else(|| {
        AppError::BadRequest("profile picture must be a jpeg, png, gif or webp image".into())
    })?;
    if upload.body.is_empty() {
        return Err(AppError::BadRequest("profile picture is empty".into()));
    }
    if upload.body.len() > MAX_PICTURE_BYTES {
        return Err(AppError::BadRequest("profile picture exceeds 10 MiB".into()));
    }

    let key = format!("profile-pictures/{}/{}.{}", user_id, Uuid::new_v4(), ext);
    storage
        .put_object(&key, upload.body, PictureUpload::content_type_for(ext))
        .await?;

    let url = public_url(media_base_url, &key);
    let saved = store.set_profile_picture_url(user_id, &url).await;
    let user = match saved {
        Ok(Some(user)) => user,
        other => {
            if let Err(e) = storage.delete_object(&key).await {
                error!(error = %e, %key, "failed to remove orphaned profile picture");
            }
            return match other {
                Ok(_) => Err(AppError::NotFound("user")),
                Err(e) => Err(e.into()),
            };
        }
    };

    info!(%user_id, %key, "profile picture uploaded");
    Ok(user.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{memory::MemoryCredentialStore, repo_types::NewUser},
        state::testing::FakeStorage,
    };

    async fn seed(store: &MemoryCredentialStore, email: &str) -> Uuid {
        store
            .create_user(NewUser {
                name: "Linus",
                email,
                password_hash: "hash",
                birth_date: time::macros::date!(1969 - 12 - 28),
            })
            .await
            .unwrap()
            .id
    }

    fn png(len: usize) -> PictureUpload {
        PictureUpload {
            file_name: Some("me.png".into()),
            content_type: Some("image/png".into()),
            body: Bytes::from(vec![0u8; len]),
        }
    }

    #[test]
    fn extension_from_type_or_name() {
        let mut upload = png(1);
        assert_eq!(upload.extension(), Some("png"));
        upload.content_type = Some("application/octet-stream".into());
        upload.file_name = Some("photo.JPEG".into());
        assert_eq!(upload.extension(), Some("jpg"));
        upload.file_name = Some("notes.txt".into());
        assert_eq!(upload.extension(), None);
        upload.file_name = None;
        assert_eq!(upload.extension(), None);
    }

    #[test]
    fn non_image_content_type_ignores_file_name() {
        let mut upload = png(1);
        upload.content_type = Some("text/html".into());
        assert_eq!(upload.extension(), None);
        upload.content_type = None;
        assert_eq!(upload.extension(), Some("png"));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn search_matches_trimmed_name_fragment() {
        let db = crate::db::fixtures::pool().await;
        let marker = Uuid::new_v4().simple().to_string();
        let id = crate::db::fixtures::user(&db, &format!("Zed {marker}")).await;

        let found = search(
            &db,
            &SearchQuery {
                q: format!("  {}  ", &marker[..12]),
                limit: Some(500),
                offset: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, id);
    }

    #[tokio::test]
    async fn html_named_like_an_image_is_not_stored() {
        let store = MemoryCredentialStore::default();
        let storage = FakeStorage::default();
        let id = seed(&store, "linus@example.com").await;
        let mut upload = png(16);
        upload.content_type = Some("text/html".into());

        let err = upload_profile_picture(&store, &storage, "https://cdn.test", id, upload)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(storage.objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn patch_keeps_unspecified_fields() {
        let store = MemoryCredentialStore::default();
        let id = seed(&store, "linus@example.com").await;
        let profile = patch_profile(
            &store,
            id,
            PatchProfileRequest {
                name: Some(" Linus T ".into()),
                email: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(profile.name, "Linus T");
        assert_eq!(profile.email, "linus@example.com");
    }

    #[tokio::test]
    async fn replace_rejects_taken_email() {
        let store = MemoryCredentialStore::default();
        let id = seed(&store, "linus@example.com").await;
        seed(&store, "other@example.com").await;
        let err = replace_profile(
            &store,
            id,
            ReplaceProfileRequest {
                name: "Linus".into(),
                email: "OTHER@example.com".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = MemoryCredentialStore::default();
        let err = public_profile(&store, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound("user")));
    }

    #[tokio::test]
    async fn upload_stores_object_and_url() {
        let store = MemoryCredentialStore::default();
        let storage = FakeStorage::default();
        let id = seed(&store, "linus@example.com").await;

        let profile = upload_profile_picture(&store, &storage, "https://cdn.test/", id, png(64))
            .await
            .unwrap();

        let keys = storage.objects.lock().unwrap().clone();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].starts_with(&format!("profile-pictures/{id}/")));
        assert!(keys[0].ends_with(".png"));
        assert_eq!(
            profile.profile_picture_url.as_deref(),
            Some(format!("https://cdn.test/{}", keys[0]).as_str())
        );
    }

    #[tokio::test]
    async fn upload_rejects_non_images_and_oversized_files() {
        let store = MemoryCredentialStore::default();
        let storage = FakeStorage::default();
        let id = seed(&store, "linus@example.com").await;

        let text = PictureUpload {
            file_name: Some("notes.txt".into()),
            content_type: Some("text/plain".into()),
            body: Bytes::from_static(b"hello"),
        };
        assert!(matches!(
            upload_profile_picture(&store, &storage, "https://cdn.test", id, text).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            upload_profile_picture(
                &store,
                &storage,
                "https://cdn.test",
                id,
                png(MAX_PICTURE_BYTES + 1)
            )
            .await,
            Err(AppError::BadRequest(_))
        ));
        assert!(storage.objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_cleans_up_when_user_is_missing() {
        let store = MemoryCredentialStore::default();
        let storage = FakeStorage::default();
        let err = upload_profile_picture(&store, &storage, "https://cdn.test", Uuid::new_v4(), png(8))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("user")));
        assert_eq!(
            *storage.objects.lock().unwrap(),
            *storage.deleted.lock().unwrap()
        );
    }
}
