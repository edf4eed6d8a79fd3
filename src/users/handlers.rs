use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection, QueryRejection},
        DefaultBodyLimit, Multipart, Path, Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    dto::{PatchProfileRequest, ReplaceProfileRequest, SearchQuery, UserProfile, UserPublic},
    services::{self, PictureUpload, MAX_PICTURE_BYTES},
};
use crate::{auth::AuthUser, error::AppError, state::AppState};

const PICTURE_FIELD: &str = "profile_picture";

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/search", get(search_users))
        .route("/users/:id", get(get_user))
        .route("/me", get(get_me).put(replace_me).patch(patch_me))
}

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/me/profile-picture", post(upload_profile_picture))
        // multipart framing on top of the picture itself
        .layer(DefaultBodyLimit::max(MAX_PICTURE_BYTES + 64 * 1024))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<UserPublic>, AppError> {
    let Path(id) = path?;
    Ok(Json(
        services::public_profile(state.credentials.as_ref(), id).await?,
    ))
}

#[instrument(skip(state))]
pub async fn search_users(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<UserPublic>>, AppError> {
    let Query(query) = query?;
    Ok(Json(services::search(&state.db, &query).await?))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(
        services::own_profile(state.credentials.as_ref(), user_id).await?,
    ))
}

#[instrument(skip(state, payload))]
pub async fn replace_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<ReplaceProfileRequest>, JsonRejection>,
) -> Result<Json<UserProfile>, AppError> {
    let Json(payload) = payload?;
    Ok(Json(
        services::replace_profile(state.credentials.as_ref(), user_id, payload).await?,
    ))
}

#[instrument(skip(state, payload))]
pub async fn patch_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<PatchProfileRequest>, JsonRejection>,
) -> Result<Json<UserProfile>, AppError> {
    let Json(payload) = payload?;
    Ok(Json(
        services::patch_profile(state.credentials.as_ref(), user_id, payload).await?,
    ))
}

#[instrument(skip(state, multipart))]
pub async fn upload_profile_picture(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UserProfile>, AppError> {
    let mut multipart = multipart?;
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!(error = %e, "multipart read failed");
        AppError::BadRequest(e.body_text())
    })? {
        if field.name() != Some(PICTURE_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let body = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        upload = Some(PictureUpload {
            file_name,
            content_type,
            body,
        });
        break;
    }

    let upload = upload
        .ok_or_else(|| AppError::BadRequest(format!("{PICTURE_FIELD} field is required")))?;
    let profile = services::upload_profile_picture(
        state.credentials.as_ref(),
        state.storage.as_ref(),
        &state.config.media.public_url,
        user_id,
        upload,
    )
    .await?;
    Ok(Json(profile))
}
