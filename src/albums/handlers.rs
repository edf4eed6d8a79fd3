use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{AddPhotoRequest, Album, CreateAlbumRequest, Photo, UpdateAlbumRequest},
    services,
};
use crate::{
    auth::{dto::MessageResponse, AuthUser},
    error::AppError,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/me/albums", post(create_album))
        .route("/users/:id/albums", get(list_user_albums))
        .route(
            "/albums/:id",
            get(get_album).put(update_album).delete(delete_album),
        )
        .route("/albums/:id/photos", post(add_photo))
        .route("/photos/:id", delete(delete_photo))
}

#[instrument(skip(state, payload))]
pub async fn create_album(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<CreateAlbumRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Album>), AppError> {
    let Json(payload) = payload?;
    let album = services::create(&state.db, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(album)))
}

#[instrument(skip(state))]
pub async fn list_user_albums(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<Album>>, AppError> {
    let Path(id) = path?;
    Ok(Json(services::list_for_owner(&state.db, user_id, id).await?))
}

#[instrument(skip(state))]
pub async fn get_album(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Album>, AppError> {
    let Path(id) = path?;
    Ok(Json(services::get(&state.db, user_id, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_album(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateAlbumRequest>, JsonRejection>,
) -> Result<Json<Album>, AppError> {
    let Path(id) = path?;
    let Json(payload) = payload?;
    Ok(Json(services::update(&state.db, user_id, id, payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_album(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(id) = path?;
    services::delete(&state.db, user_id, id).await?;
    Ok(Json(MessageResponse {
        message: "album deleted",
    }))
}

#[instrument(skip(state, payload))]
pub async fn add_photo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<AddPhotoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Photo>), AppError> {
    let Path(id) = path?;
    let Json(payload) = payload?;
    let photo = services::add_photo(&state.db, user_id, id, payload).await?;
    Ok((StatusCode::CREATED, Json(photo)))
}

#[instrument(skip(state))]
pub async fn delete_photo(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(id) = path?;
    services::delete_photo(&state.db, user_id, id).await?;
    Ok(Json(MessageResponse {
        message: "photo deleted",
    }))
}
