use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{FriendRequest, IncomingRequest},
    services,
};
use crate::{
    auth::{dto::MessageResponse, AuthUser},
    error::AppError,
    state::AppState,
    users::dto::UserPublic,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/:id/friend-requests", post(send_request))
        .route("/me/friend-requests", get(list_incoming))
        .route("/friend-requests/:id/accept", post(accept))
        .route("/friend-requests/:id/reject", post(reject))
        .route("/users/:id/friends", get(list_friends).delete(unfriend))
}

#[instrument(skip(state))]
pub async fn send_request(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<(StatusCode, Json<FriendRequest>), AppError> {
    let Path(id) = path?;
    let request = services::send_request(&state.db, user_id, id).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[instrument(skip(state))]
pub async fn list_incoming(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<IncomingRequest>>, AppError> {
    Ok(Json(services::incoming(&state.db, user_id).await?))
}

#[instrument(skip(state))]
pub async fn accept(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<FriendRequest>, AppError> {
    let Path(id) = path?;
    Ok(Json(services::accept(&state.db, id, user_id).await?))
}

#[instrument(skip(state))]
pub async fn reject(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<FriendRequest>, AppError> {
    let Path(id) = path?;
    Ok(Json(services::reject(&state.db, id, user_id).await?))
}

#[instrument(skip(state))]
pub async fn list_friends(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<UserPublic>>, AppError> {
    let Path(id) = path?;
    Ok(Json(services::friends_of(&state.db, id).await?))
}

#[instrument(skip(state))]
pub async fn unfriend(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(id) = path?;
    services::unfriend(&state.db, user_id, id).await?;
    Ok(Json(MessageResponse {
        message: "friend removed",
    }))
}
