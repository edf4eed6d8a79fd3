use axum::{
    extract::{rejection::{JsonRejection, PathRejection, QueryRejection}, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{CreatePostRequest, Post, UpdatePostRequest},
    services,
};
use crate::{
    auth::{dto::MessageResponse, AuthUser},
    common::Pagination,
    error::AppError,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post))
        .route("/feed", get(feed))
        .route("/users/:id/posts", get(list_user_posts))
        .route(
            "/posts/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    let Json(payload) = payload?;
    let post = services::create(&state.db, user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

#[instrument(skip(state))]
pub async fn feed(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<Post>>, AppError> {
    let Query(page) = query?;
    Ok(Json(services::feed(&state.db, user_id, &page).await?))
}

#[instrument(skip(state))]
pub async fn list_user_posts(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<Post>>, AppError> {
    let Path(id) = path?;
    let Query(page) = query?;
    Ok(Json(
        services::list_for_author(&state.db, user_id, id, &page).await?,
    ))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Post>, AppError> {
    let Path(id) = path?;
    Ok(Json(services::get(&state.db, user_id, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdatePostRequest>, JsonRejection>,
) -> Result<Json<Post>, AppError> {
    let Path(id) = path?;
    let Json(payload) = payload?;
    Ok(Json(services::update(&state.db, user_id, id, payload).await?))
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(id) = path?;
    services::delete(&state.db, user_id, id).await?;
    Ok(Json(MessageResponse {
        message: "post deleted",
    }))
}
