use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{dto::Like, services};
use crate::{
    auth::{dto::MessageResponse, AuthUser},
    error::AppError,
    resources::ResourceKind,
    state::AppState,
};

/// `/<kind>/:id/like` and `/<kind>/:id/likes` for every likeable kind.
pub fn routes() -> Router<AppState> {
    ResourceKind::ALL
        .into_iter()
        .fold(Router::new(), |router, kind| {
            let base = format!("/{}/:id", kind.segment());
            router.merge(
                Router::new()
                    .route(&format!("{base}/like"), post(like).delete(unlike))
                    .route(&format!("{base}/likes"), get(list_likes))
                    .layer(Extension(kind)),
            )
        })
}

#[instrument(skip(state))]
pub async fn like(
    State(state): State<AppState>,
    Extension(kind): Extension<ResourceKind>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<(StatusCode, Json<Like>), AppError> {
    let Path(id) = path?;
    let like = services::like(&state.db, user_id, kind, id).await?;
    Ok((StatusCode::CREATED, Json(like)))
}

#[instrument(skip(state))]
pub async fn unlike(
    State(state): State<AppState>,
    Extension(kind): Extension<ResourceKind>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(id) = path?;
    services::unlike(&state.db, user_id, kind, id).await?;
    Ok(Json(MessageResponse { message: "unliked" }))
}

#[instrument(skip(state))]
pub async fn list_likes(
    State(state): State<AppState>,
    Extension(kind): Extension<ResourceKind>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<Like>>, AppError> {
    let Path(id) = path?;
    Ok(Json(services::list(&state.db, user_id, kind, id).await?))
}
