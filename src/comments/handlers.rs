use axum::{
    extract::{rejection::{JsonRejection, PathRejection}, Path, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use super::{
    dto::{Comment, CreateCommentRequest},
    services,
};
use crate::{
    auth::{dto::MessageResponse, AuthUser},
    error::AppError,
    resources::ResourceKind,
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    let by_kind = ResourceKind::ALL
        .into_iter()
        .fold(Router::new(), |router, kind| {
            router.merge(
                Router::new()
                    .route(
                        &format!("/{}/:id/comments", kind.segment()),
                        get(list_comments).post(create_comment),
                    )
                    .layer(Extension(kind)),
            )
        });
    by_kind.route("/comments/:id", delete(delete_comment))
}

#[instrument(skip(state, payload))]
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(kind): Extension<ResourceKind>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let Path(id) = path?;
    let Json(payload) = payload?;
    let comment = services::create(&state.db, user_id, kind, id, payload).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
    Extension(kind): Extension<ResourceKind>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let Path(id) = path?;
    Ok(Json(services::list(&state.db, user_id, kind, id).await?))
}

#[instrument(skip(state))]
pub async fn delete_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(id) = path?;
    services::delete(&state.db, user_id, id).await?;
    Ok(Json(MessageResponse {
        message: "comment deleted",
    }))
}
