use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{
        AccessTokenResponse, LoginRequest, MessageResponse, RefreshRequest, RegisterRequest,
        TokenPair,
    },
    extractors::BearerToken,
    services::AuthService,
};
use crate::{error::AppError, state::AppState, users::dto::UserProfile};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

#[instrument(skip(auth, payload))]
pub async fn register(
    State(auth): State<AuthService>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    let Json(payload) = payload?;
    let profile = auth.register(payload).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

#[instrument(skip(auth, payload))]
pub async fn login(
    State(auth): State<AuthService>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, AppError> {
    let Json(payload) = payload?;
    Ok(Json(auth.login(payload).await?))
}

#[instrument(skip(auth, payload))]
pub async fn refresh(
    State(auth): State<AuthService>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<AccessTokenResponse>, AppError> {
    let Json(payload) = payload?;
    let access_token = auth.refresh(&payload.refresh_token).await?;
    Ok(Json(AccessTokenResponse { access_token }))
}

#[instrument(skip(auth, token))]
pub async fn logout(
    State(auth): State<AuthService>,
    BearerToken(token): BearerToken,
) -> Result<Json<MessageResponse>, AppError> {
    auth.logout(&token).await?;
    Ok(Json(MessageResponse {
        message: "logged out",
    }))
}
