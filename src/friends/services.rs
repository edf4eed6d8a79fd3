use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{FriendRequest, FriendRequestRow, IncomingRequest, RequestStatus},
    repo,
};
use crate::{
    common::ensure_owner,
    db::is_unique_violation,
    error::AppError,
    users::{self, dto::UserPublic},
};

fn check_target(from: Uuid, to: Uuid) -> Result<(), AppError> {
    if from == to {
        return Err(AppError::BadRequest(
            "cannot send a friend request to yourself".into(),
        ));
    }
    Ok(())
}

/// Only the recipient may answer, and only while the request is pending.
fn check_respondable(request: &FriendRequestRow, user_id: Uuid) -> Result<(), AppError> {
    ensure_owner(
        request.to_user_id,
        user_id,
        "only the recipient can respond to this friend request",
    )?;
    if RequestStatus::from_column(&request.status) != RequestStatus::Pending {
        return Err(AppError::BadRequest(
            "friend request is no longer pending".into(),
        ));
    }
    Ok(())
}

pub async fn send_request(db: &PgPool, from: Uuid, to: Uuid) -> Result<FriendRequest, AppError> {
    check_target(from, to)?;
    if !users::repo::exists(db, to).await? {
        return Err(AppError::NotFound("user"));
    }
    if repo::are_friends(db, from, to).await? {
        return Err(AppError::BadRequest("already friends".into()));
    }
    if repo::pending_between(db, from, to).await? {
        return Err(AppError::BadRequest("friend request already exists".into()));
    }

    let request = match repo::create_request(db, from, to).await {
        Ok(row) => row,
        Err(e) if is_unique_violation(&e) => {
            warn!(%from, %to, "duplicate friend request");
            return Err(AppError::BadRequest("friend request already exists".into()));
        }
        Err(e) => return Err(e.into()),
    };
    info!(request_id = %request.id, %from, %to, "friend request sent");
    Ok(request.into())
}

pub async fn incoming(db: &PgPool, user_id: Uuid) -> Result<Vec<IncomingRequest>, AppError> {
    let rows = repo::list_incoming(db, user_id).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

async fn load_request(db: &PgPool, id: Uuid) -> Result<FriendRequestRow, AppError> {
    repo::find_request(db, id)
        .await?
        .ok_or(AppError::NotFound("friend request"))
}

pub async fn accept(db: &PgPool, id: Uuid, user_id: Uuid) -> Result<FriendRequest, AppError> {
    let request = load_request(db, id).await?;
    check_respondable(&request, user_id)?;
    let accepted = repo::accept_request(db, &request)
        .await?
        .ok_or_else(|| AppError::BadRequest("friend request is no longer pending".into()))?;
    info!(request_id = %id, %user_id, "friend request accepted");
    Ok(accepted.into())
}

pub async fn reject(db: &PgPool, id: Uuid, user_id: Uuid) -> Result<FriendRequest, AppError> {
    let request = load_request(db, id).await?;
    check_respondable(&request, user_id)?;
    let rejected = repo::reject_request(db, id)
        .await?
        .ok_or_else(|| AppError::BadRequest("friend request is no longer pending".into()))?;
    info!(request_id = %id, %user_id, "friend request rejected");
    Ok(rejected.into())
}

pub async fn friends_of(db: &PgPool, user_id: Uuid) -> Result<Vec<UserPublic>, AppError> {
    if !users::repo::exists(db, user_id).await? {
        return Err(AppError::NotFound("user"));
    }
    Ok(repo::list_friends(db, user_id).await?)
}

pub async fn unfriend(db: &PgPool, user_id: Uuid, other: Uuid) -> Result<(), AppError> {
    if !repo::remove_friendship(db, user_id, other).await? {
        return Err(AppError::NotFound("friendship"));
    }
    info!(%user_id, %other, "friendship removed");
    Ok(())
}
