use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::dto::{FriendRequestRow, IncomingRequestRow};
use crate::{
    db::{map_write_error, UniqueViolation},
    users::dto::UserPublic,
};

const REQUEST_COLUMNS: &str = "id, from_user_id, to_user_id, status, created_at, updated_at";

pub async fn are_friends(db: &PgPool, a: Uuid, b: Uuid) -> anyhow::Result<bool> {
    let found: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM friends WHERE user_id = $1 AND friend_id = $2)",
    )
    .bind(a)
    .bind(b)
    .fetch_one(db)
    .await
    .context("check friendship")?;
    Ok(found)
}

/// Pending request between the two users in either direction.
pub async fn pending_between(db: &PgPool, a: Uuid, b: Uuid) -> anyhow::Result<bool> {
    let found: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM friend_requests
            WHERE status = 'pending'
              AND ((from_user_id = $1 AND to_user_id = $2)
                OR (from_user_id = $2 AND to_user_id = $1))
        )
        "#,
    )
    .bind(a)
    .bind(b)
    .fetch_one(db)
    .await
    .context("check pending friend request")?;
    Ok(found)
}

/// Creates a pending request. A rejected request from the same sender is
/// reopened instead of duplicated.
pub async fn create_request(db: &PgPool, from: Uuid, to: Uuid) -> anyhow::Result<FriendRequestRow> {
    sqlx::query_as::<_, FriendRequestRow>(&format!(
        r#"
        INSERT INTO friend_requests (id, from_user_id, to_user_id, status)
        VALUES ($1, $2, $3, 'pending')
        ON CONFLICT (from_user_id, to_user_id) DO UPDATE
            SET status = 'pending', updated_at = now()
            WHERE friend_requests.status = 'rejected'
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(from)
    .bind(to)
    .fetch_optional(db)
    .await
    .map_err(|e| map_write_error(e, "friend request"))?
    .ok_or_else(|| UniqueViolation("friend request").into())
}

pub async fn find_request(db: &PgPool, id: Uuid) -> anyhow::Result<Option<FriendRequestRow>> {
    let row = sqlx::query_as::<_, FriendRequestRow>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM friend_requests WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("find friend request")?;
    Ok(row)
}

pub async fn list_incoming(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<IncomingRequestRow>> {
    let rows = sqlx::query_as::<_, IncomingRequestRow>(
        r#"
        SELECT r.id, r.created_at,
               u.id AS sender_id, u.name AS sender_name,
               u.profile_picture_url AS sender_profile_picture_url,
               u.cover_photo_url AS sender_cover_photo_url,
               u.created_at AS sender_created_at
        FROM friend_requests r
        JOIN users u ON u.id = r.from_user_id
        WHERE r.to_user_id = $1 AND r.status = 'pending'
        ORDER BY r.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list incoming friend requests")?;
    Ok(rows)
}

/// Marks the request accepted and links both users. Returns `None` if the
/// request was no longer pending.
pub async fn accept_request(
    db: &PgPool,
    request: &FriendRequestRow,
) -> anyhow::Result<Option<FriendRequestRow>> {
    let mut tx = db.begin().await.context("begin accept")?;

    let updated = sqlx::query_as::<_, FriendRequestRow>(&format!(
        r#"
        UPDATE friend_requests SET status = 'accepted', updated_at = now()
        WHERE id = $1 AND status = 'pending'
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(request.id)
    .fetch_optional(&mut *tx)
    .await
    .context("mark request accepted")?;
    let Some(updated) = updated else {
        return Ok(None);
    };

    sqlx::query(
        r#"
        INSERT INTO friends (user_id, friend_id)
        VALUES ($1, $2), ($2, $1)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(request.from_user_id)
    .bind(request.to_user_id)
    .execute(&mut *tx)
    .await
    .context("insert friendship")?;

    tx.commit().await.context("commit accept")?;
    Ok(Some(updated))
}

pub async fn reject_request(db: &PgPool, id: Uuid) -> anyhow::Result<Option<FriendRequestRow>> {
    let row = sqlx::query_as::<_, FriendRequestRow>(&format!(
        r#"
        UPDATE friend_requests SET status = 'rejected', updated_at = now()
        WHERE id = $1 AND status = 'pending'
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(id)
    .fetch_optional(db)
    .await
    .context("mark request rejected")?;
    Ok(row)
}

pub async fn list_friends(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<UserPublic>> {
    let rows = sqlx::query_as::<_, UserPublic>(
        r#"
        SELECT u.id, u.name, u.profile_picture_url, u.cover_photo_url, u.created_at
        FROM friends f
        JOIN users u ON u.id = f.friend_id
        WHERE f.user_id = $1
        ORDER BY u.name
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list friends")?;
    Ok(rows)
}

/// Removes the friendship in both directions along with the requests between
/// the two users. Returns whether a friendship existed.
pub async fn remove_friendship(db: &PgPool, a: Uuid, b: Uuid) -> anyhow::Result<bool> {
    let mut tx = db.begin().await.context("begin unfriend")?;

    let removed = sqlx::query(
        r#"
        DELETE FROM friends
        WHERE (user_id = $1 AND friend_id = $2) OR (user_id = $2 AND friend_id = $1)
        "#,
    )
    .bind(a)
    .bind(b)
    .execute(&mut *tx)
    .await
    .context("delete friendship")?
    .rows_affected();
    if removed == 0 {
        return Ok(false);
    }

    sqlx::query(
        r#"
        DELETE FROM friend_requests
        WHERE (from_user_id = $1 AND to_user_id = $2) OR (from_user_id = $2 AND to_user_id = $1)
        "#,
    )
    .bind(a)
    .bind(b)
    .execute(&mut *tx)
    .await
    .context("delete friend requests")?;

    tx.commit().await.context("commit unfriend")?;
    Ok(true)
}
