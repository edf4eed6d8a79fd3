use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{
    dto::{CreatePostRequest, Post, PostRow, UpdatePostRequest},
    repo,
};
use crate::{
    common::{ensure_owner, required, Pagination, Privacy},
    error::AppError,
    friends, users,
};

pub async fn create(db: &PgPool, author_id: Uuid, req: CreatePostRequest) -> Result<Post, AppError> {
    let content = required(&req.content, "content")?;
    let row = repo::insert(db, author_id, &content, req.privacy).await?;
    info!(post_id = %row.id, %author_id, privacy = req.privacy.as_str(), "post created");
    Ok(row.into())
}

pub async fn feed(db: &PgPool, viewer_id: Uuid, page: &Pagination) -> Result<Vec<Post>, AppError> {
    let rows = repo::feed(db, viewer_id, page.limit(), page.offset()).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn list_for_author(
    db: &PgPool,
    viewer_id: Uuid,
    author_id: Uuid,
    page: &Pagination,
) -> Result<Vec<Post>, AppError> {
    if !users::repo::exists(db, author_id).await? {
        return Err(AppError::NotFound("user"));
    }
    let rows =
        repo::list_visible_by_author(db, viewer_id, author_id, page.limit(), page.offset()).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

/// Loads a post the viewer may see. Invisible posts are reported as missing.
pub(crate) async fn load_visible(
    db: &PgPool,
    viewer_id: Uuid,
    id: Uuid,
) -> Result<PostRow, AppError> {
    let post = repo::find(db, id).await?.ok_or(AppError::NotFound("post"))?;
    let are_friends = post.author_id != viewer_id
        && post.privacy() == Privacy::Friends
        && friends::repo::are_friends(db, viewer_id, post.author_id).await?;
    if !post.privacy().visible_to(post.author_id, viewer_id, are_friends) {
        return Err(AppError::NotFound("post"));
    }
    Ok(post)
}

pub async fn get(db: &PgPool, viewer_id: Uuid, id: Uuid) -> Result<Post, AppError> {
    Ok(load_visible(db, viewer_id, id).await?.into())
}

pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    req: UpdatePostRequest,
) -> Result<Post, AppError> {
    let post = repo::find(db, id).await?.ok_or(AppError::NotFound("post"))?;
    ensure_owner(post.author_id, user_id, "only the author can edit this post")?;
    let content = required(&req.content, "content")?;
    let row = repo::update(db, id, &content, req.privacy)
        .await?
        .ok_or(AppError::NotFound("post"))?;
    info!(post_id = %id, "post updated");
    Ok(row.into())
}

pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    let post = repo::find(db, id).await?.ok_or(AppError::NotFound("post"))?;
    ensure_owner(post.author_id, user_id, "only the author can delete this post")?;
    if !repo::delete(db, id).await? {
        return Err(AppError::NotFound("post"));
    }
    info!(post_id = %id, "post deleted");
    Ok(())
}
