use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{jwt::AuthUser, repo::User},
    error::ApiError,
    pagination::{page_offset, PageQuery, Paginated, PER_PAGE},
    posts::{
        dto::PostForm,
        repo::{Post, PostWithAuthor},
    },
    state::AppState,
};

const PAGE_OUT_OF_RANGE: &str = "Page out of range";
const POST_NOT_FOUND: &str = "Post not found";

/// Only the author of a post may edit or delete it.
fn ensure_owner(author_id: Uuid, user_id: Uuid) -> Result<(), ApiError> {
    if author_id != user_id {
        return Err(ApiError::Forbidden);
    }
    Ok(())
}

#[instrument(skip(state))]
pub async fn feed(
    State(state): State<AppState>,
    Query(p): Query<PageQuery>,
) -> Result<Json<Paginated<PostWithAuthor>>, ApiError> {
    let total = PostWithAuthor::count_all(&state.db).await?;
    let offset = page_offset(p.page, total, PER_PAGE)
        .ok_or_else(|| ApiError::NotFound(PAGE_OUT_OF_RANGE.into()))?;
    let items = PostWithAuthor::feed_page(&state.db, PER_PAGE, offset).await?;
    Ok(Json(Paginated::new(items, p.page, total)))
}

#[instrument(skip(state))]
pub async fn user_feed(
    State(state): State<AppState>,
    Path(fullname): Path<String>,
    Query(p): Query<PageQuery>,
) -> Result<Json<Paginated<PostWithAuthor>>, ApiError> {
    let user = User::find_by_fullname(&state.db, &fullname)
        .await?
        .ok_or_else(|| ApiError::NotFound("No user with that name".into()))?;

    let total = PostWithAuthor::count_by_author(&state.db, user.id).await?;
    let offset = page_offset(p.page, total, PER_PAGE)
        .ok_or_else(|| ApiError::NotFound(PAGE_OUT_OF_RANGE.into()))?;
    let items = PostWithAuthor::feed_page_by_author(&state.db, user.id, PER_PAGE, offset).await?;
    Ok(Json(Paginated::new(items, p.page, total)))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PostWithAuthor>, ApiError> {
    let post = PostWithAuthor::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(POST_NOT_FOUND.into()))?;
    Ok(Json(post))
}

#[instrument(skip(state, form))]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(form): Json<PostForm>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    form.validate().into_result()?;
    let post = Post::create(&state.db, user_id, &form).await?;
    info!(post_id = %post.id, user_id = %user_id, "post created");
    Ok((StatusCode::CREATED, Json(post)))
}

#[instrument(skip(state, form))]
pub async fn edit_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(form): Json<PostForm>,
) -> Result<Json<Post>, ApiError> {
    let post = Post::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(POST_NOT_FOUND.into()))?;
    if let Err(e) = ensure_owner(post.author_id, user_id) {
        warn!(post_id = %id, user_id = %user_id, "edit denied for non-owner");
        return Err(e);
    }

    form.validate().into_result()?;
    let updated = Post::update(&state.db, id, &form).await?;
    info!(post_id = %id, user_id = %user_id, "post updated");
    Ok(Json(updated))
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let post = Post::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(POST_NOT_FOUND.into()))?;
    if let Err(e) = ensure_owner(post.author_id, user_id) {
        warn!(post_id = %id, user_id = %user_id, "delete denied for non-owner");
        return Err(e);
    }

    Post::delete(&state.db, id).await?;
    info!(post_id = %id, user_id = %user_id, "post deleted");
    Ok(Json(serde_json::json!({
        "message": "Your post has been deleted!",
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_may_modify() {
        let owner = Uuid::new_v4();
        assert!(ensure_owner(owner, owner).is_ok());
    }

    #[test]
    fn non_owner_is_forbidden() {
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        assert!(matches!(
            ensure_owner(owner, stranger),
            Err(ApiError::Forbidden)
        ));
    }
}
