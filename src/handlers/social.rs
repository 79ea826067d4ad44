use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::user::UserSummary,
    services::{begin_write, guard},
    utils::jwt::Claims,
};

/// Follow a user.
pub async fn follow(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let follower_id = claims.user_id()?;

    let mut tx = begin_write(&pool).await?;
    guard::record_follow(&mut *tx, follower_id, user_id).await?;
    tx.commit().await?;

    Ok(Json(serde_json::json!({ "message": "Now following" })))
}

/// Unfollow a user. Not following the target is a client error (400).
pub async fn unfollow(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let follower_id = claims.user_id()?;

    let mut tx = begin_write(&pool).await?;
    guard::remove_follow(&mut *tx, follower_id, user_id)
        .await
        .map_err(|e| match e {
            AppError::NotFound(msg) => AppError::InvalidOperation(msg),
            other => other,
        })?;
    tx.commit().await?;

    Ok(Json(serde_json::json!({ "message": "Unfollowed" })))
}

/// Users following `user_id`, most recent first.
pub async fn list_followers(
    State(pool): State<SqlitePool>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT u.id, u.username, u.nome, u.avatar
        FROM follows f
        JOIN users u ON f.follower_id = u.id
        WHERE f.followed_id = ?
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(users))
}

/// Users that `user_id` follows, most recent first.
pub async fn list_following(
    State(pool): State<SqlitePool>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let users = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT u.id, u.username, u.nome, u.avatar
        FROM follows f
        JOIN users u ON f.followed_id = u.id
        WHERE f.follower_id = ?
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(users))
}
