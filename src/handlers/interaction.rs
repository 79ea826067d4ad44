use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::comment::{CommentResponse, CreateCommentRequest, CreateReportRequest},
    services::{begin_write, guard},
    utils::{
        jwt::Claims,
        moderation::{clean_html, is_content_approved},
    },
};

/// Toggle Like on a post: likes it if not yet liked, unlikes it otherwise.
pub async fn toggle_like(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let mut tx = begin_write(&pool).await?;
    let outcome = guard::toggle_like(&mut *tx, user_id, post_id).await?;
    tx.commit().await?;

    let msg = if outcome.liked { "Post liked" } else { "Like removed" };
    Ok(Json(serde_json::json!({
        "msg": msg,
        "liked": outcome.liked,
        "likes": outcome.likes,
    })))
}

/// Strict Like: a second like of the same post is rejected with 400.
pub async fn like_or_reject(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let mut tx = begin_write(&pool).await?;
    let likes = guard::record_like(&mut *tx, user_id, post_id).await?;
    tx.commit().await?;

    Ok(Json(serde_json::json!({ "msg": "Post liked", "likes": likes })))
}

/// Remove a like. 404 if the user had not liked the post.
pub async fn unlike(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let mut tx = begin_write(&pool).await?;
    let likes = guard::remove_like(&mut *tx, user_id, post_id).await?;
    tx.commit().await?;

    Ok(Json(serde_json::json!({ "msg": "Like removed", "likes": likes })))
}

/// Create a new comment.
pub async fn create_comment(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    if !is_content_approved(&payload.content) {
        return Err(AppError::BadRequest(
            "Content rejected by moderation".to_string(),
        ));
    }
    let user_id = claims.user_id()?;

    let mut tx = begin_write(&pool).await?;

    let exists = sqlx::query_scalar::<_, i64>("SELECT 1 FROM posts WHERE id = ?")
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    let new_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO comments (post_id, user_id, content, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(post_id)
    .bind(user_id)
    .bind(clean_html(&payload.content))
    .bind(Utc::now())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": new_id })),
    ))
}

/// List all comments for a post, oldest first.
pub async fn list_comments(
    State(pool): State<SqlitePool>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let comments = sqlx::query_as::<_, CommentResponse>(
        r#"
        SELECT c.id, c.post_id, c.user_id, u.username, c.content, c.created_at
        FROM comments c
        JOIN users u ON c.user_id = u.id
        WHERE c.post_id = ?
        ORDER BY c.created_at ASC, c.id ASC
        "#,
    )
    .bind(post_id)
    .fetch_all(&pool)
    .await?;

    Ok(Json(comments))
}

/// Flag a post for moderation.
pub async fn report_post(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
    Json(payload): Json<CreateReportRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO reports (post_id, reporter_id, reason, created_at)
        SELECT id, ?, ?, ? FROM posts WHERE id = ?
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(clean_html(&payload.reason))
    .bind(Utc::now())
    .bind(post_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Post not found".to_string()))?;

    tracing::info!(report_id = id, post_id, reporter_id = user_id, "post reported");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "msg": "Report received", "id": id })),
    ))
}
