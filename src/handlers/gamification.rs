use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    services::{analytics, dashboard::badges_of, find_user},
};

const RANKING_SIZE: i64 = 10;

/// Top users by points.
pub async fn get_ranking(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let ranking = analytics::ranking(&pool, RANKING_SIZE).await?;
    Ok(Json(ranking))
}

/// Badges earned by a user.
pub async fn get_badges(
    State(pool): State<SqlitePool>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if find_user(&pool, user_id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(Json(badges_of(&pool, user_id).await?))
}
