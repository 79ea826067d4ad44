use axum::{Extension, Json, extract::State, response::IntoResponse};
use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    services::dashboard::build_dashboard,
    utils::jwt::Claims,
};

/// Dashboard of the current user, shaped by whether they sell, buy, or neither.
pub async fn get_dashboard(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let dashboard = build_dashboard(&pool, user_id, Utc::now())
        .await
        .map_err(|e| match e {
            // token outlived its account
            AppError::NotFound(_) => AppError::AuthError("not authenticated".to_string()),
            other => other,
        })?;

    Ok(Json(dashboard))
}
