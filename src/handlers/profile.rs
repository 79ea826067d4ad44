use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::UpdateProfileRequest,
    services::find_user,
    utils::{jwt::Claims, moderation::clean_html},
};

/// Get the current user's profile.
pub async fn get_profile(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user = find_user(&pool, claims.user_id()?)
        .await?
        .ok_or(AppError::AuthError("not authenticated".to_string()))?;

    Ok(Json(serde_json::json!({ "user": user })))
}

/// Update name, bio and avatar. Absent fields are left untouched.
pub async fn update_profile(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let bio = payload.bio.as_deref().map(clean_html);

    let result = sqlx::query(
        r#"
        UPDATE users
        SET nome = COALESCE(?, nome),
            bio = COALESCE(?, bio),
            avatar = COALESCE(?, avatar)
        WHERE id = ?
        "#,
    )
    .bind(&payload.nome)
    .bind(bio)
    .bind(&payload.avatar)
    .bind(user_id)
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update profile: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::AuthError("not authenticated".to_string()));
    }

    let user = find_user(&pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(serde_json::json!({ "message": "updated", "user": user })))
}
