// src/handlers/auth.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    models::user::{ConsentParams, LoginRequest, RegisterRequest, USER_COLUMNS, User},
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Registers a new user.
///
/// Hashes the password using Argon2 before storing it.
/// When a parental email is given the account stays unverified until the
/// consent link is opened.
pub async fn register(
    State(pool): State<SqlitePool>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let taken = sqlx::query_scalar::<_, i64>(
        "SELECT 1 FROM users WHERE email = ? OR username = ?",
    )
    .bind(&payload.email)
    .bind(&payload.username)
    .fetch_optional(&pool)
    .await?;

    if taken.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;

    let user_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO users (nome, username, email, password, parental_email, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&payload.nome)
    .bind(&payload.username)
    .bind(&payload.email)
    .bind(hashed_password)
    .bind(&payload.parental_email)
    .bind(Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("User already exists".to_string())
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    if let Some(parental_email) = &payload.parental_email {
        tracing::info!(
            user_id,
            parental_email = %parental_email,
            consent_path = %format!("/api/auth/consent?user_id={}", user_id),
            "parental consent requested"
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({ "msg": "Account created. Verification may be pending." })),
    ))
}

/// Authenticates a user by email and returns a JWT token.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.validate().is_err() {
        return Err(AppError::BadRequest("Invalid credentials".to_string()));
    }

    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(&payload.email)
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Login DB error: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?
        .ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    if !verify_password(&payload.senha, &user.password)? {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let token = sign_jwt(user.id, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "user": user,
    })))
}

/// Parental consent link: marks the account as verified.
pub async fn parental_consent(
    State(pool): State<SqlitePool>,
    Query(params): Query<ConsentParams>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("UPDATE users SET is_verified = TRUE WHERE id = ?")
        .bind(params.user_id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    tracing::info!(user_id = params.user_id, "parental consent recorded");
    Ok(Json(json!({ "msg": "Consent recorded. Account enabled." })))
}
