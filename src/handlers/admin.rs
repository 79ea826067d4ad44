// src/handlers/admin.rs
//
// These routes are mounted without the auth layer.

use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::dashboard::AdminStats,
    services::dashboard::admin_analytics,
};

/// Sales, catalogue and engagement figures for the whole platform.
pub async fn get_analytics(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let analytics = admin_analytics(&pool, Utc::now()).await.map_err(|e| {
        tracing::error!("Failed to compute admin analytics: {:?}", e);
        e
    })?;

    Ok(Json(analytics))
}

/// Row counts of the main tables.
pub async fn get_stats(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let stats = sqlx::query_as::<_, (i64, i64, i64)>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users),
            (SELECT COUNT(*) FROM posts WHERE kind = 'product'),
            (SELECT COUNT(*) FROM posts)
        "#,
    )
    .fetch_one(&pool)
    .await?;

    let (usuarios, produtos, posts) = stats;
    Ok(Json(AdminStats {
        usuarios,
        produtos,
        posts,
    }))
}
