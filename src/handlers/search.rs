use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        post::{POST_COLUMNS, Post, PostRow},
        user::UserSummary,
    },
};

const SEARCH_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct SearchResults {
    pub produtos: Vec<Post>,
    pub usuarios: Vec<UserSummary>,
    pub posts: Vec<Post>,
}

/// `%term%` with LIKE wildcards in the term escaped.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

async fn search_posts(
    pool: &SqlitePool,
    column: &str,
    kind: &str,
    pattern: &str,
) -> Result<Vec<Post>, AppError> {
    let sql = format!(
        "SELECT {POST_COLUMNS} FROM posts p \
         WHERE p.kind = ? AND p.{column} LIKE ? ESCAPE '\\' \
         ORDER BY p.created_at DESC, p.id DESC LIMIT ?"
    );

    let rows = sqlx::query_as::<_, PostRow>(&sql)
        .bind(kind)
        .bind(pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(Post::try_from).collect()
}

/// Case-insensitive search over product titles, usernames and social posts.
pub async fn search(
    State(pool): State<SqlitePool>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let term = params.q.as_deref().unwrap_or_default().trim();
    if term.is_empty() {
        return Ok(Json(SearchResults::default()));
    }
    let pattern = like_pattern(term);

    let usuarios = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT id, username, nome, avatar
        FROM users
        WHERE username LIKE ? ESCAPE '\'
        ORDER BY id
        LIMIT ?
        "#,
    )
    .bind(&pattern)
    .bind(SEARCH_LIMIT)
    .fetch_all(&pool)
    .await?;

    Ok(Json(SearchResults {
        produtos: search_posts(&pool, "title", "product", &pattern).await?,
        usuarios,
        posts: search_posts(&pool, "content", "social", &pattern).await?,
    }))
}
