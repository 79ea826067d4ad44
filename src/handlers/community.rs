use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::post::{
        CreateListing, CreatePostRequest, CreateSocialPost, FeedRow, POST_COLUMNS, PostKind,
        PostListParams, PostView,
    },
    utils::{
        jwt::Claims,
        moderation::{clean_html, is_content_approved},
    },
};

/// Selection narrowing a feed query.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeedFilter {
    pub kind: Option<PostKind>,
    pub post_id: Option<i64>,
    pub cursor: Option<DateTime<Utc>>,
}

/// Loads posts with their author and derived like/comment counts, newest first.
pub async fn query_feed(
    pool: &SqlitePool,
    filter: FeedFilter,
    limit: i64,
) -> Result<Vec<PostView>, AppError> {
    let sql = format!(
        r#"
        SELECT
            {POST_COLUMNS},
            u.username AS author_username, u.nome AS author_nome, u.avatar AS author_avatar,
            (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS likes,
            (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments
        FROM posts p
        JOIN users u ON p.author_id = u.id
        WHERE (?1 IS NULL OR p.kind = ?1)
          AND (?2 IS NULL OR p.id = ?2)
          AND (?3 IS NULL OR p.created_at < ?3)
        ORDER BY p.created_at DESC, p.id DESC
        LIMIT ?4
        "#
    );

    let rows = sqlx::query_as::<_, FeedRow>(&sql)
        .bind(filter.kind.map(|k| k.as_str()))
        .bind(filter.post_id)
        .bind(filter.cursor)
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load feed: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    rows.into_iter().map(PostView::try_from).collect()
}

/// List posts (Recent first).
/// Supports cursor-based pagination.
pub async fn list_posts(
    State(pool): State<SqlitePool>,
    Query(params): Query<PostListParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let filter = FeedFilter {
        cursor: params.cursor,
        ..FeedFilter::default()
    };

    Ok(Json(query_feed(&pool, filter, limit).await?))
}

/// Get a single post by ID.
pub async fn get_post(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let filter = FeedFilter {
        post_id: Some(id),
        ..FeedFilter::default()
    };

    let post = query_feed(&pool, filter, 1)
        .await?
        .pop()
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    Ok(Json(post))
}

fn ensure_approved(texts: &[Option<&str>]) -> Result<(), AppError> {
    if texts.iter().flatten().all(|text| is_content_approved(text)) {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "Content rejected by moderation".to_string(),
        ))
    }
}

/// Create a social update or a product listing.
pub async fn create_post(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let query = match &payload {
        CreatePostRequest::Social(CreateSocialPost { conteudo, imagem }) => {
            ensure_approved(&[Some(conteudo.as_str())])?;
            sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO posts (author_id, kind, content, image, created_at)
                VALUES (?, 'social', ?, ?, ?)
                RETURNING id
                "#,
            )
            .bind(user_id)
            .bind(clean_html(conteudo))
            .bind(imagem.clone())
            .bind(Utc::now())
        }
        CreatePostRequest::Product(CreateListing {
            titulo,
            descricao,
            preco,
            file_path,
            categoria,
        }) => {
            ensure_approved(&[Some(titulo.as_str()), descricao.as_deref()])?;
            sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO posts
                (author_id, kind, title, description, price, file_path, category, created_at)
                VALUES (?, 'product', ?, ?, ?, ?, ?, ?)
                RETURNING id
                "#,
            )
            .bind(user_id)
            .bind(clean_html(titulo))
            .bind(descricao.as_deref().map(clean_html))
            .bind(*preco)
            .bind(file_path.clone())
            .bind(categoria.clone())
            .bind(Utc::now())
        }
    };

    let post_id = query.fetch_one(&pool).await.map_err(|e| {
        tracing::error!("Failed to create post: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": post_id })),
    ))
}

/// Delete a post.
/// Requires: Login + Author. Likes, comments and purchases go with it.
pub async fn delete_post(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    // 1. Fetch Post to check ownership
    let author_id = sqlx::query_scalar::<_, i64>("SELECT author_id FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    // 2. Check Permission
    if author_id != user_id {
        return Err(AppError::Forbidden(
            "You are not authorized to delete this post".to_string(),
        ));
    }

    // 3. Delete
    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete post: {:?}", e);
            AppError::InternalServerError(e.to_string())
        })?;

    Ok(StatusCode::NO_CONTENT)
}
