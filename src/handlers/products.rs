use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    handlers::community::{FeedFilter, query_feed},
    models::{
        post::{PostKind, PostListParams},
        purchase::OwnedProduct,
    },
    services::{analytics, begin_write, guard},
    utils::jwt::Claims,
};

/// List product listings (Recent first).
pub async fn list_products(
    State(pool): State<SqlitePool>,
    Query(params): Query<PostListParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100);
    let filter = FeedFilter {
        kind: Some(PostKind::Product),
        cursor: params.cursor,
        ..FeedFilter::default()
    };

    Ok(Json(query_feed(&pool, filter, limit).await?))
}

/// Get a single product listing by ID.
pub async fn get_product(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let filter = FeedFilter {
        kind: Some(PostKind::Product),
        post_id: Some(id),
        ..FeedFilter::default()
    };

    let product = query_feed(&pool, filter, 1)
        .await?
        .pop()
        .ok_or(AppError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}

/// Purchase a product listing.
pub async fn purchase_product(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let buyer_id = claims.user_id()?;

    let mut tx = begin_write(&pool).await?;
    let purchase = guard::record_purchase(&mut *tx, buyer_id, post_id).await?;
    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Purchase completed",
            "purchase_id": purchase.id,
        })),
    ))
}

/// Count a download of a product file.
/// Requires: Login + (Author OR Buyer). The file itself is served elsewhere.
pub async fn register_download(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(post_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    let mut tx = begin_write(&pool).await?;

    let (author_id, file_path) = sqlx::query_as::<_, (i64, String)>(
        "SELECT author_id, file_path FROM posts WHERE id = ? AND kind = 'product'",
    )
    .bind(post_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Product not found".to_string()))?;

    if author_id != user_id {
        let owned = sqlx::query_scalar::<_, i64>(
            "SELECT 1 FROM purchases WHERE buyer_id = ? AND post_id = ?",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?;

        if owned.is_none() {
            return Err(AppError::Forbidden(
                "Purchase this product to download it".to_string(),
            ));
        }
    }

    let downloads = sqlx::query_scalar::<_, i64>(
        "UPDATE posts SET downloads = downloads + 1 WHERE id = ? RETURNING downloads",
    )
    .bind(post_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Json(serde_json::json!({
        "file_path": file_path,
        "downloads": downloads,
    })))
}

/// Products bought by the current user, most recent first.
pub async fn list_purchased(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let owned: Vec<OwnedProduct> = analytics::recent_purchases(&pool, claims.user_id()?, i64::MAX)
        .await?
        .into_iter()
        .filter_map(OwnedProduct::from_row)
        .collect();

    Ok(Json(owned))
}
