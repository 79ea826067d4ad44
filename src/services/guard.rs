//! Write paths that carry the uniqueness invariants of the social graph:
//! one like per (user, post), one follow per ordered pair, one purchase per
//! (buyer, product).
//!
//! Every operation takes the connection of an open transaction. The
//! existence check only produces a friendlier error; the UNIQUE constraints
//! in the schema are what reject a concurrent duplicate, and that rejection
//! is reported as `AlreadyExists` as well.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqliteConnection;

use crate::{
    error::{AppError, is_unique_violation},
    models::{
        post::{Listing, POST_COLUMNS, Post, PostBody, PostRow},
        purchase::Purchase,
    },
};

/// Outcome of the toggling like route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LikeToggle {
    pub liked: bool,
    pub likes: i64,
}

async fn post_exists(conn: &mut SqliteConnection, post_id: i64) -> Result<bool, AppError> {
    let row = sqlx::query_scalar::<_, i64>("SELECT 1 FROM posts WHERE id = ?")
        .bind(post_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.is_some())
}

async fn user_exists(conn: &mut SqliteConnection, user_id: i64) -> Result<bool, AppError> {
    let row = sqlx::query_scalar::<_, i64>("SELECT 1 FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.is_some())
}

async fn like_exists(
    conn: &mut SqliteConnection,
    user_id: i64,
    post_id: i64,
) -> Result<bool, AppError> {
    let row = sqlx::query_scalar::<_, i64>(
        "SELECT 1 FROM post_likes WHERE user_id = ? AND post_id = ?",
    )
    .bind(user_id)
    .bind(post_id)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row.is_some())
}

/// Number of likes currently stored for a post.
pub async fn count_likes(conn: &mut SqliteConnection, post_id: i64) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post_likes WHERE post_id = ?")
        .bind(post_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

async fn insert_like(
    conn: &mut SqliteConnection,
    user_id: i64,
    post_id: i64,
) -> Result<(), AppError> {
    sqlx::query("INSERT INTO post_likes (user_id, post_id, created_at) VALUES (?, ?, ?)")
        .bind(user_id)
        .bind(post_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                // Concurrent request won the race
                return AppError::AlreadyExists("Post already liked".to_string());
            }
            AppError::from(e)
        })?;
    Ok(())
}

/// Strict like: rejects a second like of the same post.
/// Returns the new like count of the post.
pub async fn record_like(
    conn: &mut SqliteConnection,
    user_id: i64,
    post_id: i64,
) -> Result<i64, AppError> {
    if !post_exists(conn, post_id).await? {
        return Err(AppError::NotFound("Post not found".to_string()));
    }
    if like_exists(conn, user_id, post_id).await? {
        return Err(AppError::AlreadyExists("Post already liked".to_string()));
    }

    insert_like(conn, user_id, post_id).await?;
    count_likes(conn, post_id).await
}

/// Removes a like. Returns the new like count of the post.
pub async fn remove_like(
    conn: &mut SqliteConnection,
    user_id: i64,
    post_id: i64,
) -> Result<i64, AppError> {
    let result = sqlx::query("DELETE FROM post_likes WHERE user_id = ? AND post_id = ?")
        .bind(user_id)
        .bind(post_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Like not found".to_string()));
    }

    count_likes(conn, post_id).await
}

/// Toggling like: likes the post if the user has not, unlikes it otherwise.
pub async fn toggle_like(
    conn: &mut SqliteConnection,
    user_id: i64,
    post_id: i64,
) -> Result<LikeToggle, AppError> {
    if !post_exists(conn, post_id).await? {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    let liked = if like_exists(conn, user_id, post_id).await? {
        sqlx::query("DELETE FROM post_likes WHERE user_id = ? AND post_id = ?")
            .bind(user_id)
            .bind(post_id)
            .execute(&mut *conn)
            .await?;
        false
    } else {
        insert_like(conn, user_id, post_id).await?;
        true
    };

    let likes = count_likes(conn, post_id).await?;
    Ok(LikeToggle { liked, likes })
}

/// Adds the directed edge follower -> followed.
pub async fn record_follow(
    conn: &mut SqliteConnection,
    follower_id: i64,
    followed_id: i64,
) -> Result<(), AppError> {
    if follower_id == followed_id {
        return Err(AppError::InvalidOperation(
            "You cannot follow yourself".to_string(),
        ));
    }
    if !user_exists(conn, followed_id).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT 1 FROM follows WHERE follower_id = ? AND followed_id = ?",
    )
    .bind(follower_id)
    .bind(followed_id)
    .fetch_optional(&mut *conn)
    .await?;

    if existing.is_some() {
        return Err(AppError::AlreadyExists(
            "You already follow this user".to_string(),
        ));
    }

    sqlx::query("INSERT INTO follows (follower_id, followed_id, created_at) VALUES (?, ?, ?)")
        .bind(follower_id)
        .bind(followed_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                return AppError::AlreadyExists("You already follow this user".to_string());
            }
            AppError::from(e)
        })?;

    Ok(())
}

/// Removes the directed edge follower -> followed.
pub async fn remove_follow(
    conn: &mut SqliteConnection,
    follower_id: i64,
    followed_id: i64,
) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followed_id = ?")
        .bind(follower_id)
        .bind(followed_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(
            "You do not follow this user".to_string(),
        ));
    }

    Ok(())
}

/// Records that `buyer_id` owns the product listed by `post_id`.
///
/// `price_paid` is copied from the listing now; later price edits never
/// touch existing purchases.
pub async fn record_purchase(
    conn: &mut SqliteConnection,
    buyer_id: i64,
    post_id: i64,
) -> Result<Purchase, AppError> {
    let sql = format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = ?");
    let row = sqlx::query_as::<_, PostRow>(&sql)
        .bind(post_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::NotFound("Product not found".to_string()))?;

    let price = match Post::try_from(row)?.body {
        PostBody::Product(Listing { preco, .. }) => preco,
        PostBody::Social { .. } => {
            return Err(AppError::InvalidTarget(
                "This post is not a product".to_string(),
            ));
        }
    };

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM purchases WHERE buyer_id = ? AND post_id = ?",
    )
    .bind(buyer_id)
    .bind(post_id)
    .fetch_optional(&mut *conn)
    .await?;

    if existing.is_some() {
        return Err(AppError::AlreadyExists(
            "You already own this product".to_string(),
        ));
    }

    let purchase = sqlx::query_as::<_, Purchase>(
        r#"
        INSERT INTO purchases (buyer_id, post_id, price_paid, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING id, buyer_id, post_id, price_paid, created_at
        "#,
    )
    .bind(buyer_id)
    .bind(post_id)
    .bind(price)
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            return AppError::AlreadyExists("You already own this product".to_string());
        }
        AppError::from(e)
    })?;

    tracing::info!(
        purchase_id = purchase.id,
        buyer_id,
        post_id,
        "purchase recorded"
    );

    Ok(purchase)
}
