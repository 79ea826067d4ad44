//! Read-side aggregation: role classification, monthly rollups, product
//! rankings and merged activity feeds. Nothing here writes to the store.
//!
//! Sub-aggregates are separate queries and may observe slightly different
//! snapshots. Rows whose parent disappeared between queries are dropped.

use std::ops::AddAssign;

use chrono::{DateTime, Datelike, Duration, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::{
    error::AppError,
    models::{
        dashboard::{ActivityItem, ActivityKind, MonthlyBucket, ProductStat, Role},
        purchase::{Purchase, PurchaseJoinRow},
        user::RankingEntry,
    },
};

/// Fallback labels for untitled posts are cut to this many characters.
pub const LABEL_MAX_CHARS: usize = 50;

/// Length of the rolling "this week" window, in days.
pub const WEEK_DAYS: i64 = 7;

/// Start of the rolling week ending at `now`.
pub fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(WEEK_DAYS)
}

/// Metric used to rank product listings. Ties always fall back to the
/// oldest listing first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductOrder {
    Downloads,
    Likes,
    Recent,
}

impl ProductOrder {
    fn order_by(&self) -> &'static str {
        match self {
            ProductOrder::Downloads => "p.downloads DESC, p.id ASC",
            ProductOrder::Likes => "likes DESC, p.id ASC",
            ProductOrder::Recent => "p.created_at DESC, p.id ASC",
        }
    }
}

/// seller > buyer > general.
pub async fn classify_role(pool: &SqlitePool, user_id: i64) -> Result<Role, AppError> {
    let has_product = sqlx::query_scalar::<_, i64>(
        "SELECT 1 FROM posts WHERE author_id = ? AND kind = 'product' LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .is_some();

    if has_product {
        return Ok(Role::Seller);
    }

    let has_purchase =
        sqlx::query_scalar::<_, i64>("SELECT 1 FROM purchases WHERE buyer_id = ? LIMIT 1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?
            .is_some();

    Ok(if has_purchase { Role::Buyer } else { Role::General })
}

/// Buckets `items` by calendar month of year, months 1 through 12, every
/// month present even without activity.
///
/// The year is ignored: March of any year lands in bucket 3.
pub fn monthly_rollup<T, V>(
    items: &[T],
    timestamp: impl Fn(&T) -> DateTime<Utc>,
    value: impl Fn(&T) -> V,
) -> Vec<MonthlyBucket<V>>
where
    V: Default + Copy + AddAssign,
{
    let mut totals = [V::default(); 12];
    for item in items {
        let month = timestamp(item).month0() as usize;
        totals[month] += value(item);
    }

    totals
        .into_iter()
        .zip(1u32..)
        .map(|(total, month)| MonthlyBucket { month, total })
        .collect()
}

/// Number of purchases per calendar month.
pub fn sales_by_month(purchases: &[Purchase]) -> Vec<MonthlyBucket<i64>> {
    monthly_rollup(purchases, |p| p.created_at, |_| 1)
}

/// Sum of `price_paid` per calendar month.
pub fn earnings_by_month(purchases: &[Purchase]) -> Vec<MonthlyBucket<f64>> {
    monthly_rollup(purchases, |p| p.created_at, |p| p.price_paid)
}

/// Merges several activity streams into one, newest first, keeping at most
/// `limit` items. Events at the same instant are ordered by kind
/// (purchases before likes).
pub fn merge_activity_feed(
    sources: impl IntoIterator<Item = Vec<ActivityItem>>,
    limit: usize,
) -> Vec<ActivityItem> {
    let mut merged: Vec<ActivityItem> = sources.into_iter().flatten().collect();
    merged.sort_by(|a, b| {
        b.timestamp
            .cmp(&a.timestamp)
            .then_with(|| a.kind.cmp(&b.kind))
    });
    merged.truncate(limit);
    merged
}

/// Title of a post, or the start of its text when it has no title.
pub fn activity_label(title: Option<String>, content: Option<String>) -> String {
    title.unwrap_or_else(|| {
        content
            .unwrap_or_default()
            .chars()
            .take(LABEL_MAX_CHARS)
            .collect()
    })
}

/// Up to `limit` product listings ordered by `order`, optionally restricted
/// to one author.
pub async fn top_products(
    pool: &SqlitePool,
    author_id: Option<i64>,
    order: ProductOrder,
    limit: i64,
) -> Result<Vec<ProductStat>, AppError> {
    let sql = format!(
        r#"
        SELECT
            p.id, p.title AS titulo, p.price AS preco, p.downloads, p.created_at,
            (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS likes
        FROM posts p
        WHERE p.kind = 'product'
          AND (?1 IS NULL OR p.author_id = ?1)
        ORDER BY {}
        LIMIT ?2
        "#,
        order.order_by()
    );

    let products = sqlx::query_as::<_, ProductStat>(&sql)
        .bind(author_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(products)
}

/// Sum of `price_paid` over every purchase of a product authored by
/// `seller_id`. Zero when nothing was sold.
pub async fn total_earned(pool: &SqlitePool, seller_id: i64) -> Result<f64, AppError> {
    let total = sqlx::query_scalar::<_, f64>(
        r#"
        SELECT COALESCE(SUM(pu.price_paid), 0.0)
        FROM purchases pu
        JOIN posts p ON pu.post_id = p.id
        WHERE p.author_id = ?
        "#,
    )
    .bind(seller_id)
    .fetch_one(pool)
    .await?;

    Ok(total)
}

/// Every purchase of a product authored by `seller_id`.
pub async fn purchases_of_seller(
    pool: &SqlitePool,
    seller_id: i64,
) -> Result<Vec<Purchase>, AppError> {
    let purchases = sqlx::query_as::<_, Purchase>(
        r#"
        SELECT pu.id, pu.buyer_id, pu.post_id, pu.price_paid, pu.created_at
        FROM purchases pu
        JOIN posts p ON pu.post_id = p.id
        WHERE p.author_id = ?
        ORDER BY pu.id
        "#,
    )
    .bind(seller_id)
    .fetch_all(pool)
    .await?;

    Ok(purchases)
}

pub async fn all_purchases(pool: &SqlitePool) -> Result<Vec<Purchase>, AppError> {
    let purchases = sqlx::query_as::<_, Purchase>(
        "SELECT id, buyer_id, post_id, price_paid, created_at FROM purchases ORDER BY id",
    )
    .fetch_all(pool)
    .await?;

    Ok(purchases)
}

/// Most recent sales of the seller's products, joined with product title
/// and buyer.
pub async fn recent_sales(
    pool: &SqlitePool,
    seller_id: i64,
    limit: i64,
) -> Result<Vec<PurchaseJoinRow>, AppError> {
    let rows = sqlx::query_as::<_, PurchaseJoinRow>(
        r#"
        SELECT
            pu.id, pu.post_id, pu.price_paid, pu.created_at,
            p.title AS product_title, u.nome AS user_nome, u.username AS user_username
        FROM purchases pu
        LEFT JOIN posts p ON pu.post_id = p.id
        LEFT JOIN users u ON pu.buyer_id = u.id
        WHERE pu.post_id IN (SELECT id FROM posts WHERE author_id = ?)
        ORDER BY pu.created_at DESC, pu.id DESC
        LIMIT ?
        "#,
    )
    .bind(seller_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Most recent purchases made by `buyer_id`, joined with product title and
/// seller.
pub async fn recent_purchases(
    pool: &SqlitePool,
    buyer_id: i64,
    limit: i64,
) -> Result<Vec<PurchaseJoinRow>, AppError> {
    let rows = sqlx::query_as::<_, PurchaseJoinRow>(
        r#"
        SELECT
            pu.id, pu.post_id, pu.price_paid, pu.created_at,
            p.title AS product_title, u.nome AS user_nome, u.username AS user_username
        FROM purchases pu
        LEFT JOIN posts p ON pu.post_id = p.id
        LEFT JOIN users u ON p.author_id = u.id
        WHERE pu.buyer_id = ?
        ORDER BY pu.created_at DESC, pu.id DESC
        LIMIT ?
        "#,
    )
    .bind(buyer_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[derive(Debug, FromRow)]
struct LikeActivityRow {
    post_id: i64,
    created_at: DateTime<Utc>,
    kind: Option<String>,
    title: Option<String>,
    content: Option<String>,
}

/// Most recent likes given by `user_id`, as activity items.
pub async fn recent_like_activity(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<ActivityItem>, AppError> {
    let rows = sqlx::query_as::<_, LikeActivityRow>(
        r#"
        SELECT l.post_id, l.created_at, p.kind, p.title, p.content
        FROM post_likes l
        LEFT JOIN posts p ON l.post_id = p.id
        WHERE l.user_id = ?
        ORDER BY l.created_at DESC, l.post_id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(like_items(rows))
}

fn like_items(rows: Vec<LikeActivityRow>) -> Vec<ActivityItem> {
    rows.into_iter()
        // post removed after the like was read
        .filter(|row| row.kind.is_some())
        .map(|row| ActivityItem {
            kind: ActivityKind::Like,
            post_id: row.post_id,
            label: activity_label(row.title, row.content),
            timestamp: row.created_at,
        })
        .collect()
}

/// Likes received on posts authored by `author_id`, optionally only those
/// created at or after `since`.
pub async fn likes_received(
    pool: &SqlitePool,
    author_id: i64,
    since: Option<DateTime<Utc>>,
) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM post_likes l
        JOIN posts p ON l.post_id = p.id
        WHERE p.author_id = ?1
          AND (?2 IS NULL OR l.created_at >= ?2)
        "#,
    )
    .bind(author_id)
    .bind(since)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Likes created anywhere on the platform at or after `since`.
pub async fn likes_since(pool: &SqlitePool, since: DateTime<Utc>) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM post_likes WHERE created_at >= ?")
        .bind(since)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Users ordered by points, highest first; equal scores keep sign-up order.
pub async fn ranking(pool: &SqlitePool, top_n: i64) -> Result<Vec<RankingEntry>, AppError> {
    let entries = sqlx::query_as::<_, RankingEntry>(
        "SELECT username, points FROM users ORDER BY points DESC, id ASC LIMIT ?",
    )
    .bind(top_n)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}
