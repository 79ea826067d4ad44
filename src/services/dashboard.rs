//! Per-role dashboard composition and the admin analytics panel.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        badge::Badge,
        dashboard::{
            ActivityItem, ActivityKind, AdminAnalytics, BuyerDashboard, DashboardData,
            DashboardResponse, GeneralDashboard, Role, SellerDashboard,
        },
        purchase::{OwnedProduct, SaleRecord},
    },
    services::{
        analytics::{self, ProductOrder},
        find_user,
    },
};

const SELLER_TOP_PRODUCTS: i64 = 5;
const SELLER_RECENT_SALES: i64 = 10;
const BUYER_RECENT_PURCHASES: i64 = 5;
const BUYER_TOP_LIKED: i64 = 5;
const BUYER_FEED_LEN: usize = 5;
const GENERAL_RECENT_LIKES: i64 = 3;
const ADMIN_TOP_PRODUCTS: i64 = 3;

/// Builds the dashboard of `user_id` for the role it currently holds.
pub async fn build_dashboard(
    pool: &SqlitePool,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<DashboardResponse, AppError> {
    let user = find_user(pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;

    let role = analytics::classify_role(pool, user_id).await?;
    tracing::debug!(user_id, ?role, "building dashboard");

    let data = match role {
        Role::Seller => DashboardData::Seller(seller_dashboard(pool, user_id, now).await?),
        Role::Buyer => DashboardData::Buyer(buyer_dashboard(pool, user_id).await?),
        Role::General => DashboardData::General(general_dashboard(pool, user_id).await?),
    };

    Ok(DashboardResponse { user, data })
}

async fn seller_dashboard(
    pool: &SqlitePool,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<SellerDashboard, AppError> {
    let sales = analytics::purchases_of_seller(pool, user_id).await?;

    let total_products = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM posts WHERE author_id = ? AND kind = 'product'",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    let recent_sales = analytics::recent_sales(pool, user_id, SELLER_RECENT_SALES)
        .await?
        .into_iter()
        .filter_map(SaleRecord::from_row)
        .collect();

    Ok(SellerDashboard {
        total_sales: sales.len() as i64,
        total_products,
        total_earned: analytics::total_earned(pool, user_id).await?,
        likes_this_week: analytics::likes_received(pool, user_id, Some(analytics::week_start(now)))
            .await?,
        top_products: analytics::top_products(
            pool,
            Some(user_id),
            ProductOrder::Downloads,
            SELLER_TOP_PRODUCTS,
        )
        .await?,
        vendas_por_mes: analytics::sales_by_month(&sales),
        recent_sales,
    })
}

async fn buyer_dashboard(pool: &SqlitePool, user_id: i64) -> Result<BuyerDashboard, AppError> {
    let total_purchases =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM purchases WHERE buyer_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

    // A buyer has no listings today, but the figures stay in the payload.
    let own_sales = analytics::purchases_of_seller(pool, user_id).await?;

    let recent_purchases: Vec<OwnedProduct> =
        analytics::recent_purchases(pool, user_id, BUYER_RECENT_PURCHASES)
            .await?
            .into_iter()
            .filter_map(OwnedProduct::from_row)
            .collect();

    let purchase_events: Vec<ActivityItem> = recent_purchases
        .iter()
        .map(|p| ActivityItem {
            kind: ActivityKind::Purchase,
            post_id: p.product_id,
            label: p.product_title.clone(),
            timestamp: p.created_at,
        })
        .collect();
    let like_events =
        analytics::recent_like_activity(pool, user_id, BUYER_FEED_LEN as i64).await?;

    Ok(BuyerDashboard {
        total_purchases,
        total_earned: analytics::total_earned(pool, user_id).await?,
        likes_received: analytics::likes_received(pool, user_id, None).await?,
        earnings_by_month: analytics::earnings_by_month(&own_sales),
        recent_activity: analytics::merge_activity_feed(
            [purchase_events, like_events],
            BUYER_FEED_LEN,
        ),
        recent_purchases,
        top_liked_products: analytics::top_products(
            pool,
            None,
            ProductOrder::Likes,
            BUYER_TOP_LIKED,
        )
        .await?,
    })
}

async fn general_dashboard(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<GeneralDashboard, AppError> {
    let followers_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE followed_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

    let following_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM follows WHERE follower_id = ?")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

    let posts_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE author_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(GeneralDashboard {
        followers_count,
        following_count,
        posts_count,
        badges: badges_of(pool, user_id).await?,
        recent_likes: analytics::recent_like_activity(pool, user_id, GENERAL_RECENT_LIKES)
            .await?,
    })
}

/// Badges held by a user, in award-table order.
pub async fn badges_of(pool: &SqlitePool, user_id: i64) -> Result<Vec<Badge>, AppError> {
    let badges = sqlx::query_as::<_, Badge>(
        r#"
        SELECT b.id, b.nome, b.descricao, b.icon
        FROM user_badges ub
        JOIN badges b ON ub.badge_id = b.id
        WHERE ub.user_id = ?
        ORDER BY b.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(badges)
}

/// Platform-wide sales and engagement figures.
pub async fn admin_analytics(
    pool: &SqlitePool,
    now: DateTime<Utc>,
) -> Result<AdminAnalytics, AppError> {
    let purchases = analytics::all_purchases(pool).await?;

    let total_produtos =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE kind = 'product'")
            .fetch_one(pool)
            .await?;

    Ok(AdminAnalytics {
        total_vendas: purchases.len() as i64,
        total_produtos,
        curtidas_semana: analytics::likes_since(pool, analytics::week_start(now)).await?,
        produtos_mais_vistos: analytics::top_products(
            pool,
            None,
            ProductOrder::Downloads,
            ADMIN_TOP_PRODUCTS,
        )
        .await?,
        vendas_por_mes: analytics::sales_by_month(&purchases),
    })
}
