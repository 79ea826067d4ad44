use serde::Serialize;
use sqlx::FromRow;

use crate::models::{
    badge::Badge,
    purchase::{OwnedProduct, SaleRecord},
    user::User,
};

/// Dashboard shape selected for a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Seller,
    Buyer,
    General,
}

/// One calendar month (1..=12) of a rollup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBucket<V> {
    pub month: u32,
    pub total: V,
}

/// Product listing ranked by a metric.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ProductStat {
    pub id: i64,
    pub titulo: String,
    pub preco: f64,
    pub downloads: i64,
    pub likes: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Kinds of events merged into an activity feed. Declaration order is the
/// tie-break priority for events with identical timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Purchase,
    Like,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityItem {
    pub kind: ActivityKind,
    pub post_id: i64,
    pub label: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct SellerDashboard {
    pub total_sales: i64,
    pub total_products: i64,
    pub total_earned: f64,
    pub likes_this_week: i64,
    pub top_products: Vec<ProductStat>,
    pub vendas_por_mes: Vec<MonthlyBucket<i64>>,
    pub recent_sales: Vec<SaleRecord>,
}

#[derive(Debug, Serialize)]
pub struct BuyerDashboard {
    pub total_purchases: i64,
    pub total_earned: f64,
    pub likes_received: i64,
    pub earnings_by_month: Vec<MonthlyBucket<f64>>,
    pub recent_purchases: Vec<OwnedProduct>,
    pub top_liked_products: Vec<ProductStat>,
    pub recent_activity: Vec<ActivityItem>,
}

#[derive(Debug, Serialize)]
pub struct GeneralDashboard {
    pub followers_count: i64,
    pub following_count: i64,
    pub posts_count: i64,
    pub badges: Vec<Badge>,
    pub recent_likes: Vec<ActivityItem>,
}

/// Role-specific part of the dashboard, tagged by `user_type`.
#[derive(Debug, Serialize)]
#[serde(tag = "user_type", rename_all = "lowercase")]
pub enum DashboardData {
    Seller(SellerDashboard),
    Buyer(BuyerDashboard),
    General(GeneralDashboard),
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user: User,
    #[serde(flatten)]
    pub data: DashboardData,
}

/// Platform-wide figures for the admin panel.
#[derive(Debug, Serialize)]
pub struct AdminAnalytics {
    pub total_vendas: i64,
    pub total_produtos: i64,
    pub curtidas_semana: i64,
    pub produtos_mais_vistos: Vec<ProductStat>,
    pub vendas_por_mes: Vec<MonthlyBucket<i64>>,
}

#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub usuarios: i64,
    pub produtos: i64,
    pub posts: i64,
}
