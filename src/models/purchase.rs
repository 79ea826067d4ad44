use serde::Serialize;
use sqlx::FromRow;

/// Represents the 'purchases' table in the database.
/// `price_paid` is a snapshot of the listing price at purchase time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Purchase {
    pub id: i64,
    pub buyer_id: i64,
    pub post_id: i64,
    pub price_paid: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A purchase resolved against its product and counterpart user.
///
/// The joined columns are optional: a product or user removed between the
/// purchase query and the join leaves them empty, and the row is dropped.
#[derive(Debug, FromRow)]
pub struct PurchaseJoinRow {
    pub id: i64,
    pub post_id: i64,
    pub price_paid: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub product_title: Option<String>,
    pub user_nome: Option<String>,
    pub user_username: Option<String>,
}

/// A sale as shown on the seller dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct SaleRecord {
    pub purchase_id: i64,
    pub product_id: i64,
    pub product_title: String,
    pub buyer_nome: String,
    pub buyer_username: String,
    pub price_paid: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl SaleRecord {
    pub fn from_row(row: PurchaseJoinRow) -> Option<Self> {
        Some(SaleRecord {
            purchase_id: row.id,
            product_id: row.post_id,
            product_title: row.product_title?,
            buyer_nome: row.user_nome?,
            buyer_username: row.user_username?,
            price_paid: row.price_paid,
            created_at: row.created_at,
        })
    }
}

/// A purchase as shown to the buyer.
#[derive(Debug, Clone, Serialize)]
pub struct OwnedProduct {
    pub purchase_id: i64,
    pub product_id: i64,
    pub product_title: String,
    pub seller_username: String,
    pub price_paid: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl OwnedProduct {
    pub fn from_row(row: PurchaseJoinRow) -> Option<Self> {
        Some(OwnedProduct {
            purchase_id: row.id,
            product_id: row.post_id,
            product_title: row.product_title?,
            seller_username: row.user_username?,
            price_paid: row.price_paid,
            created_at: row.created_at,
        })
    }
}
