use serde::Serialize;
use sqlx::FromRow;

/// Represents the 'badges' table. Users hold badges through 'user_badges'.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Badge {
    pub id: i64,
    pub nome: String,
    pub descricao: Option<String>,
    pub icon: Option<String>,
}
