// src/services/mod.rs

pub mod analytics;
pub mod dashboard;
pub mod guard;

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::{
    error::AppError,
    models::user::{USER_COLUMNS, User},
};

/// Loads a full user row by id.
pub async fn find_user(pool: &SqlitePool, user_id: i64) -> Result<Option<User>, AppError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Opens a write transaction holding the database write lock from `BEGIN`.
///
/// Concurrent writers queue on the busy timeout and then see the committed
/// row, so a duplicate is reported as `AlreadyExists` and never as SQLITE_BUSY.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>, AppError> {
    let tx = pool.begin_with("BEGIN IMMEDIATE").await?;
    Ok(tx)
}
