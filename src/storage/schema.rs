// src/storage/schema.rs

//! SQLite schema for the trade journal.

use serde::Serialize;
use sqlx::sqlite::SqlitePool;
use sqlx::{Error, FromRow};
use tracing::info;

pub async fn apply_migrations(pool: &SqlitePool) -> Result<(), Error> {
    info!("Applying database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS trades (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            symbol TEXT NOT NULL,
            amount REAL NOT NULL,
            contract_type TEXT NOT NULL,
            status TEXT NOT NULL CHECK(status IN ('Filled', 'Failed')),
            contract_id INTEGER,
            transaction_id INTEGER,
            buy_price REAL,
            payout REAL,
            error_message TEXT,
            created_at INTEGER NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_trades_created_at
        ON trades (created_at);
        "#,
    )
    .execute(pool)
    .await?;

    info!("Database migrations applied successfully.");
    Ok(())
}

#[derive(Debug, FromRow, Clone, Serialize)]
pub struct TradeRecord {
    pub id: i64,
    pub symbol: String,
    pub amount: f64,
    pub contract_type: String,
    pub status: String, // "Filled" | "Failed"
    pub contract_id: Option<i64>,
    pub transaction_id: Option<i64>,
    pub buy_price: Option<f64>,
    pub payout: Option<f64>,
    pub error_message: Option<String>,
    pub created_at: i64,
}
