// src/storage/db.rs
use anyhow::{Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use std::{env, path::PathBuf};

use super::schema::{apply_migrations, TradeRecord};
use crate::exchange::types::{BuyReceipt, OrderRequest};

#[derive(Debug, Clone)]
pub struct Db {
    pub pool: SqlitePool,
}

impl Db {
    /// Opens (creating if needed) the SQLite file and applies migrations.
    pub async fn connect(path: &str) -> Result<Self> {
        let abs_path: PathBuf = {
            let p = PathBuf::from(path);
            if p.is_absolute() { p } else { env::current_dir()?.join(p) }
        };

        if let Some(dir) = abs_path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {:?}", dir))?;
        }

        let opts = SqliteConnectOptions::new()
            .filename(&abs_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(opts).await?;
        apply_migrations(&pool).await.context("Trade journal migrations failed")?;
        Ok(Db { pool })
    }

    /// Single-connection in-memory database; every pooled connection would
    /// otherwise see its own empty database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        apply_migrations(&pool).await?;
        Ok(Db { pool })
    }
}

pub async fn insert_filled_trade(db: &Db, order: &OrderRequest, receipt: &BuyReceipt) -> Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO trades (symbol, amount, contract_type, status, contract_id, transaction_id, buy_price, payout, created_at)
        VALUES (?, ?, ?, 'Filled', ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&order.symbol)
    .bind(order.amount)
    .bind(&order.contract_type)
    .bind(receipt.contract_id)
    .bind(receipt.transaction_id)
    .bind(receipt.buy_price)
    .bind(receipt.payout)
    .bind(chrono::Utc::now().timestamp())
    .execute(&db.pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

pub async fn insert_failed_trade(db: &Db, order: &OrderRequest, error_message: &str) -> Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO trades (symbol, amount, contract_type, status, error_message, created_at)
        VALUES (?, ?, ?, 'Failed', ?, ?)
        "#,
    )
    .bind(&order.symbol)
    .bind(order.amount)
    .bind(&order.contract_type)
    .bind(error_message)
    .bind(chrono::Utc::now().timestamp())
    .execute(&db.pool)
    .await?
    .last_insert_rowid();
    Ok(id)
}

/// Newest first.
pub async fn list_recent_trades(db: &Db, limit: u32) -> Result<Vec<TradeRecord>> {
    let rows = sqlx::query_as::<_, TradeRecord>(
        r#"
        SELECT id, symbol, amount, contract_type, status, contract_id, transaction_id,
               buy_price, payout, error_message, created_at
        FROM trades
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(limit as i64)
    .fetch_all(&db.pool)
    .await?;
    Ok(rows)
}
