// src/storage/mod.rs

pub mod db;
pub mod schema;

pub use db::{insert_failed_trade, insert_filled_trade, list_recent_trades, Db};
pub use schema::TradeRecord;
