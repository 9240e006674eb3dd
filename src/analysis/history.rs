// src/analysis/history.rs

use chrono::DateTime;
use serde::Serialize;

use crate::exchange::types::{Candle, Timeframe};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalPoint {
    pub date: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoricalSummary {
    pub symbol: String,
    pub timeframe: String,
    /// Mean close over the whole series, `None` for an empty series.
    pub sma: Option<f64>,
    pub data: Vec<HistoricalPoint>,
}

pub fn summarize(symbol: &str, timeframe: Timeframe, candles: &[Candle]) -> HistoricalSummary {
    let data: Vec<HistoricalPoint> = candles
        .iter()
        .map(|c| HistoricalPoint { date: format_epoch(c.epoch, timeframe), price: c.close })
        .collect();

    let sma = if data.is_empty() {
        None
    } else {
        Some(data.iter().map(|p| p.price).sum::<f64>() / data.len() as f64)
    };

    HistoricalSummary { symbol: symbol.to_string(), timeframe: timeframe.label().to_string(), sma, data }
}

fn format_epoch(epoch: i64, timeframe: Timeframe) -> String {
    let Some(ts) = DateTime::from_timestamp(epoch, 0) else {
        return epoch.to_string();
    };
    match timeframe {
        Timeframe::D1 => ts.format("%Y-%m-%d").to_string(),
        _ => ts.format("%Y-%m-%d %H:%M").to_string(),
    }
}
