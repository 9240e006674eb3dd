// src/analysis/signal.rs

use anyhow::{anyhow, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::{info, warn};

use super::indicators::{self, IndicatorSnapshot};
use crate::exchange::Broker;
use crate::exchange::types::Timeframe;

pub const ACCOUNT_BALANCES: [u32; 7] = [100, 200, 500, 1000, 2000, 5000, 10000];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSignal {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for TradeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeSignal::Buy => write!(f, "buy"),
            TradeSignal::Sell => write!(f, "sell"),
            TradeSignal::Hold => write!(f, "hold"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalDecision {
    pub signal: TradeSignal,
    pub entry_price: Option<f64>,
    pub probability: f64,
    pub timeframe: Option<Timeframe>,
}

impl SignalDecision {
    pub fn hold() -> Self {
        Self { signal: TradeSignal::Hold, entry_price: None, probability: 0.0, timeframe: None }
    }

    pub fn from_snapshot(timeframe: Timeframe, snap: &IndicatorSnapshot) -> Self {
        let signal = if snap.buy_condition() { TradeSignal::Buy } else { TradeSignal::Sell };
        Self {
            signal,
            entry_price: Some(snap.close),
            probability: probability(snap.atr, snap.close),
            timeframe: Some(timeframe),
        }
    }
}

/// ATR as a share of a 10% move, in percent with two decimals.
pub fn probability(atr: f64, close: f64) -> f64 {
    if close <= 0.0 || !atr.is_finite() {
        return 0.0;
    }
    let max_atr = close * 0.1;
    ((atr / max_atr) * 100.0 * 100.0).round() / 100.0
}

/// (stop loss, take profit). Both `None` for a hold.
pub fn risk_levels(decision: &SignalDecision, stop_loss_percent: f64, take_profit_percent: f64) -> (Option<f64>, Option<f64>) {
    let Some(entry) = decision.entry_price else {
        return (None, None);
    };
    let sl = stop_loss_percent / 100.0;
    let tp = take_profit_percent / 100.0;
    match decision.signal {
        TradeSignal::Buy => (Some(entry * (1.0 - sl)), Some(entry * (1.0 + tp))),
        TradeSignal::Sell => (Some(entry * (1.0 + sl)), Some(entry * (1.0 - tp))),
        TradeSignal::Hold => (None, None),
    }
}

pub fn recommend_lot_size(probability: f64, account_balance: u32) -> Decimal {
    let risk_per_trade = dec!(0.01);
    let factor = if probability >= 80.0 {
        dec!(0.02)
    } else if probability >= 60.0 {
        dec!(0.015)
    } else if probability >= 40.0 {
        dec!(0.01)
    } else {
        dec!(0.005)
    };
    (Decimal::from(account_balance) * risk_per_trade * factor)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Lot size per account balance, serialized as an ordered map.
#[derive(Debug, Clone, PartialEq)]
pub struct LotSizes(pub Vec<(u32, Decimal)>);

impl LotSizes {
    pub fn for_probability(probability: f64) -> Self {
        Self(ACCOUNT_BALANCES.iter().map(|&b| (b, recommend_lot_size(probability, b))).collect())
    }
}

impl Serialize for LotSizes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.0
                .iter()
                .map(|(balance, lot)| (format!("Account Balance {}", balance), lot.to_f64().unwrap_or_default())),
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SignalReport {
    pub status: &'static str,
    pub symbol: String,
    pub message: String,
    pub entry_price: Option<f64>,
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub probability: String,
    pub recommended_lot_sizes: LotSizes,
    pub timeframe_displayed: String,
}

impl SignalReport {
    pub fn new(symbol: &str, decision: &SignalDecision, stop_loss_percent: f64, take_profit_percent: f64) -> Self {
        let (stop_loss, take_profit) = risk_levels(decision, stop_loss_percent, take_profit_percent);
        Self {
            status: "success",
            symbol: symbol.to_string(),
            message: format!("Trade signal: {}", decision.signal),
            entry_price: decision.entry_price,
            stop_loss,
            take_profit,
            probability: format_probability(decision),
            recommended_lot_sizes: LotSizes::for_probability(decision.probability),
            timeframe_displayed: decision
                .timeframe
                .map(|tf| tf.label().to_string())
                .unwrap_or_else(|| "No signal".into()),
        }
    }
}

/// A hold reads `0%`; a decided signal always keeps its decimal point (`10.0%`).
fn format_probability(decision: &SignalDecision) -> String {
    if decision.timeframe.is_none() {
        return "0%".into();
    }
    format!("{:?}%", decision.probability)
}

/// Walks the timeframes in preference order and decides on the first one
/// with enough candles. Fails only when no timeframe could be fetched at all.
pub async fn decide(broker: &dyn Broker, symbol: &str, candle_count: u32) -> Result<SignalDecision> {
    let mut fetched_any = false;
    let mut last_error = None;

    for timeframe in Timeframe::PREFERENCE {
        let candles = match broker.candles(symbol, timeframe, candle_count).await {
            Ok(candles) => {
                fetched_any = true;
                candles
            }
            Err(e) => {
                warn!(symbol, timeframe = %timeframe, "Candle fetch failed: {}", e);
                last_error = Some(e);
                continue;
            }
        };

        match indicators::snapshot(&candles)? {
            Some(snap) => {
                let decision = SignalDecision::from_snapshot(timeframe, &snap);
                info!(symbol, timeframe = %timeframe, signal = %decision.signal, "Trade signal generated");
                return Ok(decision);
            }
            None => info!(symbol, timeframe = %timeframe, candles = candles.len(), "Not enough data"),
        }
    }

    match (fetched_any, last_error) {
        (false, Some(e)) => Err(anyhow!("Failed to fetch market data: {}", e)),
        _ => {
            info!(symbol, "No trade signal generated");
            Ok(SignalDecision::hold())
        }
    }
}
