// src/analysis/mod.rs

pub mod history;
pub mod indicators;
pub mod script;
pub mod signal;

pub use history::{summarize, HistoricalSummary};
pub use indicators::{snapshot, IndicatorSnapshot};
pub use script::run_script;
pub use signal::{decide, SignalDecision, SignalReport, TradeSignal};
