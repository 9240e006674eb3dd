// src/analysis/indicators.rs

//! Indicator snapshot over a candle series.
//!
//! EMA 50, RSI 14, MACD (12, 26, 9), Bollinger (20, 2), stochastic 14/3/3
//! and ATR 14, evaluated on the last candle of the series.

use anyhow::{anyhow, Result};
use serde::Serialize;
use ta::indicators::{
    AverageTrueRange, BollingerBands, ExponentialMovingAverage, FastStochastic,
    MovingAverageConvergenceDivergence, RelativeStrengthIndex, SimpleMovingAverage,
};
use ta::Next;

use crate::exchange::types::Candle;

/// Shorter series are not analysed.
pub const MIN_CANDLES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorSnapshot {
    pub epoch: i64,
    pub close: f64,
    pub ema_50: f64,
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_hist: f64,
    pub upper_bb: f64,
    pub middle_bb: f64,
    pub lower_bb: f64,
    pub stoch_k: f64,
    pub stoch_d: f64,
    pub atr: f64,
}

impl IndicatorSnapshot {
    /// Oversold-below-trend setup: every condition has to hold.
    pub fn buy_condition(&self) -> bool {
        self.ema_50 > self.close
            && self.rsi < 30.0
            && self.macd_hist > 0.0
            && self.close < self.lower_bb
            && self.stoch_k < self.stoch_d
    }
}

fn ta_err(e: impl std::fmt::Debug) -> anyhow::Error {
    anyhow!("indicator setup failed: {:?}", e)
}

/// `Ok(None)` when the series is shorter than [`MIN_CANDLES`].
pub fn snapshot(candles: &[Candle]) -> Result<Option<IndicatorSnapshot>> {
    let Some(last) = candles.last() else {
        return Ok(None);
    };
    if candles.len() < MIN_CANDLES {
        return Ok(None);
    }

    let mut ema = ExponentialMovingAverage::new(50).map_err(ta_err)?;
    let mut rsi = RelativeStrengthIndex::new(14).map_err(ta_err)?;
    let mut macd = MovingAverageConvergenceDivergence::new(12, 26, 9).map_err(ta_err)?;
    let mut bb = BollingerBands::new(20, 2.0).map_err(ta_err)?;
    let mut fast_k = FastStochastic::new(14).map_err(ta_err)?;
    let mut slow_k = SimpleMovingAverage::new(3).map_err(ta_err)?;
    let mut slow_d = SimpleMovingAverage::new(3).map_err(ta_err)?;
    let mut atr = AverageTrueRange::new(14).map_err(ta_err)?;

    let mut snap = IndicatorSnapshot {
        epoch: last.epoch,
        close: last.close,
        ema_50: 0.0,
        rsi: 0.0,
        macd: 0.0,
        macd_signal: 0.0,
        macd_hist: 0.0,
        upper_bb: 0.0,
        middle_bb: 0.0,
        lower_bb: 0.0,
        stoch_k: 0.0,
        stoch_d: 0.0,
        atr: 0.0,
    };

    for candle in candles {
        snap.ema_50 = ema.next(candle.close);
        snap.rsi = rsi.next(candle.close);

        let m = macd.next(candle.close);
        snap.macd = m.macd;
        snap.macd_signal = m.signal;
        snap.macd_hist = m.histogram;

        let b = bb.next(candle.close);
        snap.upper_bb = b.upper;
        snap.middle_bb = b.average;
        snap.lower_bb = b.lower;

        snap.stoch_k = slow_k.next(fast_k.next(candle));
        snap.stoch_d = slow_d.next(snap.stoch_k);

        snap.atr = atr.next(candle);
    }

    Ok(Some(snap))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle { epoch: i as i64 * 60, open: c, high: c + 1.0, low: c - 1.0, close: c })
            .collect()
    }

    #[test]
    fn short_series_has_no_snapshot() {
        let closes: Vec<f64> = (0..MIN_CANDLES - 1).map(|i| 100.0 + i as f64).collect();
        assert!(snapshot(&series(&closes)).unwrap().is_none());
        assert!(snapshot(&[]).unwrap().is_none());
    }

    #[test]
    fn flat_series_has_neutral_readings() {
        let snap = snapshot(&series(&[100.0; 60])).unwrap().unwrap();
        assert!((snap.ema_50 - 100.0).abs() < 1e-9);
        assert!((snap.middle_bb - 100.0).abs() < 1e-9);
        assert!(snap.macd_hist.abs() < 1e-9);
        assert!((snap.atr - 2.0).abs() < 1e-9);
        assert_eq!(snap.close, 100.0);
        assert_eq!(snap.epoch, 59 * 60);
    }

    #[test]
    fn rising_series_reads_overbought() {
        let closes: Vec<f64> = (0..80).map(|i| 100.0 + i as f64).collect();
        let snap = snapshot(&series(&closes)).unwrap().unwrap();
        assert!(snap.rsi > 70.0);
        assert!(snap.ema_50 < snap.close);
        assert!(snap.macd > 0.0);
        assert!(!snap.buy_condition());
    }

    #[test]
    fn buy_condition_needs_every_leg() {
        let base = IndicatorSnapshot {
            epoch: 0,
            close: 90.0,
            ema_50: 100.0,
            rsi: 25.0,
            macd: -1.0,
            macd_signal: -1.5,
            macd_hist: 0.5,
            upper_bb: 110.0,
            middle_bb: 100.0,
            lower_bb: 92.0,
            stoch_k: 10.0,
            stoch_d: 15.0,
            atr: 3.0,
        };
        assert!(base.buy_condition());
        assert!(!IndicatorSnapshot { rsi: 35.0, ..base }.buy_condition());
        assert!(!IndicatorSnapshot { macd_hist: -0.1, ..base }.buy_condition());
        assert!(!IndicatorSnapshot { lower_bb: 85.0, ..base }.buy_condition());
        assert!(!IndicatorSnapshot { stoch_k: 20.0, ..base }.buy_condition());
        assert!(!IndicatorSnapshot { ema_50: 80.0, ..base }.buy_condition());
    }
}
