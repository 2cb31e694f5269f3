//! Feature extraction for the next-day predictor.
//!
//! Turns the indicator arrays and raw series into a fixed set of named ratios
//! at a single index. Every feature has a fallback so degenerate denominators or
//! short histories produce a neutral value instead of NaN.

use super::indicators::IndicatorSet;
use serde::Serialize;

/// Trailing window used for the volume ratio and volatility.
const LOOKBACK: usize = 20;

/// Distance, in bars, of the momentum reference price.
pub const MOMENTUM_LOOKBACK: usize = 10;

/// Volatility assumed when too few returns are available.
const DEFAULT_VOLATILITY: f64 = 0.02;

/// Feature vector for one time index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureVector {
    pub price_to_sma20: f64,
    pub price_to_sma50: f64,
    pub sma_ratio: f64,
    pub rsi_norm: f64,
    pub macd_signal: f64,
    pub bollinger_position: f64,
    pub volume_ratio: f64,
    pub momentum: f64,
    pub volatility: f64,
}

impl FeatureVector {
    /// Extract features at `last` from aligned closes, volumes and indicators.
    ///
    /// Returns `None` when `last` is outside the close series.
    pub fn extract(
        closes: &[f64],
        volumes: &[f64],
        indicators: &IndicatorSet,
        last: usize,
    ) -> Option<Self> {
        let price = *closes.get(last)?;
        let sma20 = indicators.sma20.get(last).copied().unwrap_or(price);
        let sma50 = indicators.sma50.get(last).copied().unwrap_or(price);

        let rsi = indicators.rsi.get(last).copied().unwrap_or(f64::NAN);
        let macd_line = indicators.macd.get(last).copied().unwrap_or(0.0);
        let macd_signal_line = indicators.macd_signal.get(last).copied().unwrap_or(0.0);
        let upper = indicators.bollinger_upper.get(last).copied().unwrap_or(price);
        let lower = indicators.bollinger_lower.get(last).copied().unwrap_or(price);

        let history = &closes[..=last];
        let volume_history = &volumes[..volumes.len().min(last + 1)];

        Some(Self {
            price_to_sma20: ratio_or_one(price, sma20),
            price_to_sma50: ratio_or_one(price, sma50),
            sma_ratio: ratio_or_one(sma20, sma50),
            rsi_norm: if rsi.is_finite() { rsi / 100.0 } else { 0.5 },
            macd_signal: if macd_line > macd_signal_line { 1.0 } else { -1.0 },
            bollinger_position: {
                let width = upper - lower;
                if width > 0.0 {
                    (price - lower) / width
                } else {
                    0.5
                }
            },
            volume_ratio: volume_ratio(volume_history),
            momentum: momentum(history, MOMENTUM_LOOKBACK).unwrap_or(0.0),
            volatility: volatility(history),
        })
    }

    /// Named features in a fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> {
        [
            ("priceToSMA20", self.price_to_sma20),
            ("priceToSMA50", self.price_to_sma50),
            ("smaRatio", self.sma_ratio),
            ("rsiNorm", self.rsi_norm),
            ("macdSignal", self.macd_signal),
            ("bollingerPosition", self.bollinger_position),
            ("volumeRatio", self.volume_ratio),
            ("momentum", self.momentum),
            ("volatility", self.volatility),
        ]
        .into_iter()
    }
}

fn ratio_or_one(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        1.0
    }
}

/// Latest volume over the mean of the 20 volumes before it.
fn volume_ratio(volumes: &[f64]) -> f64 {
    if volumes.len() < LOOKBACK + 1 {
        return 1.0;
    }
    let latest = volumes[volumes.len() - 1];
    let window = &volumes[volumes.len() - 1 - LOOKBACK..volumes.len() - 1];
    let mean = window.iter().sum::<f64>() / LOOKBACK as f64;
    if mean > 0.0 {
        latest / mean
    } else {
        1.0
    }
}

/// Fractional change over the last `lookback` bars, if the reference is usable.
pub fn momentum(prices: &[f64], lookback: usize) -> Option<f64> {
    if prices.len() < lookback + 1 {
        return None;
    }
    let current = prices[prices.len() - 1];
    let reference = prices[prices.len() - 1 - lookback];
    if reference > 0.0 {
        Some((current - reference) / reference)
    } else {
        None
    }
}

/// Population standard deviation of daily returns over the trailing closes.
fn volatility(prices: &[f64]) -> f64 {
    let window = &prices[prices.len().saturating_sub(LOOKBACK)..];
    let returns: Vec<f64> = window
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();

    if returns.len() < 2 {
        return DEFAULT_VOLATILITY;
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance =
        returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
    variance.sqrt()
}
