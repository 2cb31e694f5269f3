//! Relative Strength Index (RSI) indicator.

use super::Indicator;

/// RSI emitted while fewer than `period` changes are available.
pub const NEUTRAL_RSI: f64 = 50.0;

/// Floor applied to the average loss so a loss-free window stays finite.
const MIN_AVG_LOSS: f64 = 0.01;

/// RSI (Relative Strength Index) indicator.
///
/// Measures momentum by comparing the magnitude of recent gains to recent losses.
/// Values range from 0-100:
/// - Below 30: Oversold (potential buy signal)
/// - Above 70: Overbought (potential sell signal)
///
/// The output is aligned with the price *changes*, not the prices: entry `i`
/// describes the move from `prices[i]` to `prices[i + 1]`, so the result is one
/// element shorter than the input.
#[derive(Debug, Clone, Copy)]
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Rsi {
    type Output = Vec<f64>;

    fn name(&self) -> &str {
        "RSI (14)"
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, values: &[f64]) -> Vec<f64> {
        rsi(values, self.period)
    }
}

/// Simple-average RSI over trailing windows of price changes.
pub fn rsi(prices: &[f64], period: usize) -> Vec<f64> {
    let period = period.max(1);

    let (gains, losses): (Vec<f64>, Vec<f64>) = prices
        .windows(2)
        .map(|w| {
            let change = w[1] - w[0];
            (change.max(0.0), (-change).max(0.0))
        })
        .unzip();

    (0..gains.len())
        .map(|i| {
            if i + 1 < period {
                return NEUTRAL_RSI;
            }
            let window = i + 1 - period..=i;
            let avg_gain = gains[window.clone()].iter().sum::<f64>() / period as f64;
            let avg_loss = losses[window].iter().sum::<f64>() / period as f64;

            let rs = avg_gain / avg_loss.max(MIN_AVG_LOSS);
            let value = 100.0 - 100.0 / (1.0 + rs);
            if value.is_finite() {
                value
            } else {
                NEUTRAL_RSI
            }
        })
        .collect()
}
