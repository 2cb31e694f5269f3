//! MACD (Moving Average Convergence Divergence) indicator.

use super::ema::ema;
use super::Indicator;
use serde::Serialize;

/// MACD indicator.
///
/// Shows the relationship between two EMAs:
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9) of MACD Line
/// - Histogram = MACD Line - Signal Line
///
/// Buy signal: MACD above signal line
/// Sell signal: MACD below signal line
#[derive(Debug, Clone, Copy)]
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Default for Macd {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

/// MACD line, signal line and histogram, each aligned with the input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MacdOutput {
    pub macd: Vec<f64>,
    pub signal: Vec<f64>,
    pub histogram: Vec<f64>,
}

impl MacdOutput {
    /// Whether the MACD line sits strictly above the signal line at the last index.
    pub fn is_bullish(&self) -> bool {
        match (self.macd.last(), self.signal.last()) {
            (Some(line), Some(signal)) => line > signal,
            _ => false,
        }
    }
}

impl Indicator for Macd {
    type Output = MacdOutput;

    fn name(&self) -> &str {
        "MACD"
    }

    fn min_periods(&self) -> usize {
        self.slow_period + self.signal_period
    }

    fn calculate(&self, values: &[f64]) -> MacdOutput {
        let fast = ema(values, self.fast_period);
        let slow = ema(values, self.slow_period);

        let macd_line: Vec<f64> = fast.iter().zip(&slow).map(|(f, s)| f - s).collect();
        let signal_line = ema(&macd_line, self.signal_period);
        let histogram = macd_line
            .iter()
            .zip(&signal_line)
            .map(|(m, s)| m - s)
            .collect();

        MacdOutput {
            macd: macd_line,
            signal: signal_line,
            histogram,
        }
    }
}

/// MACD(12, 26, 9) over `values`.
pub fn macd(values: &[f64]) -> MacdOutput {
    Macd::default().calculate(values)
}
