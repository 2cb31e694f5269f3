//! Technical indicator implementations.
//!
//! Every indicator is a pure function over close prices. Outputs are aligned
//! with their input and never contain NaN for finite input; warm-up indices
//! carry passthrough or neutral values instead of being dropped.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use bollinger::{bollinger_bands, BollingerBands, BollingerOutput};
pub use ema::{ema, Ema};
pub use macd::{macd, Macd, MacdOutput};
pub use rsi::{rsi, Rsi, NEUTRAL_RSI};
pub use sma::{sma, Sma};

use serde::Serialize;
use tracing::trace;

/// Trait for implementing technical indicators over a close-price series.
pub trait Indicator {
    /// Computed series (or bundle of series).
    type Output;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Number of points needed before the output stops being warm-up filler.
    fn min_periods(&self) -> usize;

    /// Calculate the indicator over the whole series.
    fn calculate(&self, values: &[f64]) -> Self::Output;
}

/// All indicators the engine uses, aligned index-for-index with the closes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSet {
    pub sma20: Vec<f64>,
    pub sma50: Vec<f64>,
    pub ema12: Vec<f64>,
    pub ema26: Vec<f64>,
    /// Price-aligned RSI(14): index 0 is neutral, index i uses the change into bar i.
    pub rsi: Vec<f64>,
    pub macd: Vec<f64>,
    pub macd_signal: Vec<f64>,
    pub macd_histogram: Vec<f64>,
    pub bollinger_upper: Vec<f64>,
    pub bollinger_middle: Vec<f64>,
    pub bollinger_lower: Vec<f64>,
}

impl IndicatorSet {
    /// Compute every indicator over `closes`.
    pub fn compute(closes: &[f64]) -> Self {
        let sma20 = Sma::new(20);
        let sma50 = Sma::new(50);
        let ema12 = Ema::new(12);
        let ema26 = Ema::new(26);
        let rsi14 = Rsi::default();
        let macd = Macd::default();
        let bands = BollingerBands::default();

        for (name, min) in [
            (sma50.name(), sma50.min_periods()),
            (rsi14.name(), rsi14.min_periods()),
            (macd.name(), macd.min_periods()),
            (bands.name(), bands.min_periods()),
        ] {
            if closes.len() < min {
                trace!("{} still warming up ({} of {} points)", name, closes.len(), min);
            }
        }

        let macd_out = macd.calculate(closes);
        let bands_out = bands.calculate(closes);

        Self {
            sma20: sma20.calculate(closes),
            sma50: sma50.calculate(closes),
            ema12: ema12.calculate(closes),
            ema26: ema26.calculate(closes),
            rsi: price_aligned_rsi(&rsi14.calculate(closes), closes.len()),
            macd: macd_out.macd,
            macd_signal: macd_out.signal,
            macd_histogram: macd_out.histogram,
            bollinger_upper: bands_out.upper,
            bollinger_middle: bands_out.middle,
            bollinger_lower: bands_out.lower,
        }
    }

    /// Number of aligned points.
    pub fn len(&self) -> usize {
        self.sma20.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sma20.is_empty()
    }
}

/// Shift the gains-aligned RSI onto price indices by prepending a neutral value.
fn price_aligned_rsi(raw: &[f64], price_len: usize) -> Vec<f64> {
    if price_len == 0 {
        return Vec::new();
    }
    let mut aligned = Vec::with_capacity(price_len);
    aligned.push(NEUTRAL_RSI);
    aligned.extend_from_slice(raw);
    aligned
}
