//! Bollinger Bands indicator.

use super::sma::sma;
use super::Indicator;
use serde::Serialize;

/// Bollinger Bands indicator.
///
/// Consists of:
/// - Middle band: SMA(20)
/// - Upper band: SMA + 2 * StdDev
/// - Lower band: SMA - 2 * StdDev
///
/// Before a full window exists all three bands equal the price.
#[derive(Debug, Clone, Copy)]
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        Self {
            period,
            std_dev_multiplier,
        }
    }

    /// Population standard deviation around `mean`.
    fn std_dev(values: &[f64], mean: f64) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let variance: f64 =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        variance.sqrt()
    }
}

/// Upper, middle and lower bands, each aligned with the input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BollingerOutput {
    pub upper: Vec<f64>,
    pub middle: Vec<f64>,
    pub lower: Vec<f64>,
}

impl Indicator for BollingerBands {
    type Output = BollingerOutput;

    fn name(&self) -> &str {
        "Bollinger Bands"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, values: &[f64]) -> BollingerOutput {
        let period = self.period.max(1);
        let middle = sma(values, period);
        let mut upper = Vec::with_capacity(values.len());
        let mut lower = Vec::with_capacity(values.len());

        for (i, &mean) in middle.iter().enumerate() {
            if i + 1 < period {
                upper.push(values[i]);
                lower.push(values[i]);
                continue;
            }
            let std_dev = Self::std_dev(&values[i + 1 - period..=i], mean);
            upper.push(mean + self.std_dev_multiplier * std_dev);
            lower.push(mean - self.std_dev_multiplier * std_dev);
        }

        BollingerOutput {
            upper,
            middle,
            lower,
        }
    }
}

/// Bollinger Bands over `values`.
pub fn bollinger_bands(values: &[f64], period: usize, std_dev: f64) -> BollingerOutput {
    BollingerBands::new(period, std_dev).calculate(values)
}
