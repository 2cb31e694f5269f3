//! Exponential Moving Average (EMA) indicator.

use super::Indicator;

/// EMA (Exponential Moving Average) indicator.
///
/// Like SMA but gives more weight to recent prices. Seeded with the first
/// value rather than an initial SMA, so every index has an output.
#[derive(Debug, Clone, Copy)]
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Ema {
    type Output = Vec<f64>;

    fn name(&self) -> &str {
        match self.period {
            12 => "EMA (12)",
            26 => "EMA (26)",
            9 => "EMA (9)",
            _ => "EMA",
        }
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, values: &[f64]) -> Vec<f64> {
        ema(values, self.period)
    }
}

/// Exponential moving average seeded with the first value.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let multiplier = 2.0 / (period.max(1) as f64 + 1.0);
    let mut out = Vec::with_capacity(values.len());

    for &value in values {
        let next = match out.last() {
            Some(&prev) => value * multiplier + prev * (1.0 - multiplier),
            None => value,
        };
        out.push(next);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ema_seed_and_recursion() {
        let values = vec![10.0, 20.0, 30.0];
        let out = ema(&values, 3);
        // multiplier = 0.5
        assert_eq!(out[0], 10.0);
        assert!((out[1] - 15.0).abs() < 1e-12);
        assert!((out[2] - 22.5).abs() < 1e-12);
    }

    #[test]
    fn test_ema_constant_series() {
        let values = vec![42.0; 30];
        assert!(ema(&values, 12).iter().all(|v| (*v - 42.0).abs() < 1e-12));
    }

    #[test]
    fn test_ema_lags_rising_series() {
        let values: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let out = ema(&values, 12);
        assert_eq!(out.len(), values.len());
        assert!(out[39] < values[39]);
        assert!(out.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_ema_empty() {
        assert!(ema(&[], 12).is_empty());
        assert_eq!(Ema::new(26).name(), "EMA (26)");
    }
}
