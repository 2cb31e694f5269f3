//! Next-day price predictor.
//!
//! A fixed linear model over [`FeatureVector`], squashed through `tanh`,
//! perturbed by a small multiplicative noise term and clamped to a hard band
//! around the current price.

use super::features::FeatureVector;
use super::indicators::IndicatorSet;
use crate::types::Bar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use tracing::{debug, trace};

/// Bars required before the model runs at all.
pub const MIN_HISTORY: usize = 50;

/// Price returned when no usable close exists.
pub const DEFAULT_PRICE: f64 = 100.0;

/// Maximum modeled change before noise (fraction of price).
const MAX_MODEL_CHANGE: f64 = 0.04;

/// Half-width of the uniform multiplicative noise.
pub const NOISE_AMPLITUDE: f64 = 0.004;

/// Hard clamp on the final prediction (fraction of price).
pub const MAX_PREDICTED_MOVE: f64 = 0.08;

/// Model weights, in [`FeatureVector::iter`] order.
const WEIGHTS: [(&str, f64); 9] = [
    ("priceToSMA20", 0.18),
    ("priceToSMA50", 0.15),
    ("smaRatio", 0.20),
    ("rsiNorm", -0.10),
    ("macdSignal", 0.12),
    ("bollingerPosition", -0.08),
    ("volumeRatio", 0.08),
    ("momentum", 0.28),
    ("volatility", -0.09),
];

/// Source of the multiplicative perturbation applied to predictions.
pub trait NoiseSource: Send + Sync {
    /// Draw a perturbation in `[-amplitude, amplitude]`.
    fn perturbation(&self, amplitude: f64) -> f64;
}

/// Uniform noise from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformNoise;

impl NoiseSource for UniformNoise {
    fn perturbation(&self, amplitude: f64) -> f64 {
        if amplitude <= 0.0 {
            return 0.0;
        }
        rand::thread_rng().gen_range(-amplitude..=amplitude)
    }
}

/// Reproducible uniform noise from a seeded RNG.
#[derive(Debug)]
pub struct SeededNoise {
    rng: Mutex<StdRng>,
}

impl SeededNoise {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl NoiseSource for SeededNoise {
    fn perturbation(&self, amplitude: f64) -> f64 {
        if amplitude <= 0.0 {
            return 0.0;
        }
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        rng.gen_range(-amplitude..=amplitude)
    }
}

/// Constant perturbation, clamped to the amplitude.
#[derive(Debug, Clone, Copy)]
pub struct FixedNoise(pub f64);

impl NoiseSource for FixedNoise {
    fn perturbation(&self, amplitude: f64) -> f64 {
        self.0.clamp(-amplitude.abs(), amplitude.abs())
    }
}

/// No perturbation; makes the predictor a pure function.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNoise;

impl NoiseSource for NoNoise {
    fn perturbation(&self, _amplitude: f64) -> f64 {
        0.0
    }
}

/// Next-day close predictor.
#[derive(Clone)]
pub struct Predictor {
    noise: Arc<dyn NoiseSource>,
}

impl Default for Predictor {
    fn default() -> Self {
        Self::new(Arc::new(UniformNoise))
    }
}

impl std::fmt::Debug for Predictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Predictor").finish_non_exhaustive()
    }
}

impl Predictor {
    pub fn new(noise: Arc<dyn NoiseSource>) -> Self {
        Self { noise }
    }

    /// Predictor without noise.
    pub fn deterministic() -> Self {
        Self::new(Arc::new(NoNoise))
    }

    /// Predict the close of the bar following `bars`.
    ///
    /// Short histories return the last close unchanged; otherwise the result
    /// lies within ±8% of the last valid close.
    pub fn predict_next_day(&self, bars: &[Bar]) -> f64 {
        if bars.len() < MIN_HISTORY {
            return fallback_price(bars);
        }

        let valid: Vec<&Bar> = bars.iter().filter(|b| b.has_valid_close()).collect();
        if valid.is_empty() {
            return fallback_price(bars);
        }

        let closes: Vec<f64> = valid.iter().map(|b| b.close).collect();
        let volumes: Vec<f64> = valid.iter().map(|b| b.volume).collect();
        self.predict_from_series(&closes, &volumes)
    }

    /// Run the model over already validated closes and aligned volumes.
    pub fn predict_from_series(&self, closes: &[f64], volumes: &[f64]) -> f64 {
        let Some(&current) = closes.last() else {
            return DEFAULT_PRICE;
        };

        let indicators = IndicatorSet::compute(closes);
        let Some(features) = FeatureVector::extract(closes, volumes, &indicators, closes.len() - 1)
        else {
            return current;
        };

        let change = modeled_change(&features);
        let noise = self.noise.perturbation(NOISE_AMPLITUDE);
        let predicted = current * (1.0 + change) * (1.0 + noise);

        let low = current * (1.0 - MAX_PREDICTED_MOVE);
        let high = current * (1.0 + MAX_PREDICTED_MOVE);
        let bounded = if predicted.is_finite() {
            predicted.clamp(low, high)
        } else {
            current
        };

        debug!(
            "Predicted {:.4} from {:.4} (model {:+.3}%, noise {:+.3}%)",
            bounded,
            current,
            change * 100.0,
            noise * 100.0
        );

        bounded
    }
}

/// Fractional change produced by the linear model, before noise.
pub fn modeled_change(features: &FeatureVector) -> f64 {
    let raw: f64 = features
        .iter()
        .zip(WEIGHTS.iter())
        .filter(|((_, value), _)| value.is_finite())
        .map(|((name, value), (_, weight))| {
            trace!("feature {} = {:.5}", name, value);
            value * weight
        })
        .sum();

    raw.tanh() * MAX_MODEL_CHANGE
}

/// Last close if usable, else [`DEFAULT_PRICE`].
pub fn fallback_price(bars: &[Bar]) -> f64 {
    bars.last()
        .filter(|b| b.has_valid_close())
        .map(|b| b.close)
        .unwrap_or(DEFAULT_PRICE)
}
