//! Backtested prediction series.
//!
//! Replays the predictor over the tail of a history, one bar at a time, using
//! only the bars before each target day. Confidence is a lagging estimate from
//! the errors of the previously emitted entries, not a statistical interval.

use super::predictor::{Predictor, MIN_HISTORY};
use crate::types::{Bar, Prediction};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::debug;

/// Default number of trailing days to backtest.
pub const DEFAULT_BACKTEST_DAYS: usize = 30;

/// Number of previous entries used to calibrate confidence.
const CONFIDENCE_WINDOW: usize = 10;

/// Error assumed before any entry has been emitted.
const DEFAULT_ERROR: f64 = 0.02;

const MIN_CONFIDENCE: f64 = 0.65;
const MAX_CONFIDENCE: f64 = 0.95;

/// Generate backtested predictions for the last `days` bars of `bars`.
///
/// Returns an empty series when fewer than 50 bars carry a valid close.
pub fn generate_predictions(predictor: &Predictor, bars: &[Bar], days: usize) -> Vec<Prediction> {
    let valid = bars.iter().filter(|b| b.has_valid_close()).count();
    if valid < MIN_HISTORY {
        debug!(
            "Skipping backtest: {} valid closes, {} required",
            valid, MIN_HISTORY
        );
        return Vec::new();
    }

    let start = MIN_HISTORY.max(bars.len().saturating_sub(days));
    let mut predictions: Vec<Prediction> = Vec::with_capacity(bars.len().saturating_sub(start));

    for i in start..bars.len() {
        let actual = bars[i].close;
        let predicted = predictor.predict_next_day(&bars[..i]);

        if !actual.is_finite() || actual <= 0.0 || !predicted.is_finite() || predicted <= 0.0 {
            continue;
        }

        predictions.push(Prediction {
            date: bars[i].date,
            actual: Some(actual),
            predicted,
            confidence: calibrated_confidence(&predictions),
        });
    }

    debug!(
        "Backtest produced {} predictions from {} bars (window {})",
        predictions.len(),
        bars.len(),
        days
    );

    predictions
}

/// Confidence from the mean relative error of the last ten entries.
pub fn calibrated_confidence(history: &[Prediction]) -> f64 {
    let recent = &history[history.len().saturating_sub(CONFIDENCE_WINDOW)..];
    let errors: Vec<f64> = recent.iter().filter_map(Prediction::relative_error).collect();

    let avg_error = if errors.is_empty() {
        DEFAULT_ERROR
    } else {
        errors.iter().sum::<f64>() / errors.len() as f64
    };

    (1.0 - avg_error * 8.0).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

/// Pure forecast for the trading day after the last bar.
///
/// The confidence reuses the calibration of the backtest over the same
/// history. Returns `None` for an empty history.
pub fn forecast_next_day(predictor: &Predictor, bars: &[Bar], days: usize) -> Option<Prediction> {
    let backtest = generate_predictions(predictor, bars, days);
    forecast_from(bars, &backtest, predictor.predict_next_day(bars))
}

/// Forecast entry for an already drawn prediction and its backtest series.
pub fn forecast_from(bars: &[Bar], backtest: &[Prediction], predicted: f64) -> Option<Prediction> {
    let last = bars.last()?;
    Some(Prediction {
        date: next_trading_day(last.date),
        actual: None,
        predicted,
        confidence: calibrated_confidence(backtest),
    })
}

/// Next weekday after `date`.
pub fn next_trading_day(date: NaiveDate) -> NaiveDate {
    let mut next = date + Duration::days(1);
    while matches!(next.weekday(), Weekday::Sat | Weekday::Sun) {
        next += Duration::days(1);
    }
    next
}
