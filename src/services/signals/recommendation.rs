//! Buy/sell/hold scoring and ranking.
//!
//! Each stock is scored from five independent signal groups. Threshold groups
//! are ordered guard clauses, so at most one branch of a group fires.

use super::features::{momentum, MOMENTUM_LOOKBACK};
use super::indicators::IndicatorSet;
use super::predictor::{fallback_price, Predictor, MIN_HISTORY};
use crate::types::{closes, volumes, Bar, Recommendation, StockInput};
use std::cmp::Ordering;
use tracing::{debug, info};

/// A triggered signal: score contribution and description.
type Triggered = (i32, String);

/// Score and recommend a single stock.
pub fn analyze_stock(
    predictor: &Predictor,
    symbol: &str,
    name: &str,
    bars: &[Bar],
) -> Recommendation {
    if bars.len() < MIN_HISTORY || !bars.iter().all(Bar::has_valid_close) {
        return analyze_stock_with_prediction(symbol, name, bars, fallback_price(bars));
    }
    let predicted = predictor.predict_from_series(&closes(bars), &volumes(bars));
    analyze_stock_with_prediction(symbol, name, bars, predicted)
}

/// Score a stock against an already drawn next-day prediction.
///
/// Lets callers that also publish the forecast reuse one noisy draw, so the
/// target price and the forecast agree.
pub fn analyze_stock_with_prediction(
    symbol: &str,
    name: &str,
    bars: &[Bar],
    predicted: f64,
) -> Recommendation {
    if bars.len() < MIN_HISTORY {
        debug!("{}: {} bars, not enough to analyze", symbol, bars.len());
        return Recommendation::fallback_hold(
            symbol.to_string(),
            name.to_string(),
            fallback_price(bars),
            "Insufficient data for analysis",
        );
    }
    if !bars.iter().all(Bar::has_valid_close) {
        debug!("{}: rejecting non-positive or non-finite closes", symbol);
        return Recommendation::fallback_hold(
            symbol.to_string(),
            name.to_string(),
            fallback_price(bars),
            "Invalid price data",
        );
    }

    let prices = closes(bars);
    let indicators = IndicatorSet::compute(&prices);

    let last = prices.len() - 1;
    let current = prices[last];
    let change_pct = (predicted - current) / current * 100.0;

    let triggered: Vec<Triggered> = [
        prediction_signal(change_pct),
        trend_signal(current, indicators.sma20[last], indicators.sma50[last]),
        rsi_signal(indicators.rsi[last]),
        Some(macd_signal(indicators.macd[last], indicators.macd_signal[last])),
        momentum(&prices, MOMENTUM_LOOKBACK).and_then(momentum_signal),
    ]
    .into_iter()
    .flatten()
    .collect();

    let score: i32 = triggered.iter().map(|(points, _)| points).sum();
    let signals: Vec<String> = triggered.into_iter().map(|(_, text)| text).collect();

    let recommendation = Recommendation::from_score(
        symbol.to_string(),
        name.to_string(),
        score,
        current,
        predicted,
        signals,
    );

    debug!(
        "{}: score {} -> {} ({:.0}% confidence)",
        symbol,
        score,
        recommendation.action.label(),
        recommendation.confidence * 100.0
    );

    recommendation
}

/// Analyze every stock and return the ranked list.
pub fn analyze_stocks(predictor: &Predictor, inputs: &[StockInput]) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = inputs
        .iter()
        .map(|input| analyze_stock(predictor, &input.symbol, &input.name, &input.bars))
        .collect();

    rank_recommendations(&mut recommendations);
    info!("Ranked {} recommendations", recommendations.len());
    recommendations
}

/// Sort by action priority (BUY, HOLD, SELL), then confidence, both descending.
///
/// The sort is stable, so equal entries keep their input order.
pub fn rank_recommendations(recommendations: &mut [Recommendation]) {
    recommendations.sort_by(compare_rank);
}

fn compare_rank(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.action
        .priority()
        .cmp(&a.action.priority())
        .then_with(|| b.confidence.total_cmp(&a.confidence))
}

fn prediction_signal(change_pct: f64) -> Option<Triggered> {
    if change_pct > 2.5 {
        Some((4, format!("Forecast shows strong upside ({:+.1}%)", change_pct)))
    } else if change_pct > 1.0 {
        Some((2, format!("Forecast shows upside ({:+.1}%)", change_pct)))
    } else if change_pct < -2.5 {
        Some((-4, format!("Forecast shows strong downside ({:+.1}%)", change_pct)))
    } else if change_pct < -1.0 {
        Some((-2, format!("Forecast shows downside ({:+.1}%)", change_pct)))
    } else {
        None
    }
}

fn trend_signal(price: f64, sma20: f64, sma50: f64) -> Option<Triggered> {
    if sma20 > sma50 && price > sma20 {
        Some((3, "Bullish trend (price above SMA20 above SMA50)".to_string()))
    } else if sma20 < sma50 && price < sma20 {
        Some((-3, "Bearish trend (price below SMA20 below SMA50)".to_string()))
    } else {
        None
    }
}

fn rsi_signal(rsi: f64) -> Option<Triggered> {
    if rsi < 30.0 {
        Some((2, format!("Oversold (RSI {:.0})", rsi)))
    } else if rsi > 70.0 {
        Some((-2, format!("Overbought (RSI {:.0})", rsi)))
    } else if (40.0..=60.0).contains(&rsi) {
        Some((1, format!("Neutral RSI ({:.0})", rsi)))
    } else {
        None
    }
}

fn macd_signal(line: f64, signal: f64) -> Triggered {
    if line > signal {
        (1, "MACD above signal line".to_string())
    } else {
        (-1, "MACD below signal line".to_string())
    }
}

fn momentum_signal(change: f64) -> Option<Triggered> {
    let pct = change * 100.0;
    if change > 0.08 {
        Some((2, format!("Strong upward momentum ({:+.1}%)", pct)))
    } else if change > 0.03 {
        Some((1, format!("Positive momentum ({:+.1}%)", pct)))
    } else if change < -0.08 {
        Some((-2, format!("Strong negative momentum ({:+.1}%)", pct)))
    } else if change < -0.03 {
        Some((-1, format!("Negative momentum ({:+.1}%)", pct)))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecommendationAction;
    use chrono::{Duration, NaiveDate};

    fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::flat(start + Duration::days(i as i64), c, 1_000_000.0))
            .collect()
    }

    fn rec(symbol: &str, action: RecommendationAction, confidence: f64) -> Recommendation {
        let mut r = Recommendation::fallback_hold(symbol.into(), symbol.into(), 10.0, "");
        r.action = action;
        r.confidence = confidence;
        r
    }

    // =========================================================================
    // Guard Clause Tests
    // =========================================================================

    #[test]
    fn test_prediction_signal_priority() {
        assert_eq!(prediction_signal(3.0).unwrap().0, 4);
        assert_eq!(prediction_signal(1.5).unwrap().0, 2);
        assert!(prediction_signal(1.0).is_none());
        assert!(prediction_signal(-1.0).is_none());
        assert_eq!(prediction_signal(-1.5).unwrap().0, -2);
        assert_eq!(prediction_signal(-3.0).unwrap().0, -4);
    }

    #[test]
    fn test_trend_signal() {
        assert_eq!(trend_signal(110.0, 105.0, 100.0).unwrap().0, 3);
        assert_eq!(trend_signal(90.0, 95.0, 100.0).unwrap().0, -3);
        // price between averages
        assert!(trend_signal(103.0, 105.0, 100.0).is_none());
    }

    #[test]
    fn test_rsi_signal_bands() {
        assert_eq!(rsi_signal(25.0).unwrap().0, 2);
        assert_eq!(rsi_signal(75.0).unwrap().0, -2);
        assert_eq!(rsi_signal(50.0).unwrap().0, 1);
        assert_eq!(rsi_signal(40.0).unwrap().0, 1);
        assert!(rsi_signal(35.0).is_none());
        assert!(rsi_signal(65.0).is_none());
    }

    #[test]
    fn test_macd_signal_always_fires() {
        assert_eq!(macd_signal(1.0, 0.5).0, 1);
        assert_eq!(macd_signal(0.5, 0.5).0, -1);
    }

    #[test]
    fn test_momentum_signal_priority() {
        assert_eq!(momentum_signal(0.10).unwrap().0, 2);
        assert_eq!(momentum_signal(0.05).unwrap().0, 1);
        assert!(momentum_signal(0.01).is_none());
        assert_eq!(momentum_signal(-0.05).unwrap().0, -1);
        assert_eq!(momentum_signal(-0.10).unwrap().0, -2);
    }

    // =========================================================================
    // Analysis Tests
    // =========================================================================

    #[test]
    fn test_insufficient_data_hold() {
        let bars = bars_from_closes(&[10.0; 20]);
        let r = analyze_stock(&Predictor::default(), "ABC", "Abc Inc", &bars);
        assert_eq!(r.action, RecommendationAction::Hold);
        assert_eq!(r.confidence, 0.5);
        assert_eq!(r.target_price, 10.0);
        assert!(r.reason.contains("Insufficient"));
    }

    #[test]
    fn test_invalid_data_hold() {
        let mut closes = vec![10.0; 60];
        closes[30] = -1.0;
        let bars = bars_from_closes(&closes);
        let r = analyze_stock(&Predictor::default(), "ABC", "Abc Inc", &bars);
        assert_eq!(r.action, RecommendationAction::Hold);
        assert_eq!(r.confidence, 0.5);
        assert!(r.reason.contains("Invalid"));
    }

    #[test]
    fn test_empty_series_defaults_target() {
        let r = analyze_stock(&Predictor::default(), "NONE", "None", &[]);
        assert_eq!(r.target_price, 100.0);
    }

    #[test]
    fn test_rising_series_scores_buy() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let bars = bars_from_closes(&closes);
        let r = analyze_stock(&Predictor::deterministic(), "UP", "Up Corp", &bars);
        // forecast upside +2, bullish trend +3, overbought -2, MACD +1, momentum +1
        assert_eq!(r.score, 5);
        assert_eq!(r.action, RecommendationAction::Buy);
        assert!((r.confidence - 0.90).abs() < 1e-9);
        assert!(r.reason.starts_with("Forecast shows upside"));
        assert!(r.reason.contains("Bullish trend"));
        assert_eq!(r.signals.len(), 5);
    }

    #[test]
    fn test_falling_series_not_buy() {
        let closes: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
        let bars = bars_from_closes(&closes);
        let r = analyze_stock(&Predictor::deterministic(), "DN", "Down Corp", &bars);
        assert_ne!(r.action, RecommendationAction::Buy);
        assert!(r.signals.iter().any(|s| s.contains("Bearish")));
        assert!(r.signals.iter().any(|s| s.contains("Negative momentum")));
        assert!(r.reason.contains("Bearish"));
    }

    #[test]
    fn test_supplied_prediction_drives_target() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let bars = bars_from_closes(&closes);

        let r = analyze_stock_with_prediction("UP", "Up Corp", &bars, 170.0);
        assert_eq!(r.target_price, 170.0);
        assert!(r.signals[0].starts_with("Forecast shows strong upside"));

        let predicted = Predictor::deterministic().predict_next_day(&bars);
        assert_eq!(
            analyze_stock_with_prediction("UP", "Up Corp", &bars, predicted),
            analyze_stock(&Predictor::deterministic(), "UP", "Up Corp", &bars)
        );
    }

    #[test]
    fn test_supplied_prediction_ignored_for_short_history() {
        let bars = bars_from_closes(&[10.0; 20]);
        let r = analyze_stock_with_prediction("ABC", "Abc Inc", &bars, 12.0);
        assert_eq!(r.target_price, 10.0);
        assert_eq!(r.score, 0);
    }

    #[test]
    fn test_confidence_never_exceeds_cap() {
        let closes: Vec<f64> = (0..80).map(|i| 50.0 * 1.01_f64.powi(i)).collect();
        let r = analyze_stock(&Predictor::default(), "X", "X", &bars_from_closes(&closes));
        assert!(r.confidence <= 0.95);
        assert!(r.target_price >= 1.0);
    }

    // =========================================================================
    // Ranking Tests
    // =========================================================================

    #[test]
    fn test_rank_by_priority_then_confidence() {
        let mut list = vec![
            rec("S", RecommendationAction::Sell, 0.88),
            rec("H1", RecommendationAction::Hold, 0.70),
            rec("B1", RecommendationAction::Buy, 0.78),
            rec("H2", RecommendationAction::Hold, 0.76),
            rec("B2", RecommendationAction::Buy, 0.90),
        ];
        rank_recommendations(&mut list);
        let order: Vec<&str> = list.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(order, vec!["B2", "B1", "H2", "H1", "S"]);
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let mut list = vec![
            rec("A", RecommendationAction::Hold, 0.7),
            rec("B", RecommendationAction::Hold, 0.7),
        ];
        rank_recommendations(&mut list);
        assert_eq!(list[0].symbol, "A");
    }

    #[test]
    fn test_analyze_stocks_is_ranked() {
        let up: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let down: Vec<f64> = (0..60).map(|i| 200.0 - i as f64).collect();
        let inputs = vec![
            StockInput::new("DN", "Down", bars_from_closes(&down)),
            StockInput::new("SHORT", "Short", bars_from_closes(&[5.0; 3])),
            StockInput::new("UP", "Up", bars_from_closes(&up)),
        ];
        let ranked = analyze_stocks(&Predictor::deterministic(), &inputs);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].symbol, "UP");
        for pair in ranked.windows(2) {
            assert!(compare_rank(&pair[0], &pair[1]) != Ordering::Greater);
        }
    }
}
