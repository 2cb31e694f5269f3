use super::Bar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Maximum confidence any recommendation may carry.
pub const MAX_RECOMMENDATION_CONFIDENCE: f64 = 0.95;

/// Upper bound for BUY confidence before the global cap.
const BUY_CONFIDENCE_CAP: f64 = 0.92;

/// Upper bound for SELL confidence before the global cap.
const SELL_CONFIDENCE_CAP: f64 = 0.88;

/// Score at or above which a stock is a BUY.
pub const BUY_SCORE_THRESHOLD: i32 = 5;

/// Score at or below which a stock is a SELL.
pub const SELL_SCORE_THRESHOLD: i32 = -4;

/// A next-day price prediction, either backtested (with an actual) or a
/// pure forecast (without one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    /// Trading day the prediction is for.
    pub date: NaiveDate,
    /// Realized close, if the day has already happened.
    pub actual: Option<f64>,
    /// Predicted close. Always positive.
    pub predicted: f64,
    /// Calibrated confidence in [0, 1].
    pub confidence: f64,
}

impl Prediction {
    /// Relative error |actual - predicted| / actual, if an actual is known.
    pub fn relative_error(&self) -> Option<f64> {
        self.actual
            .filter(|a| *a > 0.0)
            .map(|a| (a - self.predicted).abs() / a)
    }
}

/// Aggregate accuracy of a prediction series, as shown next to the chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummary {
    /// Number of predictions with a known actual.
    pub count: usize,
    /// mean(1 - |actual - predicted| / actual) * 100.
    pub accuracy_pct: f64,
    /// mean(|actual - predicted| / actual) * 100.
    pub mean_abs_pct_error: f64,
}

impl PerformanceSummary {
    /// Summarize a prediction series. Entries without an actual are ignored.
    pub fn from_predictions(predictions: &[Prediction]) -> Self {
        let errors: Vec<f64> = predictions
            .iter()
            .filter_map(Prediction::relative_error)
            .collect();

        if errors.is_empty() {
            return Self {
                count: 0,
                accuracy_pct: 0.0,
                mean_abs_pct_error: 0.0,
            };
        }

        let mean_error = errors.iter().sum::<f64>() / errors.len() as f64;
        Self {
            count: errors.len(),
            accuracy_pct: (1.0 - mean_error) * 100.0,
            mean_abs_pct_error: mean_error * 100.0,
        }
    }
}

/// Simple recommendation: Buy, Sell, or Hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecommendationAction {
    Buy,
    Sell,
    Hold,
}

impl RecommendationAction {
    /// Get display label.
    pub fn label(&self) -> &'static str {
        match self {
            RecommendationAction::Buy => "BUY",
            RecommendationAction::Sell => "SELL",
            RecommendationAction::Hold => "HOLD",
        }
    }

    /// Ranking priority; higher sorts first.
    pub fn priority(&self) -> u8 {
        match self {
            RecommendationAction::Buy => 3,
            RecommendationAction::Hold => 2,
            RecommendationAction::Sell => 1,
        }
    }
}

/// Investment recommendation for one stock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub symbol: String,
    pub name: String,
    /// The action: BUY, SELL, or HOLD.
    #[serde(rename = "recommendation")]
    pub action: RecommendationAction,
    /// Next-day target price. Always positive.
    pub target_price: f64,
    /// Confidence in [0, 0.95].
    pub confidence: f64,
    /// At most two signal descriptions, joined.
    pub reason: String,
    /// Integer signal score that produced the action.
    pub score: i32,
    /// Last close used for the analysis.
    pub current_price: f64,
    /// Predicted next-day change in percent.
    pub predicted_change_pct: f64,
    /// Every triggered signal description, in evaluation order.
    pub signals: Vec<String>,
}

impl Recommendation {
    /// Create a recommendation from an accumulated signal score.
    pub fn from_score(
        symbol: String,
        name: String,
        score: i32,
        current_price: f64,
        predicted_price: f64,
        signals: Vec<String>,
    ) -> Self {
        let magnitude = score.unsigned_abs() as f64;
        let (action, confidence) = if score >= BUY_SCORE_THRESHOLD {
            (
                RecommendationAction::Buy,
                (0.75 + magnitude * 0.03).min(BUY_CONFIDENCE_CAP),
            )
        } else if score <= SELL_SCORE_THRESHOLD {
            (
                RecommendationAction::Sell,
                (0.70 + magnitude * 0.03).min(SELL_CONFIDENCE_CAP),
            )
        } else {
            (RecommendationAction::Hold, 0.70 + magnitude * 0.02)
        };

        let reason = if signals.is_empty() {
            "Mixed technical signals".to_string()
        } else {
            signals
                .iter()
                .take(2)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };

        let predicted_change_pct = if current_price > 0.0 {
            (predicted_price - current_price) / current_price * 100.0
        } else {
            0.0
        };

        Self {
            symbol,
            name,
            action,
            target_price: predicted_price.max(1.0),
            confidence: confidence.min(MAX_RECOMMENDATION_CONFIDENCE),
            reason,
            score,
            current_price,
            predicted_change_pct,
            signals,
        }
    }

    /// Degenerate HOLD used when the data cannot support an analysis.
    pub fn fallback_hold(symbol: String, name: String, target_price: f64, reason: &str) -> Self {
        Self {
            symbol,
            name,
            action: RecommendationAction::Hold,
            target_price,
            confidence: 0.5,
            reason: reason.to_string(),
            score: 0,
            current_price: target_price,
            predicted_change_pct: 0.0,
            signals: Vec::new(),
        }
    }
}

/// Symbol, display name and history handed to the recommendation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockInput {
    pub symbol: String,
    pub name: String,
    pub bars: Vec<Bar>,
}

impl StockInput {
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            bars,
        }
    }
}

/// Everything the engine produces for one stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockReport {
    pub symbol: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast: Option<Prediction>,
    pub predictions: Vec<Prediction>,
    pub summary: PerformanceSummary,
    pub recommendation: Recommendation,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    // =========================================================================
    // Recommendation Tests
    // =========================================================================

    #[test]
    fn test_from_score_buy() {
        let rec = Recommendation::from_score(
            "AAPL".to_string(),
            "Apple".to_string(),
            6,
            100.0,
            103.0,
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
        );
        assert_eq!(rec.action, RecommendationAction::Buy);
        // 0.75 + 6 * 0.03 = 0.93, capped at 0.92
        assert!((rec.confidence - 0.92).abs() < 1e-12);
        assert_eq!(rec.reason, "a, b");
        assert!((rec.predicted_change_pct - 3.0).abs() < 1e-9);
        assert_eq!(rec.signals.len(), 3);
    }

    #[test]
    fn test_from_score_sell() {
        let rec = Recommendation::from_score(
            "X".to_string(),
            "X Corp".to_string(),
            -4,
            50.0,
            48.0,
            vec!["down".to_string()],
        );
        assert_eq!(rec.action, RecommendationAction::Sell);
        assert!((rec.confidence - 0.82).abs() < 1e-9);
        assert_eq!(rec.reason, "down");
    }

    #[test]
    fn test_from_score_sell_confidence_cap() {
        let rec = Recommendation::from_score("X".into(), "X".into(), -12, 50.0, 48.0, vec![]);
        assert_eq!(rec.action, RecommendationAction::Sell);
        assert!((rec.confidence - 0.88).abs() < 1e-12);
    }

    #[test]
    fn test_from_score_hold_and_mixed_reason() {
        let rec = Recommendation::from_score("X".into(), "X".into(), -3, 50.0, 50.0, vec![]);
        assert_eq!(rec.action, RecommendationAction::Hold);
        assert!((rec.confidence - 0.76).abs() < 1e-9);
        assert_eq!(rec.reason, "Mixed technical signals");
    }

    #[test]
    fn test_from_score_target_floor() {
        let rec = Recommendation::from_score("P".into(), "Penny".into(), 0, 0.5, 0.4, vec![]);
        assert_eq!(rec.target_price, 1.0);
    }

    #[test]
    fn test_fallback_hold() {
        let rec = Recommendation::fallback_hold(
            "X".into(),
            "X".into(),
            100.0,
            "Insufficient data for analysis",
        );
        assert_eq!(rec.action, RecommendationAction::Hold);
        assert_eq!(rec.confidence, 0.5);
        assert_eq!(rec.target_price, 100.0);
    }

    #[test]
    fn test_action_priority_and_serialization() {
        assert!(RecommendationAction::Buy.priority() > RecommendationAction::Hold.priority());
        assert!(RecommendationAction::Hold.priority() > RecommendationAction::Sell.priority());
        assert_eq!(serde_json::to_string(&RecommendationAction::Buy).unwrap(), "\"BUY\"");
        assert_eq!(RecommendationAction::Sell.label(), "SELL");
    }

    #[test]
    fn test_recommendation_json_field_names() {
        let rec = Recommendation::from_score("AAPL".into(), "Apple".into(), 5, 10.0, 10.2, vec![]);
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["recommendation"], "BUY");
        assert!(json.get("targetPrice").is_some());
        assert!(json.get("predictedChangePct").is_some());
    }

    // =========================================================================
    // Prediction / Summary Tests
    // =========================================================================

    #[test]
    fn test_relative_error() {
        let p = Prediction {
            date: date(),
            actual: Some(100.0),
            predicted: 98.0,
            confidence: 0.8,
        };
        assert!((p.relative_error().unwrap() - 0.02).abs() < 1e-12);

        let forecast = Prediction { actual: None, ..p };
        assert!(forecast.relative_error().is_none());
    }

    #[test]
    fn test_performance_summary() {
        let preds = vec![
            Prediction {
                date: date(),
                actual: Some(100.0),
                predicted: 99.0,
                confidence: 0.9,
            },
            Prediction {
                date: date(),
                actual: Some(50.0),
                predicted: 51.5,
                confidence: 0.9,
            },
            Prediction {
                date: date(),
                actual: None,
                predicted: 51.0,
                confidence: 0.9,
            },
        ];
        let summary = PerformanceSummary::from_predictions(&preds);
        assert_eq!(summary.count, 2);
        // errors 1% and 3%
        assert!((summary.mean_abs_pct_error - 2.0).abs() < 1e-9);
        assert!((summary.accuracy_pct - 98.0).abs() < 1e-9);
    }

    #[test]
    fn test_performance_summary_empty() {
        let summary = PerformanceSummary::from_predictions(&[]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.accuracy_pct, 0.0);
    }
}
