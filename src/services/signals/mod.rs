//! Trading signals service module.
//!
//! Provides technical indicator calculations, the next-day predictor,
//! backtested prediction series and ranked buy/sell/hold recommendations.

pub mod backtest;
pub mod features;
pub mod indicators;
pub mod predictor;
pub mod recommendation;

pub use backtest::{
    calibrated_confidence, forecast_from, forecast_next_day, generate_predictions,
    DEFAULT_BACKTEST_DAYS,
};
pub use features::FeatureVector;
pub use indicators::IndicatorSet;
pub use predictor::{FixedNoise, NoNoise, NoiseSource, Predictor, SeededNoise, UniformNoise};
pub use recommendation::{
    analyze_stock, analyze_stock_with_prediction, analyze_stocks, rank_recommendations,
};

use crate::config::Config;
use crate::error::Result;
use crate::types::{Bar, PerformanceSummary, Prediction, Recommendation, StockInput, StockReport};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Stateless entry point for every engine operation.
///
/// Cloning is cheap; clones share the noise source, so one service can be
/// handed to many concurrent per-symbol tasks.
#[derive(Debug, Clone)]
pub struct SignalService {
    predictor: Predictor,
    backtest_days: usize,
}

impl Default for SignalService {
    fn default() -> Self {
        Self::new(Predictor::default(), DEFAULT_BACKTEST_DAYS)
    }
}

impl SignalService {
    pub fn new(predictor: Predictor, backtest_days: usize) -> Self {
        Self {
            predictor,
            backtest_days,
        }
    }

    /// Build a service whose noise source follows the configuration.
    pub fn from_config(config: &Config) -> Self {
        let noise: Arc<dyn NoiseSource> = if config.disable_noise {
            info!("Prediction noise disabled");
            Arc::new(NoNoise)
        } else if let Some(seed) = config.noise_seed {
            info!("Using seeded prediction noise ({})", seed);
            Arc::new(SeededNoise::new(seed))
        } else {
            Arc::new(UniformNoise)
        };
        Self::new(Predictor::new(noise), config.backtest_days)
    }

    pub fn predictor(&self) -> &Predictor {
        &self.predictor
    }

    pub fn backtest_days(&self) -> usize {
        self.backtest_days
    }

    /// Predicted close for the day after the last bar.
    pub fn predict_next_day(&self, bars: &[Bar]) -> f64 {
        self.predictor.predict_next_day(bars)
    }

    /// Backtested predictions over the configured window.
    pub fn generate_predictions(&self, bars: &[Bar]) -> Vec<Prediction> {
        generate_predictions(&self.predictor, bars, self.backtest_days)
    }

    /// Backtested predictions over an explicit window.
    pub fn generate_predictions_for(&self, bars: &[Bar], days: usize) -> Vec<Prediction> {
        generate_predictions(&self.predictor, bars, days)
    }

    /// Dated forecast for the next trading day.
    pub fn forecast(&self, bars: &[Bar]) -> Option<Prediction> {
        forecast_next_day(&self.predictor, bars, self.backtest_days)
    }

    /// Recommendation for one stock.
    pub fn recommend(&self, symbol: &str, name: &str, bars: &[Bar]) -> Recommendation {
        analyze_stock(&self.predictor, symbol, name, bars)
    }

    /// Ranked recommendations, computed sequentially.
    pub fn analyze_stocks(&self, inputs: &[StockInput]) -> Vec<Recommendation> {
        analyze_stocks(&self.predictor, inputs)
    }

    /// Ranked recommendations, one blocking task per stock.
    ///
    /// Results are put back in input order before ranking, so the output
    /// matches [`SignalService::analyze_stocks`] regardless of completion order.
    pub async fn analyze_stocks_concurrent(
        &self,
        inputs: Vec<StockInput>,
    ) -> Result<Vec<Recommendation>> {
        let mut tasks = JoinSet::new();
        for (index, input) in inputs.into_iter().enumerate() {
            let service = self.clone();
            tasks.spawn_blocking(move || {
                (
                    index,
                    service.recommend(&input.symbol, &input.name, &input.bars),
                )
            });
        }

        let mut indexed = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            indexed.push(joined?);
        }
        indexed.sort_by_key(|(index, _)| *index);

        let mut recommendations: Vec<Recommendation> =
            indexed.into_iter().map(|(_, rec)| rec).collect();
        rank_recommendations(&mut recommendations);
        debug!("Ranked {} recommendations concurrently", recommendations.len());
        Ok(recommendations)
    }

    /// Forecast, backtest, summary and recommendation for one stock.
    ///
    /// The next-day prediction is drawn once and shared by the forecast and
    /// the recommendation.
    pub fn report(&self, input: &StockInput) -> StockReport {
        let predictions = self.generate_predictions(&input.bars);
        let summary = PerformanceSummary::from_predictions(&predictions);
        let predicted = self.predictor.predict_next_day(&input.bars);

        StockReport {
            symbol: input.symbol.clone(),
            name: input.name.clone(),
            forecast: forecast_from(&input.bars, &predictions, predicted),
            summary,
            recommendation: analyze_stock_with_prediction(
                &input.symbol,
                &input.name,
                &input.bars,
                predicted,
            ),
            predictions,
        }
    }

    /// Reports for every stock, one blocking task per stock, in input order.
    pub async fn reports_concurrent(&self, inputs: Vec<StockInput>) -> Result<Vec<StockReport>> {
        let mut tasks = JoinSet::new();
        for (index, input) in inputs.into_iter().enumerate() {
            let service = self.clone();
            tasks.spawn_blocking(move || (index, service.report(&input)));
        }

        let mut indexed = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            indexed.push(joined?);
        }
        indexed.sort_by_key(|(index, _)| *index);

        debug!("Built {} reports concurrently", indexed.len());
        Ok(indexed.into_iter().map(|(_, report)| report).collect())
    }
}

/// Ranked recommendations taken from already built reports.
pub fn ranked_from_reports(reports: &[StockReport]) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = reports
        .iter()
        .map(|report| report.recommendation.clone())
        .collect();
    rank_recommendations(&mut recommendations);
    recommendations
}
