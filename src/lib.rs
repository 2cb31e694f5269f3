//! Stockcast - technical-indicator forecasting and recommendation engine

pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

// Re-export commonly used types
pub use config::{Config, WatchlistEntry};
pub use error::{EngineError, Result};
pub use services::signals::{
    analyze_stock, analyze_stocks, generate_predictions, IndicatorSet, Predictor, SignalService,
};
pub use sources::{HistoricalSource, JsonFileSource};
pub use types::*;
