//! Historical bar sources.

pub mod json_file;

pub use json_file::JsonFileSource;

use crate::error::Result;
use crate::types::Bar;

/// Anything that can supply daily bars for a symbol.
pub trait HistoricalSource: Send + Sync {
    /// Source name for logging.
    fn name(&self) -> &str;

    /// Bars for `symbol`, ascending by date.
    fn load_bars(&self, symbol: &str) -> Result<Vec<Bar>>;
}
