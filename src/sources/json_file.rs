//! JSON file bar source.
//!
//! Reads `<dir>/<SYMBOL>.json`, holding either a bare array of bars or an
//! object of the form `{ "symbol": "AAPL", "bars": [...] }`.

use super::HistoricalSource;
use crate::error::{EngineError, Result};
use crate::types::{Bar, PriceSeries};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BarFile {
    Bars(Vec<Bar>),
    Document {
        #[serde(default)]
        symbol: Option<String>,
        bars: Vec<Bar>,
    },
}

/// Reads per-symbol bar files from a directory.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    dir: PathBuf,
}

impl JsonFileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a symbol.
    fn get_path(&self, symbol: &str) -> PathBuf {
        let safe_symbol = symbol.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "_");
        self.dir.join(format!("{}.json", safe_symbol.to_uppercase()))
    }
}

impl HistoricalSource for JsonFileSource {
    fn name(&self) -> &str {
        "json_file"
    }

    fn load_bars(&self, symbol: &str) -> Result<Vec<Bar>> {
        let path = self.get_path(symbol);

        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(EngineError::DataNotFound(symbol.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let bars = match serde_json::from_str::<BarFile>(&content)? {
            BarFile::Bars(bars) => bars,
            BarFile::Document {
                symbol: file_symbol,
                bars,
            } => {
                if let Some(file_symbol) = file_symbol.filter(|s| !s.eq_ignore_ascii_case(symbol)) {
                    warn!(
                        "{} declares symbol {}, expected {}",
                        path.display(),
                        file_symbol,
                        symbol
                    );
                }
                bars
            }
        };

        let series = PriceSeries::new(bars)?;
        debug!("Loaded {} bars for {} from {}", series.len(), symbol, path.display());
        Ok(series.into_bars())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "stockcast_json_{}_{}",
            name,
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    const BARS: &str = r#"[
        {"date":"2024-01-02","open":10,"high":11,"low":9,"close":10.5,"volume":1000},
        {"date":"2024-01-03","open":10.5,"high":12,"low":10,"close":11.5,"volume":1200}
    ]"#;

    #[test]
    fn test_load_bare_array() {
        let dir = temp_dir("array");
        fs::write(dir.join("AAPL.json"), BARS).unwrap();

        let source = JsonFileSource::new(&dir);
        let bars = source.load_bars("aapl").unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].close, 11.5);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_load_document() {
        let dir = temp_dir("document");
        let doc = format!(r#"{{"symbol":"MSFT","bars":{}}}"#, BARS);
        fs::write(dir.join("MSFT.json"), doc).unwrap();

        let bars = JsonFileSource::new(&dir).load_bars("MSFT").unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].volume, 1000.0);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_missing_file_is_data_not_found() {
        let dir = temp_dir("missing");
        let err = JsonFileSource::new(&dir).load_bars("NOPE").unwrap_err();
        assert!(matches!(err, EngineError::DataNotFound(ref s) if s == "NOPE"));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_unordered_file_is_rejected() {
        let dir = temp_dir("unordered");
        let json = r#"[
            {"date":"2024-01-03","open":1,"high":1,"low":1,"close":1},
            {"date":"2024-01-02","open":1,"high":1,"low":1,"close":1}
        ]"#;
        fs::write(dir.join("BAD.json"), json).unwrap();

        let err = JsonFileSource::new(&dir).load_bars("BAD").unwrap_err();
        assert!(matches!(err, EngineError::UnorderedSeries { .. }));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_malformed_file_is_json_error() {
        let dir = temp_dir("malformed");
        fs::write(dir.join("BAD.json"), "{not json").unwrap();

        let err = JsonFileSource::new(&dir).load_bars("BAD").unwrap_err();
        assert!(matches!(err, EngineError::Json(_)));
        fs::remove_dir_all(dir).ok();
    }
}
