use crate::error::{EngineError, Result};
use crate::services::signals::DEFAULT_BACKTEST_DAYS;
use std::env;
use std::path::PathBuf;
use tracing::warn;

/// Symbols analyzed when `WATCHLIST` is not set.
const DEFAULT_WATCHLIST: &[(&str, &str)] = &[
    ("AAPL", "Apple Inc."),
    ("MSFT", "Microsoft Corporation"),
    ("GOOGL", "Alphabet Inc."),
    ("AMZN", "Amazon.com, Inc."),
    ("NVDA", "NVIDIA Corporation"),
    ("META", "Meta Platforms, Inc."),
    ("TSLA", "Tesla, Inc."),
    ("JPM", "JPMorgan Chase & Co."),
];

/// One stock in the watchlist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchlistEntry {
    /// Ticker symbol.
    pub symbol: String,
    /// Display name.
    pub name: String,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding `<SYMBOL>.json` bar files.
    pub data_dir: PathBuf,
    /// Trailing days covered by the backtest.
    pub backtest_days: usize,
    /// Seed for reproducible prediction noise.
    pub noise_seed: Option<u64>,
    /// Turn prediction noise off entirely.
    pub disable_noise: bool,
    /// Trading days generated when a symbol has no data file.
    pub synthetic_days: usize,
    /// Stocks to analyze.
    pub watchlist: Vec<WatchlistEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            backtest_days: DEFAULT_BACKTEST_DAYS,
            noise_seed: None,
            disable_noise: false,
            synthetic_days: 260,
            watchlist: default_watchlist(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // Format: "SYM|Name,SYM2|Name2"; a bare symbol doubles as its name
        let watchlist = lookup("WATCHLIST")
            .map(|s| parse_watchlist(&s))
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.watchlist);

        Ok(Self {
            data_dir: lookup("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            backtest_days: parse_size(&lookup, "BACKTEST_DAYS", defaults.backtest_days)?,
            noise_seed: lookup("NOISE_SEED").and_then(|v| match v.trim().parse() {
                Ok(seed) => Some(seed),
                Err(_) => {
                    warn!("Ignoring unparseable NOISE_SEED {:?}", v);
                    None
                }
            }),
            disable_noise: lookup("DISABLE_NOISE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            synthetic_days: parse_size(&lookup, "SYNTHETIC_DAYS", defaults.synthetic_days)?,
            watchlist,
        })
    }
}

fn default_watchlist() -> Vec<WatchlistEntry> {
    DEFAULT_WATCHLIST
        .iter()
        .map(|(symbol, name)| WatchlistEntry {
            symbol: symbol.to_string(),
            name: name.to_string(),
        })
        .collect()
}

fn parse_watchlist(raw: &str) -> Vec<WatchlistEntry> {
    raw.split(',')
        .filter_map(|entry| {
            let parts: Vec<&str> = entry.split('|').map(str::trim).collect();
            let symbol = parts.first().filter(|s| !s.is_empty())?.to_uppercase();
            let name = parts
                .get(1)
                .filter(|n| !n.is_empty())
                .map(|n| n.to_string())
                .unwrap_or_else(|| symbol.clone());
            Some(WatchlistEntry { symbol, name })
        })
        .collect()
}

/// Parse a window size; negative values are a hard error, garbage falls back.
fn parse_size<F>(lookup: &F, key: &'static str, default: usize) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    match raw.trim().parse::<i64>() {
        Ok(value) if value < 0 => Err(EngineError::InvalidParameter {
            name: key,
            value: raw,
        }),
        Ok(value) => Ok(value as usize),
        Err(_) => {
            warn!("Ignoring unparseable {} {:?}, using {}", key, raw, default);
            Ok(default)
        }
    }
}
