use serde::Serialize;
use stockcast::services::signals::ranked_from_reports;
use stockcast::services::synthetic::{generate_bars, seed_for_symbol};
use stockcast::{
    Bar, Config, EngineError, HistoricalSource, JsonFileSource, Recommendation, SignalService,
    StockInput, StockReport,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Everything printed for one run.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunOutput {
    generated_at: chrono::DateTime<chrono::Utc>,
    reports: Vec<StockReport>,
    recommendations: Vec<Recommendation>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing; stdout is reserved for the JSON output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockcast=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;
    info!(
        "Analyzing {} symbols (backtest window {} days, data dir {})",
        config.watchlist.len(),
        config.backtest_days,
        config.data_dir.display()
    );

    let source = JsonFileSource::new(&config.data_dir);
    let service = SignalService::from_config(&config);

    let inputs: Vec<StockInput> = config
        .watchlist
        .iter()
        .map(|entry| {
            let bars = load_or_generate(&source, &entry.symbol, config.synthetic_days)?;
            Ok(StockInput::new(&entry.symbol, &entry.name, bars))
        })
        .collect::<Result<_, EngineError>>()?;

    let reports = service.reports_concurrent(inputs).await?;
    let recommendations = ranked_from_reports(&reports);

    for rec in &recommendations {
        info!(
            "{} {} (confidence {:.2}, target {:.2}): {}",
            rec.symbol,
            rec.action.label(),
            rec.confidence,
            rec.target_price,
            rec.reason
        );
    }

    let output = RunOutput {
        generated_at: chrono::Utc::now(),
        reports,
        recommendations,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

/// Bars from the source, or a synthetic series when the symbol has no file.
fn load_or_generate(
    source: &dyn HistoricalSource,
    symbol: &str,
    synthetic_days: usize,
) -> Result<Vec<Bar>, EngineError> {
    match source.load_bars(symbol) {
        Ok(bars) => {
            info!("Loaded {} bars for {} from {}", bars.len(), symbol, source.name());
            Ok(bars)
        }
        Err(EngineError::DataNotFound(_)) => {
            warn!(
                "No historical data found for {}, generating synthetic data",
                symbol
            );
            let seed = seed_for_symbol(symbol);
            let start_price = 20.0 + (seed % 480) as f64;
            Ok(generate_bars(start_price, synthetic_days, seed))
        }
        Err(e) => Err(e),
    }
}
