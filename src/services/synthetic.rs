//! Synthetic daily bars for symbols without stored history.

use crate::types::Bar;
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// First trading day of generated series.
const START_DATE: (i32, u32, u32) = (2024, 1, 2);

/// Generate `days` weekday bars as a random walk from `start_price`.
///
/// The same seed always yields the same series. High and low bracket both
/// open and close on every bar.
pub fn generate_bars(start_price: f64, days: usize, seed: u64) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bars = Vec::with_capacity(days);
    let mut price = if start_price.is_finite() && start_price > 0.0 {
        start_price
    } else {
        100.0
    };
    let mut date = NaiveDate::from_ymd_opt(START_DATE.0, START_DATE.1, START_DATE.2)
        .unwrap_or_default();

    while bars.len() < days {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            date += Duration::days(1);
            continue;
        }

        // Random walk with slight upward drift
        let change = rng.gen_range(-0.02..0.0205);
        let open = price * (1.0 + rng.gen_range(-0.005..0.005));
        price = (price * (1.0 + change)).max(0.01);

        let high = open.max(price) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(price) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(1_000_000.0..10_000_000.0_f64).round();

        bars.push(Bar {
            date,
            open,
            high,
            low,
            close: price,
            volume,
        });
        date += Duration::days(1);
    }

    bars
}

/// Stable seed for a symbol, so synthetic runs are repeatable per symbol.
pub fn seed_for_symbol(symbol: &str) -> u64 {
    symbol
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |hash, b| {
            (hash ^ b as u64).wrapping_mul(0x0100_0000_01b3)
        })
}
