#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
use trendvol::domain::config::StrategyConfig;
use trendvol::domain::error::TrendvolError;
use trendvol::domain::price_series::{PricePoint, PriceSeries};
use trendvol::ports::price_feed::PriceFeed;

pub struct MockPriceFeed {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceFeed {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_prices(mut self, symbol: &str, prices: &[f64]) -> Self {
        self.data.insert(symbol.to_string(), make_points(prices));
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PriceFeed for MockPriceFeed {
    fn fetch(&self, symbol: &str) -> Result<PriceSeries, TrendvolError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TrendvolError::DataSource {
                reason: reason.clone(),
            });
        }
        let points = self.data.get(symbol).cloned().unwrap_or_default();
        PriceSeries::new(symbol, points)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TrendvolError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive calendar days from 2020-01-01.
pub fn make_points(prices: &[f64]) -> Vec<PricePoint> {
    let start = date(2020, 1, 1);
    prices
        .iter()
        .enumerate()
        .map(|(i, &price)| PricePoint {
            date: start + chrono::Duration::days(i as i64),
            price,
        })
        .collect()
}

pub fn make_series(symbol: &str, prices: &[f64]) -> PriceSeries {
    PriceSeries::new(symbol, make_points(prices)).unwrap()
}

pub fn flat_prices(n: usize, price: f64) -> Vec<f64> {
    vec![price; n]
}

/// Geometric path from `start` to `end` over `n` prices.
pub fn rising_prices(n: usize, start: f64, end: f64) -> Vec<f64> {
    let steps = (n - 1) as f64;
    (0..n)
        .map(|i| start * (end / start).powf(i as f64 / steps))
        .collect()
}

/// Trending path with a deterministic oscillation so volatility is non-zero.
pub fn wavy_prices(n: usize, drift: f64, amplitude: f64, phase: f64) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            100.0 * (1.0 + drift).powf(t) * (1.0 + amplitude * (t * 0.21 + phase).sin())
        })
        .collect()
}

pub fn small_strategy() -> StrategyConfig {
    StrategyConfig {
        fast_span: 5,
        slow_span: 20,
        vol_lookback: 10,
        ..StrategyConfig::default()
    }
}

pub fn write_csv(dir: &std::path::Path, symbol: &str, prices: &[f64]) {
    let mut content = String::from("date,close\n");
    for point in make_points(prices) {
        content.push_str(&format!("{},{}\n", point.date, point.price));
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}
