//! Rolling realized volatility.
//!
//! Population standard deviation over the most recent L returns, annualized by
//! sqrt(periods_per_year). A window of identical returns is exactly zero.
//! Warmup: aligned to prices, VOL(L) is valid from price index L.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::price_series::PriceSeries;

/// Population standard deviation. Zero for empty input or identical values.
pub fn population_stddev(values: &[f64]) -> f64 {
    if values.is_empty() || values.iter().all(|&v| v == values[0]) {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Annualized rolling volatility aligned to `returns`: element `j` covers
/// `returns[j+1-lookback ..= j]` and is `None` while `j + 1 < lookback`.
pub fn rolling_volatility(returns: &[f64], lookback: usize, periods_per_year: u32) -> Vec<Option<f64>> {
    let scale = (periods_per_year as f64).sqrt();
    (0..returns.len())
        .map(|j| {
            if lookback == 0 || j + 1 < lookback {
                None
            } else {
                Some(population_stddev(&returns[j + 1 - lookback..=j]) * scale)
            }
        })
        .collect()
}

/// Annualized rolling volatility aligned to the prices of `series`.
pub fn calculate_volatility(
    series: &PriceSeries,
    lookback: usize,
    periods_per_year: u32,
) -> IndicatorSeries {
    let returns = series.simple_returns();
    let rolling = rolling_volatility(&returns.values, lookback, periods_per_year);

    let values = series
        .points()
        .iter()
        .enumerate()
        .map(|(t, point)| {
            let vol = if t == 0 { None } else { rolling[t - 1] };
            IndicatorPoint {
                date: point.date,
                valid: vol.is_some(),
                value: vol.unwrap_or(0.0),
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Volatility(lookback),
        values,
    }
}
