//! Exponential Moving Average of price.
//!
//! α = 2/(n+1). Seeded with the first price (not an SMA seed):
//! EMA[0] = P[0], EMA[i] = α·P[i] + (1-α)·EMA[i-1].
//! Warmup: the first n observations are invalid, so EMA(n) is valid from index n.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::price_series::PriceSeries;

pub fn calculate_ema(series: &PriceSeries, span: usize) -> IndicatorSeries {
    if span == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Ema(span),
            values: Vec::new(),
        };
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut values = Vec::with_capacity(series.len());
    let mut ema = 0.0;

    for (i, point) in series.points().iter().enumerate() {
        ema = if i == 0 {
            point.price
        } else {
            alpha * point.price + (1.0 - alpha) * ema
        };
        values.push(IndicatorPoint {
            date: point.date,
            valid: i >= span,
            value: ema,
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(span),
        values,
    }
}
