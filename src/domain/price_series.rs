//! Validated price series and derived return series.
//!
//! A `PriceSeries` can only be built through [`PriceSeries::new`], which
//! rejects empty input, non-increasing dates and non-positive or non-finite
//! prices. Everything downstream relies on those guarantees.

use crate::domain::error::TrendvolError;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, TrendvolError> {
        let symbol = symbol.into();
        if points.is_empty() {
            return Err(TrendvolError::EmptySeries { symbol });
        }

        for (index, point) in points.iter().enumerate() {
            if !point.price.is_finite() {
                return Err(TrendvolError::NonFiniteValue {
                    symbol,
                    index,
                    value: point.price,
                });
            }
            if point.price <= 0.0 {
                return Err(TrendvolError::NonPositivePrice {
                    symbol,
                    index,
                    price: point.price,
                });
            }
            if index > 0 && point.date <= points[index - 1].date {
                return Err(TrendvolError::NonMonotonicTimestamp {
                    symbol,
                    index,
                    previous: points[index - 1].date,
                    current: point.date,
                });
            }
        }

        Ok(Self { symbol, points })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed series; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn last(&self) -> PricePoint {
        self.points[self.points.len() - 1]
    }

    /// Simple returns `p[t]/p[t-1] - 1`, one element shorter than the series.
    /// Element `j` is the return observed at price index `j + 1`.
    pub fn simple_returns(&self) -> ReturnSeries {
        let dates = self.points[1..].iter().map(|p| p.date).collect();
        let values = self
            .points
            .windows(2)
            .map(|w| w[1].price / w[0].price - 1.0)
            .collect();
        ReturnSeries { dates, values }
    }

    /// Sub-series over the half-open index range `[start, end)`.
    pub fn slice(&self, start: usize, end: usize) -> Result<PriceSeries, TrendvolError> {
        if start >= end || end > self.points.len() {
            return Err(TrendvolError::InsufficientData {
                context: format!("slice [{start}, {end}) of {}", self.symbol),
                required: end,
                available: self.points.len(),
            });
        }
        Ok(PriceSeries {
            symbol: self.symbol.clone(),
            points: self.points[start..end].to_vec(),
        })
    }
}

/// A dated sequence of per-period returns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReturnSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl ReturnSeries {
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        Self { dates, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
