//! Inverse-volatility (risk parity) allocation across volatility-targeted
//! return streams, followed by a portfolio-level volatility-targeting pass.
//!
//! With m aligned returns per asset and lookback L (return indices 0..m):
//! - asset volatility at j covers returns j+1-L ..= j (defined for j >= L-1)
//! - weights formed at j (held between rebalances) apply to returns at j+1
//! - the combined return c[j+1] = sum_i w_i(j) * r_i(j+1) exists for j+1 >= L
//! - portfolio leverage at j uses the rolling volatility of c through j and
//!   applies to c[j+1]; it is defined for j >= 2L-1
//!
//! Only steps with a defined leverage are accounted, so at least 2L+1 returns
//! are required.

use crate::domain::config::{PortfolioConfig, StrategyConfig, VOL_FLOOR};
use crate::domain::error::TrendvolError;
use crate::domain::indicator::volatility::rolling_volatility;
use crate::domain::metrics::{EquityPoint, PerformanceSummary, equity_curve};
use crate::domain::price_series::ReturnSeries;
use crate::domain::sizing::PositionSizer;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

pub type Weights = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationStep {
    pub date: NaiveDate,
    pub weights: Weights,
    pub combined_return: f64,
    pub leverage: f64,
    pub portfolio_return: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationResult {
    pub steps: Vec<AllocationStep>,
    pub equity_curve: Vec<EquityPoint>,
    pub summary: PerformanceSummary,
    /// Weights formed at the last observation, for the next period.
    pub target_weights: Weights,
    /// Portfolio leverage formed at the last observation.
    pub target_leverage: f64,
}

impl AllocationResult {
    pub fn portfolio_returns(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.portfolio_return).collect()
    }
}

/// Normalized inverse-volatility weights; each volatility is floored at
/// `VOL_FLOOR` before inversion.
pub fn inverse_volatility_weights(vols: &BTreeMap<String, f64>) -> Weights {
    let inverse: Vec<(&String, f64)> = vols
        .iter()
        .map(|(asset, &vol)| {
            let floored = if vol.is_finite() { vol.max(VOL_FLOOR) } else { VOL_FLOOR };
            (asset, 1.0 / floored)
        })
        .collect();
    let total: f64 = inverse.iter().map(|(_, iv)| iv).sum();

    inverse
        .into_iter()
        .map(|(asset, iv)| (asset.clone(), iv / total))
        .collect()
}

#[derive(Debug, Clone)]
pub struct RiskParityAllocator {
    vol_lookback: usize,
    periods_per_year: u32,
    rebalance_interval: usize,
    sizer: PositionSizer,
}

impl RiskParityAllocator {
    pub fn new(strategy: &StrategyConfig, portfolio: &PortfolioConfig) -> Result<Self, TrendvolError> {
        strategy.validate()?;
        portfolio.validate()?;
        Ok(Self {
            vol_lookback: strategy.vol_lookback,
            periods_per_year: strategy.periods_per_year,
            rebalance_interval: portfolio.rebalance_interval,
            sizer: PositionSizer::new(portfolio.target_vol, strategy.max_leverage),
        })
    }

    pub fn allocate(
        &self,
        streams: &BTreeMap<String, ReturnSeries>,
    ) -> Result<AllocationResult, TrendvolError> {
        let dates = validate_alignment(streams)?;
        let m = dates.len();
        let lookback = self.vol_lookback;
        let required = lookback.saturating_mul(2).saturating_add(1);
        if m < required {
            return Err(TrendvolError::InsufficientData {
                context: format!("risk-parity allocation across {} assets", streams.len()),
                required,
                available: m,
            });
        }

        let asset_vols: BTreeMap<String, Vec<Option<f64>>> = streams
            .par_iter()
            .map(|(asset, series)| {
                (
                    asset.clone(),
                    rolling_volatility(&series.values, lookback, self.periods_per_year),
                )
            })
            .collect();

        // weights[j] is formed at return index j
        let mut weights: Vec<Option<Weights>> = vec![None; m];
        let mut current: Option<Weights> = None;
        for j in (lookback - 1)..m {
            if (j + 1 - lookback) % self.rebalance_interval == 0 {
                let vols: BTreeMap<String, f64> = asset_vols
                    .iter()
                    .filter_map(|(asset, v)| v[j].map(|vol| (asset.clone(), vol)))
                    .collect();
                current = Some(inverse_volatility_weights(&vols));
            }
            weights[j] = current.clone();
        }

        let mut combined: Vec<Option<f64>> = vec![None; m];
        for j in lookback..m {
            if let Some(w) = &weights[j - 1] {
                let c = w
                    .iter()
                    .map(|(asset, weight)| weight * streams[asset].values[j])
                    .sum::<f64>();
                combined[j] = Some(c);
            }
        }

        let combined_values: Vec<f64> = combined[lookback..].iter().map(|c| c.unwrap_or(0.0)).collect();
        let combined_vol = rolling_volatility(&combined_values, lookback, self.periods_per_year);
        let leverage_at = |j: usize| -> Option<f64> {
            if j < lookback {
                return None;
            }
            combined_vol[j - lookback].map(|vol| self.sizer.size(Some(1.0), Some(vol)))
        };

        let mut steps = Vec::new();
        let mut base_date = dates[m - 1];
        for j in (2 * lookback)..m {
            let (Some(leverage), Some(combined_return), Some(w)) =
                (leverage_at(j - 1), combined[j], weights[j - 1].as_ref())
            else {
                continue;
            };
            if steps.is_empty() {
                base_date = dates[j - 1];
            }
            steps.push(AllocationStep {
                date: dates[j],
                weights: w.clone(),
                combined_return,
                leverage,
                portfolio_return: leverage * combined_return,
            });
        }

        debug!(
            assets = streams.len(),
            returns = m,
            steps = steps.len(),
            "risk-parity allocation complete"
        );

        let step_dates: Vec<NaiveDate> = steps.iter().map(|s| s.date).collect();
        let returns: Vec<f64> = steps.iter().map(|s| s.portfolio_return).collect();

        Ok(AllocationResult {
            equity_curve: equity_curve(base_date, &step_dates, &returns),
            summary: PerformanceSummary::compute(&returns, self.periods_per_year),
            target_weights: weights[m - 1].clone().unwrap_or_default(),
            target_leverage: leverage_at(m - 1).unwrap_or(0.0),
            steps,
        })
    }
}

/// Every stream must share the first stream's dates exactly and hold finite values.
fn validate_alignment(
    streams: &BTreeMap<String, ReturnSeries>,
) -> Result<Vec<NaiveDate>, TrendvolError> {
    let Some((first_asset, reference)) = streams.iter().next() else {
        return Err(TrendvolError::EmptySeries {
            symbol: "portfolio".to_string(),
        });
    };
    if reference.is_empty() {
        return Err(TrendvolError::EmptySeries {
            symbol: first_asset.clone(),
        });
    }

    for (asset, series) in streams {
        if series.dates.len() != series.values.len() {
            return Err(TrendvolError::MisalignedSeries {
                asset: asset.clone(),
                index: series.dates.len().min(series.values.len()),
                reason: format!(
                    "{} dates but {} values",
                    series.dates.len(),
                    series.values.len()
                ),
            });
        }
        if series.len() != reference.len() {
            return Err(TrendvolError::MisalignedSeries {
                asset: asset.clone(),
                index: series.len().min(reference.len()),
                reason: format!(
                    "length {} differs from {} ({})",
                    series.len(),
                    first_asset,
                    reference.len()
                ),
            });
        }
        if let Some(index) = (0..series.len()).find(|&i| series.dates[i] != reference.dates[i]) {
            return Err(TrendvolError::MisalignedSeries {
                asset: asset.clone(),
                index,
                reason: format!(
                    "date {} does not match {} date {}",
                    series.dates[index], first_asset, reference.dates[index]
                ),
            });
        }
        if let Some(index) = series.values.iter().position(|v| !v.is_finite()) {
            return Err(TrendvolError::NonFiniteValue {
                symbol: asset.clone(),
                index,
                value: series.values[index],
            });
        }
    }

    Ok(reference.dates.clone())
}
