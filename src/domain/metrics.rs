//! Performance metrics over a realized-return sequence.
//!
//! Conventions, shared by every pipeline that reports a summary:
//! - annualized return is geometric: (prod(1 + r))^(P/N) - 1
//! - volatility is the population standard deviation times sqrt(P)
//! - Sharpe is annualized return / annualized volatility, 0 when volatility is 0
//! - max drawdown is <= 0 and measured from an initial equity of 1.0
//!
//! Fewer than two returns yield a neutral summary (all statistics zero).

use crate::domain::indicator::volatility::population_stddev;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceSummary {
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    pub periods: usize,
}

impl PerformanceSummary {
    pub fn neutral(periods: usize) -> Self {
        Self {
            total_return: 0.0,
            annualized_return: 0.0,
            annualized_volatility: 0.0,
            sharpe_ratio: 0.0,
            max_drawdown: 0.0,
            max_drawdown_duration: 0,
            periods,
        }
    }

    pub fn compute(returns: &[f64], periods_per_year: u32) -> Self {
        let n = returns.len();
        if n < 2 {
            let mut summary = Self::neutral(n);
            summary.total_return = returns.first().copied().unwrap_or(0.0);
            return summary;
        }

        let growth: f64 = returns.iter().map(|r| 1.0 + r).product();
        let total_return = growth - 1.0;
        let periods_per_year = periods_per_year as f64;

        let annualized_return = if growth > 0.0 {
            growth.powf(periods_per_year / n as f64) - 1.0
        } else {
            -1.0
        };

        let annualized_volatility = population_stddev(returns) * periods_per_year.sqrt();

        let sharpe_ratio = if annualized_volatility > f64::EPSILON {
            annualized_return / annualized_volatility
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(returns);

        Self {
            total_return,
            annualized_return,
            annualized_volatility,
            sharpe_ratio,
            max_drawdown,
            max_drawdown_duration,
            periods: n,
        }
    }
}

/// Compounded equity curve. The first point is the 1.0 base at `base_date`,
/// followed by one point per return. No returns gives an empty curve.
pub fn equity_curve(base_date: NaiveDate, dates: &[NaiveDate], returns: &[f64]) -> Vec<EquityPoint> {
    if returns.is_empty() {
        return Vec::new();
    }
    let mut equity = 1.0;
    let mut curve = Vec::with_capacity(returns.len() + 1);
    curve.push(EquityPoint {
        date: base_date,
        equity,
    });
    curve.extend(dates.iter().zip(returns).map(|(&date, r)| {
        equity *= 1.0 + r;
        EquityPoint { date, equity }
    }));
    curve
}

/// Largest peak-to-trough decline (as a negative fraction) and the longest
/// run of periods spent below a prior peak.
fn compute_drawdown(returns: &[f64]) -> (f64, usize) {
    let mut equity = 1.0_f64;
    let mut peak = 1.0_f64;
    let mut max_dd = 0.0_f64;
    let mut current_duration = 0usize;
    let mut max_duration = 0usize;

    for r in returns {
        equity *= 1.0 + r;
        if equity >= peak {
            peak = equity;
            current_duration = 0;
        } else {
            let dd = (equity - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
            current_duration += 1;
            max_duration = max_duration.max(current_duration);
        }
    }

    (max_dd, max_duration)
}
