//! Ticker screening: trend state, current target and a composite rank score
//! derived from a completed backtest.

use crate::domain::backtest::BacktestResult;
use crate::domain::metrics::PerformanceSummary;
use chrono::NaiveDate;
use std::fmt;

const TREND_BONUS: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Bullish,
    Bearish,
    /// Either EMA is still warming up.
    Unknown,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Bullish => write!(f, "bullish"),
            Trend::Bearish => write!(f, "bearish"),
            Trend::Unknown => write!(f, "unknown"),
        }
    }
}

/// Thresholds a ticker must clear to pass the screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenCriteria {
    pub min_sharpe: f64,
    /// Max drawdown is negative; anything below this fails.
    pub max_drawdown_limit: f64,
}

impl Default for ScreenCriteria {
    fn default() -> Self {
        Self {
            min_sharpe: 0.5,
            max_drawdown_limit: -0.35,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerAnalysis {
    pub symbol: String,
    pub as_of: Option<NaiveDate>,
    pub fast_ema: Option<f64>,
    pub slow_ema: Option<f64>,
    pub trend: Trend,
    pub target_position: f64,
    pub summary: PerformanceSummary,
    pub rank_score: f64,
    pub passes_screen: bool,
}

/// 3 * annual return + 1.5 * Sharpe + 0.5 * max drawdown, plus or minus the trend bonus.
pub fn rank_score(summary: &PerformanceSummary, trend: Trend) -> f64 {
    let bonus = match trend {
        Trend::Bullish => TREND_BONUS,
        Trend::Bearish => -TREND_BONUS,
        Trend::Unknown => 0.0,
    };
    3.0 * summary.annualized_return + 1.5 * summary.sharpe_ratio + 0.5 * summary.max_drawdown + bonus
}

pub fn passes_screen(summary: &PerformanceSummary, trend: Trend, criteria: &ScreenCriteria) -> bool {
    trend == Trend::Bullish
        && summary.sharpe_ratio >= criteria.min_sharpe
        && summary.annualized_return > 0.0
        && summary.max_drawdown >= criteria.max_drawdown_limit
}

pub fn analyze(result: &BacktestResult, criteria: &ScreenCriteria) -> TickerAnalysis {
    let fast_ema = result.trend.fast.latest();
    let slow_ema = result.trend.slow.latest();
    let trend = match (fast_ema, slow_ema) {
        (Some(fast), Some(slow)) if fast > slow => Trend::Bullish,
        (Some(_), Some(_)) => Trend::Bearish,
        _ => Trend::Unknown,
    };
    let summary = result.summary;

    TickerAnalysis {
        symbol: result.symbol.clone(),
        as_of: result.trend.fast.values.last().map(|p| p.date),
        fast_ema,
        slow_ema,
        trend,
        target_position: result.latest_position(),
        rank_score: rank_score(&summary, trend),
        passes_screen: passes_screen(&summary, trend, criteria),
        summary,
    }
}

/// Sort by rank score, best first. Ties keep input order.
pub fn rank(mut analyses: Vec<TickerAnalysis>) -> Vec<TickerAnalysis> {
    analyses.sort_by(|a, b| b.rank_score.total_cmp(&a.rank_score));
    analyses
}
