//! Walk-forward validation.
//!
//! Rolling windows over price indices, each `[train_start, train_end)` followed
//! by `[test_start, test_end)` with `test_start == train_end`. Windows start at
//! index 0 and advance by `step` while `start + train + test <= n`; a trailing
//! partial window is dropped, so the count is `floor((n - train - test) / step) + 1`.
//!
//! The train slice is backtested on its own (it must cover the warm-up). The
//! test result is accounted over the test slice only, with indicators warmed
//! on the preceding train history. Windows are independent and evaluated in
//! parallel; results keep window order.

use crate::domain::backtest::Backtester;
use crate::domain::config::{StrategyConfig, WalkForwardConfig};
use crate::domain::error::TrendvolError;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::price_series::PriceSeries;
use chrono::NaiveDate;
use rayon::prelude::*;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub index: usize,
    pub train_start: usize,
    pub train_end: usize,
    pub test_start: usize,
    pub test_end: usize,
}

impl Window {
    pub fn train_len(&self) -> usize {
        self.train_end - self.train_start
    }

    pub fn test_len(&self) -> usize {
        self.test_end - self.test_start
    }
}

/// All complete windows for a series of length `n`.
pub fn generate_windows(n: usize, config: &WalkForwardConfig) -> Vec<Window> {
    let mut windows = Vec::new();
    let Some(span) = config.train_window.checked_add(config.test_window) else {
        return windows;
    };
    if config.step == 0 {
        return windows;
    }

    let mut start = 0usize;
    while let Some(end) = start.checked_add(span).filter(|&end| end <= n) {
        let train_end = start + config.train_window;
        windows.push(Window {
            index: windows.len(),
            train_start: start,
            train_end,
            test_start: train_end,
            test_end: end,
        });
        match start.checked_add(config.step) {
            Some(next) => start = next,
            None => break,
        }
    }
    windows
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowResult {
    pub window: Window,
    pub train_start_date: NaiveDate,
    pub test_start_date: NaiveDate,
    pub test_end_date: NaiveDate,
    /// In-sample diagnostic.
    pub train: PerformanceSummary,
    /// Reported out-of-sample result.
    pub test: PerformanceSummary,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateSummary {
    pub windows: usize,
    pub positive_windows: usize,
    pub mean_annualized_return: f64,
    pub mean_annualized_volatility: f64,
    pub mean_sharpe_ratio: f64,
    pub mean_max_drawdown: f64,
}

impl AggregateSummary {
    pub fn from_summaries(summaries: &[PerformanceSummary]) -> Self {
        let n = summaries.len();
        let mean = |f: fn(&PerformanceSummary) -> f64| {
            if n == 0 {
                0.0
            } else {
                summaries.iter().map(f).sum::<f64>() / n as f64
            }
        };
        Self {
            windows: n,
            positive_windows: summaries.iter().filter(|s| s.total_return > 0.0).count(),
            mean_annualized_return: mean(|s| s.annualized_return),
            mean_annualized_volatility: mean(|s| s.annualized_volatility),
            mean_sharpe_ratio: mean(|s| s.sharpe_ratio),
            mean_max_drawdown: mean(|s| s.max_drawdown),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WalkForwardResult {
    pub symbol: String,
    pub windows: Vec<WindowResult>,
    pub aggregate: AggregateSummary,
}

#[derive(Debug, Clone)]
pub struct WalkForwardValidator {
    backtester: Backtester,
    config: WalkForwardConfig,
}

impl WalkForwardValidator {
    pub fn new(strategy: StrategyConfig, config: WalkForwardConfig) -> Result<Self, TrendvolError> {
        config.validate()?;
        if config.train_window < strategy.warmup() {
            return Err(TrendvolError::config_invalid(
                "walk_forward",
                "train_window",
                format!(
                    "train_window ({}) must cover the strategy warm-up ({})",
                    config.train_window,
                    strategy.warmup()
                ),
            ));
        }
        Ok(Self {
            backtester: Backtester::new(strategy)?,
            config,
        })
    }

    pub fn config(&self) -> &WalkForwardConfig {
        &self.config
    }

    pub fn run(&self, series: &PriceSeries) -> Result<WalkForwardResult, TrendvolError> {
        let required = self
            .config
            .train_window
            .saturating_add(self.config.test_window);
        if series.len() < required {
            return Err(TrendvolError::InsufficientData {
                context: format!("walk-forward of {}", series.symbol()),
                required,
                available: series.len(),
            });
        }

        let windows = generate_windows(series.len(), &self.config);
        info!(
            symbol = series.symbol(),
            windows = windows.len(),
            train = self.config.train_window,
            test = self.config.test_window,
            step = self.config.step,
            "running walk-forward validation"
        );

        let results = windows
            .par_iter()
            .map(|window| self.evaluate(series, window))
            .collect::<Result<Vec<_>, _>>()?;

        let tests: Vec<PerformanceSummary> = results.iter().map(|r| r.test).collect();
        Ok(WalkForwardResult {
            symbol: series.symbol().to_string(),
            aggregate: AggregateSummary::from_summaries(&tests),
            windows: results,
        })
    }

    fn evaluate(&self, series: &PriceSeries, window: &Window) -> Result<WindowResult, TrendvolError> {
        let train_slice = series.slice(window.train_start, window.train_end)?;
        let train = self.backtester.run(&train_slice)?.summary;

        let history = series.slice(window.train_start, window.test_end)?;
        let test = self.backtester.run_from(&history, window.train_len())?.summary;

        let points = series.points();
        Ok(WindowResult {
            window: *window,
            train_start_date: points[window.train_start].date,
            test_start_date: points[window.test_start].date,
            test_end_date: points[window.test_end - 1].date,
            train,
            test,
        })
    }
}
