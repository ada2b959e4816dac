//! Single-asset backtest engine.
//!
//! Drives signal -> volatility -> sizing -> cost over a price series. The
//! position decided at the close of index t uses prices up to and including t
//! and earns the return realized at t+1:
//!
//!   realized[t] = position[t-1] * r[t] - cost_rate * |position[t] - position[t-1]|
//!
//! Indices before the first defined position are warm-up; they hold zero
//! exposure and are excluded from the accounted steps.

use crate::domain::config::StrategyConfig;
use crate::domain::cost::CostModel;
use crate::domain::error::TrendvolError;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::indicator::volatility::calculate_volatility;
use crate::domain::metrics::{EquityPoint, PerformanceSummary, equity_curve};
use crate::domain::price_series::{PriceSeries, ReturnSeries};
use crate::domain::signal::{SignalEngine, TrendSignal};
use crate::domain::sizing::PositionSizer;
use chrono::NaiveDate;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BacktestStep {
    pub date: NaiveDate,
    pub index: usize,
    pub position: f64,
    pub asset_return: f64,
    pub cost: f64,
    pub realized_return: f64,
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub symbol: String,
    /// Target position per price index; zero during warm-up.
    pub positions: Vec<f64>,
    pub trend: TrendSignal,
    pub volatility: IndicatorSeries,
    pub steps: Vec<BacktestStep>,
    pub equity_curve: Vec<EquityPoint>,
    pub summary: PerformanceSummary,
}

impl BacktestResult {
    pub fn realized_returns(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.realized_return).collect()
    }

    pub fn return_series(&self) -> ReturnSeries {
        ReturnSeries::new(
            self.steps.iter().map(|s| s.date).collect(),
            self.realized_returns(),
        )
    }

    /// Target position at the last price.
    pub fn latest_position(&self) -> f64 {
        self.positions.last().copied().unwrap_or(0.0)
    }

    pub fn total_cost(&self) -> f64 {
        self.steps.iter().map(|s| s.cost).sum()
    }
}

#[derive(Debug, Clone)]
pub struct Backtester {
    config: StrategyConfig,
    signal_engine: SignalEngine,
    sizer: PositionSizer,
    cost_model: CostModel,
}

impl Backtester {
    pub fn new(config: StrategyConfig) -> Result<Self, TrendvolError> {
        config.validate()?;
        let signal_engine = SignalEngine::from_config(&config)?;
        Ok(Self {
            sizer: PositionSizer::from_config(&config),
            cost_model: CostModel::from_config(&config),
            signal_engine,
            config,
        })
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn run(&self, series: &PriceSeries) -> Result<BacktestResult, TrendvolError> {
        self.run_from(series, 0)
    }

    /// Run over the whole series but account only indices `>= account_from`.
    /// Earlier prices still warm the indicators.
    pub fn run_from(
        &self,
        series: &PriceSeries,
        account_from: usize,
    ) -> Result<BacktestResult, TrendvolError> {
        let required = self.config.warmup();
        if series.len() < required {
            return Err(TrendvolError::InsufficientData {
                context: format!("backtest of {}", series.symbol()),
                required,
                available: series.len(),
            });
        }

        let trend = self.signal_engine.compute(series);
        let volatility = calculate_volatility(
            series,
            self.config.vol_lookback,
            self.config.periods_per_year,
        );

        let positions: Vec<f64> = (0..series.len())
            .map(|t| {
                let direction = trend.at(t).map(|s| s.direction());
                self.sizer.size(direction, volatility.value_at(t))
            })
            .collect();

        let first_tradable = (0..series.len())
            .find(|&t| trend.at(t).is_some() && volatility.value_at(t).is_some());

        let points = series.points();
        let steps: Vec<BacktestStep> = match first_tradable {
            None => Vec::new(),
            Some(t0) => (t0.max(account_from).max(1)..series.len())
                .map(|t| {
                    let prev = positions[t - 1];
                    let position = positions[t];
                    let asset_return = points[t].price / points[t - 1].price - 1.0;
                    BacktestStep {
                        date: points[t].date,
                        index: t,
                        position,
                        asset_return,
                        cost: self.cost_model.cost(prev, position),
                        realized_return: self
                            .cost_model
                            .realized_return(prev, asset_return, position),
                    }
                })
                .collect(),
        };

        debug!(
            symbol = series.symbol(),
            prices = series.len(),
            first_tradable = ?first_tradable,
            steps = steps.len(),
            "backtest complete"
        );

        let dates: Vec<NaiveDate> = steps.iter().map(|s| s.date).collect();
        let returns: Vec<f64> = steps.iter().map(|s| s.realized_return).collect();
        // base point sits on the close before the first accounted step
        let base_date = steps
            .first()
            .map_or(points[0].date, |s| points[s.index - 1].date);

        Ok(BacktestResult {
            symbol: series.symbol().to_string(),
            equity_curve: equity_curve(base_date, &dates, &returns),
            summary: PerformanceSummary::compute(&returns, self.config.periods_per_year),
            positions,
            trend,
            volatility,
            steps,
        })
    }
}
