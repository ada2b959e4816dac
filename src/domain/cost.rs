//! Transaction-cost accounting.
//!
//! realized[t] = prev_position * asset_return[t] - cost_rate * |position[t] - prev_position|
//!
//! The cost of a position change is charged on the step the change is made.

use crate::domain::config::StrategyConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub cost_rate: f64,
}

impl CostModel {
    pub fn from_bps(bps: f64) -> Self {
        Self {
            cost_rate: bps / 10_000.0,
        }
    }

    pub fn from_config(config: &StrategyConfig) -> Self {
        Self {
            cost_rate: config.cost_rate(),
        }
    }

    pub fn cost(&self, prev_position: f64, position: f64) -> f64 {
        self.cost_rate * (position - prev_position).abs()
    }

    pub fn realized_return(&self, prev_position: f64, asset_return: f64, position: f64) -> f64 {
        prev_position * asset_return - self.cost(prev_position, position)
    }
}
