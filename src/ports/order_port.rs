//! Order hand-off port. The core only produces target positions; submitting
//! them is an adapter concern.

use crate::domain::error::TrendvolError;
use chrono::NaiveDate;

/// Desired exposure for a symbol as a multiple of capital.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetPosition {
    pub symbol: String,
    pub as_of: NaiveDate,
    pub position: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderAck {
    pub symbol: String,
    /// Change in exposure needed to reach the target.
    pub delta: f64,
    pub accepted: bool,
}

pub trait OrderExecutor {
    fn submit(&mut self, target: &TargetPosition) -> Result<OrderAck, TrendvolError>;

    /// Exposure currently held for `symbol`.
    fn current_position(&self, symbol: &str) -> f64;
}
