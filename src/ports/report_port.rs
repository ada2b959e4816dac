//! Report generation port.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TrendvolError;
use crate::domain::risk_parity::AllocationResult;
use crate::domain::screening::TickerAnalysis;
use crate::domain::walk_forward::WalkForwardResult;

/// Renders pipeline results. Implementations return the rendered text so the
/// caller decides where it goes.
pub trait ReportPort {
    fn backtest(&self, result: &BacktestResult) -> Result<String, TrendvolError>;

    fn walk_forward(&self, result: &WalkForwardResult) -> Result<String, TrendvolError>;

    fn portfolio(&self, result: &AllocationResult) -> Result<String, TrendvolError>;

    fn ranking(&self, analyses: &[TickerAnalysis]) -> Result<String, TrendvolError>;
}
