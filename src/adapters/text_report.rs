//! Plain-text report rendering for terminal output.

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TrendvolError;
use crate::domain::metrics::PerformanceSummary;
use crate::domain::risk_parity::AllocationResult;
use crate::domain::screening::TickerAnalysis;
use crate::domain::walk_forward::WalkForwardResult;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default, Clone, Copy)]
pub struct TextReport;

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// The standard performance block.
pub fn format_summary(summary: &PerformanceSummary) -> String {
    let mut output = String::new();
    output.push_str("Performance Summary\n");
    output.push_str("-------------------\n");
    output.push_str(&format!("Annual Return: {}\n", pct(summary.annualized_return)));
    output.push_str(&format!(
        "Annual Volatility: {}\n",
        pct(summary.annualized_volatility)
    ));
    output.push_str(&format!("Sharpe Ratio: {:.2}\n", summary.sharpe_ratio));
    output.push_str(&format!("Max Drawdown: {}\n", pct(summary.max_drawdown)));
    output.push_str(&format!("Total Return: {}\n", pct(summary.total_return)));
    output.push_str(&format!(
        "Drawdown Duration: {} periods\n",
        summary.max_drawdown_duration
    ));
    output.push_str(&format!("Periods: {}\n", summary.periods));
    output
}

impl ReportPort for TextReport {
    fn backtest(&self, result: &BacktestResult) -> Result<String, TrendvolError> {
        let mut output = String::new();
        output.push_str(&format!("Backtest: {}\n", result.symbol));
        if let (Some(first), Some(last)) = (result.steps.first(), result.steps.last()) {
            output.push_str(&format!("Period: {} to {}\n", first.date, last.date));
        }
        output.push_str(&format!("Latest Target Position: {:.4}\n", result.latest_position()));
        output.push_str(&format!("Total Cost: {}\n\n", pct(result.total_cost())));
        output.push_str(&format_summary(&result.summary));
        Ok(output)
    }

    fn walk_forward(&self, result: &WalkForwardResult) -> Result<String, TrendvolError> {
        let mut output = String::new();
        output.push_str(&format!("Walk-Forward: {}\n\n", result.symbol));
        output.push_str(&format!(
            "{:>3}  {:<10}  {:<10}  {:>9}  {:>9}  {:>7}  {:>9}\n",
            "#", "test_start", "test_end", "train_ret", "test_ret", "sharpe", "max_dd"
        ));
        for w in &result.windows {
            output.push_str(&format!(
                "{:>3}  {:<10}  {:<10}  {:>9}  {:>9}  {:>7.2}  {:>9}\n",
                w.window.index,
                w.test_start_date,
                w.test_end_date,
                pct(w.train.annualized_return),
                pct(w.test.annualized_return),
                w.test.sharpe_ratio,
                pct(w.test.max_drawdown)
            ));
        }

        let agg = &result.aggregate;
        output.push_str("\nOut-of-Sample Aggregate\n");
        output.push_str("-----------------------\n");
        output.push_str(&format!(
            "Windows: {} ({} positive)\n",
            agg.windows, agg.positive_windows
        ));
        output.push_str(&format!(
            "Mean Annual Return: {}\n",
            pct(agg.mean_annualized_return)
        ));
        output.push_str(&format!(
            "Mean Annual Volatility: {}\n",
            pct(agg.mean_annualized_volatility)
        ));
        output.push_str(&format!("Mean Sharpe Ratio: {:.2}\n", agg.mean_sharpe_ratio));
        output.push_str(&format!("Mean Max Drawdown: {}\n", pct(agg.mean_max_drawdown)));
        Ok(output)
    }

    fn portfolio(&self, result: &AllocationResult) -> Result<String, TrendvolError> {
        let mut output = String::new();
        output.push_str("Risk-Parity Portfolio\n\n");
        output.push_str("Target Weights\n");
        for (asset, weight) in &result.target_weights {
            output.push_str(&format!("  {:<8} {:>8}\n", asset, pct(*weight)));
        }
        output.push_str(&format!(
            "Portfolio Leverage: {:.4}\n\n",
            result.target_leverage
        ));
        output.push_str(&format_summary(&result.summary));
        Ok(output)
    }

    fn ranking(&self, analyses: &[TickerAnalysis]) -> Result<String, TrendvolError> {
        let mut output = String::new();
        output.push_str(&format!(
            "{:>3}  {:<8}  {:<7}  {:>8}  {:>9}  {:>7}  {:>9}  {:>7}  {}\n",
            "#", "symbol", "trend", "target", "ann_ret", "sharpe", "max_dd", "score", "screen"
        ));
        for (rank, a) in analyses.iter().enumerate() {
            output.push_str(&format!(
                "{:>3}  {:<8}  {:<7}  {:>8.4}  {:>9}  {:>7.2}  {:>9}  {:>7.2}  {}\n",
                rank + 1,
                a.symbol,
                a.trend.to_string(),
                a.target_position,
                pct(a.summary.annualized_return),
                a.summary.sharpe_ratio,
                pct(a.summary.max_drawdown),
                a.rank_score,
                if a.passes_screen { "pass" } else { "-" }
            ));
        }
        Ok(output)
    }
}
