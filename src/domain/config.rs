//! Typed strategy, walk-forward and portfolio parameters.
//!
//! Each config validates as a whole before any computation; engines call
//! `validate` in their constructors so an invalid combination never reaches a
//! computation loop.

use crate::domain::error::TrendvolError;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Annualized volatility floor applied before any `target / vol` division.
pub const VOL_FLOOR: f64 = 1e-8;

pub const DEFAULT_PERIODS_PER_YEAR: u32 = 252;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalMode {
    /// +1 when fast > slow, otherwise -1.
    #[default]
    LongShort,
    /// +1 when fast > slow, otherwise flat.
    LongOnly,
}

impl FromStr for SignalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "long_short" | "long-short" => Ok(SignalMode::LongShort),
            "long_only" | "long-only" => Ok(SignalMode::LongOnly),
            other => Err(format!(
                "unknown signal mode '{other}', expected long_short or long_only"
            )),
        }
    }
}

impl fmt::Display for SignalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalMode::LongShort => write!(f, "long_short"),
            SignalMode::LongOnly => write!(f, "long_only"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub fast_span: usize,
    pub slow_span: usize,
    pub vol_lookback: usize,
    pub target_vol: f64,
    pub max_leverage: f64,
    pub transaction_cost_bps: f64,
    pub periods_per_year: u32,
    pub signal_mode: SignalMode,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            fast_span: 12,
            slow_span: 48,
            vol_lookback: 20,
            target_vol: 0.15,
            max_leverage: 2.0,
            transaction_cost_bps: 1.0,
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
            signal_mode: SignalMode::LongShort,
        }
    }
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<(), TrendvolError> {
        if self.fast_span == 0 {
            return Err(invalid("fast_span", "fast_span must be positive"));
        }
        if self.slow_span <= self.fast_span {
            return Err(invalid(
                "slow_span",
                format!(
                    "slow_span ({}) must be greater than fast_span ({})",
                    self.slow_span, self.fast_span
                ),
            ));
        }
        if self.vol_lookback == 0 {
            return Err(invalid("vol_lookback", "vol_lookback must be positive"));
        }
        if !(self.target_vol.is_finite() && self.target_vol > 0.0) {
            return Err(invalid("target_vol", "target_vol must be a positive number"));
        }
        if !(self.max_leverage.is_finite() && self.max_leverage > 0.0) {
            return Err(invalid("max_leverage", "max_leverage must be a positive number"));
        }
        if !(self.transaction_cost_bps.is_finite() && self.transaction_cost_bps >= 0.0) {
            return Err(invalid(
                "transaction_cost_bps",
                "transaction_cost_bps must be non-negative",
            ));
        }
        if self.periods_per_year == 0 {
            return Err(invalid("periods_per_year", "periods_per_year must be positive"));
        }
        Ok(())
    }

    /// Transaction cost as a fraction of traded notional.
    pub fn cost_rate(&self) -> f64 {
        self.transaction_cost_bps / 10_000.0
    }

    /// Minimum number of prices a backtest needs before it can report.
    pub fn warmup(&self) -> usize {
        self.slow_span.max(self.vol_lookback)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkForwardConfig {
    pub train_window: usize,
    pub test_window: usize,
    pub step: usize,
}

impl Default for WalkForwardConfig {
    fn default() -> Self {
        Self {
            train_window: 252,
            test_window: 63,
            step: 63,
        }
    }
}

impl WalkForwardConfig {
    pub fn validate(&self) -> Result<(), TrendvolError> {
        for (key, value) in [
            ("train_window", self.train_window),
            ("test_window", self.test_window),
            ("step", self.step),
        ] {
            if value == 0 {
                return Err(TrendvolError::config_invalid(
                    "walk_forward",
                    key,
                    format!("{key} must be positive"),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioConfig {
    pub target_vol: f64,
    pub rebalance_interval: usize,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            target_vol: 0.15,
            rebalance_interval: 1,
        }
    }
}

impl PortfolioConfig {
    pub fn validate(&self) -> Result<(), TrendvolError> {
        if !(self.target_vol.is_finite() && self.target_vol > 0.0) {
            return Err(TrendvolError::config_invalid(
                "portfolio",
                "target_vol",
                "target_vol must be a positive number",
            ));
        }
        if self.rebalance_interval == 0 {
            return Err(TrendvolError::config_invalid(
                "portfolio",
                "rebalance_interval",
                "rebalance_interval must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Where price files live and which columns to read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataConfig {
    pub dir: PathBuf,
    pub date_column: String,
    pub price_column: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            date_column: "date".to_string(),
            price_column: "close".to_string(),
        }
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> TrendvolError {
    TrendvolError::config_invalid("strategy", key, reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strategy_config_is_valid() {
        assert!(StrategyConfig::default().validate().is_ok());
        assert_eq!(StrategyConfig::default().warmup(), 48);
    }

    #[test]
    fn fast_not_less_than_slow_rejected() {
        let config = StrategyConfig {
            fast_span: 20,
            slow_span: 20,
            ..StrategyConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, TrendvolError::ConfigInvalid { key, .. } if key == "slow_span"));
    }

    #[test]
    fn zero_fast_span_rejected() {
        let config = StrategyConfig {
            fast_span: 0,
            ..StrategyConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, TrendvolError::ConfigInvalid { key, .. } if key == "fast_span"));
    }

    #[test]
    fn negative_cost_rejected() {
        let config = StrategyConfig {
            transaction_cost_bps: -1.0,
            ..StrategyConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, TrendvolError::ConfigInvalid { key, .. } if key == "transaction_cost_bps")
        );
    }

    #[test]
    fn nan_target_vol_rejected() {
        let config = StrategyConfig {
            target_vol: f64::NAN,
            ..StrategyConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_periods_rejected() {
        let config = StrategyConfig {
            periods_per_year: 0,
            ..StrategyConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, TrendvolError::ConfigInvalid { key, .. } if key == "periods_per_year")
        );
    }

    #[test]
    fn cost_rate_from_bps() {
        let config = StrategyConfig {
            transaction_cost_bps: 5.0,
            ..StrategyConfig::default()
        };
        assert!((config.cost_rate() - 0.0005).abs() < 1e-15);
    }

    #[test]
    fn warmup_uses_longest_window() {
        let config = StrategyConfig {
            fast_span: 5,
            slow_span: 10,
            vol_lookback: 30,
            ..StrategyConfig::default()
        };
        assert_eq!(config.warmup(), 30);
    }

    #[test]
    fn walk_forward_zero_step_rejected() {
        let config = WalkForwardConfig {
            step: 0,
            ..WalkForwardConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, TrendvolError::ConfigInvalid { key, .. } if key == "step"));
    }

    #[test]
    fn portfolio_zero_interval_rejected() {
        let config = PortfolioConfig {
            rebalance_interval: 0,
            ..PortfolioConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn signal_mode_parses() {
        assert_eq!("long_only".parse::<SignalMode>(), Ok(SignalMode::LongOnly));
        assert_eq!("LONG_SHORT".parse::<SignalMode>(), Ok(SignalMode::LongShort));
        assert!("sideways".parse::<SignalMode>().is_err());
        assert_eq!(SignalMode::LongOnly.to_string(), "long_only");
    }
}
