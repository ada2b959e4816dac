//! Configuration loading and validation.
//!
//! Reads typed configs from a `ConfigPort`. Absent keys take their defaults;
//! keys that are present but unparsable are `ConfigInvalid`, never defaulted.

use crate::domain::config::{
    DataConfig, PortfolioConfig, SignalMode, StrategyConfig, WalkForwardConfig,
};
use crate::domain::error::TrendvolError;
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;
use std::str::FromStr;

pub fn load_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, TrendvolError> {
    let defaults = StrategyConfig::default();
    let strategy = StrategyConfig {
        fast_span: parse_or(config, "strategy", "fast_span", defaults.fast_span)?,
        slow_span: parse_or(config, "strategy", "slow_span", defaults.slow_span)?,
        vol_lookback: parse_or(config, "strategy", "vol_lookback", defaults.vol_lookback)?,
        target_vol: parse_or(config, "strategy", "target_vol", defaults.target_vol)?,
        max_leverage: parse_or(config, "strategy", "max_leverage", defaults.max_leverage)?,
        transaction_cost_bps: parse_or(
            config,
            "strategy",
            "transaction_cost_bps",
            defaults.transaction_cost_bps,
        )?,
        periods_per_year: parse_or(
            config,
            "strategy",
            "periods_per_year",
            defaults.periods_per_year,
        )?,
        signal_mode: parse_or::<SignalMode>(config, "strategy", "signal_mode", defaults.signal_mode)?,
    };
    strategy.validate()?;
    Ok(strategy)
}

pub fn load_walk_forward_config(
    config: &dyn ConfigPort,
) -> Result<WalkForwardConfig, TrendvolError> {
    let defaults = WalkForwardConfig::default();
    let walk_forward = WalkForwardConfig {
        train_window: parse_or(config, "walk_forward", "train_window", defaults.train_window)?,
        test_window: parse_or(config, "walk_forward", "test_window", defaults.test_window)?,
        step: parse_or(config, "walk_forward", "step", defaults.step)?,
    };
    walk_forward.validate()?;
    Ok(walk_forward)
}

/// Portfolio target volatility defaults to the strategy's target.
pub fn load_portfolio_config(
    config: &dyn ConfigPort,
    strategy: &StrategyConfig,
) -> Result<PortfolioConfig, TrendvolError> {
    let portfolio = PortfolioConfig {
        target_vol: parse_or(config, "portfolio", "target_vol", strategy.target_vol)?,
        rebalance_interval: parse_or(
            config,
            "portfolio",
            "rebalance_interval",
            PortfolioConfig::default().rebalance_interval,
        )?,
    };
    portfolio.validate()?;
    Ok(portfolio)
}

pub fn load_data_config(config: &dyn ConfigPort) -> Result<DataConfig, TrendvolError> {
    let defaults = DataConfig::default();
    let text = |key: &str, default: String| {
        config
            .get_string("data", key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    };
    Ok(DataConfig {
        dir: PathBuf::from(text("dir", defaults.dir.to_string_lossy().to_string())),
        date_column: text("date_column", defaults.date_column),
        price_column: text("price_column", defaults.price_column),
    })
}

/// Symbols listed under `[portfolio] symbols`; empty when the key is absent.
pub fn load_portfolio_symbols(config: &dyn ConfigPort) -> Result<Vec<String>, TrendvolError> {
    match config.get_string("portfolio", "symbols") {
        Some(raw) if !raw.trim().is_empty() => parse_symbols(&raw),
        _ => Ok(Vec::new()),
    }
}

const KNOWN_KEYS: &[(&str, &[&str])] = &[
    (
        "strategy",
        &[
            "fast_span",
            "slow_span",
            "vol_lookback",
            "target_vol",
            "max_leverage",
            "transaction_cost_bps",
            "periods_per_year",
            "signal_mode",
        ],
    ),
    ("walk_forward", &["train_window", "test_window", "step"]),
    ("portfolio", &["target_vol", "rebalance_interval", "symbols"]),
    ("data", &["dir", "date_column", "price_column"]),
];

/// Keys in the recognized sections that nothing reads, as `(section, key)`.
pub fn unknown_keys(config: &dyn ConfigPort) -> Vec<(String, String)> {
    KNOWN_KEYS
        .iter()
        .flat_map(|(section, known)| {
            config
                .keys(section)
                .into_iter()
                .filter(|key| !known.contains(&key.as_str()))
                .map(|key| (section.to_string(), key))
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Comma-separated, upper-cased, de-duplicated symbol list.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, TrendvolError> {
    let mut symbols: Vec<String> = Vec::new();
    for token in input.split(',') {
        let symbol = token.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(TrendvolError::config_invalid(
                "portfolio",
                "symbols",
                "empty token in symbol list",
            ));
        }
        if symbols.contains(&symbol) {
            return Err(TrendvolError::config_invalid(
                "portfolio",
                "symbols",
                format!("duplicate symbol: {symbol}"),
            ));
        }
        symbols.push(symbol);
    }
    Ok(symbols)
}

fn parse_or<T>(config: &dyn ConfigPort, section: &str, key: &str, default: T) -> Result<T, TrendvolError>
where
    T: FromStr,
{
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            TrendvolError::config_invalid(section, key, format!("cannot parse '{}'", raw.trim()))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn valid_strategy_config_passes() {
        let config = make_config(
            r#"
[strategy]
fast_span = 10
slow_span = 50
vol_lookback = 30
target_vol = 0.10
max_leverage = 3.0
transaction_cost_bps = 2.5
periods_per_year = 365
signal_mode = long_only
"#,
        );
        let strategy = load_strategy_config(&config).unwrap();
        assert_eq!(strategy.fast_span, 10);
        assert_eq!(strategy.slow_span, 50);
        assert_eq!(strategy.vol_lookback, 30);
        assert!((strategy.target_vol - 0.10).abs() < f64::EPSILON);
        assert!((strategy.max_leverage - 3.0).abs() < f64::EPSILON);
        assert!((strategy.transaction_cost_bps - 2.5).abs() < f64::EPSILON);
        assert_eq!(strategy.periods_per_year, 365);
        assert_eq!(strategy.signal_mode, SignalMode::LongOnly);
    }

    #[test]
    fn missing_section_uses_defaults() {
        let config = make_config("[data]\ndir = /tmp\n");
        assert_eq!(load_strategy_config(&config).unwrap(), StrategyConfig::default());
        assert_eq!(
            load_walk_forward_config(&config).unwrap(),
            WalkForwardConfig::default()
        );
    }

    #[test]
    fn fast_not_below_slow_fails() {
        let config = make_config("[strategy]\nfast_span = 50\nslow_span = 10\n");
        let err = load_strategy_config(&config).unwrap_err();
        assert!(matches!(err, TrendvolError::ConfigInvalid { key, .. } if key == "slow_span"));
    }

    #[test]
    fn non_numeric_value_is_rejected_not_defaulted() {
        let config = make_config("[strategy]\nvol_lookback = twenty\n");
        let err = load_strategy_config(&config).unwrap_err();
        assert!(matches!(err, TrendvolError::ConfigInvalid { key, .. } if key == "vol_lookback"));
    }

    #[test]
    fn negative_span_is_rejected() {
        let config = make_config("[strategy]\nfast_span = -3\n");
        let err = load_strategy_config(&config).unwrap_err();
        assert!(matches!(err, TrendvolError::ConfigInvalid { key, .. } if key == "fast_span"));
    }

    #[test]
    fn negative_cost_fails() {
        let config = make_config("[strategy]\ntransaction_cost_bps = -1\n");
        let err = load_strategy_config(&config).unwrap_err();
        assert!(
            matches!(err, TrendvolError::ConfigInvalid { key, .. } if key == "transaction_cost_bps")
        );
    }

    #[test]
    fn unknown_signal_mode_fails() {
        let config = make_config("[strategy]\nsignal_mode = sideways\n");
        let err = load_strategy_config(&config).unwrap_err();
        assert!(matches!(err, TrendvolError::ConfigInvalid { key, .. } if key == "signal_mode"));
    }

    #[test]
    fn walk_forward_values_read() {
        let config = make_config("[walk_forward]\ntrain_window = 100\ntest_window = 20\nstep = 10\n");
        let wf = load_walk_forward_config(&config).unwrap();
        assert_eq!(
            wf,
            WalkForwardConfig {
                train_window: 100,
                test_window: 20,
                step: 10
            }
        );
    }

    #[test]
    fn walk_forward_zero_window_fails() {
        let config = make_config("[walk_forward]\ntest_window = 0\n");
        let err = load_walk_forward_config(&config).unwrap_err();
        assert!(matches!(err, TrendvolError::ConfigInvalid { key, .. } if key == "test_window"));
    }

    #[test]
    fn portfolio_target_vol_defaults_to_strategy() {
        let config = make_config("[strategy]\ntarget_vol = 0.2\n[portfolio]\nrebalance_interval = 5\n");
        let strategy = load_strategy_config(&config).unwrap();
        let portfolio = load_portfolio_config(&config, &strategy).unwrap();
        assert!((portfolio.target_vol - 0.2).abs() < f64::EPSILON);
        assert_eq!(portfolio.rebalance_interval, 5);
    }

    #[test]
    fn data_config_reads_columns() {
        let config = make_config("[data]\ndir = /srv/prices\nprice_column = Adj Close\n");
        let data = load_data_config(&config).unwrap();
        assert_eq!(data.dir, PathBuf::from("/srv/prices"));
        assert_eq!(data.price_column, "Adj Close");
        assert_eq!(data.date_column, "date");
    }

    #[test]
    fn portfolio_symbols_optional() {
        assert!(load_portfolio_symbols(&make_config("[strategy]\n")).unwrap().is_empty());
        let config = make_config("[portfolio]\nsymbols = spy, tlt\n");
        assert_eq!(load_portfolio_symbols(&config).unwrap(), vec!["SPY", "TLT"]);
    }

    #[test]
    fn unknown_keys_are_reported() {
        let config = make_config("[strategy]\nfast_span = 5\nfast_spam = 6\n[other]\nx = 1\n");
        assert_eq!(
            unknown_keys(&config),
            vec![("strategy".to_string(), "fast_spam".to_string())]
        );
    }

    #[test]
    fn parse_symbols_normalizes() {
        assert_eq!(parse_symbols(" spy, qqq ,TLT").unwrap(), vec!["SPY", "QQQ", "TLT"]);
    }

    #[test]
    fn parse_symbols_rejects_duplicates_and_gaps() {
        assert!(parse_symbols("SPY,spy").is_err());
        assert!(parse_symbols("SPY,,QQQ").is_err());
    }
}
