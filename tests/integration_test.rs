//! End-to-end scenarios across the single-asset, walk-forward and portfolio
//! pipelines.

mod common;

use approx::assert_relative_eq;
use common::*;
use std::collections::BTreeMap;
use trendvol::domain::backtest::Backtester;
use trendvol::domain::config::{PortfolioConfig, StrategyConfig, WalkForwardConfig};
use trendvol::domain::error::TrendvolError;
use trendvol::domain::indicator::volatility::rolling_volatility;
use trendvol::domain::metrics::PerformanceSummary;
use trendvol::domain::price_series::{PriceSeries, ReturnSeries};
use trendvol::domain::risk_parity::RiskParityAllocator;
use trendvol::domain::signal::Signal;
use trendvol::domain::walk_forward::WalkForwardValidator;

mod single_asset {
    use super::*;

    #[test]
    fn flat_prices_never_leave_warmup() {
        let config = StrategyConfig {
            fast_span: 10,
            slow_span: 100,
            ..StrategyConfig::default()
        };
        let series = make_series("FLAT", &flat_prices(100, 50.0));
        let result = Backtester::new(config).unwrap().run(&series).unwrap();

        assert!((0..100).all(|t| result.trend.at(t).is_none()));
        assert!(result.steps.is_empty());
        assert_eq!(result.summary.total_return, 0.0);
        assert_eq!(result.summary.annualized_volatility, 0.0);
        assert_eq!(result.summary.sharpe_ratio, 0.0);
        assert_eq!(result.summary.max_drawdown, 0.0);
    }

    #[test]
    fn flat_prices_after_warmup_report_zero_without_nan() {
        let config = StrategyConfig {
            transaction_cost_bps: 0.0,
            ..small_strategy()
        };
        let series = make_series("FLAT", &flat_prices(100, 50.0));
        let result = Backtester::new(config).unwrap().run(&series).unwrap();

        assert!(!result.steps.is_empty());
        assert_eq!(result.summary.total_return, 0.0);
        assert_eq!(result.summary.annualized_volatility, 0.0);
        assert_eq!(result.summary.sharpe_ratio, 0.0);
        assert_eq!(result.summary.max_drawdown, 0.0);
        // zero volatility is floored, so exposure saturates at the cap
        for p in &result.positions {
            assert!(p.abs() <= 2.0);
        }
    }

    #[test]
    fn monotonic_rise_is_long_with_no_drawdown() {
        let config = StrategyConfig {
            fast_span: 10,
            slow_span: 50,
            target_vol: 0.15,
            max_leverage: 2.0,
            transaction_cost_bps: 0.0,
            ..StrategyConfig::default()
        };
        let series = make_series("UP", &rising_prices(300, 100.0, 200.0));
        let result = Backtester::new(config).unwrap().run(&series).unwrap();

        for t in 50..300 {
            assert_eq!(result.trend.at(t), Some(Signal::Long), "signal at {t}");
            assert_eq!(result.positions[t], 2.0, "position at {t}");
        }
        assert!(result.summary.annualized_return > 0.0);
        assert_eq!(result.summary.max_drawdown, 0.0);
        assert_eq!(result.summary.max_drawdown_duration, 0);
    }

    #[test]
    fn costs_reduce_returns() {
        let prices = wavy_prices(200, 0.001, 0.03, 0.0);
        let series = make_series("W", &prices);
        let free = StrategyConfig {
            transaction_cost_bps: 0.0,
            ..small_strategy()
        };
        let costly = StrategyConfig {
            transaction_cost_bps: 25.0,
            ..small_strategy()
        };
        let a = Backtester::new(free).unwrap().run(&series).unwrap();
        let b = Backtester::new(costly).unwrap().run(&series).unwrap();

        assert_eq!(a.positions, b.positions);
        assert!(b.summary.total_return < a.summary.total_return);
    }

    #[test]
    fn short_history_is_an_error_not_an_empty_result() {
        let series = make_series("S", &flat_prices(15, 10.0));
        let err = Backtester::new(small_strategy()).unwrap().run(&series).unwrap_err();
        assert!(matches!(
            err,
            TrendvolError::InsufficientData {
                required: 20,
                available: 15,
                ..
            }
        ));
        assert_eq!(err.kind(), "InsufficientDataError");
    }

    #[test]
    fn malformed_prices_rejected_at_ingestion() {
        let mut points = make_points(&[10.0, 11.0, 12.0]);
        points[2].date = points[0].date;
        let err = PriceSeries::new("BAD", points).unwrap_err();
        assert!(matches!(err, TrendvolError::NonMonotonicTimestamp { index: 2, .. }));
        assert_eq!(err.kind(), "DataIntegrityError");

        let err = PriceSeries::new("BAD", make_points(&[10.0, -1.0])).unwrap_err();
        assert!(matches!(err, TrendvolError::NonPositivePrice { index: 1, .. }));
    }

    #[test]
    fn zero_return_sequence_has_defined_metrics() {
        let summary = PerformanceSummary::compute(&[0.0; 50], 252);
        assert_eq!(summary.sharpe_ratio, 0.0);
        assert_eq!(summary.max_drawdown, 0.0);
        assert!(!summary.annualized_return.is_nan());
    }
}

mod walk_forward {
    use super::*;

    #[test]
    fn windows_report_out_of_sample_only() {
        let series = make_series("WF", &wavy_prices(400, 0.0005, 0.05, 0.3));
        let wf = WalkForwardConfig {
            train_window: 120,
            test_window: 40,
            step: 40,
        };
        let result = WalkForwardValidator::new(small_strategy(), wf)
            .unwrap()
            .run(&series)
            .unwrap();

        // floor((400 - 160) / 40) + 1
        assert_eq!(result.windows.len(), 7);
        for w in &result.windows {
            assert_eq!(w.test.periods, 40);
            assert!(w.window.test_end <= 400);
            assert!(w.test_start_date > w.train_start_date);
        }
        assert_eq!(result.aggregate.windows, 7);
        assert!(result.aggregate.positive_windows <= 7);
    }

    #[test]
    fn test_window_matches_full_run_over_same_dates() {
        let prices = wavy_prices(300, 0.0005, 0.05, 1.1);
        let series = make_series("WF", &prices);
        let wf = WalkForwardConfig {
            train_window: 100,
            test_window: 50,
            step: 50,
        };
        let strategy = small_strategy();
        let result = WalkForwardValidator::new(strategy.clone(), wf)
            .unwrap()
            .run(&series)
            .unwrap();

        let first = &result.windows[0];
        let history = series.slice(0, first.window.test_end).unwrap();
        let full = Backtester::new(strategy).unwrap().run(&history).unwrap();
        let test_returns: Vec<f64> = full
            .steps
            .iter()
            .filter(|s| s.index >= first.window.test_start)
            .map(|s| s.realized_return)
            .collect();
        let expected = PerformanceSummary::compute(&test_returns, 252);
        assert_relative_eq!(first.test.total_return, expected.total_return, epsilon = 1e-12);
        assert_relative_eq!(first.test.sharpe_ratio, expected.sharpe_ratio, epsilon = 1e-12);
    }

    #[test]
    fn series_shorter_than_one_window_is_error() {
        let series = make_series("WF", &wavy_prices(100, 0.0, 0.05, 0.0));
        let err = WalkForwardValidator::new(small_strategy(), WalkForwardConfig::default())
            .unwrap()
            .run(&series)
            .unwrap_err();
        assert!(matches!(
            err,
            TrendvolError::InsufficientData {
                required: 315,
                available: 100,
                ..
            }
        ));
    }
}

mod portfolio {
    use super::*;

    fn alternating(n: usize, amplitude: f64) -> ReturnSeries {
        let points = make_points(&vec![1.0; n]);
        ReturnSeries::new(
            points.iter().map(|p| p.date).collect(),
            (0..n)
                .map(|i| if i % 2 == 0 { amplitude } else { -amplitude })
                .collect(),
        )
    }

    #[test]
    fn inverse_volatility_ratio_is_two_to_one() {
        let a = 0.10 / 252f64.sqrt();
        let asset_a = alternating(120, a);
        let asset_b = alternating(120, 2.0 * a);

        let vol_a = rolling_volatility(&asset_a.values, 20, 252);
        let vol_b = rolling_volatility(&asset_b.values, 20, 252);
        assert_relative_eq!(vol_a[50].unwrap(), 0.10, epsilon = 1e-12);
        assert_relative_eq!(vol_b[50].unwrap(), 0.20, epsilon = 1e-12);

        let streams = BTreeMap::from([("A".to_string(), asset_a), ("B".to_string(), asset_b)]);
        let result = RiskParityAllocator::new(&StrategyConfig::default(), &PortfolioConfig::default())
            .unwrap()
            .allocate(&streams)
            .unwrap();

        assert_eq!(result.steps.len(), 120 - 40);
        for step in &result.steps {
            assert_relative_eq!(step.weights["A"], 2.0 / 3.0, epsilon = 1e-12);
            assert_relative_eq!(step.weights["B"], 1.0 / 3.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn strategy_streams_combine_into_portfolio() {
        let strategy = small_strategy();
        let backtester = Backtester::new(strategy.clone()).unwrap();
        let streams: BTreeMap<String, ReturnSeries> = [("X", 0.0), ("Y", 1.7), ("Z", 3.1)]
            .iter()
            .map(|(symbol, phase)| {
                let series = make_series(symbol, &wavy_prices(250, 0.0008, 0.04, *phase));
                let result = backtester.run(&series).unwrap();
                (symbol.to_string(), result.return_series())
            })
            .collect();

        let result = RiskParityAllocator::new(&strategy, &PortfolioConfig::default())
            .unwrap()
            .allocate(&streams)
            .unwrap();

        assert!(!result.steps.is_empty());
        assert_eq!(result.equity_curve.len(), result.steps.len() + 1);
        assert_eq!(result.equity_curve[0].equity, 1.0);
        for step in &result.steps {
            assert_relative_eq!(step.weights.values().sum::<f64>(), 1.0, epsilon = 1e-9);
            assert!(step.leverage <= strategy.max_leverage);
        }
        assert_eq!(result.target_weights.len(), 3);
    }

    #[test]
    fn misaligned_assets_rejected() {
        let a = alternating(60, 0.01);
        let mut b = alternating(60, 0.02);
        b.dates.remove(10);
        b.values.remove(10);
        let streams = BTreeMap::from([("A".to_string(), a), ("B".to_string(), b)]);
        let err = RiskParityAllocator::new(&StrategyConfig::default(), &PortfolioConfig::default())
            .unwrap()
            .allocate(&streams)
            .unwrap_err();
        assert!(matches!(err, TrendvolError::MisalignedSeries { .. }));
        assert_eq!(err.kind(), "DataIntegrityError");
    }
}
