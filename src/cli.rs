//! CLI definition and dispatch.
//!
//! Each command loads configuration, builds the adapters and hands off to a
//! pipeline function that only sees port traits, so the pipelines can be
//! driven with in-memory collaborators.

use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::adapters::csv_adapter::CsvPriceFeed;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::paper_executor::PaperExecutor;
use crate::adapters::text_report::TextReport;
use crate::domain::backtest::Backtester;
use crate::domain::config::{PortfolioConfig, StrategyConfig, WalkForwardConfig};
use crate::domain::config_validation::{
    load_data_config, load_portfolio_config, load_portfolio_symbols, load_strategy_config,
    load_walk_forward_config, parse_symbols, unknown_keys,
};
use crate::domain::error::TrendvolError;
use crate::domain::price_series::ReturnSeries;
use crate::domain::risk_parity::RiskParityAllocator;
use crate::domain::screening::{self, ScreenCriteria};
use crate::domain::walk_forward::WalkForwardValidator;
use crate::ports::config_port::ConfigPort;
use crate::ports::order_port::{OrderAck, OrderExecutor, TargetPosition};
use crate::ports::price_feed::PriceFeed;
use crate::ports::report_port::ReportPort;

/// Trend-following backtester with volatility-targeted sizing.
#[derive(Parser, Debug)]
#[command(name = "trendvol", version, about)]
pub struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest one symbol over its full history
    Backtest {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        symbol: String,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Rolling out-of-sample validation for one symbol
    WalkForward {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        symbol: String,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Risk-parity combination of per-symbol strategies
    Portfolio {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Comma-separated; overrides [portfolio] symbols
        #[arg(long)]
        symbols: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Rank symbols by composite score
    Rank {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Comma-separated; defaults to [portfolio] symbols, then every file in the data dir
        #[arg(long)]
        symbols: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Only show symbols that pass the screen
        #[arg(long)]
        passing_only: bool,
    },
    /// Compute the latest target position and hand it to the paper executor
    Target {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        symbol: String,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
}

impl Cli {
    /// Install the stderr log subscriber. Safe to call more than once.
    pub fn init_logging(&self) {
        let level = match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            symbol,
            data_dir,
        } => run_backtest(config.as_ref(), &symbol, data_dir),
        Command::WalkForward {
            config,
            symbol,
            data_dir,
        } => run_walk_forward(config.as_ref(), &symbol, data_dir),
        Command::Portfolio {
            config,
            symbols,
            data_dir,
        } => run_portfolio(config.as_ref(), symbols.as_deref(), data_dir),
        Command::Rank {
            config,
            symbols,
            data_dir,
            passing_only,
        } => run_rank(config.as_ref(), symbols.as_deref(), data_dir, passing_only),
        Command::Target {
            config,
            symbol,
            data_dir,
        } => run_target(config.as_ref(), &symbol, data_dir),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config, data_dir } => run_list_symbols(config.as_ref(), data_dir),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error [{}]: {e}", e.kind());
            (&e).into()
        }
    }
}

/// Load an INI file, or an empty configuration when no path is given.
pub fn load_config(path: Option<&PathBuf>) -> Result<FileConfigAdapter, TrendvolError> {
    match path {
        None => Ok(FileConfigAdapter::empty()),
        Some(path) => {
            info!(path = %path.display(), "loading config");
            let config = FileConfigAdapter::from_file(path)?;
            for (section, key) in unknown_keys(&config) {
                warn!(section = %section, key = %key, "ignoring unknown config key");
            }
            Ok(config)
        }
    }
}

/// CSV feed from `[data]`, with the data directory optionally overridden.
pub fn build_feed(
    config: &dyn ConfigPort,
    data_dir: Option<PathBuf>,
) -> Result<CsvPriceFeed, TrendvolError> {
    let mut data = load_data_config(config)?;
    if let Some(dir) = data_dir {
        data.dir = dir;
    }
    Ok(CsvPriceFeed::from_config(&data))
}

/// Explicit list first, then `[portfolio] symbols`.
pub fn resolve_symbols(
    symbols_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, TrendvolError> {
    match symbols_override {
        Some(list) => parse_symbols(list),
        None => load_portfolio_symbols(config),
    }
}

pub fn backtest_pipeline(
    feed: &dyn PriceFeed,
    strategy: &StrategyConfig,
    symbol: &str,
    report: &dyn ReportPort,
) -> Result<String, TrendvolError> {
    let series = feed.fetch(symbol)?;
    info!(symbol = symbol, prices = series.len(), "running backtest");
    let result = Backtester::new(strategy.clone())?.run(&series)?;
    report.backtest(&result)
}

pub fn walk_forward_pipeline(
    feed: &dyn PriceFeed,
    strategy: &StrategyConfig,
    walk_forward: &WalkForwardConfig,
    symbol: &str,
    report: &dyn ReportPort,
) -> Result<String, TrendvolError> {
    let series = feed.fetch(symbol)?;
    let validator = WalkForwardValidator::new(strategy.clone(), walk_forward.clone())?;
    let result = validator.run(&series)?;
    report.walk_forward(&result)
}

/// Backtest every symbol, then allocate across their realized returns.
/// Price histories must share dates so the return streams align.
pub fn portfolio_pipeline(
    feed: &dyn PriceFeed,
    strategy: &StrategyConfig,
    portfolio: &PortfolioConfig,
    symbols: &[String],
    report: &dyn ReportPort,
) -> Result<String, TrendvolError> {
    if symbols.is_empty() {
        return Err(TrendvolError::ConfigMissing {
            section: "portfolio".to_string(),
            key: "symbols".to_string(),
        });
    }

    let series = symbols
        .iter()
        .map(|s| feed.fetch(s))
        .collect::<Result<Vec<_>, _>>()?;

    let backtester = Backtester::new(strategy.clone())?;
    let streams = series
        .par_iter()
        .map(|s| {
            backtester
                .run(s)
                .map(|r| (s.symbol().to_string(), r.return_series()))
        })
        .collect::<Result<BTreeMap<String, ReturnSeries>, _>>()?;

    info!(assets = streams.len(), "allocating risk-parity portfolio");
    let result = RiskParityAllocator::new(strategy, portfolio)?.allocate(&streams)?;
    report.portfolio(&result)
}

/// Screen and rank symbols. Symbols that cannot be loaded or backtested are
/// skipped with a warning.
pub fn rank_pipeline(
    feed: &dyn PriceFeed,
    strategy: &StrategyConfig,
    symbols: &[String],
    passing_only: bool,
    report: &dyn ReportPort,
) -> Result<String, TrendvolError> {
    let backtester = Backtester::new(strategy.clone())?;
    let criteria = ScreenCriteria::default();

    let mut analyses = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let result = feed.fetch(symbol).and_then(|s| backtester.run(&s));
        match result {
            Ok(r) => analyses.push(screening::analyze(&r, &criteria)),
            Err(e) => warn!(symbol = %symbol, error = %e, "skipping symbol"),
        }
    }

    let mut ranked = screening::rank(analyses);
    if passing_only {
        ranked.retain(|a| a.passes_screen);
    }
    report.ranking(&ranked)
}

/// Compute the latest target for `symbol` and submit it.
pub fn target_pipeline(
    feed: &dyn PriceFeed,
    strategy: &StrategyConfig,
    symbol: &str,
    executor: &mut dyn OrderExecutor,
) -> Result<OrderAck, TrendvolError> {
    let series = feed.fetch(symbol)?;
    let result = Backtester::new(strategy.clone())?.run(&series)?;
    let target = TargetPosition {
        symbol: symbol.to_string(),
        as_of: series.last().date,
        position: result.latest_position(),
    };
    executor.submit(&target)
}

fn run_backtest(
    config_path: Option<&PathBuf>,
    symbol: &str,
    data_dir: Option<PathBuf>,
) -> Result<(), TrendvolError> {
    let config = load_config(config_path)?;
    let strategy = load_strategy_config(&config)?;
    let feed = build_feed(&config, data_dir)?;
    let output = backtest_pipeline(&feed, &strategy, symbol, &TextReport)?;
    print!("{output}");
    Ok(())
}

fn run_walk_forward(
    config_path: Option<&PathBuf>,
    symbol: &str,
    data_dir: Option<PathBuf>,
) -> Result<(), TrendvolError> {
    let config = load_config(config_path)?;
    let strategy = load_strategy_config(&config)?;
    let walk_forward = load_walk_forward_config(&config)?;
    let feed = build_feed(&config, data_dir)?;
    let output = walk_forward_pipeline(&feed, &strategy, &walk_forward, symbol, &TextReport)?;
    print!("{output}");
    Ok(())
}

fn run_portfolio(
    config_path: Option<&PathBuf>,
    symbols: Option<&str>,
    data_dir: Option<PathBuf>,
) -> Result<(), TrendvolError> {
    let config = load_config(config_path)?;
    let strategy = load_strategy_config(&config)?;
    let portfolio = load_portfolio_config(&config, &strategy)?;
    let symbols = resolve_symbols(symbols, &config)?;
    let feed = build_feed(&config, data_dir)?;
    let output = portfolio_pipeline(&feed, &strategy, &portfolio, &symbols, &TextReport)?;
    print!("{output}");
    Ok(())
}

fn run_rank(
    config_path: Option<&PathBuf>,
    symbols: Option<&str>,
    data_dir: Option<PathBuf>,
    passing_only: bool,
) -> Result<(), TrendvolError> {
    let config = load_config(config_path)?;
    let strategy = load_strategy_config(&config)?;
    let feed = build_feed(&config, data_dir)?;
    let mut symbols = resolve_symbols(symbols, &config)?;
    if symbols.is_empty() {
        symbols = feed.list_symbols()?;
    }
    let output = rank_pipeline(&feed, &strategy, &symbols, passing_only, &TextReport)?;
    print!("{output}");
    Ok(())
}

fn run_target(
    config_path: Option<&PathBuf>,
    symbol: &str,
    data_dir: Option<PathBuf>,
) -> Result<(), TrendvolError> {
    let config = load_config(config_path)?;
    let strategy = load_strategy_config(&config)?;
    let feed = build_feed(&config, data_dir)?;
    let mut executor = PaperExecutor::with_limit(strategy.max_leverage);
    let ack = target_pipeline(&feed, &strategy, symbol, &mut executor)?;
    println!(
        "{} target={:.4} delta={:.4}",
        ack.symbol,
        executor.current_position(&ack.symbol),
        ack.delta
    );
    Ok(())
}

fn run_validate(config_path: &PathBuf) -> Result<(), TrendvolError> {
    let config = load_config(Some(config_path))?;
    let strategy = load_strategy_config(&config)?;
    let walk_forward = load_walk_forward_config(&config)?;
    let portfolio = load_portfolio_config(&config, &strategy)?;
    let symbols = load_portfolio_symbols(&config)?;
    let data = load_data_config(&config)?;
    WalkForwardValidator::new(strategy.clone(), walk_forward.clone())?;

    println!("[strategy]");
    println!("  fast_span = {}", strategy.fast_span);
    println!("  slow_span = {}", strategy.slow_span);
    println!("  vol_lookback = {}", strategy.vol_lookback);
    println!("  target_vol = {}", strategy.target_vol);
    println!("  max_leverage = {}", strategy.max_leverage);
    println!("  transaction_cost_bps = {}", strategy.transaction_cost_bps);
    println!("  periods_per_year = {}", strategy.periods_per_year);
    println!("  signal_mode = {}", strategy.signal_mode);
    println!("[walk_forward]");
    println!("  train_window = {}", walk_forward.train_window);
    println!("  test_window = {}", walk_forward.test_window);
    println!("  step = {}", walk_forward.step);
    println!("[portfolio]");
    println!("  target_vol = {}", portfolio.target_vol);
    println!("  rebalance_interval = {}", portfolio.rebalance_interval);
    println!("  symbols = {}", symbols.join(","));
    println!("[data]");
    println!("  dir = {}", data.dir.display());
    println!("  date_column = {}", data.date_column);
    println!("  price_column = {}", data.price_column);
    eprintln!("\nConfiguration is valid.");
    Ok(())
}

fn run_list_symbols(
    config_path: Option<&PathBuf>,
    data_dir: Option<PathBuf>,
) -> Result<(), TrendvolError> {
    let config = load_config(config_path)?;
    let feed = build_feed(&config, data_dir)?;
    let symbols = feed.list_symbols()?;
    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}
