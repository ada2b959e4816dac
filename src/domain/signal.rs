//! EMA crossover trend signal.
//!
//! At each index where both EMAs are valid (index >= slow span) the signal is
//! +1 when fast EMA > slow EMA, otherwise -1 (or 0 in long-only mode). Before
//! that the signal is undefined.

use crate::domain::config::{SignalMode, StrategyConfig};
use crate::domain::error::TrendvolError;
use crate::domain::indicator::IndicatorSeries;
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::price_series::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Long,
    Short,
    Flat,
}

impl Signal {
    pub fn direction(self) -> f64 {
        match self {
            Signal::Long => 1.0,
            Signal::Short => -1.0,
            Signal::Flat => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrendSignal {
    pub fast: IndicatorSeries,
    pub slow: IndicatorSeries,
    pub signals: Vec<Option<Signal>>,
}

impl TrendSignal {
    pub fn at(&self, index: usize) -> Option<Signal> {
        self.signals.get(index).copied().flatten()
    }

    /// Index of the first defined signal.
    pub fn first_defined(&self) -> Option<usize> {
        self.signals.iter().position(Option::is_some)
    }
}

#[derive(Debug, Clone)]
pub struct SignalEngine {
    fast_span: usize,
    slow_span: usize,
    mode: SignalMode,
}

impl SignalEngine {
    pub fn new(fast_span: usize, slow_span: usize, mode: SignalMode) -> Result<Self, TrendvolError> {
        if fast_span == 0 {
            return Err(TrendvolError::config_invalid(
                "strategy",
                "fast_span",
                "fast_span must be positive",
            ));
        }
        if fast_span >= slow_span {
            return Err(TrendvolError::config_invalid(
                "strategy",
                "slow_span",
                format!("slow_span ({slow_span}) must be greater than fast_span ({fast_span})"),
            ));
        }
        Ok(Self {
            fast_span,
            slow_span,
            mode,
        })
    }

    pub fn from_config(config: &StrategyConfig) -> Result<Self, TrendvolError> {
        Self::new(config.fast_span, config.slow_span, config.signal_mode)
    }

    pub fn compute(&self, series: &PriceSeries) -> TrendSignal {
        let fast = calculate_ema(series, self.fast_span);
        let slow = calculate_ema(series, self.slow_span);

        let signals = (0..series.len())
            .map(|t| match (fast.value_at(t), slow.value_at(t)) {
                (Some(f), Some(s)) => Some(self.classify(f, s)),
                _ => None,
            })
            .collect();

        TrendSignal {
            fast,
            slow,
            signals,
        }
    }

    fn classify(&self, fast: f64, slow: f64) -> Signal {
        if fast > slow {
            Signal::Long
        } else {
            match self.mode {
                SignalMode::LongShort => Signal::Short,
                SignalMode::LongOnly => Signal::Flat,
            }
        }
    }
}
