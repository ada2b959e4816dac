//! Core domain types and logic.

pub mod backtest;
pub mod config;
pub mod config_validation;
pub mod cost;
pub mod error;
pub mod indicator;
pub mod metrics;
pub mod price_series;
pub mod risk_parity;
pub mod screening;
pub mod signal;
pub mod sizing;
pub mod walk_forward;
