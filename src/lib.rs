//! trendvol: trend-following backtester with volatility-targeted sizing,
//! walk-forward validation and risk-parity allocation.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], command surface in [`cli`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
