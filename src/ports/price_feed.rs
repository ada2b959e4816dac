//! Price data access port.

use crate::domain::error::TrendvolError;
use crate::domain::price_series::PriceSeries;

pub trait PriceFeed {
    /// Full validated history for `symbol`, oldest first.
    fn fetch(&self, symbol: &str) -> Result<PriceSeries, TrendvolError>;

    /// Symbols this feed can serve.
    fn list_symbols(&self) -> Result<Vec<String>, TrendvolError>;
}
