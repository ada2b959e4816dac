//! CSV file price feed.
//!
//! One file per symbol, `<dir>/<SYMBOL>.csv`, with a header row. The date and
//! price columns are located by name (case-insensitive); other columns are
//! ignored. Rows are kept in file order so ordering problems surface as
//! integrity errors instead of being silently repaired.

use crate::domain::config::DataConfig;
use crate::domain::error::TrendvolError;
use crate::domain::price_series::{PricePoint, PriceSeries};
use crate::ports::price_feed::PriceFeed;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

pub struct CsvPriceFeed {
    base_path: PathBuf,
    date_column: String,
    price_column: String,
}

impl CsvPriceFeed {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            date_column: "date".to_string(),
            price_column: "close".to_string(),
        }
    }

    pub fn from_config(config: &DataConfig) -> Self {
        Self {
            base_path: config.dir.clone(),
            date_column: config.date_column.clone(),
            price_column: config.price_column.clone(),
        }
    }

    pub fn with_columns(mut self, date_column: &str, price_column: &str) -> Self {
        self.date_column = date_column.to_string();
        self.price_column = price_column.to_string();
        self
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| NaiveDate::parse_from_str(raw, "%m/%d/%Y").ok())
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

impl PriceFeed for CsvPriceFeed {
    fn fetch(&self, symbol: &str) -> Result<PriceSeries, TrendvolError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| TrendvolError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| TrendvolError::DataSource {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();

        let date_idx = column_index(&headers, &self.date_column).ok_or_else(|| {
            TrendvolError::DataSource {
                reason: format!("{} has no '{}' column", path.display(), self.date_column),
            }
        })?;
        let price_idx = column_index(&headers, &self.price_column).ok_or_else(|| {
            TrendvolError::DataSource {
                reason: format!("{} has no '{}' column", path.display(), self.price_column),
            }
        })?;

        let mut points = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| TrendvolError::DataSource {
                reason: format!("CSV parse error in {} row {}: {}", path.display(), row + 1, e),
            })?;

            let date_str = record.get(date_idx).unwrap_or_default();
            let date = parse_date(date_str).ok_or_else(|| TrendvolError::DataSource {
                reason: format!("invalid date '{}' in {} row {}", date_str, path.display(), row + 1),
            })?;

            let price_str = record.get(price_idx).unwrap_or_default().trim();
            let price: f64 = price_str.parse().map_err(|e| TrendvolError::DataSource {
                reason: format!(
                    "invalid {} value '{}' in {} row {}: {}",
                    self.price_column,
                    price_str,
                    path.display(),
                    row + 1,
                    e
                ),
            })?;

            points.push(PricePoint { date, price });
        }

        debug!(symbol = symbol, rows = points.len(), path = %path.display(), "loaded price file");
        PriceSeries::new(symbol, points)
    }

    fn list_symbols(&self) -> Result<Vec<String>, TrendvolError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TrendvolError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| TrendvolError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().to_string());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
