//! In-memory order executor. Fills every target immediately and keeps a
//! ledger of what was submitted.

use crate::domain::error::TrendvolError;
use crate::ports::order_port::{OrderAck, OrderExecutor, TargetPosition};
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Default)]
pub struct PaperExecutor {
    positions: HashMap<String, f64>,
    submitted: Vec<TargetPosition>,
    max_abs_position: Option<f64>,
}

impl PaperExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject targets whose absolute exposure exceeds `limit`.
    pub fn with_limit(limit: f64) -> Self {
        Self {
            max_abs_position: Some(limit),
            ..Self::default()
        }
    }

    pub fn submitted(&self) -> &[TargetPosition] {
        &self.submitted
    }
}

impl OrderExecutor for PaperExecutor {
    fn submit(&mut self, target: &TargetPosition) -> Result<OrderAck, TrendvolError> {
        if !target.position.is_finite() {
            return Err(TrendvolError::Execution {
                reason: format!("non-finite target {} for {}", target.position, target.symbol),
            });
        }
        if let Some(limit) = self.max_abs_position {
            if target.position.abs() > limit {
                return Err(TrendvolError::Execution {
                    reason: format!(
                        "target {:.4} for {} exceeds limit {:.4}",
                        target.position, target.symbol, limit
                    ),
                });
            }
        }

        let delta = target.position - self.current_position(&target.symbol);
        self.positions.insert(target.symbol.clone(), target.position);
        self.submitted.push(target.clone());

        info!(
            symbol = %target.symbol,
            as_of = %target.as_of,
            target = target.position,
            delta,
            "paper order filled"
        );

        Ok(OrderAck {
            symbol: target.symbol.clone(),
            delta,
            accepted: true,
        })
    }

    fn current_position(&self, symbol: &str) -> f64 {
        self.positions.get(symbol).copied().unwrap_or(0.0)
    }
}
