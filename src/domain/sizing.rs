//! Volatility-targeted position sizing.
//!
//! position = clamp(direction * target_vol / max(vol, VOL_FLOOR), ±max_leverage)

use crate::domain::config::{StrategyConfig, VOL_FLOOR};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSizer {
    pub target_vol: f64,
    pub max_leverage: f64,
}

impl PositionSizer {
    pub fn new(target_vol: f64, max_leverage: f64) -> Self {
        Self {
            target_vol,
            max_leverage,
        }
    }

    pub fn from_config(config: &StrategyConfig) -> Self {
        Self::new(config.target_vol, config.max_leverage)
    }

    /// Unsigned leverage for a volatility estimate, capped at `max_leverage`.
    /// A non-finite estimate gives no exposure.
    pub fn leverage(&self, vol: f64) -> f64 {
        if !vol.is_finite() {
            return 0.0;
        }
        let raw = self.target_vol / vol.max(VOL_FLOOR);
        if raw.is_finite() {
            raw.min(self.max_leverage)
        } else {
            0.0
        }
    }

    /// Signed target position. `None` inputs (warm-up) give zero exposure.
    pub fn size(&self, direction: Option<f64>, vol: Option<f64>) -> f64 {
        match (direction, vol) {
            (Some(d), Some(v)) if d.is_finite() => {
                let position = d * self.leverage(v);
                position.clamp(-self.max_leverage, self.max_leverage)
            }
            _ => 0.0,
        }
    }
}
