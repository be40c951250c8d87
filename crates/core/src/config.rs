//! Configuration structures for the moneyflow pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Tier;

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Order aggregation and tier classification configuration.
    pub classification: ClassificationConfig,
    /// Tick synthesis configuration.
    pub synthesis: SynthesisConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            classification: ClassificationConfig::default(),
            synthesis: SynthesisConfig::default(),
        }
    }
}

impl Config {
    /// Validate all sections, failing on the first problem found.
    pub fn validate(&self) -> Result<()> {
        self.classification.validate()?;
        self.synthesis.validate()
    }
}

/// Amount cut points separating the order size tiers, largest first.
///
/// This is the single source of truth for tier boundaries; every consumer of
/// tier labels classifies through the same instance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierThresholds {
    /// Minimum amount for SuperLarge.
    pub super_large: f64,
    /// Minimum amount for Large.
    pub large: f64,
    /// Minimum amount for Medium.
    pub medium: f64,
    /// Minimum amount for Small; everything below is Mini.
    pub small: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            super_large: 3_000_000.0,
            large: 1_000_000.0,
            medium: 500_000.0,
            small: 300_000.0,
        }
    }
}

impl TierThresholds {
    /// Classify an order amount, first match from the top. Total over
    /// non-negative inputs; boundary amounts land in the larger tier.
    #[inline]
    pub fn classify(&self, amount: f64) -> Tier {
        if amount >= self.super_large {
            Tier::SuperLarge
        } else if amount >= self.large {
            Tier::Large
        } else if amount >= self.medium {
            Tier::Medium
        } else if amount >= self.small {
            Tier::Small
        } else {
            Tier::Mini
        }
    }
}

/// Order aggregation and tier classification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationConfig {
    /// Tier cut points.
    pub thresholds: TierThresholds,
    /// Minimum aggregated amount for a group to be kept as an order.
    pub min_order_amount: f64,
    /// Price granularity for grouping trades into levels.
    pub price_granularity: f64,
    /// Aggregation time window in seconds.
    pub time_window_secs: u32,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            thresholds: TierThresholds::default(),
            min_order_amount: 100_000.0,
            price_granularity: 0.1,
            time_window_secs: 60,
        }
    }
}

impl ClassificationConfig {
    /// Check that the five amount cut points are strictly decreasing and
    /// that the grouping knobs are usable.
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        let cuts = [
            t.super_large,
            t.large,
            t.medium,
            t.small,
            self.min_order_amount,
        ];
        for pair in cuts.windows(2) {
            // Comparing through ! also rejects NaN cut points.
            if !(pair[0] > pair[1]) {
                return Err(Error::config(format!(
                    "tier cut points must be strictly decreasing, got {:?}",
                    cuts
                )));
            }
        }
        if !(self.min_order_amount > 0.0) {
            return Err(Error::config("min_order_amount must be positive"));
        }
        if !(self.price_granularity > 0.0) || !self.price_granularity.is_finite() {
            return Err(Error::config("price_granularity must be positive and finite"));
        }
        if self.time_window_secs == 0 {
            return Err(Error::config("time_window_secs must be at least 1"));
        }
        Ok(())
    }
}

/// Tick synthesis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Hard cap on synthetic trades per bar.
    pub max_trades_per_bar: u32,
    /// Minimum synthetic trades per bar.
    pub min_trades_per_bar: u32,
    /// Lots represented by one base trade in the count estimate.
    pub volume_per_trade: u64,
    /// Weight of the relative bar range in the count estimate.
    pub volatility_scale: f64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_trades_per_bar: 50,
            min_trades_per_bar: 5,
            volume_per_trade: 50,
            volatility_scale: 500.0,
        }
    }
}

impl SynthesisConfig {
    /// Check the trade-count knobs form a usable range.
    pub fn validate(&self) -> Result<()> {
        if self.min_trades_per_bar == 0 {
            return Err(Error::config("min_trades_per_bar must be at least 1"));
        }
        if self.max_trades_per_bar < self.min_trades_per_bar {
            return Err(Error::config(format!(
                "max_trades_per_bar ({}) must be >= min_trades_per_bar ({})",
                self.max_trades_per_bar, self.min_trades_per_bar
            )));
        }
        if self.volume_per_trade == 0 {
            return Err(Error::config("volume_per_trade must be at least 1"));
        }
        if !self.volatility_scale.is_finite() || self.volatility_scale < 0.0 {
            return Err(Error::config("volatility_scale must be finite and non-negative"));
        }
        Ok(())
    }
}
