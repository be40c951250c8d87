//! Per-tier order statistics and money flow rollups.

use moneyflow_core::{ClassificationConfig, FlowSummary, Order, TierStats, TradeDirection};

/// Rolls orders up into per-tier tallies and a session flow summary.
pub struct StatsEngine {
    config: ClassificationConfig,
}

impl StatsEngine {
    /// Create a stats engine over the given tier thresholds.
    pub fn new(config: &ClassificationConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Tally orders into the five size tiers and the buy/sell flow split.
    ///
    /// Every tier appears in the output even when it received no orders.
    /// Neutral orders contribute to no tally on either side.
    pub fn tally(&self, orders: &[Order]) -> ([TierStats; 5], FlowSummary) {
        let mut stats = TierStats::zeroed_all();
        let mut flow = FlowSummary::default();

        for order in orders {
            let tier = self.config.thresholds.classify(order.amount);
            let entry = &mut stats[tier.index()];

            match order.direction {
                TradeDirection::Buy => {
                    entry.buy_count += 1;
                    entry.buy_amount += order.amount;
                    flow.total_buy_amount += order.amount;
                    if tier.is_main_force() {
                        flow.main_force_buy += order.amount;
                    } else {
                        flow.retail_buy += order.amount;
                    }
                }
                TradeDirection::Sell => {
                    entry.sell_count += 1;
                    entry.sell_amount += order.amount;
                    flow.total_sell_amount += order.amount;
                    if tier.is_main_force() {
                        flow.main_force_sell += order.amount;
                    } else {
                        flow.retail_sell += order.amount;
                    }
                }
                TradeDirection::Neutral => {}
            }
        }

        (stats, flow)
    }

    /// Number of orders large enough to count as main force money.
    pub fn main_force_count(&self, orders: &[Order]) -> u32 {
        orders
            .iter()
            .filter(|o| self.config.thresholds.classify(o.amount).is_main_force())
            .count() as u32
    }
}
