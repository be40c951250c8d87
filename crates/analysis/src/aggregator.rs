//! Order aggregation from synthetic trades.
//!
//! Trades landing in the same time window, price level and direction are
//! merged into order candidates; only groups whose total amount clears the
//! configured minimum survive as orders.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveTime;
use moneyflow_core::{
    time_to_bucket, ClassificationConfig, Order, SyntheticTrade, TradeDirection,
};
use ordered_float::OrderedFloat;
use tracing::debug;

/// Grouping key: (window start, snapped price level, direction label).
type GroupKey = (NaiveTime, OrderedFloat<f64>, TradeDirection);

/// Accumulator for one trade group.
#[derive(Debug, Clone, Default)]
struct GroupAccumulator {
    first_time: Option<NaiveTime>,
    volume: u64,
    amount: f64,
    vwap_numerator: f64,
    buy_amount: f64,
    sell_amount: f64,
    neutral_amount: f64,
    buy_count: u32,
    sell_count: u32,
    neutral_count: u32,
}

impl GroupAccumulator {
    fn add(&mut self, trade: &SyntheticTrade) {
        self.first_time = Some(match self.first_time {
            Some(t) => t.min(trade.time),
            None => trade.time,
        });
        self.volume += trade.volume;
        self.amount += trade.amount;
        self.vwap_numerator += trade.price * trade.volume as f64;
        match trade.direction {
            TradeDirection::Buy => {
                self.buy_amount += trade.amount;
                self.buy_count += 1;
            }
            TradeDirection::Sell => {
                self.sell_amount += trade.amount;
                self.sell_count += 1;
            }
            TradeDirection::Neutral => {
                self.neutral_amount += trade.amount;
                self.neutral_count += 1;
            }
        }
    }

    fn member_count(&self) -> u32 {
        self.buy_count + self.sell_count + self.neutral_count
    }

    fn to_order(&self, bucket: NaiveTime, level: f64) -> Order {
        let direction =
            dominant_direction(self.buy_amount, self.sell_amount, self.neutral_amount);
        let members = self.member_count();
        let matching = match direction {
            TradeDirection::Buy => self.buy_count,
            TradeDirection::Sell => self.sell_count,
            TradeDirection::Neutral => self.neutral_count,
        };
        let confidence = if members > 0 {
            matching as f64 / members as f64
        } else {
            0.0
        };
        let price = if self.volume > 0 {
            round2(self.vwap_numerator / self.volume as f64)
        } else {
            0.0
        };

        Order {
            key: format!(
                "{}_{:.2}_{}",
                bucket.format("%H:%M:%S"),
                level,
                direction.as_str()
            ),
            time: self.first_time.unwrap_or(bucket),
            price,
            volume: self.volume,
            amount: self.amount,
            direction,
            confidence,
            trade_count: members,
        }
    }
}

/// Dominant direction from per-label amounts. Exact ties resolve by the
/// fixed priority Buy, then Sell, then Neutral.
fn dominant_direction(buy: f64, sell: f64, neutral: f64) -> TradeDirection {
    if buy >= sell && buy >= neutral {
        TradeDirection::Buy
    } else if sell >= neutral {
        TradeDirection::Sell
    } else {
        TradeDirection::Neutral
    }
}

#[inline]
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Groups synthetic trades into orders.
pub struct OrderAggregator {
    config: ClassificationConfig,
}

impl OrderAggregator {
    /// Create an aggregator over the given grouping knobs.
    pub fn new(config: &ClassificationConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Group trades and keep the groups whose amount clears the minimum.
    /// Orders come back sorted by time ascending, then amount descending.
    pub fn aggregate(&self, trades: &[SyntheticTrade]) -> Vec<Order> {
        let mut groups: BTreeMap<GroupKey, GroupAccumulator> = BTreeMap::new();
        for trade in trades {
            groups
                .entry(self.group_key(trade))
                .or_default()
                .add(trade);
        }

        let mut orders: Vec<Order> = groups
            .into_iter()
            .filter(|(_, acc)| acc.amount >= self.config.min_order_amount)
            .map(|((bucket, level, _), acc)| acc.to_order(bucket, level.into_inner()))
            .collect();

        orders.sort_by(|a, b| {
            a.time
                .cmp(&b.time)
                .then_with(|| b.amount.partial_cmp(&a.amount).unwrap_or(Ordering::Equal))
        });

        debug!("kept {} orders from {} trades", orders.len(), trades.len());
        orders
    }

    fn group_key(&self, trade: &SyntheticTrade) -> GroupKey {
        let bucket = time_to_bucket(trade.time, self.config.time_window_secs);
        let level =
            (trade.price / self.config.price_granularity).round() * self.config.price_granularity;
        (bucket, OrderedFloat(level), trade.direction)
    }
}
