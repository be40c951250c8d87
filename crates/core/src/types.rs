//! Core data types for the moneyflow pipeline.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Truncate a time-of-day to the start of its aggregation window.
#[inline]
pub fn time_to_bucket(t: NaiveTime, window_secs: u32) -> NaiveTime {
    let window = window_secs.max(1);
    let secs = t.num_seconds_from_midnight();
    let start = secs - secs % window;
    NaiveTime::from_num_seconds_from_midnight_opt(start, 0).unwrap_or(t)
}

/// Direction label attached to a synthetic trade or an aggregated order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(i8)]
pub enum TradeDirection {
    /// Buyer-initiated.
    Buy = 1,
    /// Seller-initiated.
    Sell = -1,
    /// No clear initiator.
    Neutral = 0,
}

impl TradeDirection {
    /// Get the sign as i8.
    #[inline]
    pub fn sign(self) -> i8 {
        self as i8
    }

    /// Get the sign as f64.
    #[inline]
    pub fn sign_f64(self) -> f64 {
        self.sign() as f64
    }

    /// Lowercase label used in order keys and wire output.
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            TradeDirection::Buy => "buy",
            TradeDirection::Sell => "sell",
            TradeDirection::Neutral => "neutral",
        }
    }

    /// Parse a provider direction flag. Feeds disagree on the encoding, so
    /// both letter and numeric codes are accepted; unknown codes are Neutral.
    pub fn from_flag(flag: &str) -> Self {
        match flag.trim().to_ascii_lowercase().as_str() {
            "buy" | "b" | "1" => TradeDirection::Buy,
            "sell" | "s" | "2" => TradeDirection::Sell,
            _ => TradeDirection::Neutral,
        }
    }
}

/// One normalized per-minute OHLCV bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    /// Bucket time-of-day.
    pub time: NaiveTime,
    /// Open price.
    pub open: f64,
    /// High price.
    pub high: f64,
    /// Low price.
    pub low: f64,
    /// Close price.
    pub close: f64,
    /// Traded volume in lots.
    pub volume: u64,
    /// Traded amount in currency units.
    pub amount: f64,
}

impl Bar {
    /// Representative price: mean of the four OHLC points.
    #[inline]
    pub fn avg_price(&self) -> f64 {
        (self.open + self.high + self.low + self.close) / 4.0
    }

    /// High-low range.
    #[inline]
    pub fn price_range(&self) -> f64 {
        self.high - self.low
    }

    /// Close-to-close return versus the previous bucket, 0 without a usable
    /// reference close.
    #[inline]
    pub fn momentum_from(&self, prev: Option<&Bar>) -> f64 {
        match prev {
            Some(p) if p.close > 0.0 => (self.close - p.close) / p.close,
            _ => 0.0,
        }
    }
}

/// A synthetic execution reconstructed from a bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntheticTrade {
    /// Execution time (bar minute plus a second offset).
    pub time: NaiveTime,
    /// Execution price.
    pub price: f64,
    /// Volume in lots, at least 1.
    pub volume: u64,
    /// Amount in currency units.
    pub amount: f64,
    /// Direction label.
    pub direction: TradeDirection,
}

/// An aggregated order candidate: nearby same-direction trades merged into
/// one record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Group id: `"<bucket>_<price level>_<direction>"`.
    pub key: String,
    /// Earliest member trade time.
    pub time: NaiveTime,
    /// Volume-weighted average price, rounded to 2 decimals.
    pub price: f64,
    /// Total member volume in lots.
    pub volume: u64,
    /// Total member amount.
    pub amount: f64,
    /// Dominant direction by member amount.
    pub direction: TradeDirection,
    /// Fraction of members labeled with the dominant direction.
    pub confidence: f64,
    /// Number of member trades.
    pub trade_count: u32,
}

/// Order size tier by total amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    /// At or above the super-large cut point.
    SuperLarge,
    /// At or above the large cut point.
    Large,
    /// At or above the medium cut point.
    Medium,
    /// At or above the small cut point.
    Small,
    /// Everything below the small cut point.
    Mini,
}

impl Tier {
    /// All tiers in report order, largest first.
    pub const ALL: [Tier; 5] = [
        Tier::SuperLarge,
        Tier::Large,
        Tier::Medium,
        Tier::Small,
        Tier::Mini,
    ];

    /// Position in the report order.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Tier::SuperLarge => 0,
            Tier::Large => 1,
            Tier::Medium => 2,
            Tier::Small => 3,
            Tier::Mini => 4,
        }
    }

    /// Wire code used by downstream dashboards.
    #[inline]
    pub fn code(self) -> &'static str {
        match self {
            Tier::SuperLarge => "D300",
            Tier::Large => "D100",
            Tier::Medium => "D50",
            Tier::Small => "D30",
            Tier::Mini => "D10",
        }
    }

    /// True for the tiers counted as institutional ("main force") flow.
    #[inline]
    pub fn is_main_force(self) -> bool {
        matches!(self, Tier::SuperLarge | Tier::Large | Tier::Medium)
    }
}

/// Buy/sell tallies for one tier. Neutral orders join neither side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TierStats {
    /// Tier being tallied.
    pub tier: Tier,
    /// Number of buy orders.
    pub buy_count: u32,
    /// Number of sell orders.
    pub sell_count: u32,
    /// Total buy amount.
    pub buy_amount: f64,
    /// Total sell amount.
    pub sell_amount: f64,
}

impl TierStats {
    /// Empty tallies for one tier.
    pub fn new(tier: Tier) -> Self {
        Self {
            tier,
            buy_count: 0,
            sell_count: 0,
            buy_amount: 0.0,
            sell_amount: 0.0,
        }
    }

    /// Zero-filled tallies for all five tiers in report order.
    pub fn zeroed_all() -> [TierStats; 5] {
        Tier::ALL.map(TierStats::new)
    }

    /// Net amount: buy minus sell.
    #[inline]
    pub fn net_flow(&self) -> f64 {
        self.buy_amount - self.sell_amount
    }

    /// Net order count: buy minus sell.
    #[inline]
    pub fn net_count(&self) -> i64 {
        self.buy_count as i64 - self.sell_count as i64
    }
}

/// Session-level money flow rollup split between institutional and retail
/// size tiers.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FlowSummary {
    /// Buy amount across all tiers.
    pub total_buy_amount: f64,
    /// Sell amount across all tiers.
    pub total_sell_amount: f64,
    /// Buy amount in main-force tiers.
    pub main_force_buy: f64,
    /// Sell amount in main-force tiers.
    pub main_force_sell: f64,
    /// Buy amount in retail tiers.
    pub retail_buy: f64,
    /// Sell amount in retail tiers.
    pub retail_sell: f64,
}

impl FlowSummary {
    /// Net amount across all tiers.
    #[inline]
    pub fn net_flow(&self) -> f64 {
        self.total_buy_amount - self.total_sell_amount
    }

    /// Net main-force amount.
    #[inline]
    pub fn main_force_net(&self) -> f64 {
        self.main_force_buy - self.main_force_sell
    }

    /// Net retail amount.
    #[inline]
    pub fn retail_net(&self) -> f64 {
        self.retail_buy - self.retail_sell
    }

    /// Main-force share of total turnover, 0 when nothing traded.
    pub fn participation(&self) -> f64 {
        let total = self.total_buy_amount + self.total_sell_amount;
        if total > 0.0 {
            (self.main_force_buy + self.main_force_sell) / total
        } else {
            0.0
        }
    }
}

/// Outcome of the session data quality assessment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    /// Score in [0, 100].
    pub score: u32,
    /// Human-readable problems found.
    pub issues: Vec<String>,
    /// Number of synthetic trades assessed.
    pub trade_count: u32,
    /// Orders kept per trade, 0 when there are no trades.
    pub order_ratio: f64,
}

/// Full output of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersResult {
    /// Kept orders, sorted by time ascending then amount descending.
    pub orders: Vec<Order>,
    /// Per-tier tallies, always all five tiers.
    pub tier_stats: [TierStats; 5],
    /// Number of synthetic trades analyzed.
    pub total_trades: u32,
    /// Money flow rollup over the kept orders.
    pub flow: FlowSummary,
    /// Data quality assessment.
    pub quality: QualityReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn test_time_to_bucket() {
        assert_eq!(time_to_bucket(t(9, 30, 45), 60), t(9, 30, 0));
        assert_eq!(time_to_bucket(t(9, 30, 0), 60), t(9, 30, 0));
        assert_eq!(time_to_bucket(t(14, 59, 59), 300), t(14, 55, 0));
    }

    #[test]
    fn test_direction_sign() {
        assert_eq!(TradeDirection::Buy.sign(), 1);
        assert_eq!(TradeDirection::Sell.sign(), -1);
        assert_eq!(TradeDirection::Neutral.sign(), 0);
    }

    #[test]
    fn test_direction_from_flag() {
        assert_eq!(TradeDirection::from_flag("B"), TradeDirection::Buy);
        assert_eq!(TradeDirection::from_flag("1"), TradeDirection::Buy);
        assert_eq!(TradeDirection::from_flag(" sell "), TradeDirection::Sell);
        assert_eq!(TradeDirection::from_flag("2"), TradeDirection::Sell);
        assert_eq!(TradeDirection::from_flag("4"), TradeDirection::Neutral);
        assert_eq!(TradeDirection::from_flag(""), TradeDirection::Neutral);
    }

    #[test]
    fn test_bar_avg_price() {
        let bar = Bar {
            time: t(9, 30, 0),
            open: 10.0,
            high: 10.5,
            low: 9.8,
            close: 10.2,
            volume: 1000,
            amount: 10_200.0,
        };
        // (10.0 + 10.5 + 9.8 + 10.2) / 4 = 10.125
        assert!((bar.avg_price() - 10.125).abs() < 1e-10);
        assert!((bar.price_range() - 0.7).abs() < 1e-10);
    }

    #[test]
    fn test_bar_momentum() {
        let prev = Bar {
            time: t(9, 30, 0),
            open: 10.0,
            high: 10.0,
            low: 10.0,
            close: 10.0,
            volume: 100,
            amount: 1000.0,
        };
        let cur = Bar {
            time: t(9, 31, 0),
            open: 10.0,
            high: 10.2,
            low: 10.0,
            close: 10.2,
            volume: 100,
            amount: 1020.0,
        };
        assert!((cur.momentum_from(Some(&prev)) - 0.02).abs() < 1e-10);
        assert_eq!(cur.momentum_from(None), 0.0);

        let broken = Bar { close: 0.0, ..prev };
        assert_eq!(cur.momentum_from(Some(&broken)), 0.0);
    }

    #[test]
    fn test_tier_codes() {
        assert_eq!(Tier::SuperLarge.code(), "D300");
        assert_eq!(Tier::Mini.code(), "D10");
        for (i, tier) in Tier::ALL.iter().enumerate() {
            assert_eq!(tier.index(), i);
        }
    }

    #[test]
    fn test_tier_stats_net() {
        let mut s = TierStats::new(Tier::Large);
        s.buy_count = 3;
        s.sell_count = 1;
        s.buy_amount = 5_000_000.0;
        s.sell_amount = 2_000_000.0;
        assert_eq!(s.net_count(), 2);
        assert!((s.net_flow() - 3_000_000.0).abs() < 1e-10);
    }

    #[test]
    fn test_flow_participation() {
        let flow = FlowSummary {
            total_buy_amount: 600_000.0,
            total_sell_amount: 400_000.0,
            main_force_buy: 500_000.0,
            main_force_sell: 250_000.0,
            retail_buy: 100_000.0,
            retail_sell: 150_000.0,
        };
        assert!((flow.net_flow() - 200_000.0).abs() < 1e-10);
        assert!((flow.participation() - 0.75).abs() < 1e-10);
        assert_eq!(FlowSummary::default().participation(), 0.0);
    }
}
