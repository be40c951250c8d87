//! Last-resort trade synthesis from a realtime quote snapshot.
//!
//! When a session has no per-minute bars at all, the only signal left is the
//! latest quote. This walks a fixed number of ticks back from "now", shaping
//! direction odds from the day's change percent and volumes from weighted
//! size classes. The output feeds the same aggregation path as bar-derived
//! trades.

use chrono::{NaiveTime, Timelike};
use moneyflow_core::{Error, Result, SyntheticTrade, TradeDirection};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Number of ticks synthesized per snapshot.
const TICK_COUNT: u32 = 200;
/// Spacing between ticks in seconds (200 ticks cover two hours).
const TICK_SPACING_SECS: u32 = 36;
/// Price jitter band around the snapshot price.
const PRICE_JITTER: f64 = 0.02;

/// Realtime quote snapshot, the minimum upstream state worth synthesizing
/// from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    /// Last traded price.
    pub price: f64,
    /// Day change in percent (e.g. 2.5 for +2.5%).
    pub change_percent: f64,
}

/// Synthesizes a session tail from a quote snapshot.
#[derive(Debug, Default)]
pub struct SnapshotSynthesizer;

impl SnapshotSynthesizer {
    /// Create a snapshot synthesizer.
    pub fn new() -> Self {
        Self
    }

    /// Synthesize ticks walking back from `now`.
    ///
    /// Fails when the snapshot price is unusable; output is sorted ascending
    /// by time and labels only Buy or Sell.
    pub fn synthesize<R: Rng>(
        &self,
        snapshot: &QuoteSnapshot,
        now: NaiveTime,
        rng: &mut R,
    ) -> Result<Vec<SyntheticTrade>> {
        if !(snapshot.price > 0.0) || !snapshot.price.is_finite() {
            return Err(Error::data(format!(
                "snapshot price {} is unusable for synthesis",
                snapshot.price
            )));
        }

        warn!(
            "no bar data available, synthesizing {} fallback ticks",
            TICK_COUNT
        );

        let buy_probability = buy_probability(snapshot.change_percent);
        let now_secs = now.num_seconds_from_midnight();
        let mut trades = Vec::with_capacity(TICK_COUNT as usize);

        for i in 0..TICK_COUNT {
            let back = (TICK_COUNT - i) * TICK_SPACING_SECS;
            let secs = now_secs.saturating_sub(back);
            let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap_or(now);

            let jitter = rng.gen_range(-PRICE_JITTER..PRICE_JITTER);
            let price = round2(snapshot.price * (1.0 + jitter));
            let volume = draw_volume(rng);
            let direction = if rng.gen::<f64>() < buy_probability {
                TradeDirection::Buy
            } else {
                TradeDirection::Sell
            };

            trades.push(SyntheticTrade {
                time,
                price,
                volume,
                amount: round2(price * volume as f64),
                direction,
            });
        }

        trades.sort_by_key(|t| t.time);
        Ok(trades)
    }
}

/// Buy probability stepped from the day change percent.
fn buy_probability(change_percent: f64) -> f64 {
    if change_percent > 3.0 {
        0.8
    } else if change_percent > 0.0 {
        0.6
    } else if change_percent < -3.0 {
        0.2
    } else if change_percent < 0.0 {
        0.4
    } else {
        0.5
    }
}

/// Volume in lots from weighted size classes: 10% large, 30% medium,
/// 60% small.
fn draw_volume<R: Rng>(rng: &mut R) -> u64 {
    let r: f64 = rng.gen();
    if r < 0.1 {
        rng.gen_range(5_000..=50_000)
    } else if r < 0.4 {
        rng.gen_range(1_000..=5_000)
    } else {
        rng.gen_range(100..=1_000)
    }
}

#[inline]
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
