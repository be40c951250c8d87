//! Synthetic trade reconstruction from per-minute bars.
//!
//! True tick data is often unavailable, so each bar is expanded into a
//! bounded set of plausible executions that exactly conserve the bar's
//! volume and amount. Direction pressure follows close-to-close momentum;
//! per-trade volumes follow a bounded normal partition of the remainder.

use chrono::{NaiveTime, Timelike};
use moneyflow_core::{time_to_bucket, Bar, SynthesisConfig, SyntheticTrade, TradeDirection};
use rand::distributions::Distribution;
use rand::Rng;
use statrs::distribution::Normal;
use tracing::debug;

/// Standard deviation of the per-trade volume fraction draw.
const VOLUME_FRACTION_SIGMA: f64 = 0.05;
/// Bounds on the per-trade volume fraction.
const VOLUME_FRACTION_MIN: f64 = 0.02;
const VOLUME_FRACTION_MAX: f64 = 0.4;
/// Share of the non-buy probability mass labeled Sell; the rest is Neutral.
const SELL_SHARE: f64 = 0.8;

/// Synthesizes per-trade executions from OHLCV bars.
///
/// All randomness comes from the caller-supplied generator, so a fixed seed
/// reproduces output exactly and concurrent calls never share state.
pub struct TickSynthesizer {
    config: SynthesisConfig,
}

impl TickSynthesizer {
    /// Create a synthesizer with the given knobs.
    pub fn new(config: SynthesisConfig) -> Self {
        Self { config }
    }

    /// Expand one bar into synthetic trades.
    ///
    /// `prev` supplies the momentum reference close. The returned trades sum
    /// to exactly `bar.volume` and `bar.amount` and are ordered by time.
    pub fn synthesize<R: Rng>(
        &self,
        bar: &Bar,
        prev: Option<&Bar>,
        rng: &mut R,
    ) -> Vec<SyntheticTrade> {
        if bar.volume == 0 {
            return Vec::new();
        }

        let n = self.trade_count(bar);
        let ratio = buy_ratio(bar.momentum_from(prev));
        // Amount carried by one unit of volume in this bar, whatever unit
        // the provider reports volume in.
        let unit_amount = bar.amount / bar.volume as f64;
        let base_time = time_to_bucket(bar.time, 60);

        // Sigma is a positive constant, so construction cannot fail; the
        // fallback mean keeps the partition well-defined regardless.
        let fraction_dist = Normal::new(1.0 / n as f64, VOLUME_FRACTION_SIGMA).ok();

        let mut remaining_volume = bar.volume;
        let mut remaining_amount = bar.amount;
        let mut trades = Vec::with_capacity(n);

        for j in 0..n {
            if remaining_volume == 0 {
                break;
            }
            let last = j + 1 == n;
            let (volume, amount) = if last {
                (remaining_volume, remaining_amount)
            } else {
                let fraction = match &fraction_dist {
                    Some(dist) => dist.sample(rng),
                    None => 1.0 / n as f64,
                }
                .clamp(VOLUME_FRACTION_MIN, VOLUME_FRACTION_MAX);
                let drawn = ((remaining_volume as f64 * fraction) as u64)
                    .max(1)
                    .min(remaining_volume);
                if drawn == remaining_volume {
                    // The draw exhausted the bar; sweep the rest of the
                    // amount too so both sums stay exact.
                    (drawn, remaining_amount)
                } else {
                    (drawn, (drawn as f64 * unit_amount).min(remaining_amount))
                }
            };
            remaining_volume -= volume;
            remaining_amount -= amount;

            trades.push(SyntheticTrade {
                time: offset_time(base_time, ((j * 60) / n).min(59) as u32),
                price: trade_price(bar, j, n, ratio, rng),
                volume,
                amount,
                direction: direction_label(ratio, rng),
            });
        }

        trades
    }

    /// Expand a whole session, chaining each bar's momentum off the bar
    /// before it. Returns all trades sorted ascending by time.
    pub fn synthesize_session<R: Rng>(&self, bars: &[Bar], rng: &mut R) -> Vec<SyntheticTrade> {
        let mut trades = Vec::new();
        let mut prev: Option<&Bar> = None;
        for bar in bars {
            trades.extend(self.synthesize(bar, prev, rng));
            prev = Some(bar);
        }
        trades.sort_by_key(|t| t.time);
        debug!("synthesized {} trades from {} bars", trades.len(), bars.len());
        trades
    }

    /// Estimated execution count for a bar: a volume-proportional base plus
    /// a range-proportional volatility term, capped.
    fn trade_count(&self, bar: &Bar) -> usize {
        let base =
            (bar.volume / self.config.volume_per_trade).max(self.config.min_trades_per_bar as u64);
        let avg = bar.avg_price();
        let volatility = if avg > 0.0 && bar.price_range() > 0.0 {
            (self.config.volatility_scale * bar.price_range() / avg).round() as u64
        } else {
            0
        };
        (base + volatility).min(self.config.max_trades_per_bar as u64) as usize
    }
}

impl Default for TickSynthesizer {
    fn default() -> Self {
        Self::new(SynthesisConfig::default())
    }
}

/// Buy-pressure probability stepped from close-to-close momentum.
/// Monotonic, with breakpoints at +-0.5%, +-1% and +-2%.
fn buy_ratio(momentum: f64) -> f64 {
    if momentum > 0.02 {
        0.8
    } else if momentum > 0.01 {
        0.7
    } else if momentum > 0.005 {
        0.6
    } else if momentum < -0.02 {
        0.2
    } else if momentum < -0.01 {
        0.3
    } else if momentum < -0.005 {
        0.4
    } else {
        0.5
    }
}

/// Price for the j-th of n trades: buys walk the upper part of the range,
/// sells the lower, each drifting with trade index. The buy draw here is
/// independent of the direction label draw.
fn trade_price<R: Rng>(bar: &Bar, j: usize, n: usize, buy_ratio: f64, rng: &mut R) -> f64 {
    let range = bar.price_range();
    let price = if range <= 0.0 {
        bar.close
    } else {
        let progress = j as f64 / n as f64;
        let bias = if rng.gen::<f64>() < buy_ratio {
            0.6 + 0.4 * progress
        } else {
            0.4 - 0.4 * progress
        };
        bar.low + range * bias
    };
    round2(price).clamp(bar.low, bar.high)
}

/// Direction label from a single uniform draw: Buy below the buy ratio,
/// then Sell over most of the remainder, Neutral for the tail.
fn direction_label<R: Rng>(buy_ratio: f64, rng: &mut R) -> TradeDirection {
    let r: f64 = rng.gen();
    if r < buy_ratio {
        TradeDirection::Buy
    } else if r < buy_ratio + (1.0 - buy_ratio) * SELL_SHARE {
        TradeDirection::Sell
    } else {
        TradeDirection::Neutral
    }
}

#[inline]
fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn offset_time(base: NaiveTime, offset_secs: u32) -> NaiveTime {
    let secs = base.num_seconds_from_midnight() + offset_secs;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn t(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn make_bar(time: NaiveTime, open: f64, high: f64, low: f64, close: f64) -> Bar {
        Bar {
            time,
            open,
            high,
            low,
            close,
            volume: 1000,
            amount: 10_200.0,
        }
    }

    #[test]
    fn test_conservation_and_bounds() {
        let bar = make_bar(t(9, 30, 0), 10.0, 10.5, 9.8, 10.2);
        let synthesizer = TickSynthesizer::default();
        let mut rng = StdRng::seed_from_u64(42);

        let trades = synthesizer.synthesize(&bar, None, &mut rng);
        assert!(!trades.is_empty());

        let total_volume: u64 = trades.iter().map(|t| t.volume).sum();
        let total_amount: f64 = trades.iter().map(|t| t.amount).sum();
        assert_eq!(total_volume, 1000);
        assert_relative_eq!(total_amount, 10_200.0, max_relative = 1e-6);

        for trade in &trades {
            assert!(trade.volume >= 1);
            assert!(trade.price >= 9.8 && trade.price <= 10.5);
            assert!(trade.time >= t(9, 30, 0) && trade.time <= t(9, 30, 59));
        }
    }

    #[test]
    fn test_conservation_over_many_seeds() {
        let bar = Bar {
            volume: 1000,
            amount: 20_500.0,
            ..make_bar(t(10, 15, 0), 20.0, 20.9, 19.9, 20.5)
        };
        let synthesizer = TickSynthesizer::default();

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let trades = synthesizer.synthesize(&bar, None, &mut rng);
            let total_volume: u64 = trades.iter().map(|t| t.volume).sum();
            let total_amount: f64 = trades.iter().map(|t| t.amount).sum();
            assert_eq!(total_volume, bar.volume);
            assert_relative_eq!(total_amount, bar.amount, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_trade_count_estimate() {
        let synthesizer = TickSynthesizer::default();

        // base = max(5, 1000/50) = 20, volatility = round(500*0.7/10.125) = 35,
        // capped at 50.
        let busy = make_bar(t(9, 30, 0), 10.0, 10.5, 9.8, 10.2);
        assert_eq!(synthesizer.trade_count(&busy), 50);

        // Flat bar: no volatility term, base = max(5, 100/50) = 5.
        let quiet = Bar {
            volume: 100,
            amount: 1000.0,
            ..make_bar(t(9, 31, 0), 10.0, 10.0, 10.0, 10.0)
        };
        assert_eq!(synthesizer.trade_count(&quiet), 5);
    }

    #[test]
    fn test_buy_ratio_steps() {
        assert_eq!(buy_ratio(0.025), 0.8);
        assert_eq!(buy_ratio(0.015), 0.7);
        assert_eq!(buy_ratio(0.007), 0.6);
        assert_eq!(buy_ratio(0.01), 0.6);
        assert_eq!(buy_ratio(0.005), 0.5);
        assert_eq!(buy_ratio(0.0), 0.5);
        assert_eq!(buy_ratio(-0.005), 0.5);
        assert_eq!(buy_ratio(-0.007), 0.4);
        assert_eq!(buy_ratio(-0.015), 0.3);
        assert_eq!(buy_ratio(-0.025), 0.2);
    }

    #[test]
    fn test_degenerate_range_uses_close() {
        let bar = Bar {
            volume: 500,
            amount: 5_000.0,
            ..make_bar(t(9, 40, 0), 10.0, 10.0, 10.0, 10.0)
        };
        let synthesizer = TickSynthesizer::default();
        let mut rng = StdRng::seed_from_u64(1);

        for trade in synthesizer.synthesize(&bar, None, &mut rng) {
            assert!((trade.price - 10.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_same_seed_reproduces() {
        let bars = vec![
            make_bar(t(9, 30, 0), 10.0, 10.5, 9.8, 10.2),
            make_bar(t(9, 31, 0), 10.2, 10.6, 10.1, 10.4),
        ];
        let synthesizer = TickSynthesizer::default();

        let a = synthesizer.synthesize_session(&bars, &mut StdRng::seed_from_u64(7));
        let b = synthesizer.synthesize_session(&bars, &mut StdRng::seed_from_u64(7));

        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.time, y.time);
            assert_eq!(x.volume, y.volume);
            assert_eq!(x.direction, y.direction);
            assert!((x.price - y.price).abs() < 1e-12);
            assert!((x.amount - y.amount).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zero_momentum_label_balance() {
        // 100 identical-close bars: every momentum is 0, so the buy ratio
        // stays 0.5 and labels split roughly 50/40/10 buy/sell/neutral.
        let bars: Vec<Bar> = (0..100u32)
            .map(|i| make_bar(t(9 + (30 + i) / 60, (30 + i) % 60, 0), 10.0, 10.5, 9.8, 10.0))
            .collect();
        let synthesizer = TickSynthesizer::default();
        let trades = synthesizer.synthesize_session(&bars, &mut StdRng::seed_from_u64(99));

        let total = trades.len() as f64;
        let buys = trades
            .iter()
            .filter(|t| t.direction == TradeDirection::Buy)
            .count() as f64;
        let sells = trades
            .iter()
            .filter(|t| t.direction == TradeDirection::Sell)
            .count() as f64;
        assert!(total >= 1000.0);
        assert!((buys / total - 0.5).abs() < 0.05);
        assert!((sells / total - 0.4).abs() < 0.05);
    }

    #[test]
    fn test_session_sorted_by_time() {
        let bars = vec![
            make_bar(t(9, 31, 0), 10.2, 10.6, 10.1, 10.4),
            make_bar(t(9, 30, 0), 10.0, 10.5, 9.8, 10.2),
        ];
        let synthesizer = TickSynthesizer::default();
        let trades = synthesizer.synthesize_session(&bars, &mut StdRng::seed_from_u64(3));

        for pair in trades.windows(2) {
            assert!(pair[0].time <= pair[1].time);
        }
    }

    #[test]
    fn test_tiny_volume_bar() {
        // Fewer lots than the minimum trade count: every trade is one lot
        // and the sums still close.
        let bar = Bar {
            volume: 3,
            amount: 30.0,
            ..make_bar(t(9, 30, 0), 10.0, 10.1, 9.9, 10.0)
        };
        let synthesizer = TickSynthesizer::default();
        let mut rng = StdRng::seed_from_u64(5);

        let trades = synthesizer.synthesize(&bar, None, &mut rng);
        let total_volume: u64 = trades.iter().map(|t| t.volume).sum();
        let total_amount: f64 = trades.iter().map(|t| t.amount).sum();
        assert_eq!(total_volume, 3);
        assert_relative_eq!(total_amount, 30.0, max_relative = 1e-6);
        assert!(trades.len() <= 3);
    }
}
