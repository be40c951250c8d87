//! Raw feed record normalization.
//!
//! Upstream per-minute data arrives in two shapes: comma-delimited lines
//! (`"time,open,high,low,close,volume,amount"`) and keyed JSON objects whose
//! field names differ between providers. Both normalize into canonical
//! [`Bar`]s; records that cannot be made usable are dropped, never raised.

use chrono::NaiveTime;
use moneyflow_core::Bar;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Field aliases for keyed records, in lookup order.
const CLOSE_KEYS: &[&str] = &["close", "close_price", "price"];
const OPEN_KEYS: &[&str] = &["open", "open_price"];
const HIGH_KEYS: &[&str] = &["high", "high_price"];
const LOW_KEYS: &[&str] = &["low", "low_price"];
const AMOUNT_KEYS: &[&str] = &["amount", "turnover"];

/// One raw per-minute record as delivered by a feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawBucket {
    /// Comma-delimited line.
    Line(String),
    /// Keyed object with provider-specific field names.
    Keyed(Map<String, Value>),
}

/// Counters describing the records a normalizer has seen.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeStats {
    /// Records normalized into bars.
    pub parsed: u32,
    /// Records dropped as unusable.
    pub dropped: u32,
    /// Bars whose OHLC range needed widening.
    pub repaired: u32,
}

/// Normalizer turning raw feed records into canonical bars.
#[derive(Debug, Default)]
pub struct BarNormalizer {
    stats: NormalizeStats,
}

impl BarNormalizer {
    /// Create a new normalizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get counters for the records seen so far.
    pub fn stats(&self) -> &NormalizeStats {
        &self.stats
    }

    /// Reset counters.
    pub fn reset(&mut self) {
        self.stats = NormalizeStats::default();
    }

    /// Normalize one record.
    ///
    /// Returns None when the record is unusable: missing or unparseable time,
    /// a present-but-unparseable numeric field, or volume below one lot.
    /// Absent open/high/low fall back to close; absent amount falls back to 0.
    pub fn normalize(&mut self, raw: &RawBucket) -> Option<Bar> {
        let parsed = match raw {
            RawBucket::Line(line) => parse_line(line),
            RawBucket::Keyed(map) => parse_keyed(map),
        };
        match parsed {
            Some(bar) => {
                self.stats.parsed += 1;
                Some(self.repair_range(bar))
            }
            None => {
                self.stats.dropped += 1;
                warn!("dropped unusable record");
                None
            }
        }
    }

    /// Normalize a batch, dropping unusable records and keeping input order.
    pub fn normalize_all(&mut self, records: &[RawBucket]) -> Vec<Bar> {
        let bars: Vec<Bar> = records.iter().filter_map(|r| self.normalize(r)).collect();
        debug!(
            "normalized {} of {} records",
            bars.len(),
            records.len()
        );
        bars
    }

    /// Widen the OHLC range so low <= open, close <= high always holds.
    fn repair_range(&mut self, mut bar: Bar) -> Bar {
        let low = bar.low.min(bar.open).min(bar.close);
        let high = bar.high.max(bar.open).max(bar.close);
        if low < bar.low || high > bar.high {
            self.stats.repaired += 1;
            debug!("widened inconsistent OHLC range for bar at {}", bar.time);
        }
        bar.low = low;
        bar.high = high;
        bar
    }
}

fn parse_line(line: &str) -> Option<Bar> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 7 {
        return None;
    }
    let time = parse_time(parts[0])?;
    let open = parse_float(parts[1])?;
    let high = parse_float(parts[2])?;
    let low = parse_float(parts[3])?;
    let close = parse_float(parts[4])?;
    let volume = parse_float(parts[5])?;
    let amount = parse_float(parts[6])?;
    build_bar(time, open, high, low, close, volume, amount)
}

fn parse_keyed(map: &Map<String, Value>) -> Option<Bar> {
    let time = parse_time(lookup(map, &["time"])?.as_str()?)?;
    let close = numeric(lookup(map, CLOSE_KEYS)?)?;
    let open = match lookup(map, OPEN_KEYS) {
        Some(v) => numeric(v)?,
        None => close,
    };
    let high = match lookup(map, HIGH_KEYS) {
        Some(v) => numeric(v)?,
        None => close,
    };
    let low = match lookup(map, LOW_KEYS) {
        Some(v) => numeric(v)?,
        None => close,
    };
    let volume = numeric(lookup(map, &["volume"])?)?;
    let amount = match lookup(map, AMOUNT_KEYS) {
        Some(v) => numeric(v)?,
        None => 0.0,
    };
    build_bar(time, open, high, low, close, volume, amount)
}

fn build_bar(
    time: NaiveTime,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    amount: f64,
) -> Option<Bar> {
    if volume < 1.0 {
        return None;
    }
    Some(Bar {
        time,
        open,
        high,
        low,
        close,
        volume: volume.floor() as u64,
        amount,
    })
}

/// First non-null value among the alias keys.
fn lookup<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| map.get(*k)).find(|v| !v.is_null())
}

/// Accept JSON numbers and numeric strings; non-finite values fail.
fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_float(s),
        _ => None,
    }
}

fn parse_float(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Parse a time-of-day, ignoring a leading date ("2024-07-15 09:31").
fn parse_time(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    let s = s.rsplit(' ').next().unwrap_or(s);
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}
