//! Session data quality scoring.
//!
//! Grades how trustworthy a synthesized session looks before its orders are
//! shown to anyone. Deductions are additive and the score never goes below
//! zero.

use std::collections::HashSet;

use moneyflow_core::{QualityReport, SyntheticTrade};

/// Deduction when the session carries no traded amount at all.
const NO_AMOUNT_PENALTY: i64 = 50;
/// Deduction when trades cluster on fewer than this many timestamps.
const MIN_DISTINCT_TIMES: usize = 10;
const SPARSE_TIMES_PENALTY: i64 = 20;
/// Deduction when more than half the trades survive as orders.
const HIGH_RATIO_PENALTY: i64 = 15;
/// Deduction when no order cleared the minimum amount.
const NO_ORDERS_PENALTY: i64 = 10;

/// Score a synthesized session against the orders kept from it.
pub fn assess(trades: &[SyntheticTrade], order_count: usize) -> QualityReport {
    if trades.is_empty() {
        return QualityReport {
            score: 0,
            issues: vec!["no tick data".to_string()],
            trade_count: 0,
            order_ratio: 0.0,
        };
    }

    let mut score: i64 = 100;
    let mut issues = Vec::new();

    let total_amount: f64 = trades.iter().map(|t| t.amount).sum();
    if total_amount == 0.0 {
        score -= NO_AMOUNT_PENALTY;
        issues.push("total traded amount is zero".to_string());
    }

    let distinct_times: HashSet<_> = trades.iter().map(|t| t.time).collect();
    if distinct_times.len() < MIN_DISTINCT_TIMES {
        score -= SPARSE_TIMES_PENALTY;
        issues.push(format!(
            "trades cluster on only {} distinct timestamps",
            distinct_times.len()
        ));
    }

    let order_ratio = order_count as f64 / trades.len() as f64;
    if order_ratio > 0.5 {
        score -= HIGH_RATIO_PENALTY;
        issues.push("unusually high share of trades kept as orders".to_string());
    }

    if order_count == 0 {
        score -= NO_ORDERS_PENALTY;
        issues.push("no order cleared the minimum amount".to_string());
    }

    QualityReport {
        score: score.max(0) as u32,
        issues,
        trade_count: trades.len() as u32,
        order_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use moneyflow_core::TradeDirection;

    fn make_trade(second: u32, amount: f64) -> SyntheticTrade {
        SyntheticTrade {
            time: NaiveTime::from_hms_opt(9, 30 + second / 60, second % 60).unwrap(),
            price: 10.0,
            volume: 100,
            amount,
            direction: TradeDirection::Buy,
        }
    }

    fn healthy_session() -> Vec<SyntheticTrade> {
        (0..20).map(|i| make_trade(i * 3, 50_000.0)).collect()
    }

    #[test]
    fn test_empty_session_scores_zero() {
        let report = assess(&[], 0);
        assert_eq!(report.score, 0);
        assert_eq!(report.issues, vec!["no tick data".to_string()]);
        assert_eq!(report.trade_count, 0);
        assert_eq!(report.order_ratio, 0.0);
    }

    #[test]
    fn test_healthy_session_scores_full() {
        let trades = healthy_session();
        let report = assess(&trades, 4);
        assert_eq!(report.score, 100);
        assert!(report.issues.is_empty());
        assert_eq!(report.trade_count, 20);
        assert!((report.order_ratio - 0.2).abs() < 1e-10);
    }

    #[test]
    fn test_zero_amount_penalized() {
        let trades: Vec<_> = (0..20).map(|i| make_trade(i * 3, 0.0)).collect();
        let report = assess(&trades, 2);
        assert_eq!(report.score, 50);
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn test_sparse_timestamps_penalized() {
        // 20 trades sharing 5 timestamps.
        let trades: Vec<_> = (0..20).map(|i| make_trade((i % 5) * 3, 50_000.0)).collect();
        let report = assess(&trades, 2);
        assert_eq!(report.score, 80);
    }

    #[test]
    fn test_high_order_ratio_penalized() {
        let trades = healthy_session();
        let report = assess(&trades, 15);
        assert_eq!(report.score, 85);
        assert!((report.order_ratio - 0.75).abs() < 1e-10);
    }

    #[test]
    fn test_no_orders_penalized() {
        let trades = healthy_session();
        let report = assess(&trades, 0);
        assert_eq!(report.score, 90);
    }

    #[test]
    fn test_penalties_stack() {
        // One zero-amount trade: no amount, sparse timestamps, no orders.
        // With zero orders the ratio check cannot also fire.
        let trades = vec![make_trade(0, 0.0)];
        let report = assess(&trades, 0);
        assert_eq!(report.score, 20);
        assert_eq!(report.issues.len(), 3);

        // Same degenerate session but with an order kept pushes the ratio
        // over the line instead of the no-order deduction.
        let report = assess(&trades, 1);
        assert_eq!(report.score, 15);
    }
}
