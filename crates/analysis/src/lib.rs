//! Order analysis for the moneyflow system.
//!
//! This crate handles:
//! - Trade-to-order aggregation by time window, price level and direction
//! - Per-tier order statistics and money flow rollups
//! - Session data quality scoring
//! - The end-to-end analysis pipeline

pub mod aggregator;
pub mod stats;
pub mod quality;
pub mod pipeline;

pub use aggregator::OrderAggregator;
pub use stats::StatsEngine;
pub use pipeline::TickPipeline;
