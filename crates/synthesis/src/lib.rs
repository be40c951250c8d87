//! Synthetic trade reconstruction for the moneyflow pipeline.
//!
//! This crate handles:
//! - Bar-to-trade expansion with exact volume/amount conservation
//! - Momentum-driven direction pressure
//! - Quote-snapshot fallback synthesis when no bars exist

pub mod fallback;
pub mod synthesizer;

pub use fallback::{QuoteSnapshot, SnapshotSynthesizer};
pub use synthesizer::TickSynthesizer;
