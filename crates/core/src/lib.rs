//! Core types and configuration for the moneyflow pipeline.
//!
//! This crate provides shared types used across all other crates:
//! - Market data types (bars, synthetic trades, orders, tiers)
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{ClassificationConfig, Config, SynthesisConfig, TierThresholds};
pub use error::{Error, Result};
pub use types::*;
