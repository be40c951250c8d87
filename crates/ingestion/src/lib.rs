//! Data ingestion and normalization for the moneyflow pipeline.
//!
//! This crate handles:
//! - Raw record shape dispatch (delimited lines vs keyed objects)
//! - Provider field-name reconciliation
//! - Canonical bar construction with silent-drop degradation

pub mod normalizer;

pub use normalizer::{BarNormalizer, NormalizeStats, RawBucket};
