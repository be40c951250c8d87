//! End-to-end analysis pipeline.
//!
//! Wires normalization, tick synthesis, order aggregation, tier tallies and
//! quality scoring into one entry point.

use chrono::NaiveTime;
use moneyflow_core::{
    Bar, ClassificationConfig, Config, OrdersResult, Result, SynthesisConfig, SyntheticTrade,
};
use moneyflow_ingestion::{BarNormalizer, RawBucket};
use moneyflow_synthesis::{QuoteSnapshot, SnapshotSynthesizer, TickSynthesizer};
use rand::Rng;
use tracing::debug;

use crate::{aggregator::OrderAggregator, quality, stats::StatsEngine};

/// Analysis pipeline.
pub struct TickPipeline {
    /// Per-bar tick synthesizer.
    synthesizer: TickSynthesizer,
    /// Trade-to-order grouping.
    aggregator: OrderAggregator,
    /// Tier tallies and flow rollup.
    stats: StatsEngine,
    /// Quote-only fallback synthesizer.
    snapshot: SnapshotSynthesizer,
    /// Configuration the pipeline was built from.
    config: Config,
}

impl TickPipeline {
    /// Build a pipeline with default synthesis knobs.
    pub fn new(classification: ClassificationConfig) -> Result<Self> {
        Self::with_config(Config {
            classification,
            synthesis: SynthesisConfig::default(),
        })
    }

    /// Build a pipeline from a full configuration. Fails fast on an
    /// invalid configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            synthesizer: TickSynthesizer::new(config.synthesis.clone()),
            aggregator: OrderAggregator::new(&config.classification),
            stats: StatsEngine::new(&config.classification),
            snapshot: SnapshotSynthesizer::new(),
            config,
        })
    }

    /// Configuration the pipeline runs with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Analyze raw minute records end to end.
    ///
    /// Malformed records are dropped during normalization and never fail
    /// the run; an input with nothing usable yields an empty result with a
    /// zero quality score.
    pub fn run<R: Rng>(&self, records: &[RawBucket], rng: &mut R) -> OrdersResult {
        let mut normalizer = BarNormalizer::new();
        let bars = normalizer.normalize_all(records);
        self.run_bars(&bars, rng)
    }

    /// Analyze already-normalized minute bars.
    pub fn run_bars<R: Rng>(&self, bars: &[Bar], rng: &mut R) -> OrdersResult {
        let trades = self.synthesizer.synthesize_session(bars, rng);
        self.analyze(trades)
    }

    /// Analyze a quote snapshot when no minute bars are available.
    pub fn run_snapshot<R: Rng>(
        &self,
        snapshot: &QuoteSnapshot,
        now: NaiveTime,
        rng: &mut R,
    ) -> Result<OrdersResult> {
        let trades = self.snapshot.synthesize(snapshot, now, rng)?;
        Ok(self.analyze(trades))
    }

    fn analyze(&self, trades: Vec<SyntheticTrade>) -> OrdersResult {
        let orders = self.aggregator.aggregate(&trades);
        let quality = quality::assess(&trades, orders.len());
        let (tier_stats, flow) = self.stats.tally(&orders);

        debug!(
            "analyzed {} trades into {} orders, quality {}",
            trades.len(),
            orders.len(),
            quality.score
        );

        OrdersResult {
            orders,
            tier_stats,
            total_trades: trades.len() as u32,
            flow,
            quality,
        }
    }
}
