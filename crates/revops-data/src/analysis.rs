//! Top-level aggregation pipeline.
//!
//! Validates the four record sets, runs the marketing, pipeline and revenue
//! aggregators, synthesizes the trend series from their totals and assembles
//! the [`DashboardPayload`] handed to the UI.

use revops_core::error::Result;
use revops_core::models::{
    validate_records, BenchmarkRecord, CustomerRecord, MarketingChannelRecord,
    PipelineDealRecord,
};
use revops_core::settings::EngineConfig;
use serde::{Deserialize, Serialize};

use crate::marketing::{summarize_marketing, MarketingSummary};
use crate::pipeline::{summarize_pipeline, PipelineSummary};
use crate::revenue::{summarize_revenue, RevenueSummary};
use crate::trends::{self, TrendInputs};

// ── Public types ──────────────────────────────────────────────────────────────

/// The four input record sets, each consumed by exactly one aggregator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardInputs {
    pub marketing: Vec<MarketingChannelRecord>,
    pub pipeline: Vec<PipelineDealRecord>,
    pub customers: Vec<CustomerRecord>,
    pub benchmarks: Vec<BenchmarkRecord>,
}

impl DashboardInputs {
    /// Reject non-finite numbers in any dataset.
    pub fn validate(&self) -> Result<()> {
        validate_records(&self.marketing)?;
        validate_records(&self.pipeline)?;
        validate_records(&self.customers)?;
        validate_records(&self.benchmarks)?;
        Ok(())
    }
}

/// The complete dashboard document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardPayload {
    pub marketing: MarketingSummary,
    pub pipeline: PipelineSummary,
    pub revenue: RevenueSummary,
    pub benchmarks: Vec<BenchmarkRecord>,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Merge independently computed summaries into the payload.
///
/// The trend series is derived here because it needs totals from both the
/// marketing and revenue summaries. Marketing receives the leading slice,
/// revenue the trailing slice. Benchmarks pass through unchanged.
pub fn assemble(
    mut marketing: MarketingSummary,
    pipeline: PipelineSummary,
    mut revenue: RevenueSummary,
    benchmarks: Vec<BenchmarkRecord>,
    config: &EngineConfig,
) -> Result<DashboardPayload> {
    let inputs = TrendInputs::from_metrics(&marketing.metrics, &revenue.metrics);
    let series = trends::synthesize(&inputs, config.trend_year)?;

    marketing.trends_data = trends::leading(&series, config.trend_slice_len);
    revenue.trends_data = trends::trailing_mrr(&series, config.trend_slice_len);

    Ok(DashboardPayload {
        marketing,
        pipeline,
        revenue,
        benchmarks,
    })
}

/// Run the full pipeline sequentially.
///
/// Either every step succeeds and the whole payload is returned, or the
/// first error is; no partial payload is produced. Empty inputs succeed with
/// zero totals and empty lists.
pub fn build_dashboard(inputs: &DashboardInputs, config: &EngineConfig) -> Result<DashboardPayload> {
    inputs.validate()?;

    let marketing = summarize_marketing(&inputs.marketing);
    let pipeline = summarize_pipeline(&inputs.pipeline, config);
    let revenue = summarize_revenue(&inputs.customers);

    let payload = assemble(
        marketing,
        pipeline,
        revenue,
        inputs.benchmarks.clone(),
        config,
    )?;

    tracing::info!(
        "Dashboard built: {} channels, {} stages, {} segments, {} benchmarks",
        payload.marketing.channel_performance.len(),
        payload.pipeline.stage_breakdown.len(),
        payload.revenue.segment_breakdown.len(),
        payload.benchmarks.len()
    );

    Ok(payload)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
