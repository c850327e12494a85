//! Sales pipeline rollup: totals, win rate, stage and segment breakdowns,
//! and the stuck-deal watch list.

use std::collections::BTreeMap;

use revops_core::models::{DealStage, PipelineDealRecord};
use revops_core::settings::EngineConfig;
use revops_core::stats::{mean, percentage, round2, MeanAccumulator};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ── Public types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineMetrics {
    pub total_pipeline: f64,
    pub weighted_pipeline: f64,
    pub avg_deal_size: f64,
    pub total_deals: u64,
    pub avg_probability: f64,
    /// Percentage of closed deals that were won; `0.0` with no closed deals.
    pub win_rate: f64,
}

/// One row per distinct stage label, values rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageBreakdown {
    pub stage: String,
    pub total_amount: f64,
    pub avg_amount: f64,
    pub deal_count: u64,
    pub avg_probability: f64,
    pub expected_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StuckDeal {
    pub deal_id: String,
    pub account: String,
    pub amount: f64,
    pub stage: String,
    pub days_in_stage: u32,
    pub owner: String,
    pub probability: f64,
}

impl From<&PipelineDealRecord> for StuckDeal {
    fn from(deal: &PipelineDealRecord) -> Self {
        StuckDeal {
            deal_id: deal.deal_id.clone(),
            account: deal.account.clone(),
            amount: deal.amount,
            stage: deal.stage.to_string(),
            days_in_stage: deal.days_in_stage,
            owner: deal.owner.clone(),
            probability: deal.probability,
        }
    }
}

/// Pipeline section of the dashboard payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSummary {
    pub metrics: PipelineMetrics,
    /// Ordered by stage label, ascending.
    pub stage_breakdown: Vec<StageBreakdown>,
    pub deals_by_segment: BTreeMap<String, f64>,
    /// First stuck deals in input order, capped at the configured limit.
    pub stuck_deals: Vec<StuckDeal>,
    /// Number of stuck deals before capping.
    pub stuck_deal_count: u64,
}

// ── Aggregation ───────────────────────────────────────────────────────────────

/// Won deals as a percentage of closed (won or lost) deals.
pub fn win_rate(deals: &[PipelineDealRecord]) -> f64 {
    let (won, closed) = deals
        .iter()
        .filter(|d| d.stage.is_terminal())
        .fold((0u64, 0u64), |(won, closed), d| {
            (won + u64::from(d.stage == DealStage::ClosedWon), closed + 1)
        });
    if closed == 0 && !deals.is_empty() {
        warn!("No closed deals in pipeline; win rate reported as 0");
    }
    percentage(won, closed)
}

pub fn pipeline_metrics(deals: &[PipelineDealRecord]) -> PipelineMetrics {
    PipelineMetrics {
        total_pipeline: deals.iter().map(|d| d.amount).sum(),
        weighted_pipeline: deals.iter().map(|d| d.expected_value).sum(),
        avg_deal_size: mean(deals.iter().map(|d| d.amount)),
        total_deals: deals.len() as u64,
        avg_probability: mean(deals.iter().map(|d| d.probability)),
        win_rate: win_rate(deals),
    }
}

#[derive(Debug, Default)]
struct StageAccumulator {
    amount: MeanAccumulator,
    probability: MeanAccumulator,
    expected_value: f64,
}

pub fn stage_breakdown(deals: &[PipelineDealRecord]) -> Vec<StageBreakdown> {
    let mut groups: BTreeMap<&str, StageAccumulator> = BTreeMap::new();
    for deal in deals {
        let acc = groups.entry(deal.stage.as_str()).or_default();
        acc.amount.push(deal.amount);
        acc.probability.push(deal.probability);
        acc.expected_value += deal.expected_value;
    }
    groups
        .into_iter()
        .map(|(stage, acc)| StageBreakdown {
            stage: stage.to_string(),
            total_amount: round2(acc.amount.sum()),
            avg_amount: round2(acc.amount.mean()),
            deal_count: acc.amount.count(),
            avg_probability: round2(acc.probability.mean()),
            expected_value: round2(acc.expected_value),
        })
        .collect()
}

/// Sum of deal amount per segment.
pub fn deals_by_segment(deals: &[PipelineDealRecord]) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for deal in deals {
        *totals.entry(deal.segment.clone()).or_default() += deal.amount;
    }
    totals
}

/// A deal is stuck when it has sat in one of the watched open stages for
/// strictly longer than the threshold.
pub fn is_stuck(deal: &PipelineDealRecord, config: &EngineConfig) -> bool {
    deal.days_in_stage > config.stuck_days_threshold && config.stuck_stages.contains(&deal.stage)
}

/// Returns the capped list (input order) and the uncapped count.
pub fn stuck_deals(deals: &[PipelineDealRecord], config: &EngineConfig) -> (Vec<StuckDeal>, u64) {
    let mut listed = Vec::new();
    let mut count = 0u64;
    for deal in deals.iter().filter(|d| is_stuck(d, config)) {
        if listed.len() < config.stuck_deal_limit {
            listed.push(StuckDeal::from(deal));
        }
        count += 1;
    }
    (listed, count)
}

pub fn summarize_pipeline(deals: &[PipelineDealRecord], config: &EngineConfig) -> PipelineSummary {
    let (stuck, stuck_count) = stuck_deals(deals, config);
    debug!(
        "Pipeline: {} deals aggregated, {} stuck",
        deals.len(),
        stuck_count
    );
    PipelineSummary {
        metrics: pipeline_metrics(deals),
        stage_breakdown: stage_breakdown(deals),
        deals_by_segment: deals_by_segment(deals),
        stuck_deals: stuck,
        stuck_deal_count: stuck_count,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn deal(id: &str, stage: &str, amount: f64, days: u32) -> PipelineDealRecord {
        PipelineDealRecord {
            deal_id: id.to_string(),
            account: format!("Account {id}"),
            amount,
            stage: DealStage::from(stage),
            probability: 50.0,
            expected_value: amount * 0.5,
            days_in_stage: days,
            owner: "Dana".to_string(),
            segment: "MM".to_string(),
        }
    }

    #[test]
    fn test_win_rate_one_won_one_lost() {
        let deals = vec![
            deal("D1", "Closed_Won", 1000.0, 1),
            deal("D2", "Closed_Lost", 1000.0, 1),
        ];
        assert_eq!(pipeline_metrics(&deals).win_rate, 50.0);
    }

    #[test]
    fn test_win_rate_ignores_open_deals() {
        let deals = vec![
            deal("D1", "Closed_Won", 1000.0, 1),
            deal("D2", "Discovery", 1000.0, 1),
            deal("D3", "Negotiation", 1000.0, 1),
            deal("D4", "Closed_Won", 1000.0, 1),
        ];
        assert_eq!(win_rate(&deals), 100.0);
    }

    #[test]
    fn test_win_rate_zero_without_terminal_deals() {
        let deals = vec![deal("D1", "Demo", 1000.0, 1)];
        assert_eq!(win_rate(&deals), 0.0);
        assert_eq!(win_rate(&[]), 0.0);
    }

    #[test]
    fn test_win_rate_stays_within_bounds() {
        let stages = ["Closed_Won", "Closed_Lost", "Demo", "Closed_Lost", "Closed_Won"];
        for n in 0..=stages.len() {
            let deals: Vec<_> = stages[..n]
                .iter()
                .enumerate()
                .map(|(i, s)| deal(&format!("D{i}"), s, 10.0, 1))
                .collect();
            let rate = win_rate(&deals);
            assert!((0.0..=100.0).contains(&rate), "rate {rate} for {n} deals");
        }
    }

    #[test]
    fn test_stuck_deal_threshold_is_strict() {
        let config = EngineConfig::default();
        let (stuck, count) = stuck_deals(&[deal("D1", "Discovery", 500.0, 50)], &config);
        assert_eq!(count, 1);
        assert_eq!(stuck[0].deal_id, "D1");

        let (stuck, count) = stuck_deals(&[deal("D1", "Discovery", 500.0, 40)], &config);
        assert_eq!(count, 0);
        assert!(stuck.is_empty());

        assert!(!is_stuck(&deal("D1", "Demo", 500.0, 45), &config));
        assert!(is_stuck(&deal("D1", "Demo", 500.0, 46), &config));
    }

    #[test]
    fn test_stuck_deals_only_in_watched_stages() {
        let config = EngineConfig::default();
        let deals = vec![
            deal("D1", "Closed_Won", 1.0, 200),
            deal("D2", "Closed_Lost", 1.0, 200),
            deal("D3", "Proposal", 1.0, 200),
            deal("D4", "Negotiation", 1.0, 200),
        ];
        let (stuck, count) = stuck_deals(&deals, &config);
        assert_eq!(count, 1);
        assert_eq!(stuck[0].stage, "Negotiation");
    }

    #[test]
    fn test_stuck_deals_capped_in_input_order() {
        let config = EngineConfig::default();
        let deals: Vec<_> = (0..15)
            .map(|i| deal(&format!("D{i:02}"), "Demo", 100.0 * i as f64, 60 + i))
            .collect();
        let (stuck, count) = stuck_deals(&deals, &config);

        assert_eq!(count, 15);
        assert_eq!(stuck.len(), 10);
        let ids: Vec<&str> = stuck.iter().map(|d| d.deal_id.as_str()).collect();
        assert_eq!(ids.first(), Some(&"D00"));
        assert_eq!(ids.last(), Some(&"D09"));
        for d in &stuck {
            assert!(d.days_in_stage > 45);
            assert!(["Discovery", "Demo", "Negotiation"].contains(&d.stage.as_str()));
        }
    }

    #[test]
    fn test_stuck_deals_respect_config() {
        let config = EngineConfig {
            stuck_days_threshold: 10,
            stuck_deal_limit: 1,
            ..EngineConfig::default()
        };
        let deals = vec![deal("D1", "Demo", 1.0, 11), deal("D2", "Demo", 1.0, 12)];
        let (stuck, count) = stuck_deals(&deals, &config);
        assert_eq!(count, 2);
        assert_eq!(stuck.len(), 1);
    }

    #[test]
    fn test_stage_breakdown_merges_padded_custom_stage() {
        let deals = vec![
            deal("D1", " Proposal", 100.0, 1),
            deal("D2", "Proposal ", 200.0, 1),
        ];
        let rows = stage_breakdown(&deals);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].stage, "Proposal");
        assert_eq!(rows[0].deal_count, 2);
    }

    #[test]
    fn test_stage_breakdown_is_flat_and_sorted() {
        let deals = vec![
            deal("D1", "Negotiation", 1000.0, 1),
            deal("D2", "Demo", 300.0, 1),
            deal("D3", "Negotiation", 2000.0, 1),
            deal("D4", "Closed_Won", 999.999, 1),
        ];
        let rows = stage_breakdown(&deals);
        let stages: Vec<&str> = rows.iter().map(|r| r.stage.as_str()).collect();
        assert_eq!(stages, vec!["Closed_Won", "Demo", "Negotiation"]);

        let negotiation = &rows[2];
        assert_eq!(negotiation.total_amount, 3000.0);
        assert_eq!(negotiation.avg_amount, 1500.0);
        assert_eq!(negotiation.deal_count, 2);
        assert_eq!(negotiation.avg_probability, 50.0);
        assert_eq!(negotiation.expected_value, 1500.0);

        assert_eq!(rows[0].total_amount, 1000.0);
    }

    #[test]
    fn test_deals_by_segment_sums_amounts() {
        let mut deals = vec![
            deal("D1", "Demo", 100.0, 1),
            deal("D2", "Demo", 250.0, 1),
            deal("D3", "Demo", 75.0, 1),
        ];
        deals[1].segment = "ENT".to_string();
        let by_segment = deals_by_segment(&deals);
        assert_eq!(by_segment.len(), 2);
        assert_eq!(by_segment["MM"], 175.0);
        assert_eq!(by_segment["ENT"], 250.0);
    }

    #[test]
    fn test_empty_pipeline() {
        let summary = summarize_pipeline(&[], &EngineConfig::default());
        assert_eq!(summary.metrics, PipelineMetrics::default());
        assert!(summary.stage_breakdown.is_empty());
        assert!(summary.deals_by_segment.is_empty());
        assert!(summary.stuck_deals.is_empty());
        assert_eq!(summary.stuck_deal_count, 0);
    }

    #[test]
    fn test_pipeline_totals() {
        let deals = vec![
            deal("D1", "Demo", 100.0, 1),
            deal("D2", "Demo", 300.0, 1),
        ];
        let m = pipeline_metrics(&deals);
        assert_eq!(m.total_pipeline, 400.0);
        assert_eq!(m.weighted_pipeline, 200.0);
        assert_eq!(m.avg_deal_size, 200.0);
        assert_eq!(m.total_deals, 2);
        assert_eq!(m.avg_probability, 50.0);
    }

    #[test]
    fn test_serialized_field_names() {
        let summary = summarize_pipeline(
            &[deal("D1", "Discovery", 500.0, 90)],
            &EngineConfig::default(),
        );
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["metrics"]["totalDeals"], 1);
        assert_eq!(json["stageBreakdown"][0]["dealCount"], 1);
        assert_eq!(json["dealsBySegment"]["MM"], 500.0);
        assert_eq!(json["stuckDeals"][0]["dealId"], "D1");
        assert_eq!(json["stuckDeals"][0]["daysInStage"], 90);
        assert_eq!(json["stuckDealCount"], 1);
    }
}
