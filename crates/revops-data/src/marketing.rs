//! Marketing spend and funnel rollup.

use std::collections::BTreeMap;

use revops_core::models::MarketingChannelRecord;
use revops_core::stats::{mean, round2, MeanAccumulator};
use serde::{Deserialize, Serialize};

use crate::trends::TrendPoint;

// ── Public types ──────────────────────────────────────────────────────────────

/// Scalar totals over every marketing row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingMetrics {
    pub total_spend: f64,
    pub total_leads: u64,
    #[serde(rename = "totalMQLs")]
    pub total_mqls: u64,
    #[serde(rename = "totalSQLs")]
    pub total_sqls: u64,
    pub total_opportunities: u64,
    pub total_closed_won: u64,
    #[serde(rename = "avgCAC")]
    pub avg_cac: f64,
    #[serde(rename = "avgROI")]
    pub avg_roi: f64,
}

/// One row of the per-channel rollup. Every numeric field is rounded to two
/// decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelPerformance {
    pub channel: String,
    pub spend: f64,
    pub leads: u64,
    #[serde(rename = "MQLs")]
    pub mqls: u64,
    #[serde(rename = "SQLs")]
    pub sqls: u64,
    #[serde(rename = "CAC")]
    pub cac: f64,
    #[serde(rename = "ROI")]
    pub roi: f64,
    pub opportunities: u64,
    pub closed_won: u64,
}

/// A single stage of the marketing funnel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelStage {
    pub stage: String,
    pub count: u64,
}

/// Marketing section of the dashboard payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingSummary {
    pub metrics: MarketingMetrics,
    /// Ordered by channel name, ascending.
    pub channel_performance: Vec<ChannelPerformance>,
    pub funnel_data: Vec<FunnelStage>,
    /// Filled in by the payload assembler.
    pub trends_data: Vec<TrendPoint>,
}

/// Funnel stage labels, in funnel order.
pub const FUNNEL_STAGES: [&str; 5] = ["Leads", "MQLs", "SQLs", "Opportunities", "Closed Won"];

// ── Aggregation ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct ChannelAccumulator {
    spend: f64,
    leads: u64,
    mqls: u64,
    sqls: u64,
    opportunities: u64,
    closed_won: u64,
    cac: MeanAccumulator,
    roi: MeanAccumulator,
}

impl ChannelAccumulator {
    fn add(&mut self, row: &MarketingChannelRecord) {
        self.spend += row.spend;
        self.leads += row.leads;
        self.mqls += row.mqls;
        self.sqls += row.sqls;
        self.opportunities += row.opportunities;
        self.closed_won += row.closed_won;
        self.cac.push(row.cac);
        self.roi.push(row.roi);
    }

    fn into_row(self, channel: String) -> ChannelPerformance {
        ChannelPerformance {
            channel,
            spend: round2(self.spend),
            leads: self.leads,
            mqls: self.mqls,
            sqls: self.sqls,
            cac: round2(self.cac.mean()),
            roi: round2(self.roi.mean()),
            opportunities: self.opportunities,
            closed_won: self.closed_won,
        }
    }
}

/// Compute totals over all rows. CAC and ROI are plain row means, not
/// spend-weighted.
pub fn marketing_metrics(rows: &[MarketingChannelRecord]) -> MarketingMetrics {
    MarketingMetrics {
        total_spend: rows.iter().map(|r| r.spend).sum(),
        total_leads: rows.iter().map(|r| r.leads).sum(),
        total_mqls: rows.iter().map(|r| r.mqls).sum(),
        total_sqls: rows.iter().map(|r| r.sqls).sum(),
        total_opportunities: rows.iter().map(|r| r.opportunities).sum(),
        total_closed_won: rows.iter().map(|r| r.closed_won).sum(),
        avg_cac: mean(rows.iter().map(|r| r.cac)),
        avg_roi: mean(rows.iter().map(|r| r.roi)),
    }
}

/// Group rows by channel, one output row per distinct channel.
pub fn channel_performance(rows: &[MarketingChannelRecord]) -> Vec<ChannelPerformance> {
    let mut groups: BTreeMap<&str, ChannelAccumulator> = BTreeMap::new();
    for row in rows {
        groups.entry(row.channel.as_str()).or_default().add(row);
    }
    groups
        .into_iter()
        .map(|(channel, acc)| acc.into_row(channel.to_string()))
        .collect()
}

/// The fixed five-stage funnel built from the totals.
pub fn funnel(metrics: &MarketingMetrics) -> Vec<FunnelStage> {
    let counts = [
        metrics.total_leads,
        metrics.total_mqls,
        metrics.total_sqls,
        metrics.total_opportunities,
        metrics.total_closed_won,
    ];
    FUNNEL_STAGES
        .iter()
        .zip(counts)
        .map(|(stage, count)| FunnelStage {
            stage: stage.to_string(),
            count,
        })
        .collect()
}

/// Build the marketing summary. `trends_data` is left empty.
pub fn summarize_marketing(rows: &[MarketingChannelRecord]) -> MarketingSummary {
    let metrics = marketing_metrics(rows);
    let funnel_data = funnel(&metrics);
    tracing::debug!("Marketing: {} rows aggregated", rows.len());
    MarketingSummary {
        channel_performance: channel_performance(rows),
        funnel_data,
        metrics,
        trends_data: Vec::new(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn channel_row(
        channel: &str,
        spend: f64,
        leads: u64,
        cac: f64,
        roi: f64,
    ) -> MarketingChannelRecord {
        MarketingChannelRecord {
            channel: channel.to_string(),
            spend,
            leads,
            mqls: leads / 2,
            sqls: leads / 4,
            opportunities: leads / 10,
            closed_won: leads / 20,
            cac,
            roi,
        }
    }

    fn email_row() -> MarketingChannelRecord {
        MarketingChannelRecord {
            channel: "Email".to_string(),
            spend: 1000.0,
            leads: 100,
            mqls: 40,
            sqls: 10,
            opportunities: 5,
            closed_won: 2,
            cac: 10.0,
            roi: 150.0,
        }
    }

    #[test]
    fn test_single_email_channel_scenario() {
        let summary = summarize_marketing(&[email_row()]);
        let m = &summary.metrics;

        assert_eq!(m.total_spend, 1000.0);
        assert_eq!(m.total_leads, 100);
        assert_eq!(m.total_mqls, 40);
        assert_eq!(m.total_sqls, 10);
        assert_eq!(m.avg_cac, 10.0);
        assert_eq!(m.avg_roi, 150.0);

        let funnel: Vec<(&str, u64)> = summary
            .funnel_data
            .iter()
            .map(|f| (f.stage.as_str(), f.count))
            .collect();
        assert_eq!(
            funnel,
            vec![
                ("Leads", 100),
                ("MQLs", 40),
                ("SQLs", 10),
                ("Opportunities", 5),
                ("Closed Won", 2),
            ]
        );
    }

    #[test]
    fn test_empty_input_yields_zero_totals() {
        let summary = summarize_marketing(&[]);
        assert_eq!(summary.metrics, MarketingMetrics::default());
        assert!(summary.channel_performance.is_empty());
        assert_eq!(summary.funnel_data.len(), 5);
        assert!(summary.funnel_data.iter().all(|f| f.count == 0));
    }

    #[test]
    fn test_averages_are_unweighted() {
        let rows = vec![
            channel_row("Paid Search", 9000.0, 100, 90.0, 50.0),
            channel_row("Events", 1000.0, 100, 10.0, 250.0),
        ];
        let m = marketing_metrics(&rows);
        assert_eq!(m.avg_cac, 50.0);
        assert_eq!(m.avg_roi, 150.0);
    }

    #[test]
    fn test_channel_rollup_groups_and_sorts_by_channel() {
        let rows = vec![
            channel_row("Webinar", 300.0, 30, 10.0, 100.0),
            channel_row("Email", 100.0, 10, 5.0, 200.0),
            channel_row("Webinar", 700.0, 70, 20.0, 150.0),
            channel_row("Content", 50.0, 5, 1.0, 50.0),
        ];
        let perf = channel_performance(&rows);

        let names: Vec<&str> = perf.iter().map(|p| p.channel.as_str()).collect();
        assert_eq!(names, vec!["Content", "Email", "Webinar"]);

        let webinar = &perf[2];
        assert_eq!(webinar.spend, 1000.0);
        assert_eq!(webinar.leads, 100);
        assert_eq!(webinar.cac, 15.0);
        assert_eq!(webinar.roi, 125.0);
    }

    #[test]
    fn test_channel_rollup_rounds_to_two_decimals() {
        let rows = vec![
            channel_row("Social", 100.005, 1, 1.0, 10.0),
            channel_row("Social", 0.001, 1, 2.0, 20.0),
            channel_row("Social", 0.0, 1, 2.0, 20.0),
        ];
        let perf = channel_performance(&rows);
        assert_eq!(perf.len(), 1);
        assert_eq!(perf[0].cac, 1.67);
        assert_eq!(perf[0].roi, 16.67);
        assert_eq!(perf[0].spend, 100.01);
    }

    #[test]
    fn test_channel_spend_reconciles_with_total() {
        let rows = vec![
            channel_row("A", 1234.567, 10, 1.0, 1.0),
            channel_row("B", 89.123, 10, 1.0, 1.0),
            channel_row("A", 10.0, 10, 1.0, 1.0),
            channel_row("C", 0.5, 10, 1.0, 1.0),
        ];
        let metrics = marketing_metrics(&rows);
        let perf = channel_performance(&rows);
        let rollup_spend: f64 = perf.iter().map(|p| p.spend).sum();
        // Each channel is rounded to the cent, so the gap is bounded by
        // half a cent per channel.
        assert!((rollup_spend - metrics.total_spend).abs() <= 0.005 * perf.len() as f64);
    }

    #[test]
    fn test_every_channel_appears_exactly_once() {
        let rows = vec![
            channel_row("X", 1.0, 1, 1.0, 1.0),
            channel_row("Y", 1.0, 1, 1.0, 1.0),
            channel_row("X", 1.0, 1, 1.0, 1.0),
        ];
        let perf = channel_performance(&rows);
        assert_eq!(perf.len(), 2);
        assert_eq!(perf.iter().filter(|p| p.channel == "X").count(), 1);
    }

    #[test]
    fn test_serialized_field_names() {
        let summary = summarize_marketing(&[email_row()]);
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["metrics"]["totalMQLs"], 40);
        assert_eq!(json["metrics"]["avgROI"], 150.0);
        assert_eq!(json["channelPerformance"][0]["closed_won"], 2);
        assert_eq!(json["channelPerformance"][0]["CAC"], 10.0);
        assert_eq!(json["funnelData"][4]["stage"], "Closed Won");
        assert!(json["trendsData"].as_array().unwrap().is_empty());
        // Counts stay integral on the wire.
        assert!(json["metrics"]["totalLeads"].is_u64());
    }
}
