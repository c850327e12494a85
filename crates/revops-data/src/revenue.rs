//! Recurring-revenue rollup over the customer base.

use std::collections::HashMap;

use revops_core::models::CustomerRecord;
use revops_core::stats::{mean, percentage, MeanAccumulator};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::trends::RevenueTrendPoint;

/// Months in a year; ARR is always derived from MRR, never summed.
const ARR_MULTIPLIER: f64 = 12.0;

// ── Public types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueMetrics {
    #[serde(rename = "totalMRR")]
    pub total_mrr: f64,
    #[serde(rename = "totalARR")]
    pub total_arr: f64,
    #[serde(rename = "avgARPA")]
    pub avg_arpa: f64,
    #[serde(rename = "avgNRR")]
    pub avg_nrr: f64,
    #[serde(rename = "totalCustomers")]
    pub total_customers: u64,
    #[serde(rename = "churnedCustomers")]
    pub churned_customers: u64,
    /// Churned customers as a percentage of all customers.
    #[serde(rename = "churnRate")]
    pub churn_rate: f64,
}

/// Per-segment MRR rollup row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentBreakdown {
    pub segment: String,
    #[serde(rename = "totalMRR")]
    pub total_mrr: f64,
    #[serde(rename = "newMRR")]
    pub new_mrr: f64,
    #[serde(rename = "expansionMRR")]
    pub expansion_mrr: f64,
    #[serde(rename = "contractionMRR")]
    pub contraction_mrr: f64,
    #[serde(rename = "avgARPA")]
    pub avg_arpa: f64,
    #[serde(rename = "avgNRR")]
    pub avg_nrr: f64,
    #[serde(rename = "customerCount")]
    pub customer_count: u64,
}

/// MRR movement totals across all customers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MrrComponents {
    pub new_mrr: f64,
    pub expansion_mrr: f64,
    pub contraction_mrr: f64,
}

/// Revenue section of the dashboard payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    pub metrics: RevenueMetrics,
    /// One row per segment, in order of first appearance.
    pub segment_breakdown: Vec<SegmentBreakdown>,
    pub mrr_components: MrrComponents,
    /// Filled in by the payload assembler.
    pub trends_data: Vec<RevenueTrendPoint>,
}

// ── Aggregation ───────────────────────────────────────────────────────────────

pub fn revenue_metrics(customers: &[CustomerRecord]) -> RevenueMetrics {
    let total_mrr: f64 = customers.iter().map(|c| c.mrr).sum();
    let total_customers = customers.len() as u64;
    let churned_customers = customers.iter().filter(|c| c.churned_flag).count() as u64;
    RevenueMetrics {
        total_mrr,
        total_arr: total_mrr * ARR_MULTIPLIER,
        avg_arpa: mean(customers.iter().map(|c| c.arpa)),
        avg_nrr: mean(customers.iter().map(|c| c.nrr)),
        total_customers,
        churned_customers,
        churn_rate: percentage(churned_customers, total_customers),
    }
}

#[derive(Debug, Default)]
struct SegmentAccumulator {
    mrr: f64,
    new_mrr: f64,
    expansion_mrr: f64,
    contraction_mrr: f64,
    arpa: MeanAccumulator,
    nrr: MeanAccumulator,
}

pub fn segment_breakdown(customers: &[CustomerRecord]) -> Vec<SegmentBreakdown> {
    let mut order: Vec<(&str, SegmentAccumulator)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for customer in customers {
        let slot = *index.entry(customer.segment.as_str()).or_insert_with(|| {
            order.push((customer.segment.as_str(), SegmentAccumulator::default()));
            order.len() - 1
        });
        let acc = &mut order[slot].1;
        acc.mrr += customer.mrr;
        acc.new_mrr += customer.new_mrr;
        acc.expansion_mrr += customer.expansion_mrr;
        acc.contraction_mrr += customer.contraction_mrr;
        acc.arpa.push(customer.arpa);
        acc.nrr.push(customer.nrr);
    }

    order
        .into_iter()
        .map(|(segment, acc)| SegmentBreakdown {
            segment: segment.to_string(),
            total_mrr: acc.mrr,
            new_mrr: acc.new_mrr,
            expansion_mrr: acc.expansion_mrr,
            contraction_mrr: acc.contraction_mrr,
            avg_arpa: acc.arpa.mean(),
            avg_nrr: acc.nrr.mean(),
            customer_count: acc.arpa.count(),
        })
        .collect()
}

pub fn mrr_components(customers: &[CustomerRecord]) -> MrrComponents {
    MrrComponents {
        new_mrr: customers.iter().map(|c| c.new_mrr).sum(),
        expansion_mrr: customers.iter().map(|c| c.expansion_mrr).sum(),
        contraction_mrr: customers.iter().map(|c| c.contraction_mrr).sum(),
    }
}

/// Build the revenue summary. `trends_data` is left empty.
pub fn summarize_revenue(customers: &[CustomerRecord]) -> RevenueSummary {
    let metrics = revenue_metrics(customers);
    if metrics.total_customers == 0 {
        tracing::warn!("No customers in revenue dataset; churn rate reported as 0");
    }
    debug!(
        "Revenue: {} customers aggregated, {} churned",
        metrics.total_customers, metrics.churned_customers
    );
    RevenueSummary {
        segment_breakdown: segment_breakdown(customers),
        mrr_components: mrr_components(customers),
        metrics,
        trends_data: Vec::new(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(id: &str, segment: &str, mrr: f64, churned: bool) -> CustomerRecord {
        CustomerRecord {
            customer_id: id.to_string(),
            segment: segment.to_string(),
            mrr,
            new_mrr: mrr * 0.1,
            expansion_mrr: mrr * 0.05,
            contraction_mrr: mrr * 0.02,
            arpa: mrr,
            nrr: 100.0,
            churned_flag: churned,
        }
    }

    #[test]
    fn test_zero_customers() {
        let summary = summarize_revenue(&[]);
        assert_eq!(summary.metrics.total_mrr, 0.0);
        assert_eq!(summary.metrics.total_arr, 0.0);
        assert_eq!(summary.metrics.churn_rate, 0.0);
        assert_eq!(summary.metrics.avg_arpa, 0.0);
        assert!(summary.segment_breakdown.is_empty());
        assert_eq!(summary.mrr_components, MrrComponents::default());
    }

    #[test]
    fn test_arr_is_exactly_twelve_times_mrr() {
        let customers = vec![
            customer("C1", "SMB", 123.45, false),
            customer("C2", "ENT", 6789.01, false),
            customer("C3", "MM", 0.07, true),
        ];
        let m = revenue_metrics(&customers);
        assert_eq!(m.total_arr, m.total_mrr * 12.0);
    }

    #[test]
    fn test_churn_rate() {
        let customers = vec![
            customer("C1", "SMB", 100.0, true),
            customer("C2", "SMB", 100.0, false),
            customer("C3", "SMB", 100.0, false),
            customer("C4", "SMB", 100.0, false),
        ];
        let m = revenue_metrics(&customers);
        assert_eq!(m.total_customers, 4);
        assert_eq!(m.churned_customers, 1);
        assert_eq!(m.churn_rate, 25.0);
    }

    #[test]
    fn test_churn_rate_bounds() {
        let all_churned = vec![customer("C1", "SMB", 1.0, true), customer("C2", "MM", 1.0, true)];
        assert_eq!(revenue_metrics(&all_churned).churn_rate, 100.0);
        let none_churned = vec![customer("C1", "SMB", 1.0, false)];
        assert_eq!(revenue_metrics(&none_churned).churn_rate, 0.0);
    }

    #[test]
    fn test_segment_breakdown_first_seen_order() {
        let customers = vec![
            customer("C1", "SMB", 100.0, false),
            customer("C2", "ENT", 1000.0, false),
            customer("C3", "SMB", 300.0, false),
            customer("C4", "MM", 500.0, true),
        ];
        let rows = segment_breakdown(&customers);
        let names: Vec<&str> = rows.iter().map(|r| r.segment.as_str()).collect();
        assert_eq!(names, vec!["SMB", "ENT", "MM"]);

        let smb = &rows[0];
        assert_eq!(smb.total_mrr, 400.0);
        assert_eq!(smb.avg_arpa, 200.0);
        assert_eq!(smb.avg_nrr, 100.0);
        assert_eq!(smb.customer_count, 2);
        assert!((smb.new_mrr - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_mrr_components_independent_of_segment() {
        let customers = vec![
            customer("C1", "SMB", 100.0, false),
            customer("C2", "ENT", 200.0, false),
        ];
        let components = mrr_components(&customers);
        assert!((components.new_mrr - 30.0).abs() < 1e-9);
        assert!((components.expansion_mrr - 15.0).abs() < 1e-9);
        assert!((components.contraction_mrr - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_serialized_field_names() {
        let summary = summarize_revenue(&[customer("C1", "SMB", 100.0, true)]);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["metrics"]["totalARR"], 1200.0);
        assert_eq!(json["metrics"]["churnedCustomers"], 1);
        assert_eq!(json["segmentBreakdown"][0]["customerCount"], 1);
        assert!(json["mrrComponents"].get("expansion_mrr").is_some());
        assert!(json["trendsData"].as_array().unwrap().is_empty());
    }
}
