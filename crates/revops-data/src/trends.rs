//! Synthetic monthly trend series.
//!
//! The series is illustrative rather than measured: each yearly funnel total
//! is spread evenly over twelve months and modulated by a fixed sine wave,
//! while MRR grows linearly by 2% of the monthly average per month. The same
//! totals always produce the same series.

use chrono::NaiveDate;
use revops_core::error::{DashboardError, Result};
use serde::{Deserialize, Serialize};

use crate::marketing::MarketingMetrics;
use crate::revenue::RevenueMetrics;

pub const MONTHS: usize = 12;

const LEADS_AMPLITUDE: f64 = 0.20;
const MQLS_AMPLITUDE: f64 = 0.15;
const SQLS_AMPLITUDE: f64 = 0.10;
const PHASE_STEP: f64 = 0.5;
const MRR_MONTHLY_GROWTH: f64 = 0.02;

/// One month of the synthetic series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// First day of the month.
    pub date: NaiveDate,
    pub leads: u64,
    #[serde(rename = "MQLs")]
    pub mqls: u64,
    #[serde(rename = "SQLs")]
    pub sqls: u64,
    pub mrr: f64,
}

/// MRR-only view of a trend point, as shown in the revenue section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueTrendPoint {
    pub month: NaiveDate,
    pub mrr: f64,
}

/// The yearly totals the synthesizer spreads across months.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrendInputs {
    pub total_leads: u64,
    pub total_mqls: u64,
    pub total_sqls: u64,
    pub total_mrr: f64,
}

impl TrendInputs {
    pub fn from_metrics(marketing: &MarketingMetrics, revenue: &RevenueMetrics) -> Self {
        Self {
            total_leads: marketing.total_leads,
            total_mqls: marketing.total_mqls,
            total_sqls: marketing.total_sqls,
            total_mrr: revenue.total_mrr,
        }
    }
}

fn seasonal(total: u64, month: usize, amplitude: f64) -> u64 {
    let factor = 1.0 + (month as f64 * PHASE_STEP).sin() * amplitude;
    // Truncation toward zero; the factor never drops below 0.8.
    (total as f64 / MONTHS as f64 * factor) as u64
}

/// Produce twelve monthly points for `year`, January first.
pub fn synthesize(inputs: &TrendInputs, year: i32) -> Result<Vec<TrendPoint>> {
    (0..MONTHS)
        .map(|i| {
            let date = NaiveDate::from_ymd_opt(year, i as u32 + 1, 1).ok_or_else(|| {
                DashboardError::Config(format!("trend year {year} is out of range"))
            })?;
            Ok(TrendPoint {
                date,
                leads: seasonal(inputs.total_leads, i, LEADS_AMPLITUDE),
                mqls: seasonal(inputs.total_mqls, i, MQLS_AMPLITUDE),
                sqls: seasonal(inputs.total_sqls, i, SQLS_AMPLITUDE),
                mrr: inputs.total_mrr / MONTHS as f64 * (1.0 + i as f64 * MRR_MONTHLY_GROWTH),
            })
        })
        .collect()
}

/// The leading `len` points, used by the marketing section.
pub fn leading(points: &[TrendPoint], len: usize) -> Vec<TrendPoint> {
    points.iter().take(len).cloned().collect()
}

/// The trailing `len` points reduced to MRR, used by the revenue section.
pub fn trailing_mrr(points: &[TrendPoint], len: usize) -> Vec<RevenueTrendPoint> {
    let start = points.len().saturating_sub(len);
    points[start..]
        .iter()
        .map(|p| RevenueTrendPoint {
            month: p.date,
            mrr: p.mrr,
        })
        .collect()
}
