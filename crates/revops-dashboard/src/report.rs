//! Plain-text console summary of a finished dashboard payload.

use std::fmt::Write;

use revops_core::formatting::{format_count, format_currency, format_percent};
use revops_data::marketing::ChannelPerformance;
use revops_data::reader::DatasetShape;
use revops_data::DashboardPayload;

const RULE_WIDTH: usize = 50;

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{title}");
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
}

/// Channels ranked by `key` descending, ties kept in payload order.
fn top_channels<F>(channels: &[ChannelPerformance], n: usize, key: F) -> Vec<&ChannelPerformance>
where
    F: Fn(&ChannelPerformance) -> f64,
{
    let mut ranked: Vec<&ChannelPerformance> = channels.iter().collect();
    ranked.sort_by(|a, b| key(b).total_cmp(&key(a)));
    ranked.truncate(n);
    ranked
}

/// Render key metrics, revenue by segment, the top channels by ROI and by
/// spend, and the number of deals stuck longer than `stuck_days`.
pub fn render_summary(payload: &DashboardPayload, top_n: usize, stuck_days: u32) -> String {
    let mut out = String::new();
    let revenue = &payload.revenue.metrics;
    let marketing = &payload.marketing.metrics;
    let pipeline = &payload.pipeline.metrics;

    heading(&mut out, "KEY METRICS");
    let rows = [
        ("Total MRR", format_currency(revenue.total_mrr)),
        ("Total ARR", format_currency(revenue.total_arr)),
        ("Marketing Spend", format_currency(marketing.total_spend)),
        ("Average ROI", format_percent(marketing.avg_roi, 1)),
        ("Total Pipeline", format_currency(pipeline.total_pipeline)),
        ("Win Rate", format_percent(pipeline.win_rate, 1)),
        ("Total Customers", format_count(revenue.total_customers)),
        ("Churn Rate", format_percent(revenue.churn_rate, 1)),
    ];
    for (label, value) in rows {
        let _ = writeln!(out, "{:<20}{:>20}", format!("{label}:"), value);
    }

    heading(&mut out, "REVENUE BY SEGMENT");
    for seg in &payload.revenue.segment_breakdown {
        let _ = writeln!(
            out,
            "{:<20}{:>20}  ({} customers)",
            seg.segment,
            format_currency(seg.total_mrr),
            format_count(seg.customer_count)
        );
    }

    let channels = &payload.marketing.channel_performance;

    heading(&mut out, &format!("TOP {top_n} CHANNELS BY ROI"));
    for ch in top_channels(channels, top_n, |c| c.roi) {
        let _ = writeln!(out, "{:<20}{:>20}", ch.channel, format_percent(ch.roi, 1));
    }

    heading(&mut out, &format!("TOP {top_n} CHANNELS BY SPEND"));
    for ch in top_channels(channels, top_n, |c| c.spend) {
        let _ = writeln!(out, "{:<20}{:>20}", ch.channel, format_currency(ch.spend));
    }

    heading(&mut out, "PIPELINE HEALTH");
    let _ = writeln!(
        out,
        "Stuck deals (>{stuck_days} days): {}",
        format_count(payload.pipeline.stuck_deal_count)
    );

    out
}

/// Render one block per dataset with its row count and columns.
pub fn render_shapes(shapes: &[DatasetShape]) -> String {
    let mut out = String::new();
    for shape in shapes {
        heading(&mut out, &shape.name.to_uppercase());
        let _ = writeln!(out, "File: {}", shape.path.display());
        let _ = writeln!(out, "Rows: {}", format_count(shape.rows as u64));
        let _ = writeln!(out, "Columns: {}", shape.columns.join(", "));
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────
