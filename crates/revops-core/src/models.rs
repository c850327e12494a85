use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{DashboardError, Result};

// ── Dataset trait ─────────────────────────────────────────────────────────────

/// A typed row shape belonging to one of the four input tables.
pub trait Dataset {
    /// Canonical dataset name, also the stem of its CSV file.
    const NAME: &'static str;
    /// Columns that must be present in the header row.
    const REQUIRED_COLUMNS: &'static [&'static str];

    /// Floating-point fields that must be finite before aggregation.
    fn float_fields(&self) -> Vec<(&'static str, f64)> {
        Vec::new()
    }
}

/// Fail with [`DashboardError::MissingField`] on the first required column of
/// `D` that does not appear in `headers`.
pub fn validate_columns<D: Dataset>(headers: &[String]) -> Result<()> {
    for column in D::REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(DashboardError::missing_field(D::NAME, column));
        }
    }
    Ok(())
}

/// Reject NaN and infinite values so they never reach a sum or mean.
///
/// Row numbers in the error are 1-based, counting data rows only.
pub fn validate_records<D: Dataset>(records: &[D]) -> Result<()> {
    for (idx, record) in records.iter().enumerate() {
        for (field, value) in record.float_fields() {
            if !value.is_finite() {
                return Err(DashboardError::InvalidValue {
                    dataset: D::NAME.to_string(),
                    row: idx + 1,
                    field: field.to_string(),
                    value: value.to_string(),
                });
            }
        }
    }
    Ok(())
}

// ── Marketing ─────────────────────────────────────────────────────────────────

/// One channel-period row of marketing spend and funnel counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketingChannelRecord {
    pub channel: String,
    pub spend: f64,
    pub leads: u64,
    #[serde(rename = "MQLs")]
    pub mqls: u64,
    #[serde(rename = "SQLs")]
    pub sqls: u64,
    pub opportunities: u64,
    pub closed_won: u64,
    /// Customer acquisition cost.
    #[serde(rename = "CAC")]
    pub cac: f64,
    /// Return on investment, as a percentage.
    #[serde(rename = "ROI")]
    pub roi: f64,
}

impl Dataset for MarketingChannelRecord {
    const NAME: &'static str = "marketing_channels";
    const REQUIRED_COLUMNS: &'static [&'static str] = &[
        "channel",
        "spend",
        "leads",
        "MQLs",
        "SQLs",
        "opportunities",
        "closed_won",
        "CAC",
        "ROI",
    ];

    fn float_fields(&self) -> Vec<(&'static str, f64)> {
        vec![("spend", self.spend), ("CAC", self.cac), ("ROI", self.roi)]
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Sales stage of a pipeline deal.
///
/// Unknown labels are kept (trimmed) in [`DealStage::Other`] so that
/// every stage seen in the input still gets its own rollup row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DealStage {
    Discovery,
    Demo,
    Negotiation,
    ClosedWon,
    ClosedLost,
    Other(String),
}

impl DealStage {
    /// The label as it appears in the dataset.
    pub fn as_str(&self) -> &str {
        match self {
            DealStage::Discovery => "Discovery",
            DealStage::Demo => "Demo",
            DealStage::Negotiation => "Negotiation",
            DealStage::ClosedWon => "Closed_Won",
            DealStage::ClosedLost => "Closed_Lost",
            DealStage::Other(label) => label,
        }
    }

    /// Whether the deal has reached a closed outcome.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DealStage::ClosedWon | DealStage::ClosedLost)
    }
}

impl From<String> for DealStage {
    fn from(label: String) -> Self {
        match label.trim() {
            "Discovery" => DealStage::Discovery,
            "Demo" => DealStage::Demo,
            "Negotiation" => DealStage::Negotiation,
            "Closed_Won" => DealStage::ClosedWon,
            "Closed_Lost" => DealStage::ClosedLost,
            _ => DealStage::Other(label.trim().to_string()),
        }
    }
}

impl From<&str> for DealStage {
    fn from(label: &str) -> Self {
        DealStage::from(label.to_string())
    }
}

impl From<DealStage> for String {
    fn from(stage: DealStage) -> Self {
        match stage {
            DealStage::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for DealStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One open or closed deal in the sales pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDealRecord {
    pub deal_id: String,
    pub account: String,
    pub amount: f64,
    pub stage: DealStage,
    /// Close probability in the range 0–100.
    pub probability: f64,
    pub expected_value: f64,
    pub days_in_stage: u32,
    pub owner: String,
    pub segment: String,
}

impl Dataset for PipelineDealRecord {
    const NAME: &'static str = "pipeline_deals";
    const REQUIRED_COLUMNS: &'static [&'static str] = &[
        "deal_id",
        "account",
        "amount",
        "stage",
        "probability",
        "expected_value",
        "days_in_stage",
        "owner",
        "segment",
    ];

    fn float_fields(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("amount", self.amount),
            ("probability", self.probability),
            ("expected_value", self.expected_value),
        ]
    }
}

// ── Revenue ───────────────────────────────────────────────────────────────────

/// One recurring-revenue customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub segment: String,
    pub mrr: f64,
    pub new_mrr: f64,
    pub expansion_mrr: f64,
    pub contraction_mrr: f64,
    /// Average revenue per account.
    pub arpa: f64,
    /// Net revenue retention.
    pub nrr: f64,
    #[serde(deserialize_with = "deserialize_flag")]
    pub churned_flag: bool,
}

impl Dataset for CustomerRecord {
    const NAME: &'static str = "revenue_customers";
    const REQUIRED_COLUMNS: &'static [&'static str] = &[
        "customer_id",
        "segment",
        "mrr",
        "new_mrr",
        "expansion_mrr",
        "contraction_mrr",
        "arpa",
        "nrr",
        "churned_flag",
    ];

    fn float_fields(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("mrr", self.mrr),
            ("new_mrr", self.new_mrr),
            ("expansion_mrr", self.expansion_mrr),
            ("contraction_mrr", self.contraction_mrr),
            ("arpa", self.arpa),
            ("nrr", self.nrr),
        ]
    }
}

/// Accept the boolean spellings spreadsheet exports commonly produce.
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw).ok_or_else(|| {
        serde::de::Error::custom(format!("invalid boolean flag '{}'", raw.trim()))
    })
}

/// Parse `true/false`, `1/0`, `yes/no` and `t/f`, ignoring case and
/// surrounding whitespace.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "1.0" | "yes" | "y" | "t" => Some(true),
        "false" | "0" | "0.0" | "no" | "n" | "f" => Some(false),
        _ => None,
    }
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

/// An industry-comparison row, carried through to the payload untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BenchmarkRecord(pub Map<String, Value>);

impl BenchmarkRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl Dataset for BenchmarkRecord {
    const NAME: &'static str = "benchmarks";
    const REQUIRED_COLUMNS: &'static [&'static str] = &[];
}

// ── Tests ─────────────────────────────────────────────────────────────────────
