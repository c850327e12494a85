//! CSV dataset discovery and loading.
//!
//! Each dataset lives in `<name>.csv` somewhere under the data directory.
//! Headers are checked against the record's required columns before any row
//! is decoded, so a missing column fails fast with the dataset and column
//! named instead of surfacing as a per-row decode error.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use revops_core::error::{DashboardError, Result};
use revops_core::models::{
    validate_columns, BenchmarkRecord, CustomerRecord, Dataset, MarketingChannelRecord,
    PipelineDealRecord,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::analysis::DashboardInputs;

// ── Public types ──────────────────────────────────────────────────────────────

/// Row count and header of one dataset file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetShape {
    pub name: String,
    pub path: PathBuf,
    pub rows: usize,
    pub columns: Vec<String>,
}

// ── Discovery ─────────────────────────────────────────────────────────────────

/// File name a dataset is expected under.
pub fn dataset_file_name<D: Dataset>() -> String {
    format!("{}.csv", D::NAME)
}

/// Locate `file_name` under `data_dir`, descending into subdirectories.
///
/// When several copies exist the shallowest wins, ties broken by path.
pub fn find_dataset_file(data_dir: &Path, dataset: &str, file_name: &str) -> Result<PathBuf> {
    let not_found = || DashboardError::DatasetNotFound {
        dataset: dataset.to_string(),
        dir: data_dir.to_path_buf(),
    };
    if !data_dir.is_dir() {
        return Err(not_found());
    }

    walkdir::WalkDir::new(data_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
        .min_by(|a, b| a.depth().cmp(&b.depth()).then_with(|| a.path().cmp(b.path())))
        .map(|entry| entry.into_path())
        .ok_or_else(not_found)
}

fn locate<D: Dataset>(data_dir: &Path) -> Result<PathBuf> {
    find_dataset_file(data_dir, D::NAME, &dataset_file_name::<D>())
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| DashboardError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader)
}

fn header_names<R: Read>(rdr: &mut csv::Reader<R>) -> Result<Vec<String>> {
    Ok(rdr.headers()?.iter().map(|h| h.to_string()).collect())
}

// ── Typed datasets ────────────────────────────────────────────────────────────

/// Decode typed records from CSV text, checking the header first.
pub fn read_records<D, R>(reader: R) -> Result<Vec<D>>
where
    D: Dataset + DeserializeOwned,
    R: Read,
{
    let mut rdr = csv_reader(reader);
    let headers = header_names(&mut rdr)?;
    validate_columns::<D>(&headers)?;

    let records = rdr
        .deserialize::<D>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    debug!("{}: {} rows decoded", D::NAME, records.len());
    Ok(records)
}

/// Open and decode a dataset file.
pub fn load_dataset<D>(path: &Path) -> Result<Vec<D>>
where
    D: Dataset + DeserializeOwned,
{
    read_records(open(path)?)
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

/// Turn a CSV cell into the most specific JSON scalar it parses as.
fn coerce_cell(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if cell.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if cell.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(i) = cell.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = cell.parse::<f64>() {
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(cell.to_string())
}

/// Read benchmark rows as opaque objects, keeping column order.
pub fn read_benchmarks<R: Read>(reader: R) -> Result<Vec<BenchmarkRecord>> {
    let mut rdr = csv_reader(reader);
    let headers = header_names(&mut rdr)?;

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let mut obj = Map::new();
        for (idx, header) in headers.iter().enumerate() {
            obj.insert(header.clone(), coerce_cell(record.get(idx).unwrap_or("")));
        }
        rows.push(BenchmarkRecord(obj));
    }
    debug!("{}: {} rows decoded", BenchmarkRecord::NAME, rows.len());
    Ok(rows)
}

/// Open and read a benchmarks file.
pub fn load_benchmarks(path: &Path) -> Result<Vec<BenchmarkRecord>> {
    read_benchmarks(open(path)?)
}

// ── Whole directory ───────────────────────────────────────────────────────────

/// Paths of the four datasets under `data_dir`, in load order.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetPaths {
    pub marketing: PathBuf,
    pub pipeline: PathBuf,
    pub customers: PathBuf,
    pub benchmarks: PathBuf,
}

impl DatasetPaths {
    pub fn discover(data_dir: &Path) -> Result<Self> {
        Ok(Self {
            marketing: locate::<MarketingChannelRecord>(data_dir)?,
            pipeline: locate::<PipelineDealRecord>(data_dir)?,
            customers: locate::<CustomerRecord>(data_dir)?,
            benchmarks: locate::<BenchmarkRecord>(data_dir)?,
        })
    }
}

/// Load all four datasets from `data_dir`.
pub fn load_inputs(data_dir: &Path) -> Result<DashboardInputs> {
    let paths = DatasetPaths::discover(data_dir)?;
    let inputs = DashboardInputs {
        marketing: load_dataset(&paths.marketing)?,
        pipeline: load_dataset(&paths.pipeline)?,
        customers: load_dataset(&paths.customers)?,
        benchmarks: load_benchmarks(&paths.benchmarks)?,
    };
    info!(
        "Loaded {} marketing rows, {} deals, {} customers, {} benchmarks from {}",
        inputs.marketing.len(),
        inputs.pipeline.len(),
        inputs.customers.len(),
        inputs.benchmarks.len(),
        data_dir.display()
    );
    Ok(inputs)
}

/// Row count and columns of the CSV at `path`, without typed decoding.
pub fn inspect_file(name: &str, path: &Path) -> Result<DatasetShape> {
    let mut rdr = csv_reader(open(path)?);
    let columns = header_names(&mut rdr)?;
    let mut rows = 0;
    for record in rdr.records() {
        record?;
        rows += 1;
    }
    Ok(DatasetShape {
        name: name.to_string(),
        path: path.to_path_buf(),
        rows,
        columns,
    })
}

/// Shapes of all four datasets under `data_dir`.
pub fn inspect_dir(data_dir: &Path) -> Result<Vec<DatasetShape>> {
    let paths = DatasetPaths::discover(data_dir)?;
    Ok(vec![
        inspect_file(CustomerRecord::NAME, &paths.customers)?,
        inspect_file(MarketingChannelRecord::NAME, &paths.marketing)?,
        inspect_file(PipelineDealRecord::NAME, &paths.pipeline)?,
        inspect_file(BenchmarkRecord::NAME, &paths.benchmarks)?,
    ])
}

// ── Tests ─────────────────────────────────────────────────────────────────────
