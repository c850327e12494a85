use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::DealStage;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Build the revenue-operations dashboard payload from funnel CSV exports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "revops-dashboard",
    about = "Build the revenue-operations dashboard payload from funnel CSV exports",
    version
)]
pub struct Settings {
    /// Directory containing the four dataset CSV files
    #[arg(long, default_value = ".")]
    pub data_dir: PathBuf,

    /// Where to write the JSON payload
    #[arg(long, default_value = "dashboard_data.json")]
    pub output: PathBuf,

    /// Calendar year used for the synthetic monthly trend axis
    #[arg(long, default_value = "2024", value_parser = clap::value_parser!(i32).range(1970..=9999))]
    pub trend_year: i32,

    /// Days in stage after which an open deal counts as stuck
    #[arg(long, default_value = "45")]
    pub stuck_days: u32,

    /// Maximum number of stuck deals listed in the payload
    #[arg(long, default_value = "10")]
    pub stuck_limit: usize,

    /// Number of channels shown in each top-channel ranking of the summary
    #[arg(long, default_value = "3")]
    pub top_channels: usize,

    /// Print dataset shapes and columns, then exit without writing a payload
    #[arg(long)]
    pub inspect: bool,

    /// Suppress the console summary
    #[arg(long)]
    pub quiet: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── EngineConfig ───────────────────────────────────────────────────────────────

/// Tunables of the aggregation engine.
///
/// [`EngineConfig::default`] reproduces the standard dashboard rules: deals
/// open for more than 45 days in Discovery, Demo or Negotiation are stuck, at
/// most 10 of them are listed, and trends are laid out over 2024 with six
/// points shown per summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub stuck_days_threshold: u32,
    pub stuck_deal_limit: usize,
    pub stuck_stages: Vec<DealStage>,
    pub trend_year: i32,
    pub trend_slice_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stuck_days_threshold: 45,
            stuck_deal_limit: 10,
            stuck_stages: vec![
                DealStage::Discovery,
                DealStage::Demo,
                DealStage::Negotiation,
            ],
            trend_year: 2024,
            trend_slice_len: 6,
        }
    }
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.revops-dashboard/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl LastUsedParams {
    /// Default location of the persisted parameters.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".revops-dashboard").join("last_used.json")
    }

    /// Load persisted params. Absent or unparseable files yield `Default`.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&content) {
            Ok(params) => params,
            Err(e) => {
                tracing::warn!("Ignoring unreadable {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write params via a temp file and rename, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at `path` if it exists.
    pub fn clear_at(path: &Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse process arguments, fill unset values from the last run, and
    /// persist the result for the next one.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Same as [`Settings::load_with_last_used`] with explicit arguments and
    /// config location.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!("Could not clear {}: {}", config_path.display(), e);
            }
            return settings.apply_debug();
        }

        let last = LastUsedParams::load_from(config_path);

        // clap stores arg ids by field name, not by flag spelling.
        if !is_arg_explicitly_set(&matches, "data_dir") {
            if let Some(v) = last.data_dir {
                settings.data_dir = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "output") {
            if let Some(v) = last.output {
                settings.output = v;
            }
        }

        settings = settings.apply_debug();

        // Inspection runs are read-only.
        if !settings.inspect {
            if let Err(e) = LastUsedParams::from(&settings).save_to(config_path) {
                tracing::warn!("Could not persist {}: {}", config_path.display(), e);
            }
        }

        settings
    }

    /// Engine tunables derived from the CLI values.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            stuck_days_threshold: self.stuck_days,
            stuck_deal_limit: self.stuck_limit,
            trend_year: self.trend_year,
            ..EngineConfig::default()
        }
    }

    fn apply_debug(mut self) -> Self {
        if self.debug {
            self.log_level = "DEBUG".to_string();
        }
        self
    }
}

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            data_dir: Some(s.data_dir.clone()),
            output: Some(s.output.clone()),
        }
    }
}

/// `true` when `name` was supplied on the command line rather than defaulted.
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
