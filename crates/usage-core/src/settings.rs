use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, UsageError};
use crate::filter::FilterCriteria;
use crate::models::{RankMetric, RecordField};

/// Default multiplier over the mean daily cost above which a day is flagged.
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 1.5;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Summaries, rankings and cost anomalies for GitHub Actions / LFS usage reports
#[derive(Parser, Debug, Clone)]
#[command(
    name = "usage-dashboard",
    about = "Summaries, rankings and cost anomalies for GitHub Actions / LFS usage reports",
    version
)]
pub struct Settings {
    /// Usage report CSV file
    pub file: PathBuf,

    /// View mode
    #[arg(long, default_value = "dashboard", value_parser = [
        "dashboard", "summary", "daily", "sku", "users", "repositories", "anomalies", "records",
    ])]
    pub view: String,

    /// Only include records on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<String>,

    /// Only include records on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<String>,

    /// Only include records for this username
    #[arg(long)]
    pub user: Option<String>,

    /// Only include records for this repository
    #[arg(long)]
    pub repository: Option<String>,

    /// Only include records for this SKU
    #[arg(long)]
    pub sku: Option<String>,

    /// Only include records for this cost center
    #[arg(long)]
    pub cost_center: Option<String>,

    /// Metric used to rank top users and repositories
    #[arg(long, default_value = "quantity", value_parser = ["quantity", "cost"])]
    pub rank_by: String,

    /// Flag days whose cost exceeds this multiple of the mean daily cost
    #[arg(long, default_value_t = DEFAULT_ANOMALY_THRESHOLD)]
    pub anomaly_threshold: f64,

    /// Case-insensitive search over the raw records (records view)
    #[arg(long)]
    pub search: Option<String>,

    /// Column used to sort the raw records (records view)
    #[arg(long, default_value = "date", value_parser = clap::builder::PossibleValuesParser::new(RecordField::NAMES))]
    pub sort_by: String,

    /// Sort the raw records ascending instead of descending
    #[arg(long)]
    pub ascending: bool,

    /// Page of raw records to print, starting at 1 (records view)
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Print the report as JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "classic", "auto"])]
    pub theme: String,

    /// Seconds between checks for a changed report file (1-60)
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..=60))]
    pub refresh_rate: u32,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
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

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.usage-dashboard/last_used.json`.
///
/// Filters are deliberately absent: they only live as long as one run.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_rate: Option<u32>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".usage-dashboard").join("last_used.json")
    }

    /// Load persisted params from the default path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load persisted params from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable saved settings");
            Self::default()
        })
    }

    /// Atomically write params to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<()> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation; accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        // Raw ArgMatches tell us which values came from the command line.
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!(error = %e, "failed to clear saved settings");
            }
            return settings.apply_debug_flag();
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins. clap keys args by field name (underscores).
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = last.theme {
                settings.theme = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "rank_by") {
            if let Some(v) = last.rank_by {
                settings.rank_by = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "anomaly_threshold") {
            if let Some(v) = last.anomaly_threshold {
                settings.anomaly_threshold = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "refresh_rate") {
            if let Some(v) = last.refresh_rate {
                settings.refresh_rate = v;
            }
        }

        settings = settings.apply_debug_flag();

        if let Err(e) = LastUsedParams::from(&settings).save_to(config_path) {
            tracing::warn!(error = %e, "failed to persist settings");
        }

        settings
    }

    /// `--debug` overrides the log level.
    fn apply_debug_flag(mut self) -> Self {
        if self.debug {
            self.log_level = "DEBUG".to_string();
        }
        self
    }

    /// Check the values clap cannot validate on its own.
    pub fn validate(&self) -> Result<()> {
        for (flag, value) in [("--start-date", &self.start_date), ("--end-date", &self.end_date)] {
            if let Some(date) = value {
                if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() || date.len() != 10 {
                    return Err(UsageError::Config(format!(
                        "{flag} must be a date in YYYY-MM-DD form, got {date:?}"
                    )));
                }
            }
        }
        if let (Some(start), Some(end)) = (&self.start_date, &self.end_date) {
            if start > end {
                return Err(UsageError::Config(format!(
                    "--start-date {start} is after --end-date {end}"
                )));
            }
        }
        if !self.anomaly_threshold.is_finite() || self.anomaly_threshold <= 0.0 {
            return Err(UsageError::Config(format!(
                "--anomaly-threshold must be a positive number, got {}",
                self.anomaly_threshold
            )));
        }
        self.rank_metric()?;
        self.sort_field()?;
        Ok(())
    }

    /// The record filter described by the filter flags.
    pub fn filter(&self) -> FilterCriteria {
        let mut filter = FilterCriteria::new();
        if let Some(v) = &self.start_date {
            filter = filter.with_start_date(v.clone());
        }
        if let Some(v) = &self.end_date {
            filter = filter.with_end_date(v.clone());
        }
        if let Some(v) = &self.user {
            filter = filter.with_username(v.clone());
        }
        if let Some(v) = &self.repository {
            filter = filter.with_repository(v.clone());
        }
        if let Some(v) = &self.sku {
            filter = filter.with_sku(v.clone());
        }
        if let Some(v) = &self.cost_center {
            filter = filter.with_cost_center(v.clone());
        }
        filter
    }

    /// Parsed `--rank-by`.
    pub fn rank_metric(&self) -> Result<RankMetric> {
        self.rank_by.parse()
    }

    /// Parsed `--sort-by`.
    pub fn sort_field(&self) -> Result<RecordField> {
        RecordField::from_name(&self.sort_by)
            .ok_or_else(|| UsageError::Config(format!("unknown record column: {}", self.sort_by)))
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            theme: Some(s.theme.clone()),
            view: Some(s.view.clone()),
            rank_by: Some(s.rank_by.clone()),
            anomaly_threshold: Some(s.anomaly_threshold),
            refresh_rate: Some(s.refresh_rate),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
