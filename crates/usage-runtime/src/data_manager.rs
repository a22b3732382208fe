//! Change-aware data manager for the dashboard runtime.
//!
//! Owns the loaded record set for one usage-report file. The file is only
//! re-read when its size or modification time changes; each successful read
//! bumps a generation counter. Loads are retried up to three times with
//! back-off, and on failure the previously loaded records stay available.
//!
//! [`ReportCache`] memoizes the filtered records keyed by (generation,
//! filter) and the last [`DashboardReport`] keyed by (generation, filter,
//! options); both are invalidated wholesale on reload.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant, SystemTime};

use usage_core::filter::FilterCriteria;
use usage_core::models::UsageRecord;
use usage_data::analysis::{analyze_filtered, AnalysisOptions, DashboardReport};
use usage_data::reader::load_usage_csv;

/// Maximum number of load attempts before giving up and keeping stale data.
const MAX_RETRY_ATTEMPTS: u32 = 3;

// ── FileFingerprint ───────────────────────────────────────────────────────────

/// Size and modification time of the report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileFingerprint {
    len: u64,
    modified: Option<SystemTime>,
}

impl FileFingerprint {
    fn of(path: &Path) -> Option<Self> {
        let meta = fs::metadata(path).ok()?;
        Some(Self {
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

// ── ReportCache ───────────────────────────────────────────────────────────────

/// Single-entry memo of the filtered records and the last computed report.
///
/// The filtered records are keyed by (generation, filter) and the report by
/// (generation, filter, options), so toggling the rank metric reuses the
/// filtered set.
#[derive(Debug, Default)]
pub struct ReportCache {
    filtered: Option<FilteredRecords>,
    entry: Option<CachedReport>,
}

#[derive(Debug)]
struct FilteredRecords {
    generation: u64,
    filter: FilterCriteria,
    records: Arc<Vec<UsageRecord>>,
}

#[derive(Debug)]
struct CachedReport {
    generation: u64,
    filter: FilterCriteria,
    options: AnalysisOptions,
    report: DashboardReport,
}

impl ReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records of `records` matching `filter`, applying the filter only when
    /// the generation or the filter changed.
    pub fn filtered(
        &mut self,
        generation: u64,
        records: &[UsageRecord],
        filter: &FilterCriteria,
    ) -> Arc<Vec<UsageRecord>> {
        let hit = matches!(
            &self.filtered,
            Some(f) if f.generation == generation && f.filter == *filter
        );
        let entry = match self.filtered.take() {
            Some(cached) if hit => cached,
            _ => {
                let matching = filter.apply(records);
                tracing::debug!(
                    generation,
                    matched = matching.len(),
                    filter = %filter.describe(),
                    "filter applied"
                );
                FilteredRecords {
                    generation,
                    filter: filter.clone(),
                    records: Arc::new(matching),
                }
            }
        };
        Arc::clone(&self.filtered.insert(entry).records)
    }

    /// Return the cached report when the key matches, otherwise run
    /// [`analyze_filtered`] over the cached filtered records and cache the
    /// result.
    pub fn get_or_compute(
        &mut self,
        generation: u64,
        records: &[UsageRecord],
        filter: &FilterCriteria,
        options: &AnalysisOptions,
    ) -> &DashboardReport {
        let hit = matches!(
            &self.entry,
            Some(c) if c.generation == generation && c.filter == *filter && c.options == *options
        );

        let entry = match self.entry.take() {
            Some(cached) if hit => {
                tracing::debug!(generation, "report cache hit");
                cached
            }
            _ => {
                tracing::debug!(generation, filter = %filter.describe(), "report cache miss");
                let filtered = self.filtered(generation, records, filter);
                CachedReport {
                    generation,
                    filter: filter.clone(),
                    options: *options,
                    report: analyze_filtered(records, &filtered, filter, options),
                }
            }
        };
        &self.entry.insert(entry).report
    }

    /// Drop the cached records and report.
    pub fn invalidate(&mut self) {
        self.filtered = None;
        self.entry = None;
    }

    pub fn is_empty(&self) -> bool {
        self.filtered.is_none() && self.entry.is_none()
    }
}

// ── DataManager ───────────────────────────────────────────────────────────────

/// Loads one usage-report file and keeps the latest good copy in memory.
///
/// # Example
/// ```no_run
/// use usage_runtime::data_manager::DataManager;
///
/// let mut mgr = DataManager::new("usage.csv");
/// if let Some(records) = mgr.load(false) {
///     println!("{} records", records.len());
/// }
/// ```
pub struct DataManager {
    path: PathBuf,
    /// Most recently loaded records.
    records: Option<Arc<Vec<UsageRecord>>>,
    /// Incremented on every successful load; `0` means nothing loaded yet.
    generation: u64,
    /// File state at the last successful load.
    fingerprint: Option<FileFingerprint>,
    reports: ReportCache,
    /// Human-readable description of the last error encountered.
    last_error: Option<String>,
    /// When the last *successful* load completed.
    last_successful_load: Option<Instant>,
}

impl DataManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: None,
            generation: 0,
            fingerprint: None,
            reports: ReportCache::new(),
            last_error: None,
            last_successful_load: None,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the loaded records, re-reading the file first when needed.
    ///
    /// The file is read when `force` is `true`, when nothing has been loaded
    /// yet, or when [`has_changed`](Self::has_changed) reports a change. On
    /// failure the previous records (if any) are returned.
    pub fn load(&mut self, force: bool) -> Option<Arc<Vec<UsageRecord>>> {
        if !force && self.records.is_some() && !self.has_changed() {
            tracing::debug!("report file unchanged; keeping loaded records");
            return self.records.clone();
        }

        match self.load_with_retry() {
            Ok((records, fingerprint)) => {
                self.generation += 1;
                tracing::debug!(
                    records = records.len(),
                    generation = self.generation,
                    "usage records loaded"
                );
                self.records = Some(Arc::new(records));
                self.fingerprint = fingerprint;
                self.reports.invalidate();
                self.last_error = None;
                self.last_successful_load = Some(Instant::now());
            }
            Err(e) => {
                tracing::warn!(error = %e, "load failed; keeping previously loaded records");
                self.last_error = Some(e);
            }
        }
        self.records.clone()
    }

    /// `true` when the file's size or modification time differs from the
    /// last successful load, or the file cannot be inspected.
    pub fn has_changed(&self) -> bool {
        match (FileFingerprint::of(&self.path), self.fingerprint) {
            (Some(now), Some(then)) => now != then,
            _ => true,
        }
    }

    /// Report for the loaded records, memoized by (generation, filter, options).
    ///
    /// Returns `None` when nothing has been loaded.
    pub fn report(
        &mut self,
        filter: &FilterCriteria,
        options: &AnalysisOptions,
    ) -> Option<&DashboardReport> {
        let records = self.records.as_ref()?;
        Some(
            self.reports
                .get_or_compute(self.generation, records, filter, options),
        )
    }

    /// Loaded records matching `filter`, memoized by (generation, filter).
    ///
    /// Returns `None` when nothing has been loaded.
    pub fn filtered_records(&mut self, filter: &FilterCriteria) -> Option<Arc<Vec<UsageRecord>>> {
        let records = self.records.as_ref()?;
        Some(self.reports.filtered(self.generation, records, filter))
    }

    /// Discard the cached report, forcing the next [`report`](Self::report)
    /// call to recompute.
    pub fn invalidate_cache(&mut self) {
        self.reports.invalidate();
        tracing::debug!("report cache invalidated");
    }

    pub fn records(&self) -> Option<Arc<Vec<UsageRecord>>> {
        self.records.clone()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Human-readable description of the last load error, or `None`.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Time since the last successful load.
    pub fn last_load_age(&self) -> Option<Duration> {
        self.last_successful_load.map(|ts| ts.elapsed())
    }

    // ── Private helpers ───────────────────────────────────────────────────

    /// Attempt up to [`MAX_RETRY_ATTEMPTS`] loads with back-off
    /// (0 ms, 100 ms, 200 ms).
    fn load_with_retry(&self) -> Result<(Vec<UsageRecord>, Option<FileFingerprint>), String> {
        let mut last_err = String::new();

        for attempt in 0..MAX_RETRY_ATTEMPTS {
            if attempt > 0 {
                let sleep_ms = (attempt as u64) * 100;
                tracing::debug!(attempt, sleep_ms, "retrying load after back-off");
                thread::sleep(Duration::from_millis(sleep_ms));
            }

            // Fingerprint first so a write racing the read is picked up next poll.
            let fingerprint = FileFingerprint::of(&self.path);
            match load_usage_csv(&self.path) {
                Ok(records) => return Ok((records, fingerprint)),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "load attempt failed");
                    last_err = e.to_string();
                }
            }
        }

        Err(last_err)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
