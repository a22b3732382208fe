//! Full analysis pipeline for the usage dashboard.
//!
//! Applies the filter once, then runs every summary over the filtered set and
//! bundles the results into a [`DashboardReport`] ready for the UI layer or
//! JSON output.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use usage_core::filter::{FilterChoices, FilterCriteria};
use usage_core::models::{
    CostAnomaly, DailySummary, RankMetric, RepositorySummary, SkuSummary, UsageRecord,
    UsageTotals, UserSummary,
};
use usage_core::settings::DEFAULT_ANOMALY_THRESHOLD;

use crate::aggregator::UsageAggregator;
use crate::anomaly::detect_cost_anomalies;
use crate::ranker::{top_n, TOP_N};

// ── Public types ──────────────────────────────────────────────────────────────

/// Knobs for [`analyze_usage`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Metric used to rank users and repositories.
    pub rank_by: RankMetric,
    /// Length of each ranking.
    pub top_n: usize,
    /// Multiplier applied to the average daily cost.
    pub anomaly_threshold: f64,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            rank_by: RankMetric::Quantity,
            top_n: TOP_N,
            anomaly_threshold: DEFAULT_ANOMALY_THRESHOLD,
        }
    }
}

/// Metadata produced alongside the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// ISO-8601 timestamp when this report was generated.
    pub generated_at: String,
    /// Records in the dataset before filtering.
    pub records_loaded: usize,
    /// Records left after filtering.
    pub records_matched: usize,
    pub filter_active: bool,
    /// Human-readable filter summary, `"none"` when inactive.
    pub filter: String,
    pub rank_by: RankMetric,
    pub anomaly_threshold: f64,
}

/// Every summary the dashboard shows, computed from one filtered record set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    pub totals: UsageTotals,
    pub daily: Vec<DailySummary>,
    pub skus: Vec<SkuSummary>,
    pub top_users: Vec<UserSummary>,
    pub top_repositories: Vec<RepositorySummary>,
    pub anomalies: Vec<CostAnomaly>,
    /// Filter options over the unfiltered dataset.
    pub filter_choices: FilterChoices,
}

impl DashboardReport {
    /// Whether the filter left nothing to show.
    pub fn is_empty(&self) -> bool {
        self.metadata.records_matched == 0
    }
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full analysis pipeline.
///
/// 1. Collect filter choices from the unfiltered `records`.
/// 2. Apply `filter` once.
/// 3. Aggregate totals, daily, SKU, user and repository summaries.
/// 4. Rank users and repositories by `options.rank_by`.
/// 5. Detect cost anomalies with `options.anomaly_threshold`.
pub fn analyze_usage(
    records: &[UsageRecord],
    filter: &FilterCriteria,
    options: &AnalysisOptions,
) -> DashboardReport {
    let filtered = filter.apply(records);
    analyze_filtered(records, &filtered, filter, options)
}

/// Same as [`analyze_usage`] for callers that already hold
/// `filter.apply(records)`.
pub fn analyze_filtered(
    records: &[UsageRecord],
    filtered: &[UsageRecord],
    filter: &FilterCriteria,
    options: &AnalysisOptions,
) -> DashboardReport {
    let filter_choices = FilterChoices::from_records(records);

    tracing::debug!(
        "Analysing {} of {} record(s) (filter: {})",
        filtered.len(),
        records.len(),
        filter.describe()
    );

    // ── Aggregate ────────────────────────────────────────────────────────────
    let totals = UsageAggregator::calculate_totals(filtered);
    let daily = UsageAggregator::aggregate_daily(filtered);
    let skus = UsageAggregator::aggregate_by_sku(filtered);

    // ── Rank ─────────────────────────────────────────────────────────────────
    let top_users = top_n(
        UsageAggregator::aggregate_by_user(filtered),
        options.rank_by,
        options.top_n,
    );
    let top_repositories = top_n(
        UsageAggregator::aggregate_by_repository(filtered),
        options.rank_by,
        options.top_n,
    );

    // ── Anomalies ────────────────────────────────────────────────────────────
    let anomalies = detect_cost_anomalies(filtered, options.anomaly_threshold);

    let metadata = ReportMetadata {
        generated_at: Utc::now().to_rfc3339(),
        records_loaded: records.len(),
        records_matched: filtered.len(),
        filter_active: filter.is_active(),
        filter: filter.describe(),
        rank_by: options.rank_by,
        anomaly_threshold: options.anomaly_threshold,
    };

    tracing::debug!(
        "Report ready: {} day(s), {} SKU(s), {} anomaly(ies)",
        daily.len(),
        skus.len(),
        anomalies.len()
    );

    DashboardReport {
        metadata,
        totals,
        daily,
        skus,
        top_users,
        top_repositories,
        anomalies,
        filter_choices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, user: &str, repo: &str, sku: &str, qty: f64, gross: f64) -> UsageRecord {
        UsageRecord {
            date: date.to_string(),
            product: "actions".to_string(),
            sku: sku.to_string(),
            quantity: qty,
            unit_type: "minutes".to_string(),
            gross_amount: gross,
            net_amount: gross,
            username: user.to_string(),
            organization: "acme".to_string(),
            repository: repo.to_string(),
            ..Default::default()
        }
    }

    fn dataset() -> Vec<UsageRecord> {
        vec![
            record("2024-03-01", "alice", "acme/app", "actions_linux", 10.0, 10.0),
            record("2024-03-02", "bob", "acme/api", "actions_linux", 10.0, 10.0),
            record("2024-03-03", "alice", "acme/app", "actions_macos", 10.0, 10.0),
            record("2024-03-04", "carol", "acme/web", "actions_linux", 10.0, 10.0),
            record("2024-03-05", "bob", "acme/api", "actions_windows", 40.0, 100.0),
        ]
    }

    #[test]
    fn test_unfiltered_report() {
        let records = dataset();
        let report = analyze_usage(&records, &FilterCriteria::default(), &AnalysisOptions::default());

        assert_eq!(report.metadata.records_loaded, 5);
        assert_eq!(report.metadata.records_matched, 5);
        assert!(!report.metadata.filter_active);
        assert_eq!(report.metadata.filter, "none");
        assert_eq!(report.totals.record_count, 5);
        assert!((report.totals.total_quantity - 80.0).abs() < 1e-9);
        assert_eq!(report.daily.len(), 5);
        assert_eq!(report.skus[0].sku, "actions_windows");
        assert_eq!(report.top_users[0].username, "bob");
        assert_eq!(report.anomalies.len(), 1);
        assert_eq!(report.anomalies[0].date, "2024-03-05");
        assert!(!report.is_empty());
    }

    #[test]
    fn test_filter_applies_to_every_summary() {
        let records = dataset();
        let filter = FilterCriteria::new().with_username("alice");
        let report = analyze_usage(&records, &filter, &AnalysisOptions::default());

        assert_eq!(report.metadata.records_matched, 2);
        assert!(report.metadata.filter_active);
        assert_eq!(report.totals.unique_users, 1);
        assert_eq!(report.daily.len(), 2);
        assert_eq!(report.top_users.len(), 1);
        assert_eq!(report.top_repositories.len(), 1);
        assert_eq!(report.top_repositories[0].repository, "acme/app");
        assert!(report.anomalies.is_empty());

        // Choices still list every user.
        assert_eq!(report.filter_choices.users, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_date_range_filter() {
        let records = dataset();
        let filter = FilterCriteria::new()
            .with_start_date("2024-03-02")
            .with_end_date("2024-03-04");
        let report = analyze_usage(&records, &filter, &AnalysisOptions::default());
        assert_eq!(report.metadata.records_matched, 3);
        let dates: Vec<&str> = report.daily.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-03-02", "2024-03-03", "2024-03-04"]);
    }

    #[test]
    fn test_options_change_rank_and_threshold() {
        let records = vec![
            record("2024-03-01", "cheap", "acme/a", "s", 100.0, 1.0),
            record("2024-03-01", "pricey", "acme/b", "s", 1.0, 50.0),
        ];
        let options = AnalysisOptions {
            rank_by: RankMetric::Cost,
            top_n: 1,
            anomaly_threshold: 2.0,
        };
        let report = analyze_usage(&records, &FilterCriteria::default(), &options);
        assert_eq!(report.top_users.len(), 1);
        assert_eq!(report.top_users[0].username, "pricey");
        assert_eq!(report.metadata.rank_by, RankMetric::Cost);
        assert_eq!(report.metadata.anomaly_threshold, 2.0);
    }

    #[test]
    fn test_filter_matching_nothing() {
        let records = dataset();
        let filter = FilterCriteria::new().with_sku("does_not_exist");
        let report = analyze_usage(&records, &filter, &AnalysisOptions::default());
        assert!(report.is_empty());
        assert!(report.daily.is_empty());
        assert!(report.skus.is_empty());
        assert!(report.top_users.is_empty());
        assert!(report.anomalies.is_empty());
        assert_eq!(report.totals, UsageTotals::default());
    }

    #[test]
    fn test_prefiltered_records_give_same_report() {
        let records = dataset();
        let filter = FilterCriteria::new().with_username("bob");
        let filtered = filter.apply(&records);
        let options = AnalysisOptions::default();

        let direct = analyze_usage(&records, &filter, &options);
        let reused = analyze_filtered(&records, &filtered, &filter, &options);

        assert_eq!(reused.metadata.records_loaded, 5);
        assert_eq!(reused.metadata.records_matched, 2);
        assert_eq!(reused.totals, direct.totals);
        assert_eq!(reused.daily, direct.daily);
        assert_eq!(reused.top_users, direct.top_users);
        assert_eq!(reused.filter_choices, direct.filter_choices);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let records = dataset();
        let report = analyze_usage(&records, &FilterCriteria::default(), &AnalysisOptions::default());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["metadata"]["rank_by"], "quantity");
        assert_eq!(json["totals"]["record_count"], 5);
        assert!(json["anomalies"].is_array());
    }
}
