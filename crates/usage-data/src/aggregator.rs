//! Grouping and summing of usage records.
//!
//! Every function here is pure: it borrows an immutable record slice and
//! returns freshly built summaries. Groups come out in first-occurrence
//! order unless a function documents a sort.

use std::collections::{HashMap, HashSet};

use usage_core::models::{
    DailySummary, RepositorySummary, SkuSummary, UsageRecord, UsageTotals, UserSummary,
};

// ── GroupKey ──────────────────────────────────────────────────────────────────

/// The record attribute used to partition records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Date,
    Sku,
    Username,
    Repository,
}

impl GroupKey {
    /// Borrow the key value from `record`. No normalisation is applied.
    pub fn extract<'a>(&self, record: &'a UsageRecord) -> &'a str {
        match self {
            GroupKey::Date => &record.date,
            GroupKey::Sku => &record.sku,
            GroupKey::Username => &record.username,
            GroupKey::Repository => &record.repository,
        }
    }
}

// ── AggregatedStats ───────────────────────────────────────────────────────────

/// Quantity and money totals accumulated across multiple records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedStats {
    pub quantity: f64,
    pub gross_amount: f64,
    pub discount_amount: f64,
    pub net_amount: f64,
    pub count: usize,
}

impl AggregatedStats {
    /// Add a single record's values to the running totals.
    pub fn add_record(&mut self, record: &UsageRecord) {
        self.quantity += record.quantity;
        self.gross_amount += record.gross_amount;
        self.discount_amount += record.discount_amount;
        self.net_amount += record.net_amount;
        self.count += 1;
    }
}

// ── AggregatedGroup ───────────────────────────────────────────────────────────

/// All records sharing one key value.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedGroup {
    pub key: String,
    pub stats: AggregatedStats,
    /// Distinct values of the counterpart attribute, or `0` when no
    /// counterpart was requested.
    pub distinct_counterparts: usize,
}

/// Per-group working state; the counterpart set is dropped once counted.
struct GroupAccumulator<'a> {
    stats: AggregatedStats,
    counterparts: HashSet<&'a str>,
}

// ── UsageAggregator ───────────────────────────────────────────────────────────

/// Stateless helper that groups usage records.
pub struct UsageAggregator;

impl UsageAggregator {
    /// Group `records` by `key`, summing every numeric field.
    ///
    /// When `counterpart` is set, each group also counts the distinct values
    /// of that attribute (e.g. repositories per user). Groups are returned in
    /// the order their key first appears in `records`.
    pub fn aggregate_by<'a>(
        records: &'a [UsageRecord],
        key: GroupKey,
        counterpart: Option<GroupKey>,
    ) -> Vec<AggregatedGroup> {
        let mut index: HashMap<&'a str, usize> = HashMap::new();
        let mut groups: Vec<(&'a str, GroupAccumulator<'a>)> = Vec::new();

        for record in records {
            let key_value = key.extract(record);
            let slot = *index.entry(key_value).or_insert_with(|| {
                groups.push((
                    key_value,
                    GroupAccumulator {
                        stats: AggregatedStats::default(),
                        counterparts: HashSet::new(),
                    },
                ));
                groups.len() - 1
            });

            let acc = &mut groups[slot].1;
            acc.stats.add_record(record);
            if let Some(other) = counterpart {
                acc.counterparts.insert(other.extract(record));
            }
        }

        groups
            .into_iter()
            .map(|(key_value, acc)| AggregatedGroup {
                key: key_value.to_string(),
                stats: acc.stats,
                distinct_counterparts: acc.counterparts.len(),
            })
            .collect()
    }

    /// Aggregate `records` by calendar day, sorted ascending by date.
    pub fn aggregate_daily(records: &[UsageRecord]) -> Vec<DailySummary> {
        let mut daily: Vec<DailySummary> = Self::aggregate_by(records, GroupKey::Date, None)
            .into_iter()
            .map(|g| DailySummary {
                date: g.key,
                total_quantity: g.stats.quantity,
                total_gross_amount: g.stats.gross_amount,
                total_net_amount: g.stats.net_amount,
                total_discount_amount: g.stats.discount_amount,
            })
            .collect();

        // Fixed-width YYYY-MM-DD keys sort chronologically as strings.
        daily.sort_by(|a, b| a.date.cmp(&b.date));
        daily
    }

    /// Aggregate `records` by SKU with each SKU's share of total quantity,
    /// sorted descending by quantity (ties keep first-occurrence order).
    ///
    /// Empty input returns an empty list before any division happens. When
    /// the total quantity is zero every share is reported as `0.0`.
    pub fn aggregate_by_sku(records: &[UsageRecord]) -> Vec<SkuSummary> {
        let groups = Self::aggregate_by(records, GroupKey::Sku, None);
        if groups.is_empty() {
            return Vec::new();
        }

        let total_quantity: f64 = groups.iter().map(|g| g.stats.quantity).sum();

        let mut skus: Vec<SkuSummary> = groups
            .into_iter()
            .map(|g| SkuSummary {
                percentage: share_of(g.stats.quantity, total_quantity),
                sku: g.key,
                total_quantity: g.stats.quantity,
                total_cost: g.stats.gross_amount,
            })
            .collect();

        skus.sort_by(|a, b| {
            b.total_quantity
                .partial_cmp(&a.total_quantity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        skus
    }

    /// Aggregate `records` by username, counting distinct repositories per
    /// user. Unranked, first-occurrence order.
    pub fn aggregate_by_user(records: &[UsageRecord]) -> Vec<UserSummary> {
        Self::aggregate_by(records, GroupKey::Username, Some(GroupKey::Repository))
            .into_iter()
            .map(|g| UserSummary {
                username: g.key,
                total_quantity: g.stats.quantity,
                total_cost: g.stats.gross_amount,
                repository_count: g.distinct_counterparts,
            })
            .collect()
    }

    /// Aggregate `records` by repository, counting distinct users per
    /// repository. Unranked, first-occurrence order.
    pub fn aggregate_by_repository(records: &[UsageRecord]) -> Vec<RepositorySummary> {
        Self::aggregate_by(records, GroupKey::Repository, Some(GroupKey::Username))
            .into_iter()
            .map(|g| RepositorySummary {
                repository: g.key,
                total_quantity: g.stats.quantity,
                total_cost: g.stats.gross_amount,
                user_count: g.distinct_counterparts,
            })
            .collect()
    }

    /// Headline totals across every record.
    pub fn calculate_totals(records: &[UsageRecord]) -> UsageTotals {
        let mut stats = AggregatedStats::default();
        let mut users: HashSet<&str> = HashSet::new();
        let mut repositories: HashSet<&str> = HashSet::new();

        for record in records {
            stats.add_record(record);
            users.insert(&record.username);
            repositories.insert(&record.repository);
        }

        UsageTotals {
            record_count: stats.count,
            total_quantity: stats.quantity,
            total_gross_amount: stats.gross_amount,
            total_net_amount: stats.net_amount,
            total_discount_amount: stats.discount_amount,
            unique_users: users.len(),
            unique_repositories: repositories.len(),
        }
    }
}

/// `part / whole * 100`, or `0.0` when `whole` is zero.
fn share_of(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
