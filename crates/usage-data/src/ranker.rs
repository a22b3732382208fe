//! Top-N ranking of user and repository summaries.

use std::cmp::Ordering;

use usage_core::models::{RankMetric, RepositorySummary, UserSummary};

/// Number of entries the dashboard shows in every ranking.
pub const TOP_N: usize = 10;

/// A summary that can be ordered by a [`RankMetric`].
pub trait Rankable {
    fn metric_value(&self, metric: RankMetric) -> f64;
}

impl Rankable for UserSummary {
    fn metric_value(&self, metric: RankMetric) -> f64 {
        match metric {
            RankMetric::Quantity => self.total_quantity,
            RankMetric::Cost => self.total_cost,
        }
    }
}

impl Rankable for RepositorySummary {
    fn metric_value(&self, metric: RankMetric) -> f64 {
        match metric {
            RankMetric::Quantity => self.total_quantity,
            RankMetric::Cost => self.total_cost,
        }
    }
}

/// Sort `items` descending by `metric` and keep the first `n`.
///
/// The sort is stable, so equal values keep their input order. Fewer than
/// `n` items are all returned.
pub fn top_n<T: Rankable>(mut items: Vec<T>, metric: RankMetric, n: usize) -> Vec<T> {
    items.sort_by(|a, b| {
        b.metric_value(metric)
            .partial_cmp(&a.metric_value(metric))
            .unwrap_or(Ordering::Equal)
    });
    items.truncate(n);
    items
}

/// Top [`TOP_N`] users by `metric`.
pub fn top_users(users: Vec<UserSummary>, metric: RankMetric) -> Vec<UserSummary> {
    top_n(users, metric, TOP_N)
}

/// Top [`TOP_N`] repositories by `metric`.
pub fn top_repositories(
    repositories: Vec<RepositorySummary>,
    metric: RankMetric,
) -> Vec<RepositorySummary> {
    top_n(repositories, metric, TOP_N)
}
