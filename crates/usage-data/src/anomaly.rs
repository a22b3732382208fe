//! Mean-multiplier cost anomaly detection.
//!
//! A day is anomalous when its summed gross amount exceeds the average daily
//! gross amount times a threshold. Simple and deterministic; it does not try
//! to model seasonality or variance.

use std::cmp::Ordering;

use usage_core::models::{CostAnomaly, UsageRecord};
pub use usage_core::settings::DEFAULT_ANOMALY_THRESHOLD;

use crate::aggregator::{GroupKey, UsageAggregator};

/// Flag every day whose gross cost is above `average * threshold`.
///
/// The average is taken over distinct days present in `records`. Results are
/// sorted descending by cost; equal costs keep first-occurrence order.
/// Returns an empty list when there are no days or the average is not
/// strictly positive.
pub fn detect_cost_anomalies(records: &[UsageRecord], threshold: f64) -> Vec<CostAnomaly> {
    let days = UsageAggregator::aggregate_by(records, GroupKey::Date, None);
    if days.is_empty() {
        return Vec::new();
    }

    let total: f64 = days.iter().map(|d| d.stats.gross_amount).sum();
    let average = total / days.len() as f64;
    if average <= 0.0 || !average.is_finite() {
        return Vec::new();
    }

    let cutoff = average * threshold;
    let mut anomalies: Vec<CostAnomaly> = days
        .into_iter()
        .filter(|d| d.stats.gross_amount > cutoff)
        .map(|d| {
            let cost = d.stats.gross_amount;
            let difference = cost - average;
            CostAnomaly {
                date: d.key,
                total_cost: cost,
                average_cost: average,
                difference,
                percentage: difference / average * 100.0,
            }
        })
        .collect();

    anomalies.sort_by(|a, b| {
        b.total_cost
            .partial_cmp(&a.total_cost)
            .unwrap_or(Ordering::Equal)
    });

    tracing::debug!(
        "Anomaly scan: {} anomalous day(s), average {:.4}, threshold {}",
        anomalies.len(),
        average,
        threshold
    );
    anomalies
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(date: &str, gross: f64) -> UsageRecord {
        UsageRecord {
            date: date.to_string(),
            sku: "actions_linux".to_string(),
            gross_amount: gross,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_spike_detected() {
        let records = vec![
            day("2024-03-01", 10.0),
            day("2024-03-02", 10.0),
            day("2024-03-03", 10.0),
            day("2024-03-04", 10.0),
            day("2024-03-05", 100.0),
        ];
        let anomalies = detect_cost_anomalies(&records, DEFAULT_ANOMALY_THRESHOLD);
        assert_eq!(anomalies.len(), 1);

        let spike = &anomalies[0];
        assert_eq!(spike.date, "2024-03-05");
        assert!((spike.total_cost - 100.0).abs() < 1e-9);
        assert!((spike.average_cost - 28.0).abs() < 1e-9);
        assert!((spike.difference - 72.0).abs() < 1e-9);
        assert!((spike.percentage - 257.142857).abs() < 1e-4);
    }

    #[test]
    fn test_costs_are_summed_per_day() {
        // Day 1 totals 30 from three records; day 2 is 2.
        let records = vec![
            day("2024-03-01", 10.0),
            day("2024-03-02", 2.0),
            day("2024-03-01", 10.0),
            day("2024-03-01", 10.0),
        ];
        let anomalies = detect_cost_anomalies(&records, 1.5);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].date, "2024-03-01");
        assert!((anomalies[0].average_cost - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_uniform_costs_have_no_anomalies() {
        let records: Vec<UsageRecord> = (1..=7)
            .map(|d| day(&format!("2024-03-0{d}"), 4.2))
            .collect();
        assert!(detect_cost_anomalies(&records, 1.5).is_empty());
    }

    #[test]
    fn test_equal_to_cutoff_is_not_anomalous() {
        // Average 2, cutoff 3: the 3.0 day sits exactly on the line.
        let records = vec![day("2024-03-01", 1.0), day("2024-03-02", 2.0), day("2024-03-03", 3.0)];
        assert!(detect_cost_anomalies(&records, 1.5).is_empty());
    }

    #[test]
    fn test_sorted_descending_by_cost() {
        let records = vec![
            day("2024-03-01", 1.0),
            day("2024-03-02", 1.0),
            day("2024-03-03", 1.0),
            day("2024-03-04", 1.0),
            day("2024-03-05", 1.0),
            day("2024-03-06", 1.0),
            day("2024-03-07", 30.0),
            day("2024-03-08", 40.0),
        ];
        let anomalies = detect_cost_anomalies(&records, 1.5);
        let dates: Vec<&str> = anomalies.iter().map(|a| a.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-03-08", "2024-03-07"]);
    }

    #[test]
    fn test_lower_threshold_flags_more_days() {
        let records = vec![day("2024-03-01", 10.0), day("2024-03-02", 12.0), day("2024-03-03", 20.0)];
        assert_eq!(detect_cost_anomalies(&records, 1.5).len(), 0);
        assert_eq!(detect_cost_anomalies(&records, 1.1).len(), 1);
    }

    #[test]
    fn test_empty_and_zero_cost_inputs() {
        assert!(detect_cost_anomalies(&[], 1.5).is_empty());

        let free = vec![day("2024-03-01", 0.0), day("2024-03-02", 0.0)];
        assert!(detect_cost_anomalies(&free, 1.5).is_empty());
    }
}
