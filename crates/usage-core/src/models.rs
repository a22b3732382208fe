use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One row of a GitHub Actions / LFS usage report.
///
/// Records are produced in bulk by the CSV reader and never mutated
/// afterwards; every summary is derived freshly from a slice of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Calendar day in `YYYY-MM-DD` form. Lexicographic order is
    /// chronological order.
    pub date: String,
    /// Billed product, e.g. `"actions"` or `"git_lfs"`.
    pub product: String,
    /// Billed item class, e.g. `"actions_linux"`.
    pub sku: String,
    /// Amount consumed (minutes, GB, ...). Never negative.
    pub quantity: f64,
    /// Unit of `quantity`; descriptive only.
    pub unit_type: String,
    /// Price per unit of `quantity`.
    pub applied_cost_per_quantity: f64,
    /// Cost before discounts.
    pub gross_amount: f64,
    /// Discount applied to `gross_amount`.
    pub discount_amount: f64,
    /// Cost after discounts; usually `gross_amount - discount_amount`.
    pub net_amount: f64,
    pub username: String,
    pub organization: String,
    pub repository: String,
    pub workflow_path: String,
    /// May be empty when the organisation has no cost centers.
    pub cost_center_name: String,
}

/// Per-day totals, sorted ascending by `date` when produced by the aggregator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: String,
    pub total_quantity: f64,
    pub total_gross_amount: f64,
    pub total_net_amount: f64,
    pub total_discount_amount: f64,
}

/// Per-SKU totals with the SKU's share of the overall quantity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkuSummary {
    pub sku: String,
    pub total_quantity: f64,
    /// Summed gross amount.
    pub total_cost: f64,
    /// `total_quantity / grand_total_quantity * 100`; `0.0` when the grand
    /// total is zero.
    pub percentage: f64,
}

/// Per-user totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub username: String,
    pub total_quantity: f64,
    /// Summed gross amount.
    pub total_cost: f64,
    /// Number of distinct repositories this user consumed in.
    pub repository_count: usize,
}

/// Per-repository totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub repository: String,
    pub total_quantity: f64,
    /// Summed gross amount.
    pub total_cost: f64,
    /// Number of distinct users that consumed in this repository.
    pub user_count: usize,
}

/// A day whose gross cost exceeded the anomaly threshold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostAnomaly {
    pub date: String,
    /// Summed gross amount for `date`.
    pub total_cost: f64,
    /// Mean daily gross amount across every day in the dataset.
    pub average_cost: f64,
    /// `total_cost - average_cost`.
    pub difference: f64,
    /// `difference / average_cost * 100`.
    pub percentage: f64,
}

/// Headline totals over a record set (the dashboard's summary cards).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageTotals {
    pub record_count: usize,
    pub total_quantity: f64,
    pub total_gross_amount: f64,
    pub total_net_amount: f64,
    pub total_discount_amount: f64,
    pub unique_users: usize,
    pub unique_repositories: usize,
}

/// Which summed value the ranker orders by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankMetric {
    /// Summed `quantity`.
    #[default]
    Quantity,
    /// Summed `gross_amount`.
    Cost,
}

impl RankMetric {
    /// Lowercase name as accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            RankMetric::Quantity => "quantity",
            RankMetric::Cost => "cost",
        }
    }

    /// The other metric; used by the dashboard's toggle key.
    pub fn toggled(&self) -> Self {
        match self {
            RankMetric::Quantity => RankMetric::Cost,
            RankMetric::Cost => RankMetric::Quantity,
        }
    }
}

impl fmt::Display for RankMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankMetric {
    type Err = crate::UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "quantity" | "minutes" => Ok(RankMetric::Quantity),
            "cost" => Ok(RankMetric::Cost),
            other => Err(crate::UsageError::Config(format!(
                "unknown rank metric: {other}"
            ))),
        }
    }
}

/// A column of [`UsageRecord`], used to sort the raw-record table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    #[default]
    Date,
    Product,
    Sku,
    Quantity,
    UnitType,
    AppliedCostPerQuantity,
    GrossAmount,
    DiscountAmount,
    NetAmount,
    Username,
    Organization,
    Repository,
    WorkflowPath,
    CostCenterName,
}

/// Sortable value of one record cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
}

impl RecordField {
    pub const ALL: [RecordField; 14] = [
        RecordField::Date,
        RecordField::Product,
        RecordField::Sku,
        RecordField::Quantity,
        RecordField::UnitType,
        RecordField::AppliedCostPerQuantity,
        RecordField::GrossAmount,
        RecordField::DiscountAmount,
        RecordField::NetAmount,
        RecordField::Username,
        RecordField::Organization,
        RecordField::Repository,
        RecordField::WorkflowPath,
        RecordField::CostCenterName,
    ];

    /// Column names as they appear in the CSV header.
    pub const NAMES: [&'static str; 14] = [
        "date",
        "product",
        "sku",
        "quantity",
        "unit_type",
        "applied_cost_per_quantity",
        "gross_amount",
        "discount_amount",
        "net_amount",
        "username",
        "organization",
        "repository",
        "workflow_path",
        "cost_center_name",
    ];

    /// CSV header name of this column.
    pub fn as_str(&self) -> &'static str {
        Self::NAMES[*self as usize]
    }

    /// Look up a column by its CSV header name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| Self::ALL[idx])
    }

    /// The next column in header order, wrapping around.
    pub fn next(&self) -> Self {
        Self::ALL[(*self as usize + 1) % Self::ALL.len()]
    }

    /// Whether the column holds a number.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            RecordField::Quantity
                | RecordField::AppliedCostPerQuantity
                | RecordField::GrossAmount
                | RecordField::DiscountAmount
                | RecordField::NetAmount
        )
    }

    /// Read this column from `record`.
    pub fn value<'a>(&self, record: &'a UsageRecord) -> FieldValue<'a> {
        match self {
            RecordField::Date => FieldValue::Text(&record.date),
            RecordField::Product => FieldValue::Text(&record.product),
            RecordField::Sku => FieldValue::Text(&record.sku),
            RecordField::Quantity => FieldValue::Number(record.quantity),
            RecordField::UnitType => FieldValue::Text(&record.unit_type),
            RecordField::AppliedCostPerQuantity => {
                FieldValue::Number(record.applied_cost_per_quantity)
            }
            RecordField::GrossAmount => FieldValue::Number(record.gross_amount),
            RecordField::DiscountAmount => FieldValue::Number(record.discount_amount),
            RecordField::NetAmount => FieldValue::Number(record.net_amount),
            RecordField::Username => FieldValue::Text(&record.username),
            RecordField::Organization => FieldValue::Text(&record.organization),
            RecordField::Repository => FieldValue::Text(&record.repository),
            RecordField::WorkflowPath => FieldValue::Text(&record.workflow_path),
            RecordField::CostCenterName => FieldValue::Text(&record.cost_center_name),
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_record_default_is_empty() {
        let record = UsageRecord::default();
        assert!(record.date.is_empty());
        assert!(record.cost_center_name.is_empty());
        assert_eq!(record.quantity, 0.0);
        assert_eq!(record.gross_amount, 0.0);
    }

    #[test]
    fn test_usage_record_structural_equality() {
        let a = UsageRecord {
            date: "2024-03-15".to_string(),
            sku: "actions_linux".to_string(),
            quantity: 12.0,
            ..Default::default()
        };
        let b = a.clone();
        assert_eq!(a, b);

        let c = UsageRecord {
            quantity: 13.0,
            ..a.clone()
        };
        assert_ne!(a, c);
    }

    #[test]
    fn test_rank_metric_from_str() {
        assert_eq!("quantity".parse::<RankMetric>().unwrap(), RankMetric::Quantity);
        assert_eq!("COST".parse::<RankMetric>().unwrap(), RankMetric::Cost);
        assert_eq!("minutes".parse::<RankMetric>().unwrap(), RankMetric::Quantity);
        assert!("tokens".parse::<RankMetric>().is_err());
    }

    #[test]
    fn test_rank_metric_toggle_and_display() {
        assert_eq!(RankMetric::Quantity.toggled(), RankMetric::Cost);
        assert_eq!(RankMetric::Cost.toggled(), RankMetric::Quantity);
        assert_eq!(RankMetric::Cost.to_string(), "cost");
        assert_eq!(RankMetric::default(), RankMetric::Quantity);
    }

    #[test]
    fn test_record_field_names_round_trip_in_order() {
        for (idx, field) in RecordField::ALL.iter().enumerate() {
            assert_eq!(*field as usize, idx);
            assert_eq!(RecordField::from_name(field.as_str()), Some(*field));
        }
        assert_eq!(RecordField::from_name("cost"), None);
    }

    #[test]
    fn test_record_field_next_wraps() {
        assert_eq!(RecordField::Date.next(), RecordField::Product);
        assert_eq!(RecordField::CostCenterName.next(), RecordField::Date);
    }

    #[test]
    fn test_record_field_value() {
        let record = UsageRecord {
            date: "2024-03-15".to_string(),
            gross_amount: 1.5,
            ..Default::default()
        };
        assert_eq!(RecordField::Date.value(&record), FieldValue::Text("2024-03-15"));
        assert_eq!(RecordField::GrossAmount.value(&record), FieldValue::Number(1.5));
        assert!(RecordField::GrossAmount.is_numeric());
        assert!(!RecordField::Username.is_numeric());
    }

    #[test]
    fn test_summary_serialises_snake_case_fields() {
        let summary = SkuSummary {
            sku: "actions_linux".to_string(),
            total_quantity: 10.0,
            total_cost: 0.08,
            percentage: 100.0,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["sku"], "actions_linux");
        assert_eq!(json["total_quantity"], 10.0);
        assert_eq!(json["percentage"], 100.0);
    }
}
