//! Row-level filter predicate and the choice lists that populate it.
//!
//! A [`FilterCriteria`] is applied once, up front, and the filtered record
//! collection is then fed identically into every summary. Unset or empty
//! constraints never restrict anything.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::UsageRecord;

// ── FilterField ───────────────────────────────────────────────────────────────

/// The exact-match attribution fields a filter can constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    Username,
    Repository,
    Sku,
    CostCenter,
}

impl FilterField {
    pub const ALL: [FilterField; 4] = [
        FilterField::Username,
        FilterField::Repository,
        FilterField::Sku,
        FilterField::CostCenter,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            FilterField::Username => "User",
            FilterField::Repository => "Repository",
            FilterField::Sku => "SKU",
            FilterField::CostCenter => "Cost Center",
        }
    }

    /// The record attribute this field compares against.
    pub fn value_of<'a>(&self, record: &'a UsageRecord) -> &'a str {
        match self {
            FilterField::Username => &record.username,
            FilterField::Repository => &record.repository,
            FilterField::Sku => &record.sku,
            FilterField::CostCenter => &record.cost_center_name,
        }
    }
}

// ── FilterCriteria ────────────────────────────────────────────────────────────

/// Independent, optional constraints on a [`UsageRecord`].
///
/// Date bounds are inclusive and compared lexicographically, which matches
/// chronological order for `YYYY-MM-DD` strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub username: Option<String>,
    pub repository: Option<String>,
    pub sku: Option<String>,
    pub cost_center: Option<String>,
}

impl FilterCriteria {
    /// A filter with no constraints.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_date(mut self, date: impl Into<String>) -> Self {
        self.start_date = non_empty(date.into());
        self
    }

    pub fn with_end_date(mut self, date: impl Into<String>) -> Self {
        self.end_date = non_empty(date.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = non_empty(username.into());
        self
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = non_empty(repository.into());
        self
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = non_empty(sku.into());
        self
    }

    pub fn with_cost_center(mut self, cost_center: impl Into<String>) -> Self {
        self.cost_center = non_empty(cost_center.into());
        self
    }

    /// Current constraint for an exact-match field.
    pub fn get(&self, field: FilterField) -> Option<&str> {
        let slot = match field {
            FilterField::Username => &self.username,
            FilterField::Repository => &self.repository,
            FilterField::Sku => &self.sku,
            FilterField::CostCenter => &self.cost_center,
        };
        active(slot)
    }

    /// Replace the constraint for an exact-match field. Empty strings unset it.
    pub fn set(&mut self, field: FilterField, value: Option<String>) {
        let value = value.and_then(non_empty);
        match field {
            FilterField::Username => self.username = value,
            FilterField::Repository => self.repository = value,
            FilterField::Sku => self.sku = value,
            FilterField::CostCenter => self.cost_center = value,
        }
    }

    /// Returns `true` iff `record` satisfies every supplied constraint.
    pub fn matches(&self, record: &UsageRecord) -> bool {
        if let Some(start) = active(&self.start_date) {
            if record.date.as_str() < start {
                return false;
            }
        }
        if let Some(end) = active(&self.end_date) {
            if record.date.as_str() > end {
                return false;
            }
        }
        FilterField::ALL.iter().all(|field| match self.get(*field) {
            Some(wanted) => field.value_of(record) == wanted,
            None => true,
        })
    }

    /// Collect the records that pass the filter, preserving input order.
    pub fn apply(&self, records: &[UsageRecord]) -> Vec<UsageRecord> {
        if !self.is_active() {
            return records.to_vec();
        }
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }

    /// `true` when at least one constraint is set.
    pub fn is_active(&self) -> bool {
        active(&self.start_date).is_some()
            || active(&self.end_date).is_some()
            || FilterField::ALL.iter().any(|f| self.get(*f).is_some())
    }

    /// Drop every constraint.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// One-line summary such as `2024-03-01..2024-03-31, User=octocat`.
    ///
    /// Returns `"none"` for an inactive filter.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        match (active(&self.start_date), active(&self.end_date)) {
            (Some(start), Some(end)) => parts.push(format!("{start}..{end}")),
            (Some(start), None) => parts.push(format!("from {start}")),
            (None, Some(end)) => parts.push(format!("until {end}")),
            (None, None) => {}
        }
        for field in FilterField::ALL {
            if let Some(value) = self.get(field) {
                parts.push(format!("{}={}", field.label(), value));
            }
        }
        if parts.is_empty() {
            "none".to_string()
        } else {
            parts.join(", ")
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn active(slot: &Option<String>) -> Option<&str> {
    slot.as_deref().filter(|s| !s.is_empty())
}

// ── FilterChoices ─────────────────────────────────────────────────────────────

/// Sorted distinct values offered for each exact-match filter field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterChoices {
    pub users: Vec<String>,
    pub repositories: Vec<String>,
    pub skus: Vec<String>,
    /// Blank cost centers are not offered as a choice.
    pub cost_centers: Vec<String>,
}

impl FilterChoices {
    /// Collect the choices from an (unfiltered) record set.
    pub fn from_records(records: &[UsageRecord]) -> Self {
        let distinct = |field: FilterField| -> Vec<String> {
            records
                .iter()
                .map(|r| field.value_of(r))
                .collect::<BTreeSet<&str>>()
                .into_iter()
                .map(str::to_string)
                .collect()
        };

        let mut cost_centers = distinct(FilterField::CostCenter);
        cost_centers.retain(|c| !c.is_empty());

        Self {
            users: distinct(FilterField::Username),
            repositories: distinct(FilterField::Repository),
            skus: distinct(FilterField::Sku),
            cost_centers,
        }
    }

    /// Choices for one field.
    pub fn options(&self, field: FilterField) -> &[String] {
        match field {
            FilterField::Username => &self.users,
            FilterField::Repository => &self.repositories,
            FilterField::Sku => &self.skus,
            FilterField::CostCenter => &self.cost_centers,
        }
    }

    /// Step through the choices of `field`: unset → first → ... → last → unset.
    ///
    /// A `current` value that is no longer among the choices restarts at the
    /// first one.
    pub fn next_value(&self, field: FilterField, current: Option<&str>) -> Option<String> {
        let options = self.options(field);
        match current {
            None => options.first().cloned(),
            Some(value) => match options.iter().position(|o| o == value) {
                Some(idx) => options.get(idx + 1).cloned(),
                None => options.first().cloned(),
            },
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(date: &str, user: &str, repo: &str, sku: &str, cc: &str) -> UsageRecord {
        UsageRecord {
            date: date.to_string(),
            username: user.to_string(),
            repository: repo.to_string(),
            sku: sku.to_string(),
            cost_center_name: cc.to_string(),
            quantity: 1.0,
            ..Default::default()
        }
    }

    // ── matches ───────────────────────────────────────────────────────────────

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = FilterCriteria::new();
        let record = make_record("2024-03-15", "octocat", "org/app", "actions_linux", "");
        assert!(filter.matches(&record));
        assert!(!filter.is_active());
    }

    #[test]
    fn test_date_range_inclusive() {
        let record = make_record("2024-03-15", "octocat", "org/app", "actions_linux", "");
        let march = FilterCriteria::new()
            .with_start_date("2024-03-01")
            .with_end_date("2024-03-31");
        assert!(march.matches(&record));

        let april = FilterCriteria::new().with_start_date("2024-04-01");
        assert!(!april.matches(&record));

        let exact = FilterCriteria::new()
            .with_start_date("2024-03-15")
            .with_end_date("2024-03-15");
        assert!(exact.matches(&record));

        let before = FilterCriteria::new().with_end_date("2024-03-14");
        assert!(!before.matches(&record));
    }

    #[test]
    fn test_exact_match_fields() {
        let record = make_record("2024-03-15", "octocat", "org/app", "actions_linux", "Platform");

        assert!(FilterCriteria::new().with_username("octocat").matches(&record));
        assert!(!FilterCriteria::new().with_username("Octocat").matches(&record));
        assert!(!FilterCriteria::new().with_username("octocat ").matches(&record));
        assert!(FilterCriteria::new().with_repository("org/app").matches(&record));
        assert!(!FilterCriteria::new().with_sku("actions_macos").matches(&record));
        assert!(FilterCriteria::new().with_cost_center("Platform").matches(&record));
    }

    #[test]
    fn test_all_constraints_must_hold() {
        let record = make_record("2024-03-15", "octocat", "org/app", "actions_linux", "");
        let filter = FilterCriteria::new()
            .with_username("octocat")
            .with_repository("org/other");
        assert!(!filter.matches(&record));
    }

    #[test]
    fn test_empty_strings_are_unset() {
        let filter = FilterCriteria::new()
            .with_username("")
            .with_start_date("")
            .with_cost_center("");
        assert!(!filter.is_active());
        assert_eq!(filter, FilterCriteria::default());

        // Empty values set directly on the struct are ignored too.
        let raw = FilterCriteria {
            sku: Some(String::new()),
            ..Default::default()
        };
        assert!(!raw.is_active());
        assert!(raw.matches(&make_record("2024-01-01", "a", "b", "c", "")));
    }

    // ── apply / clear ─────────────────────────────────────────────────────────

    #[test]
    fn test_apply_preserves_order() {
        let records = vec![
            make_record("2024-03-02", "bob", "r1", "s", ""),
            make_record("2024-03-01", "alice", "r1", "s", ""),
            make_record("2024-03-03", "bob", "r2", "s", ""),
        ];
        let filtered = FilterCriteria::new().with_username("bob").apply(&records);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].date, "2024-03-02");
        assert_eq!(filtered[1].date, "2024-03-03");
    }

    #[test]
    fn test_apply_empty_input() {
        let filtered = FilterCriteria::new().with_sku("x").apply(&[]);
        assert!(filtered.is_empty());
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut filter = FilterCriteria::new()
            .with_username("octocat")
            .with_start_date("2024-01-01");
        assert!(filter.is_active());
        filter.clear();
        assert!(!filter.is_active());
    }

    // ── get / set / describe ─────────────────────────────────────────────────

    #[test]
    fn test_get_and_set_fields() {
        let mut filter = FilterCriteria::new();
        filter.set(FilterField::Sku, Some("actions_linux".to_string()));
        assert_eq!(filter.get(FilterField::Sku), Some("actions_linux"));
        filter.set(FilterField::Sku, Some(String::new()));
        assert_eq!(filter.get(FilterField::Sku), None);
    }

    #[test]
    fn test_describe() {
        assert_eq!(FilterCriteria::new().describe(), "none");
        let filter = FilterCriteria::new()
            .with_start_date("2024-03-01")
            .with_end_date("2024-03-31")
            .with_username("octocat");
        assert_eq!(filter.describe(), "2024-03-01..2024-03-31, User=octocat");
        assert_eq!(
            FilterCriteria::new().with_end_date("2024-03-31").describe(),
            "until 2024-03-31"
        );
    }

    // ── FilterChoices ─────────────────────────────────────────────────────────

    #[test]
    fn test_choices_sorted_and_distinct() {
        let records = vec![
            make_record("2024-03-01", "zed", "org/b", "actions_linux", "Ops"),
            make_record("2024-03-01", "amy", "org/a", "actions_linux", ""),
            make_record("2024-03-02", "zed", "org/a", "git_lfs_storage", "Data"),
        ];
        let choices = FilterChoices::from_records(&records);
        assert_eq!(choices.users, vec!["amy", "zed"]);
        assert_eq!(choices.repositories, vec!["org/a", "org/b"]);
        assert_eq!(choices.skus, vec!["actions_linux", "git_lfs_storage"]);
        assert_eq!(choices.cost_centers, vec!["Data", "Ops"]);
    }

    #[test]
    fn test_choices_keep_blank_users_but_not_blank_cost_centers() {
        let records = vec![make_record("2024-03-01", "", "org/a", "s", "")];
        let choices = FilterChoices::from_records(&records);
        assert_eq!(choices.users, vec![""]);
        assert!(choices.cost_centers.is_empty());
    }

    #[test]
    fn test_next_value_cycles_through_choices() {
        let records = vec![
            make_record("2024-03-01", "amy", "r", "s", ""),
            make_record("2024-03-01", "bob", "r", "s", ""),
        ];
        let choices = FilterChoices::from_records(&records);
        let field = FilterField::Username;

        let first = choices.next_value(field, None);
        assert_eq!(first.as_deref(), Some("amy"));
        let second = choices.next_value(field, first.as_deref());
        assert_eq!(second.as_deref(), Some("bob"));
        assert_eq!(choices.next_value(field, second.as_deref()), None);
        assert_eq!(
            choices.next_value(field, Some("carol")).as_deref(),
            Some("amy")
        );
    }

    #[test]
    fn test_next_value_without_choices() {
        let choices = FilterChoices::default();
        assert_eq!(choices.next_value(FilterField::CostCenter, None), None);
    }
}
