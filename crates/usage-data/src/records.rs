//! Search, sort and paging for the raw-record browser.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use usage_core::models::{FieldValue, RecordField, UsageRecord};

/// Rows shown per page of the record browser.
pub const PAGE_SIZE: usize = 20;

/// Sort direction for [`RecordQuery`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn toggled(&self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    /// Arrow glyph for column headers.
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

/// Parameters for one view of the record table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordQuery {
    /// Case-insensitive substring; empty matches everything.
    pub search: String,
    pub sort_field: RecordField,
    pub direction: SortDirection,
    /// Zero-based page index, clamped to the last page when run.
    pub page: usize,
    pub page_size: usize,
}

impl Default for RecordQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            sort_field: RecordField::Date,
            direction: SortDirection::Descending,
            page: 0,
            page_size: PAGE_SIZE,
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordPage {
    pub rows: Vec<UsageRecord>,
    /// Records matching the search before paging.
    pub total_matches: usize,
    /// Zero-based index of the page actually returned.
    pub page: usize,
    /// Always at least 1, even with no matches.
    pub page_count: usize,
}

impl RecordQuery {
    /// Whether `record` satisfies the search text.
    ///
    /// Username, repository, SKU and workflow path are compared without case;
    /// the date is a plain substring match.
    pub fn matches(&self, record: &UsageRecord) -> bool {
        let needle = self.search.trim();
        if needle.is_empty() {
            return true;
        }
        if record.date.contains(needle) {
            return true;
        }
        let needle = needle.to_lowercase();
        [
            &record.username,
            &record.repository,
            &record.sku,
            &record.workflow_path,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Number of pages the matches in `records` span; at least 1.
    pub fn page_count(&self, records: &[UsageRecord]) -> usize {
        let total = records.iter().filter(|r| self.matches(r)).count();
        pages_for(total, self.page_size)
    }

    /// Filter, sort and slice `records`.
    pub fn run(&self, records: &[UsageRecord]) -> RecordPage {
        let mut matched: Vec<&UsageRecord> = records.iter().filter(|r| self.matches(r)).collect();

        let field = self.sort_field;
        let direction = self.direction;
        matched.sort_by(|a, b| {
            let ord = compare_values(field.value(a), field.value(b));
            match direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });

        let page_size = self.page_size.max(1);
        let total_matches = matched.len();
        let page_count = pages_for(total_matches, page_size);
        let page = self.page.min(page_count - 1);

        let rows = matched
            .into_iter()
            .skip(page * page_size)
            .take(page_size)
            .cloned()
            .collect();

        RecordPage {
            rows,
            total_matches,
            page,
            page_count,
        }
    }
}

fn pages_for(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1)).max(1)
}

/// Numbers compare numerically; text compares without case, falling back to
/// byte order so the result is total.
fn compare_values(a: FieldValue<'_>, b: FieldValue<'_>) -> Ordering {
    match (a, b) {
        (FieldValue::Number(x), FieldValue::Number(y)) => {
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (FieldValue::Text(x), FieldValue::Text(y)) => x
            .to_lowercase()
            .cmp(&y.to_lowercase())
            .then_with(|| x.cmp(y)),
        (FieldValue::Number(_), FieldValue::Text(_)) => Ordering::Less,
        (FieldValue::Text(_), FieldValue::Number(_)) => Ordering::Greater,
    }
}
