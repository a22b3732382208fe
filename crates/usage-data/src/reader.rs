//! CSV ingestion for usage reports.
//!
//! Reads a GitHub Actions / LFS usage report, checks the header row against
//! the expected schema and validates every row into a typed [`UsageRecord`].
//! Anything ambiguous is rejected here with a row-level error; nothing past
//! this boundary ever sees an untyped cell.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::debug;
use usage_core::error::{Result, UsageError};
use usage_core::models::UsageRecord;

/// Columns that must be present in the header row.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "date",
    "product",
    "sku",
    "quantity",
    "unit_type",
    "username",
    "organization",
    "repository",
];

/// Columns that default to zero / empty when absent.
pub const OPTIONAL_COLUMNS: [&str; 6] = [
    "applied_cost_per_quantity",
    "gross_amount",
    "discount_amount",
    "net_amount",
    "workflow_path",
    "cost_center_name",
];

// ── Raw row ───────────────────────────────────────────────────────────────────

/// One CSV row before validation. Every cell is still text.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawUsageRow {
    date: String,
    product: String,
    sku: String,
    quantity: String,
    unit_type: String,
    applied_cost_per_quantity: String,
    gross_amount: String,
    discount_amount: String,
    net_amount: String,
    username: String,
    organization: String,
    repository: String,
    workflow_path: String,
    cost_center_name: String,
}

impl RawUsageRow {
    /// Validate and coerce the row. `row` is the 1-based line number used in
    /// error messages.
    fn into_record(self, row: usize) -> Result<UsageRecord> {
        let date = parse_date(&self.date, row)?;
        let quantity = parse_amount("quantity", &self.quantity, row)?;
        if quantity < 0.0 {
            return Err(UsageError::InvalidField {
                row,
                column: "quantity".to_string(),
                value: self.quantity,
                reason: "must not be negative".to_string(),
            });
        }

        Ok(UsageRecord {
            date,
            product: self.product,
            sku: self.sku,
            quantity,
            unit_type: self.unit_type,
            applied_cost_per_quantity: parse_amount(
                "applied_cost_per_quantity",
                &self.applied_cost_per_quantity,
                row,
            )?,
            gross_amount: parse_amount("gross_amount", &self.gross_amount, row)?,
            discount_amount: parse_amount("discount_amount", &self.discount_amount, row)?,
            net_amount: parse_amount("net_amount", &self.net_amount, row)?,
            username: self.username,
            organization: self.organization,
            repository: self.repository,
            workflow_path: self.workflow_path,
            cost_center_name: self.cost_center_name,
        })
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load and validate the usage report at `path`.
pub fn load_usage_csv(path: &Path) -> Result<Vec<UsageRecord>> {
    let file = File::open(path).map_err(|source| UsageError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    read_usage_csv(BufReader::new(file), path)
}

/// Parse a usage report from any reader. `source` only labels errors.
///
/// * Header names are the contract; column order does not matter and
///   surrounding whitespace in header names is ignored.
/// * Unknown columns are ignored.
/// * Rows whose cells are all blank are skipped.
pub fn read_usage_csv<R: Read>(input: R, source: &Path) -> Result<Vec<UsageRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(UsageError::EmptyFile(source.to_path_buf()));
    }

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(UsageError::MissingColumns(missing));
    }

    let mut records = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let row = result?;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let line = row
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);
        let raw: RawUsageRow = row.deserialize(Some(&headers))?;
        records.push(raw.into_record(line)?);
    }

    if records.is_empty() {
        return Err(UsageError::EmptyFile(source.to_path_buf()));
    }

    debug!(
        "Loaded {} usage records from {}",
        records.len(),
        source.display()
    );
    Ok(records)
}

/// Whether `path` carries a `.csv` extension (case-insensitive).
pub fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

// ── Cell parsers ──────────────────────────────────────────────────────────────

fn parse_date(value: &str, row: usize) -> Result<String> {
    let trimmed = value.trim();
    let valid = trimmed.len() == 10 && NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_ok();
    if valid {
        Ok(trimmed.to_string())
    } else {
        Err(UsageError::InvalidDate {
            row,
            value: value.to_string(),
        })
    }
}

/// Blank cells count as zero; anything else must be a finite number.
fn parse_amount(column: &str, value: &str, row: usize) -> Result<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(UsageError::InvalidField {
            row,
            column: column.to_string(),
            value: value.to_string(),
            reason: "not a number".to_string(),
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
