//! Plain-text and JSON rendering of reports for the non-interactive views.

use usage_core::formatting::{format_count, format_currency, format_percentage};
use usage_data::analysis::DashboardReport;
use usage_data::records::{RecordPage, RecordQuery};
use usage_ui::table_view::truncate_to_width;

const NAME_WIDTH: usize = 32;
const NUMBER_WIDTH: usize = 14;

/// Views that print to stdout instead of starting the dashboard.
pub const PRINT_VIEWS: [&str; 7] = [
    "summary",
    "daily",
    "sku",
    "users",
    "repositories",
    "anomalies",
    "records",
];

// ── Layout helpers ─────────────────────────────────────────────────────────────

fn title(text: &str) -> Vec<String> {
    vec![text.to_string(), "=".repeat(text.chars().count())]
}

fn row(name: &str, numbers: &[String]) -> String {
    let mut line = format!(
        "{:<width$}",
        truncate_to_width(name, NAME_WIDTH),
        width = NAME_WIDTH
    );
    for n in numbers {
        line.push_str(&format!("{:>width$}", n, width = NUMBER_WIDTH));
    }
    line.trim_end().to_string()
}

fn header(name: &str, columns: &[&str]) -> Vec<String> {
    let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
    let line = row(name, &columns);
    let rule = "-".repeat(NAME_WIDTH + NUMBER_WIDTH * columns.len());
    vec![line, rule]
}

fn filter_line(report: &DashboardReport) -> String {
    format!(
        "Filter: {}  ({} of {} records)",
        report.metadata.filter, report.metadata.records_matched, report.metadata.records_loaded
    )
}

fn no_data() -> String {
    "No usage records match the current filter".to_string()
}

// ── Views ──────────────────────────────────────────────────────────────────────

/// Headline totals plus the SKU split and anomaly count.
pub fn summary_text(report: &DashboardReport) -> String {
    let totals = &report.totals;
    let mut lines = title("GitHub usage summary");
    lines.push(filter_line(report));
    lines.push(String::new());
    let stats = [
        ("Records", format_count(totals.record_count as f64)),
        ("Days", report.daily.len().to_string()),
        ("Quantity", format_count(totals.total_quantity)),
        ("Gross amount", format_currency(totals.total_gross_amount)),
        ("Discount", format_currency(-totals.total_discount_amount)),
        ("Net amount", format_currency(totals.total_net_amount)),
        ("Users", totals.unique_users.to_string()),
        ("Repositories", totals.unique_repositories.to_string()),
        ("SKUs", report.skus.len().to_string()),
        ("Cost anomalies", report.anomalies.len().to_string()),
    ];
    for (label, value) in stats {
        lines.push(format!("{:<16}{}", format!("{label}:"), value));
    }
    lines.join("\n")
}

/// One row per day, ascending, with a totals row.
pub fn daily_text(report: &DashboardReport) -> String {
    let mut lines = title("Daily usage");
    lines.push(filter_line(report));
    lines.push(String::new());
    if report.daily.is_empty() {
        lines.push(no_data());
        return lines.join("\n");
    }
    lines.extend(header("Date", &["Quantity", "Gross", "Discount", "Net"]));
    for day in &report.daily {
        lines.push(row(
            &day.date,
            &[
                format_count(day.total_quantity),
                format_currency(day.total_gross_amount),
                format_currency(day.total_discount_amount),
                format_currency(day.total_net_amount),
            ],
        ));
    }
    let totals = &report.totals;
    lines.push(row(
        &format!("TOTAL ({} days)", report.daily.len()),
        &[
            format_count(totals.total_quantity),
            format_currency(totals.total_gross_amount),
            format_currency(totals.total_discount_amount),
            format_currency(totals.total_net_amount),
        ],
    ));
    lines.join("\n")
}

/// Per-SKU quantity, cost and share of total quantity.
pub fn sku_text(report: &DashboardReport) -> String {
    let mut lines = title("Usage by SKU");
    lines.push(filter_line(report));
    lines.push(String::new());
    if report.skus.is_empty() {
        lines.push(no_data());
        return lines.join("\n");
    }
    lines.extend(header("SKU", &["Quantity", "Cost", "Share"]));
    for sku in &report.skus {
        lines.push(row(
            &sku.sku,
            &[
                format_count(sku.total_quantity),
                format_currency(sku.total_cost),
                format_percentage(sku.percentage, 1),
            ],
        ));
    }
    lines.join("\n")
}

/// Top users by the report's rank metric.
pub fn users_text(report: &DashboardReport) -> String {
    let mut lines = title(&format!("Top users by {}", report.metadata.rank_by));
    lines.push(filter_line(report));
    lines.push(String::new());
    if report.top_users.is_empty() {
        lines.push(no_data());
        return lines.join("\n");
    }
    lines.extend(header("User", &["Quantity", "Cost", "Repos"]));
    for user in &report.top_users {
        lines.push(row(
            &user.username,
            &[
                format_count(user.total_quantity),
                format_currency(user.total_cost),
                user.repository_count.to_string(),
            ],
        ));
    }
    lines.join("\n")
}

/// Top repositories by the report's rank metric.
pub fn repositories_text(report: &DashboardReport) -> String {
    let mut lines = title(&format!("Top repositories by {}", report.metadata.rank_by));
    lines.push(filter_line(report));
    lines.push(String::new());
    if report.top_repositories.is_empty() {
        lines.push(no_data());
        return lines.join("\n");
    }
    lines.extend(header("Repository", &["Quantity", "Cost", "Users"]));
    for repo in &report.top_repositories {
        lines.push(row(
            &repo.repository,
            &[
                format_count(repo.total_quantity),
                format_currency(repo.total_cost),
                repo.user_count.to_string(),
            ],
        ));
    }
    lines.join("\n")
}

/// Days whose cost exceeds the configured multiple of the average.
pub fn anomalies_text(report: &DashboardReport) -> String {
    let threshold = report.metadata.anomaly_threshold;
    let mut lines = title("Cost anomalies");
    lines.push(filter_line(report));
    lines.push(String::new());
    if report.anomalies.is_empty() {
        lines.push(format!(
            "No cost anomalies detected (threshold {threshold}× the average daily cost)"
        ));
        return lines.join("\n");
    }
    lines.extend(header("Date", &["Cost", "Average", "Difference", "Above avg"]));
    for anomaly in &report.anomalies {
        lines.push(row(
            &anomaly.date,
            &[
                format_currency(anomaly.total_cost),
                format_currency(anomaly.average_cost),
                format_currency(anomaly.difference),
                format!("+{}", format_percentage(anomaly.percentage, 1)),
            ],
        ));
    }
    lines.join("\n")
}

/// One page of raw records.
pub fn records_text(query: &RecordQuery, page: &RecordPage) -> String {
    let mut lines = title("Usage records");
    let search = query.search.trim();
    lines.push(format!(
        "{} matches{} | sort: {} {} | page {}/{}",
        page.total_matches,
        if search.is_empty() {
            String::new()
        } else {
            format!(" for \"{search}\"")
        },
        query.sort_field,
        query.direction.arrow(),
        page.page + 1,
        page.page_count,
    ));
    lines.push(String::new());
    if page.rows.is_empty() {
        lines.push("No records match".to_string());
        return lines.join("\n");
    }
    lines.push(format!(
        "{:<12}{:<20}{:<28}{:<22}{:>12}{:>12}{:>12}",
        "Date", "User", "Repository", "SKU", "Quantity", "Gross", "Net"
    ));
    lines.push("-".repeat(118));
    for r in &page.rows {
        lines.push(format!(
            "{:<12}{:<20}{:<28}{:<22}{:>12}{:>12}{:>12}",
            r.date,
            truncate_to_width(&r.username, 19),
            truncate_to_width(&r.repository, 27),
            truncate_to_width(&r.sku, 21),
            format_count(r.quantity),
            format_currency(r.gross_amount),
            format_currency(r.net_amount),
        ));
    }
    lines.join("\n")
}

/// Plain-text rendering of one of the report views (everything but `records`).
pub fn view_text(view: &str, report: &DashboardReport) -> String {
    match view {
        "daily" => daily_text(report),
        "sku" => sku_text(report),
        "users" => users_text(report),
        "repositories" => repositories_text(report),
        "anomalies" => anomalies_text(report),
        _ => summary_text(report),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
