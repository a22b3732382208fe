//! Overview tab: headline totals, SKU shares and the worst anomalies.

use ratatui::{
    layout::Rect,
    text::{Line, Span, Text},
    widgets::Paragraph,
    Frame,
};

use usage_core::formatting::format_count;
use usage_data::analysis::DashboardReport;

use crate::components::indicators::{AnomalyIndicator, CostIndicator};
use crate::components::progress_bar::ShareBar;
use crate::table_view::truncate_to_width;
use crate::themes::Theme;

/// SKUs shown on the overview before the rest are summarised.
const OVERVIEW_SKUS: usize = 5;
/// Anomalies shown on the overview.
const OVERVIEW_ANOMALIES: usize = 3;

fn section<'a>(title: &'a str, theme: &Theme) -> Line<'a> {
    Line::from(Span::styled(title, theme.bold))
}

fn stat<'a>(label: &'a str, value: String, theme: &Theme) -> Vec<Span<'a>> {
    vec![
        Span::styled(label, theme.label),
        Span::styled(value, theme.value),
    ]
}

/// Build the overview lines (extracted for testability).
pub fn build_overview_lines<'a>(report: &'a DashboardReport, theme: &'a Theme) -> Vec<Line<'a>> {
    let totals = &report.totals;
    let mut lines: Vec<Line<'a>> = Vec::with_capacity(24);

    // ── Summary ───────────────────────────────────────────────────────────────
    lines.push(section("📊 Summary", theme));
    let mut first = stat("Records: ", format_count(totals.record_count as f64), theme);
    first.push(Span::raw("   "));
    first.extend(stat("Quantity: ", format_count(totals.total_quantity), theme));
    lines.push(Line::from(first));

    let mut second = stat("Users: ", totals.unique_users.to_string(), theme);
    second.push(Span::raw("   "));
    second.extend(stat("Repositories: ", totals.unique_repositories.to_string(), theme));
    second.push(Span::raw("   "));
    second.extend(stat("Days: ", report.daily.len().to_string(), theme));
    lines.push(Line::from(second));

    lines.push(CostIndicator::new(totals, theme).to_line());
    lines.push(Line::from(""));

    // ── SKU shares ────────────────────────────────────────────────────────────
    lines.push(section("📦 Quantity by SKU", theme));
    for sku in report.skus.iter().take(OVERVIEW_SKUS) {
        let mut spans = vec![Span::styled(
            format!("{:<28}", truncate_to_width(&sku.sku, 26)),
            theme.label,
        )];
        spans.extend(ShareBar::new(sku.percentage, theme).to_line().spans);
        lines.push(Line::from(spans));
    }
    if report.skus.len() > OVERVIEW_SKUS {
        lines.push(Line::from(Span::styled(
            format!("… and {} more (see SKU tab)", report.skus.len() - OVERVIEW_SKUS),
            theme.dim,
        )));
    }
    lines.push(Line::from(""));

    // ── Anomalies ─────────────────────────────────────────────────────────────
    lines.push(section("🚨 Cost anomalies", theme));
    if report.anomalies.is_empty() {
        lines.push(Line::from(Span::styled(
            format!(
                "None above {}× the average daily cost",
                report.metadata.anomaly_threshold
            ),
            theme.success,
        )));
    } else {
        for anomaly in report.anomalies.iter().take(OVERVIEW_ANOMALIES) {
            lines.push(AnomalyIndicator::new(anomaly, theme).to_line());
        }
        if report.anomalies.len() > OVERVIEW_ANOMALIES {
            lines.push(Line::from(Span::styled(
                format!(
                    "… and {} more (see Anomalies tab)",
                    report.anomalies.len() - OVERVIEW_ANOMALIES
                ),
                theme.dim,
            )));
        }
    }

    lines
}

/// Render the overview tab into `area`.
pub fn render_overview(frame: &mut Frame, area: Rect, report: &DashboardReport, theme: &Theme) {
    let lines = build_overview_lines(report, theme);
    frame.render_widget(Paragraph::new(Text::from(lines)), area);
}

// ── Tests ──────────────────────────────────────────────────────────────────────
