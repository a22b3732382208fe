//! Summary table views (daily, SKU, users, repositories, anomalies).
//!
//! Each view renders a bordered [`ratatui::widgets::Table`] with one row per
//! summary and, where it makes sense, a highlighted totals row at the bottom.

use ratatui::{
    layout::{Constraint, Rect},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use usage_core::formatting::{format_count, format_currency, format_percentage};
use usage_core::models::{
    CostAnomaly, DailySummary, RankMetric, RepositorySummary, SkuSummary, UserSummary,
};

use crate::themes::Theme;

/// Longest display width allowed for name columns before truncation.
pub const NAME_COLUMN_WIDTH: usize = 32;

/// Shorten `text` to at most `max_width` display columns, ending in `…` when
/// anything was cut.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let budget = max_width - 1;
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

fn header_row<'a>(titles: &[&'a str], theme: &Theme) -> Row<'a> {
    Row::new(
        titles
            .iter()
            .map(|h| Cell::from(*h).style(theme.table_header))
            .collect::<Vec<_>>(),
    )
    .height(1)
}

fn row_style(i: usize, theme: &Theme) -> ratatui::style::Style {
    if i % 2 == 0 {
        theme.table_row
    } else {
        theme.table_row_alt
    }
}

fn bordered_table<'a>(
    header: Row<'a>,
    rows: Vec<Row<'a>>,
    widths: &[Constraint],
    title: &str,
    theme: &Theme,
) -> Table<'a> {
    Table::new(rows, widths.to_vec())
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(format!(" {} ", title)),
        )
        .style(theme.text)
}

// ── Daily ─────────────────────────────────────────────────────────────────────

/// Per-day totals plus a totals row.
pub fn render_daily_table(frame: &mut Frame, area: Rect, daily: &[DailySummary], theme: &Theme) {
    let header = header_row(&["Date", "Quantity", "Gross", "Discount", "Net"], theme);

    let mut rows: Vec<Row> = daily
        .iter()
        .enumerate()
        .map(|(i, d)| {
            Row::new(vec![
                Cell::from(d.date.clone()),
                Cell::from(format_count(d.total_quantity)),
                Cell::from(format_currency(d.total_gross_amount)),
                Cell::from(format_currency(d.total_discount_amount)),
                Cell::from(format_currency(d.total_net_amount)),
            ])
            .style(row_style(i, theme))
        })
        .collect();

    rows.push(
        Row::new(vec![
            Cell::from(format!("TOTAL ({} days)", daily.len())),
            Cell::from(format_count(daily.iter().map(|d| d.total_quantity).sum())),
            Cell::from(format_currency(daily.iter().map(|d| d.total_gross_amount).sum())),
            Cell::from(format_currency(
                daily.iter().map(|d| d.total_discount_amount).sum(),
            )),
            Cell::from(format_currency(daily.iter().map(|d| d.total_net_amount).sum())),
        ])
        .style(theme.table_total),
    );

    let widths = [
        Constraint::Length(18),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(14),
    ];
    frame.render_widget(bordered_table(header, rows, &widths, "Daily Usage", theme), area);
}

// ── SKU ───────────────────────────────────────────────────────────────────────

/// Per-SKU totals with share of total quantity.
pub fn render_sku_table(frame: &mut Frame, area: Rect, skus: &[SkuSummary], theme: &Theme) {
    let header = header_row(&["SKU", "Quantity", "Cost", "Share"], theme);

    let mut rows: Vec<Row> = skus
        .iter()
        .enumerate()
        .map(|(i, s)| {
            Row::new(vec![
                Cell::from(truncate_to_width(&s.sku, NAME_COLUMN_WIDTH)),
                Cell::from(format_count(s.total_quantity)),
                Cell::from(format_currency(s.total_cost)),
                Cell::from(format_percentage(s.percentage, 1))
                    .style(theme.share_style(s.percentage)),
            ])
            .style(row_style(i, theme))
        })
        .collect();

    rows.push(
        Row::new(vec![
            Cell::from(format!("TOTAL ({} SKUs)", skus.len())),
            Cell::from(format_count(skus.iter().map(|s| s.total_quantity).sum())),
            Cell::from(format_currency(skus.iter().map(|s| s.total_cost).sum())),
            Cell::from(""),
        ])
        .style(theme.table_total),
    );

    let widths = [
        Constraint::Length(NAME_COLUMN_WIDTH as u16 + 2),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(10),
    ];
    frame.render_widget(bordered_table(header, rows, &widths, "Usage by SKU", theme), area);
}

// ── Users / repositories ──────────────────────────────────────────────────────

fn ranking_title(entity: &str, metric: RankMetric) -> String {
    format!("Top {} by {}", entity, metric)
}

/// Ranked users.
pub fn render_user_table(
    frame: &mut Frame,
    area: Rect,
    users: &[UserSummary],
    metric: RankMetric,
    theme: &Theme,
) {
    let header = header_row(&["#", "User", "Quantity", "Cost", "Repos"], theme);

    let rows: Vec<Row> = users
        .iter()
        .enumerate()
        .map(|(i, u)| {
            Row::new(vec![
                Cell::from(format!("{}", i + 1)),
                Cell::from(truncate_to_width(&u.username, NAME_COLUMN_WIDTH)),
                Cell::from(format_count(u.total_quantity)),
                Cell::from(format_currency(u.total_cost)),
                Cell::from(u.repository_count.to_string()),
            ])
            .style(row_style(i, theme))
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Length(NAME_COLUMN_WIDTH as u16 + 2),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(7),
    ];
    let title = ranking_title("Users", metric);
    frame.render_widget(bordered_table(header, rows, &widths, &title, theme), area);
}

/// Ranked repositories.
pub fn render_repository_table(
    frame: &mut Frame,
    area: Rect,
    repositories: &[RepositorySummary],
    metric: RankMetric,
    theme: &Theme,
) {
    let header = header_row(&["#", "Repository", "Quantity", "Cost", "Users"], theme);

    let rows: Vec<Row> = repositories
        .iter()
        .enumerate()
        .map(|(i, r)| {
            Row::new(vec![
                Cell::from(format!("{}", i + 1)),
                Cell::from(truncate_to_width(&r.repository, NAME_COLUMN_WIDTH)),
                Cell::from(format_count(r.total_quantity)),
                Cell::from(format_currency(r.total_cost)),
                Cell::from(r.user_count.to_string()),
            ])
            .style(row_style(i, theme))
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Length(NAME_COLUMN_WIDTH as u16 + 2),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(7),
    ];
    let title = ranking_title("Repositories", metric);
    frame.render_widget(bordered_table(header, rows, &widths, &title, theme), area);
}

// ── Anomalies ─────────────────────────────────────────────────────────────────

/// Anomalous days, most expensive first.
pub fn render_anomaly_table(
    frame: &mut Frame,
    area: Rect,
    anomalies: &[CostAnomaly],
    threshold: f64,
    theme: &Theme,
) {
    let title = format!("Cost Anomalies (> {}× average)", threshold);
    if anomalies.is_empty() {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled("No cost anomalies detected", theme.success)),
        ];
        frame.render_widget(
            Paragraph::new(Text::from(text)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.table_border)
                    .title(format!(" {} ", title)),
            ),
            area,
        );
        return;
    }

    let header = header_row(&["Date", "Cost", "Average", "Difference", "Excess"], theme);
    let rows: Vec<Row> = anomalies
        .iter()
        .map(|a| {
            let style = theme.anomaly_style(a.percentage);
            Row::new(vec![
                Cell::from(a.date.clone()),
                Cell::from(format_currency(a.total_cost)).style(style),
                Cell::from(format_currency(a.average_cost)),
                Cell::from(format_currency(a.difference)),
                Cell::from(format!("+{}", format_percentage(a.percentage, 1))).style(style),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(14),
        Constraint::Length(12),
    ];
    frame.render_widget(bordered_table(header, rows, &widths, &title, theme), area);
}

/// Render a "no data" placeholder when the filter matched nothing.
pub fn render_no_data(frame: &mut Frame, area: Rect, theme: &Theme) {
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("No usage records match the current filter", theme.warning)),
        Line::from(""),
        Line::from(Span::styled("Press 'x' to clear filters", theme.dim)),
        Line::from(Span::styled("Press 'q' or Ctrl+C to exit", theme.dim)),
    ];
    frame.render_widget(
        Paragraph::new(Text::from(text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Usage Dashboard "),
        ),
        area,
    );
}

// ── Tests ──────────────────────────────────────────────────────────────────────
