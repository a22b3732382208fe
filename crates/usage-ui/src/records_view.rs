//! Raw-record browser tab.

use ratatui::{
    layout::{Constraint, Rect},
    widgets::{Block, Borders, Cell, Row, Table},
    Frame,
};

use usage_core::formatting::{format_count, format_currency};
use usage_core::models::RecordField;
use usage_data::records::{RecordPage, RecordQuery};

use crate::table_view::truncate_to_width;
use crate::themes::Theme;

const COLUMNS: [(RecordField, &str, u16); 8] = [
    (RecordField::Date, "Date", 12),
    (RecordField::Username, "User", 18),
    (RecordField::Repository, "Repository", 26),
    (RecordField::Sku, "SKU", 20),
    (RecordField::Quantity, "Quantity", 11),
    (RecordField::GrossAmount, "Gross", 11),
    (RecordField::NetAmount, "Net", 11),
    (RecordField::WorkflowPath, "Workflow", 30),
];

/// Block title summarising search, sort and paging state.
pub fn records_title(query: &RecordQuery, page: &RecordPage) -> String {
    let search = if query.search.trim().is_empty() {
        String::new()
    } else {
        format!(" | search: \"{}\"", query.search.trim())
    };
    format!(
        " Records ({} matches){} | sort: {} {} | page {}/{} ",
        page.total_matches,
        search,
        query.sort_field,
        query.direction.arrow(),
        page.page + 1,
        page.page_count,
    )
}

/// Render one page of records.
pub fn render_records(
    frame: &mut Frame,
    area: Rect,
    query: &RecordQuery,
    page: &RecordPage,
    theme: &Theme,
) {
    let header = Row::new(
        COLUMNS
            .iter()
            .map(|(field, title, _)| {
                let text = if *field == query.sort_field {
                    format!("{} {}", title, query.direction.arrow())
                } else {
                    (*title).to_string()
                };
                Cell::from(text).style(theme.table_header)
            })
            .collect::<Vec<_>>(),
    );

    let rows: Vec<Row> = page
        .rows
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let style = if i % 2 == 0 {
                theme.table_row
            } else {
                theme.table_row_alt
            };
            Row::new(vec![
                Cell::from(r.date.clone()),
                Cell::from(truncate_to_width(&r.username, 17)),
                Cell::from(truncate_to_width(&r.repository, 25)),
                Cell::from(truncate_to_width(&r.sku, 19)),
                Cell::from(format_count(r.quantity)),
                Cell::from(format_currency(r.gross_amount)),
                Cell::from(format_currency(r.net_amount)),
                Cell::from(truncate_to_width(&r.workflow_path, 29)),
            ])
            .style(style)
        })
        .collect();

    let widths: Vec<Constraint> = COLUMNS
        .iter()
        .map(|(_, _, w)| Constraint::Length(*w))
        .collect();

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(theme.table_border)
                .title(records_title(query, page)),
        )
        .style(theme.text);

    frame.render_widget(table, area);
}

// ── Tests ──────────────────────────────────────────────────────────────────────
