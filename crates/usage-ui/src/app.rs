//! Main application state and TUI event loop for the usage dashboard.
//!
//! [`App`] owns the theme, active tab, filter state and the current dataset.
//! Every filter, metric or dataset change recomputes the whole report (the
//! [`ReportCache`] only avoids recomputing between unchanged frames).

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span, Text},
    widgets::Paragraph,
    Frame, Terminal,
};
use tokio::sync::mpsc;

use usage_core::filter::{FilterCriteria, FilterField};
use usage_core::models::UsageRecord;
use usage_data::analysis::{AnalysisOptions, DashboardReport};
use usage_data::records::RecordQuery;
use usage_runtime::data_manager::ReportCache;
use usage_runtime::orchestrator::DatasetUpdate;

use crate::components::header::Header;
use crate::themes::Theme;
use crate::{dashboard_view, records_view, table_view};

// ── Tab ───────────────────────────────────────────────────────────────────────

/// Which view the TUI is currently rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Overview,
    Daily,
    Skus,
    Users,
    Repositories,
    Anomalies,
    Records,
}

impl Tab {
    pub const ALL: [Tab; 7] = [
        Tab::Overview,
        Tab::Daily,
        Tab::Skus,
        Tab::Users,
        Tab::Repositories,
        Tab::Anomalies,
        Tab::Records,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Daily => "Daily",
            Tab::Skus => "SKUs",
            Tab::Users => "Users",
            Tab::Repositories => "Repositories",
            Tab::Anomalies => "Anomalies",
            Tab::Records => "Records",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

/// Root application state for the dashboard TUI.
pub struct App {
    pub theme: Theme,
    pub tab: Tab,
    /// File name shown in the header.
    pub source: String,
    pub filter: FilterCriteria,
    pub options: AnalysisOptions,
    pub query: RecordQuery,
    /// `true` while the record search box is capturing keys.
    pub search_mode: bool,
    /// Error from the most recent reload, if it failed.
    pub status: Option<String>,
    /// Set to `true` to break out of the event loop on the next iteration.
    pub should_quit: bool,
    records: Arc<Vec<UsageRecord>>,
    generation: u64,
    reports: ReportCache,
}

impl App {
    /// Construct a new application over an already loaded dataset.
    pub fn new(
        theme_name: &str,
        tab: Tab,
        source: String,
        records: Arc<Vec<UsageRecord>>,
        generation: u64,
        filter: FilterCriteria,
        options: AnalysisOptions,
    ) -> Self {
        Self {
            theme: Theme::from_name(theme_name),
            tab,
            source,
            filter,
            options,
            query: RecordQuery::default(),
            search_mode: false,
            status: None,
            should_quit: false,
            records,
            generation,
            reports: ReportCache::new(),
        }
    }

    // ── Public event loop ─────────────────────────────────────────────────────

    /// Run the interactive dashboard, receiving dataset updates from `rx`.
    ///
    /// Uses `crossterm::event::poll` (synchronous, with a 250 ms timeout) so
    /// that the terminal event loop stays on the current thread while
    /// updates arrive on the async channel via `try_recv`.
    pub async fn run(mut self, mut rx: mpsc::Receiver<DatasetUpdate>) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let tick_rate = Duration::from_millis(250);

        let result = loop {
            if let Err(e) = terminal.draw(|frame| self.render(frame)) {
                break Err(e);
            }

            match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    Ok(_) => {}
                    Err(e) => break Err(e),
                },
                Ok(false) => {}
                Err(e) => break Err(e),
            }

            // Drain any pending dataset updates (non-blocking).
            loop {
                match rx.try_recv() {
                    Ok(update) => self.apply_update(update),
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => break,
                }
            }

            if self.should_quit {
                break Ok(());
            }
        };

        // Restore terminal state unconditionally.
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    // ── State transitions ─────────────────────────────────────────────────────

    /// Replace the dataset with a newer generation and record load errors.
    pub fn apply_update(&mut self, update: DatasetUpdate) {
        self.status = update.error;
        if update.generation != self.generation && update.generation > 0 {
            tracing::debug!(
                generation = update.generation,
                records = update.records.len(),
                "dashboard dataset replaced"
            );
            self.records = update.records;
            self.generation = update.generation;
            self.reports.invalidate();
        }
    }

    /// Apply one key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.search_mode {
            self.handle_search_key(key.code);
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Tab | KeyCode::Right => self.tab = self.tab.next(),
            KeyCode::BackTab | KeyCode::Left => self.tab = self.tab.previous(),
            KeyCode::Char(c @ '1'..='7') => {
                let idx = c as usize - '1' as usize;
                self.tab = Tab::ALL[idx];
            }
            KeyCode::Char('u') => self.cycle_filter(FilterField::Username),
            KeyCode::Char('r') => self.cycle_filter(FilterField::Repository),
            KeyCode::Char('s') => self.cycle_filter(FilterField::Sku),
            KeyCode::Char('c') => self.cycle_filter(FilterField::CostCenter),
            KeyCode::Char('x') => {
                self.filter.clear();
                self.query.page = 0;
            }
            KeyCode::Char('m') => self.options.rank_by = self.options.rank_by.toggled(),
            _ if self.tab == Tab::Records => self.handle_records_key(key.code),
            _ => {}
        }
    }

    fn handle_search_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter => self.search_mode = false,
            KeyCode::Esc => {
                self.search_mode = false;
                self.query.search.clear();
            }
            KeyCode::Backspace => {
                self.query.search.pop();
            }
            KeyCode::Char(c) => self.query.search.push(c),
            _ => return,
        }
        self.query.page = 0;
    }

    fn handle_records_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('/') => self.search_mode = true,
            KeyCode::Char('n') | KeyCode::PageDown => {
                let filtered = self.filtered_records();
                let last = self.query.page_count(&filtered) - 1;
                self.query.page = (self.query.page + 1).min(last);
            }
            KeyCode::Char('p') | KeyCode::PageUp => {
                self.query.page = self.query.page.saturating_sub(1);
            }
            KeyCode::Char('o') => {
                self.query.sort_field = self.query.sort_field.next();
                self.query.page = 0;
            }
            KeyCode::Char('d') => self.query.direction = self.query.direction.toggled(),
            _ => {}
        }
    }

    /// Step `field` to its next choice from the unfiltered dataset.
    fn cycle_filter(&mut self, field: FilterField) {
        let choices = self.current_report().filter_choices.clone();
        let next = choices.next_value(field, self.filter.get(field));
        tracing::debug!(field = field.label(), value = ?next, "filter changed");
        self.filter.set(field, next);
        self.query.page = 0;
    }

    /// Records matching the active filter, shared with the cached report.
    fn filtered_records(&mut self) -> Arc<Vec<UsageRecord>> {
        self.reports.filtered(self.generation, &self.records, &self.filter)
    }

    /// Report for the current dataset, filter and options.
    pub fn current_report(&mut self) -> &DashboardReport {
        self.reports
            .get_or_compute(self.generation, &self.records, &self.filter, &self.options)
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    /// Render the current application state into `frame`.
    pub fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(2),
            ])
            .split(frame.area());

        let filter_text = self.filter.describe();
        let header = Header::new(&self.source, &filter_text, &self.theme).to_lines();
        frame.render_widget(Paragraph::new(Text::from(header)), chunks[0]);
        frame.render_widget(Paragraph::new(tab_line(self.tab, &self.theme)), chunks[1]);

        let filtered = self.filtered_records();
        let report = self.reports.get_or_compute(
            self.generation,
            &self.records,
            &self.filter,
            &self.options,
        );
        if let Some(page) = render_body(
            frame,
            chunks[2],
            self.tab,
            report,
            &filtered,
            &self.query,
            &self.theme,
        ) {
            // Keep the stored index on the page actually shown.
            self.query.page = page;
        }

        frame.render_widget(
            Paragraph::new(Text::from(footer_lines(
                self.tab,
                self.search_mode,
                &self.query.search,
                self.status.as_deref(),
                &self.theme,
            ))),
            chunks[3],
        );
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn tab_line(active: Tab, theme: &Theme) -> Line<'static> {
    let mut spans = Vec::with_capacity(Tab::ALL.len() * 2);
    for (i, tab) in Tab::ALL.iter().enumerate() {
        let style = if *tab == active {
            theme.tab_active
        } else {
            theme.tab_inactive
        };
        spans.push(Span::styled(format!(" {} {} ", i + 1, tab.title()), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

/// Render the active tab; returns the record page shown on the Records tab.
fn render_body(
    frame: &mut Frame,
    area: Rect,
    tab: Tab,
    report: &DashboardReport,
    filtered: &[UsageRecord],
    query: &RecordQuery,
    theme: &Theme,
) -> Option<usize> {
    if report.is_empty() && tab != Tab::Records {
        table_view::render_no_data(frame, area, theme);
        return None;
    }

    let metric = report.metadata.rank_by;
    match tab {
        Tab::Overview => dashboard_view::render_overview(frame, area, report, theme),
        Tab::Daily => table_view::render_daily_table(frame, area, &report.daily, theme),
        Tab::Skus => table_view::render_sku_table(frame, area, &report.skus, theme),
        Tab::Users => table_view::render_user_table(frame, area, &report.top_users, metric, theme),
        Tab::Repositories => {
            table_view::render_repository_table(frame, area, &report.top_repositories, metric, theme)
        }
        Tab::Anomalies => table_view::render_anomaly_table(
            frame,
            area,
            &report.anomalies,
            report.metadata.anomaly_threshold,
            theme,
        ),
        Tab::Records => {
            let page = query.run(filtered);
            records_view::render_records(frame, area, query, &page, theme);
            return Some(page.page);
        }
    }
    None
}

fn footer_lines<'a>(
    tab: Tab,
    search_mode: bool,
    search: &'a str,
    status: Option<&'a str>,
    theme: &Theme,
) -> Vec<Line<'a>> {
    let keys = if search_mode {
        Line::from(vec![
            Span::styled("Search: ", theme.info),
            Span::styled(search, theme.value),
            Span::styled("█  Enter apply · Esc clear", theme.dim),
        ])
    } else if tab == Tab::Records {
        Line::from(Span::styled(
            "/ search · n/p page · o sort column · d direction · u/r/s/c filter · x clear · q quit",
            theme.dim,
        ))
    } else {
        Line::from(Span::styled(
            "←/→ tabs · u/r/s/c filter user/repo/sku/cost center · x clear · m rank metric · q quit",
            theme.dim,
        ))
    };

    let status_line = match status {
        Some(err) => Line::from(Span::styled(
            format!("Reload failed, showing last good data: {err}"),
            theme.notification_error,
        )),
        None => Line::from(""),
    };

    vec![keys, status_line]
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use usage_core::models::RankMetric;
    use usage_core::models::RecordField;

    fn record(date: &str, user: &str, repo: &str, sku: &str, qty: f64, gross: f64) -> UsageRecord {
        UsageRecord {
            date: date.to_string(),
            product: "actions".to_string(),
            sku: sku.to_string(),
            quantity: qty,
            unit_type: "minutes".to_string(),
            gross_amount: gross,
            net_amount: gross,
            username: user.to_string(),
            organization: "acme".to_string(),
            repository: repo.to_string(),
            ..Default::default()
        }
    }

    fn dataset() -> Arc<Vec<UsageRecord>> {
        Arc::new(vec![
            record("2024-03-01", "alice", "acme/app", "actions_linux", 10.0, 10.0),
            record("2024-03-02", "bob", "acme/api", "actions_linux", 10.0, 10.0),
            record("2024-03-03", "alice", "acme/app", "actions_macos", 10.0, 10.0),
            record("2024-03-04", "carol", "acme/web", "actions_linux", 10.0, 10.0),
            record("2024-03-05", "bob", "acme/api", "actions_windows", 40.0, 100.0),
        ])
    }

    fn make_app() -> App {
        App::new(
            "dark",
            Tab::Overview,
            "usage.csv".to_string(),
            dataset(),
            1,
            FilterCriteria::default(),
            AnalysisOptions::default(),
        )
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn render_text(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| app.render(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    // ── Tab ───────────────────────────────────────────────────────────────────

    #[test]
    fn test_tab_navigation_wraps() {
        assert_eq!(Tab::Overview.previous(), Tab::Records);
        assert_eq!(Tab::Records.next(), Tab::Overview);
        assert_eq!(Tab::Daily.next(), Tab::Skus);
    }

    // ── Keys ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_quit_keys() {
        let mut app = make_app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);

        let mut app = make_app();
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[test]
    fn test_number_keys_select_tab() {
        let mut app = make_app();
        press(&mut app, KeyCode::Char('6'));
        assert_eq!(app.tab, Tab::Anomalies);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.tab, Tab::Records);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.tab, Tab::Anomalies);
    }

    #[test]
    fn test_user_filter_cycles_and_recomputes() {
        let mut app = make_app();

        press(&mut app, KeyCode::Char('u'));
        assert_eq!(app.filter.username.as_deref(), Some("alice"));
        assert_eq!(app.current_report().metadata.records_matched, 2);

        press(&mut app, KeyCode::Char('u'));
        assert_eq!(app.filter.username.as_deref(), Some("bob"));
        assert_eq!(app.current_report().metadata.records_matched, 2);

        press(&mut app, KeyCode::Char('u'));
        press(&mut app, KeyCode::Char('u'));
        assert!(app.filter.username.is_none());
        assert_eq!(app.current_report().metadata.records_matched, 5);
    }

    #[test]
    fn test_clear_filters() {
        let mut app = make_app();
        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Char('r'));
        assert!(app.filter.is_active());

        press(&mut app, KeyCode::Char('x'));
        assert!(!app.filter.is_active());
    }

    #[test]
    fn test_metric_toggle_reranks() {
        let mut app = make_app();
        assert_eq!(app.current_report().top_users[0].username, "bob");

        press(&mut app, KeyCode::Char('m'));
        assert_eq!(app.options.rank_by, RankMetric::Cost);
        assert_eq!(app.current_report().metadata.rank_by, RankMetric::Cost);
    }

    #[test]
    fn test_records_keys() {
        let mut app = make_app();
        press(&mut app, KeyCode::Char('7'));

        press(&mut app, KeyCode::Char('o'));
        assert_eq!(app.query.sort_field, RecordField::Product);
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(
            app.query.direction,
            usage_data::records::SortDirection::Ascending
        );
        // Five records fit on one page.
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.query.page, 0);
        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.query.page, 0);
    }

    fn paged_app(count: usize) -> App {
        let records = (0..count)
            .map(|i| {
                let user = if i % 5 == 0 { "alice" } else { "bob" };
                record("2024-03-01", user, "acme/app", "actions_linux", i as f64, 1.0)
            })
            .collect();
        App::new(
            "dark",
            Tab::Records,
            "usage.csv".to_string(),
            Arc::new(records),
            1,
            FilterCriteria::default(),
            AnalysisOptions::default(),
        )
    }

    #[test]
    fn test_next_page_stops_at_last_page() {
        let mut app = paged_app(25);
        for _ in 0..3 {
            press(&mut app, KeyCode::Char('n'));
        }
        assert_eq!(app.query.page, 1);
        assert!(render_text(&mut app, 160, 30).contains("page 2/2"));

        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.query.page, 0);
        assert!(render_text(&mut app, 160, 30).contains("page 1/2"));
    }

    #[test]
    fn test_page_down_respects_search() {
        let mut app = paged_app(25);
        app.query.search = "alice".to_string();
        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.query.page, 0);
    }

    #[test]
    fn test_render_pulls_page_back_when_matches_shrink() {
        let mut app = paged_app(25);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.query.page, 1);

        app.filter = FilterCriteria::new().with_username("alice");
        render_text(&mut app, 160, 30);
        assert_eq!(app.query.page, 0);

        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.query.page, 0);
    }

    #[test]
    fn test_records_keys_ignored_on_other_tabs() {
        let mut app = make_app();
        press(&mut app, KeyCode::Char('o'));
        assert_eq!(app.query.sort_field, RecordField::Date);
        press(&mut app, KeyCode::Char('/'));
        assert!(!app.search_mode);
    }

    #[test]
    fn test_search_mode_captures_keys() {
        let mut app = make_app();
        app.tab = Tab::Records;
        press(&mut app, KeyCode::Char('/'));
        assert!(app.search_mode);

        for c in "quit".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert!(!app.should_quit);
        assert_eq!(app.query.search, "quit");

        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.query.search, "qui");
        press(&mut app, KeyCode::Enter);
        assert!(!app.search_mode);
        assert_eq!(app.query.search, "qui");

        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Esc);
        assert!(app.query.search.is_empty());
    }

    // ── Dataset updates ───────────────────────────────────────────────────────

    #[test]
    fn test_apply_update_replaces_dataset() {
        let mut app = make_app();
        let more = Arc::new(vec![record("2024-04-01", "dave", "acme/new", "actions_linux", 1.0, 1.0)]);

        app.apply_update(DatasetUpdate {
            records: more,
            generation: 2,
            error: None,
        });
        assert_eq!(app.current_report().metadata.records_loaded, 1);
        assert!(app.status.is_none());
    }

    #[test]
    fn test_apply_update_error_keeps_dataset() {
        let mut app = make_app();
        app.apply_update(DatasetUpdate {
            records: dataset(),
            generation: 1,
            error: Some("CSV file is empty".to_string()),
        });
        assert_eq!(app.current_report().metadata.records_loaded, 5);
        assert_eq!(app.status.as_deref(), Some("CSV file is empty"));

        app.apply_update(DatasetUpdate {
            records: Arc::new(Vec::new()),
            generation: 0,
            error: Some("missing".to_string()),
        });
        assert_eq!(app.current_report().metadata.records_loaded, 5);
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    #[test]
    fn test_render_every_tab() {
        let mut app = make_app();
        for tab in Tab::ALL {
            app.tab = tab;
            let text = render_text(&mut app, 160, 30);
            assert!(text.contains("GITHUB USAGE DASHBOARD"), "{tab:?}");
            assert!(text.contains(tab.title()), "{tab:?}");
        }
    }

    #[test]
    fn test_render_shows_filter_and_status() {
        let mut app = make_app();
        press(&mut app, KeyCode::Char('u'));
        app.status = Some("boom".to_string());
        let text = render_text(&mut app, 160, 30);
        assert!(text.contains("filter: User=alice"));
        assert!(text.contains("Reload failed, showing last good data: boom"));
    }

    #[test]
    fn test_render_no_matching_records() {
        let mut app = make_app();
        app.filter = FilterCriteria::new().with_sku("nothing");
        let text = render_text(&mut app, 120, 24);
        assert!(text.contains("No usage records match the current filter"));
    }
}
