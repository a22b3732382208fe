mod bootstrap;
mod report;

use anyhow::{anyhow, Result};
use usage_core::settings::Settings;
use usage_data::analysis::AnalysisOptions;
use usage_data::ranker::TOP_N;
use usage_data::reader::has_csv_extension;
use usage_data::records::{RecordQuery, SortDirection, PAGE_SIZE};
use usage_runtime::data_manager::DataManager;
use usage_runtime::orchestrator::ReloadOrchestrator;
use usage_ui::app::{App, Tab};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();
    settings.validate()?;

    let interactive = settings.view == "dashboard";
    let log_file = match (&settings.log_file, interactive) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => Some(bootstrap::default_log_file()),
        (None, false) => None,
    };

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level, log_file.as_deref())?;

    tracing::info!("Usage Dashboard v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "File: {}, View: {}, Theme: {}",
        settings.file.display(),
        settings.view,
        settings.theme
    );
    if !has_csv_extension(&settings.file) {
        tracing::warn!("{} does not have a .csv extension", settings.file.display());
    }

    let mut manager = DataManager::new(settings.file.clone());
    let records = manager.load(true).ok_or_else(|| {
        anyhow!(
            "failed to load {}: {}",
            settings.file.display(),
            manager.last_error().unwrap_or("unknown error")
        )
    })?;

    let filter = settings.filter();
    let options = AnalysisOptions {
        rank_by: settings.rank_metric()?,
        top_n: TOP_N,
        anomaly_threshold: settings.anomaly_threshold,
    };

    match settings.view.as_str() {
        "dashboard" => {
            tracing::info!("Starting interactive dashboard...");

            let source = settings
                .file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| settings.file.display().to_string());
            let app = App::new(
                &settings.theme,
                Tab::Overview,
                source,
                records,
                manager.generation(),
                filter,
                options,
            );

            let orchestrator =
                ReloadOrchestrator::new(u64::from(settings.refresh_rate), manager);
            let (rx, handle) = orchestrator.start();

            // The loop exits on 'q' / Ctrl+C inside the TUI. Ctrl+C is also
            // caught at the OS level for signals delivered outside raw mode.
            tokio::select! {
                result = app.run(rx) => {
                    handle.abort();
                    result?;
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received; stopping reload task");
                    handle.abort();
                }
            }
        }

        "records" => {
            tracing::info!("Printing records page {}...", settings.page);

            let query = RecordQuery {
                search: settings.search.clone().unwrap_or_default(),
                sort_field: settings.sort_field()?,
                direction: if settings.ascending {
                    SortDirection::Ascending
                } else {
                    SortDirection::Descending
                },
                page: settings.page.saturating_sub(1) as usize,
                page_size: PAGE_SIZE,
            };
            let matching = manager.filtered_records(&filter).unwrap_or_default();
            let page = query.run(&matching);

            if settings.json {
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else {
                println!("{}", report::records_text(&query, &page));
            }
        }

        view if report::PRINT_VIEWS.contains(&view) => {
            tracing::info!("Running {} view...", view);

            let summary = manager
                .report(&filter, &options)
                .ok_or_else(|| anyhow!("no usage records loaded"))?;
            if settings.json {
                println!("{}", serde_json::to_string_pretty(summary)?);
            } else {
                println!("{}", report::view_text(view, summary));
            }
        }

        unknown => {
            eprintln!("Unknown view mode: {}", unknown);
        }
    }

    Ok(())
}
