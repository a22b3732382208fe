//! Terminal UI layer for the usage dashboard.
//!
//! Provides themes, the header, share-bar and indicator components, the
//! summary table views, the record browser and the main application event
//! loop built on top of [`ratatui`].

pub mod app;
pub mod components;
pub mod dashboard_view;
pub mod records_view;
pub mod table_view;
pub mod themes;

pub use usage_core as core;
