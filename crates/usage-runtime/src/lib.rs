//! Runtime layer for the usage dashboard.
//!
//! Keeps the loaded usage report in memory, reloads it when the file changes
//! and memoizes the last computed report.

pub mod data_manager;
pub mod orchestrator;

pub use usage_core as core;
pub use usage_data as data;
