//! Data layer for the usage dashboard.
//!
//! Reads usage-report CSV files into typed records, groups and ranks them,
//! flags cost anomalies, backs the raw-record browser and runs the top-level
//! analysis pipeline.

pub mod aggregator;
pub mod analysis;
pub mod anomaly;
pub mod ranker;
pub mod reader;
pub mod records;

pub use usage_core as core;
