//! Core types for the usage dashboard.
//!
//! Holds the canonical [`models::UsageRecord`] shape, the derived summary
//! value objects, the row-level [`filter::FilterCriteria`] predicate, the
//! pure presentation formatters and the CLI settings shared by every other
//! crate in the workspace.

pub mod error;
pub mod filter;
pub mod formatting;
pub mod models;
pub mod settings;

pub use error::{Result, UsageError};
