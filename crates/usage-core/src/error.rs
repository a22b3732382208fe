use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the usage dashboard.
#[derive(Error, Debug)]
pub enum UsageError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV reader rejected the input (malformed quoting, ragged rows, ...).
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// The report contains a header row at most, but no data rows.
    #[error("CSV file is empty: {0}")]
    EmptyFile(PathBuf),

    /// One or more required columns are absent from the header row.
    #[error("CSV file is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A cell could not be coerced into the type its column requires.
    #[error("Invalid value {value:?} for column '{column}' on row {row}: {reason}")]
    InvalidField {
        row: usize,
        column: String,
        value: String,
        reason: String,
    },

    /// A `date` cell is not a calendar day in `YYYY-MM-DD` form.
    #[error("Invalid date {value:?} on row {row}: expected YYYY-MM-DD")]
    InvalidDate { row: usize, value: String },

    /// A JSON document could not be parsed or written.
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// An error originating from the terminal / TUI layer.
    #[error("Terminal error: {0}")]
    Terminal(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, UsageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = UsageError::FileRead {
            path: PathBuf::from("/some/usage.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/some/usage.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_empty_file() {
        let err = UsageError::EmptyFile(PathBuf::from("/tmp/empty.csv"));
        assert_eq!(err.to_string(), "CSV file is empty: /tmp/empty.csv");
    }

    #[test]
    fn test_error_display_missing_columns() {
        let err = UsageError::MissingColumns(vec!["sku".to_string(), "quantity".to_string()]);
        assert_eq!(
            err.to_string(),
            "CSV file is missing required columns: sku, quantity"
        );
    }

    #[test]
    fn test_error_display_invalid_field() {
        let err = UsageError::InvalidField {
            row: 4,
            column: "quantity".to_string(),
            value: "abc".to_string(),
            reason: "not a number".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value \"abc\" for column 'quantity' on row 4: not a number"
        );
    }

    #[test]
    fn test_error_display_invalid_date() {
        let err = UsageError::InvalidDate {
            row: 2,
            value: "03/15/2024".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid date \"03/15/2024\" on row 2: expected YYYY-MM-DD"
        );
    }

    #[test]
    fn test_error_display_config() {
        let err = UsageError::Config("anomaly threshold must be positive".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: anomaly threshold must be positive"
        );
    }

    #[test]
    fn test_error_display_terminal() {
        let err = UsageError::Terminal("crossterm failure".to_string());
        assert_eq!(err.to_string(), "Terminal error: crossterm failure");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: UsageError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: UsageError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }
}
