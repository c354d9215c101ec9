//! Error handling for harmonization operations.
//!
//! Provides error types with context for table fetching, the tab-separated
//! codec, cache access, and reshaping contract violations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarmonizerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TSV codec error: {0}")]
    Tsv(#[from] csv::Error),

    #[error("no table found for identifier: {id}")]
    TableNotFound { id: String },

    #[error("column '{column}' has {len} values but the frame has {height} rows")]
    ColumnLength {
        column: String,
        len: usize,
        height: usize,
    },

    #[error("duplicate column '{column}' in frame")]
    DuplicateColumn { column: String },

    #[error("missing key column '{column}' while {context}")]
    MissingKeyColumn { column: String, context: String },

    #[error("cache entry not found: {key}")]
    CacheMiss { key: String },

    #[error("invalid link pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("configuration error: {message}")]
    Configuration { message: String },

    #[error("unknown dataset: {name}")]
    UnknownDataset { name: String },
}

impl HarmonizerError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a missing-key-column error with context
    pub fn missing_key_column(column: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingKeyColumn {
            column: column.into(),
            context: context.into(),
        }
    }

    /// Create an unknown dataset error
    pub fn unknown_dataset(name: impl Into<String>) -> Self {
        Self::UnknownDataset { name: name.into() }
    }
}

pub type Result<T> = std::result::Result<T, HarmonizerError>;
