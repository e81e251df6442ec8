//! Error and warning types shared by the data model.

use thiserror::Error;

/// Errors surfaced to the caller. Everything else is recovered locally
/// and reported as a [`DataWarning`].
#[derive(Error, Debug)]
pub enum DataModelError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("unsupported data shape: {0}")]
    UnsupportedDataShape(String),
    #[error("a live data model requires an update source")]
    MissingDataSource,
    #[error("columns must have the same length (expected {expected}, found {found})")]
    LengthMismatch { expected: usize, found: usize },
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DataModelError>;

/// Non-fatal problems with inbound data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataWarning {
    /// The record can not be drawn; it is skipped.
    #[error("invalid data structure: {0}")]
    InvalidDataStructure(String),
    /// A cosmetic field was replaced with its default.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

impl DataWarning {
    pub(crate) fn emit(&self) {
        tracing::warn!("{}", self);
    }
}
