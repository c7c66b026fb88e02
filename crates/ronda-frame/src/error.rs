//! Error types for the ronda workspace.
//!
//! Every operation in the engine is fatal on error: nothing is retried and
//! no partial result is returned alongside an error.

use thiserror::Error;

/// The main error type for ronda operations.
#[derive(Debug, Error)]
pub enum RondaError {
    /// The dataset's shape cannot be handled by the requested operation,
    /// or its index is malformed.
    #[error("Shape error: {0}")]
    Shape(String),

    /// The dataset has zero rows.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// A caller-supplied unit function failed inside a window.
    ///
    /// `key` is the rendered temporal key of the window's right edge.
    #[error("Unit function failed on window ending {key}: {source}")]
    UnitFunction {
        /// Temporal key of the failing window.
        key: String,
        /// The error raised by the unit function.
        #[source]
        source: Box<RondaError>,
    },

    /// A required column is missing from the data.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// A concrete key passed to a selector matched no row.
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Not enough observations for the requested operation.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl RondaError {
    /// Wraps an error raised inside a unit function with the window's key.
    pub fn in_window(key: impl Into<String>, source: Self) -> Self {
        Self::UnitFunction {
            key: key.into(),
            source: Box::new(source),
        }
    }

    /// Returns the window key if this is a unit function failure.
    pub fn window_key(&self) -> Option<&str> {
        match self {
            Self::UnitFunction { key, .. } => Some(key),
            _ => None,
        }
    }
}

impl From<String> for RondaError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for RondaError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for ronda operations.
pub type Result<T> = std::result::Result<T, RondaError>;
