//! The [`Dataset`] container.
//!
//! A dataset is an ordered table of observations whose *index* is a list of
//! columns, outer level first. An empty index means implicit row order.

use crate::{Result, RondaError};
use polars::prelude::*;

// Re-export date type from chrono
pub use chrono::NaiveDate as Date;

/// Value arity of a dataset: one named value column or several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Arity {
    /// Exactly one value column; behaves like a named series.
    #[display("series")]
    Series,
    /// Zero or several value columns.
    #[display("frame")]
    Frame,
}

/// A Polars `DataFrame` plus the columns that make up its index.
///
/// # Example
///
/// ```no_run
/// use ronda_frame::Dataset;
/// use polars::prelude::*;
///
/// let df = df! {
///     "asset" => &["a", "b"],
///     "close" => &[150.0, 300.0],
/// }.unwrap();
///
/// let dataset = Dataset::new(df, ["asset"]).unwrap();
/// assert_eq!(dataset.value_columns().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Dataset {
    data: DataFrame,
    index: Vec<PlSmallStr>,
}

impl Dataset {
    /// Creates a dataset indexed by the given columns, outer level first.
    ///
    /// Fails if an index column is missing or listed twice.
    pub fn new<I, S>(data: DataFrame, index: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<PlSmallStr>,
    {
        let index: Vec<PlSmallStr> = index.into_iter().map(Into::into).collect();

        for (i, name) in index.iter().enumerate() {
            if data.column(name).is_err() {
                return Err(RondaError::MissingColumn(name.to_string()));
            }
            if index[..i].contains(name) {
                return Err(RondaError::InvalidData(format!(
                    "index column {} listed more than once",
                    name
                )));
            }
        }

        Ok(Self { data, index })
    }

    /// Creates a dataset with no index columns (implicit row order).
    pub const fn cross_section(data: DataFrame) -> Self {
        Self {
            data,
            index: Vec::new(),
        }
    }

    /// Creates a dataset indexed by a single temporal column.
    pub fn time_series(data: DataFrame, time: &str) -> Result<Self> {
        Self::new(data, [time])
    }

    /// Creates a dataset indexed by `(time, entity)`.
    pub fn panel(data: DataFrame, time: &str, entity: &str) -> Result<Self> {
        Self::new(data, [time, entity])
    }

    /// Returns a reference to the underlying DataFrame.
    pub const fn data(&self) -> &DataFrame {
        &self.data
    }

    /// The index columns, outer level first.
    pub fn index(&self) -> &[PlSmallStr] {
        &self.index
    }

    /// Consumes self and returns the underlying DataFrame.
    pub fn into_inner(self) -> DataFrame {
        self.data
    }

    /// Consumes self and returns the DataFrame and the index columns.
    pub fn into_parts(self) -> (DataFrame, Vec<PlSmallStr>) {
        (self.data, self.index)
    }

    /// Replaces the index, validating it against the data.
    pub fn with_index<I, S>(self, index: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<PlSmallStr>,
    {
        Self::new(self.data, index)
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.data.height()
    }

    /// Returns whether the dataset has no rows.
    pub fn is_empty(&self) -> bool {
        self.data.height() == 0
    }

    /// Returns all column names, index columns included.
    pub fn columns(&self) -> Vec<String> {
        self.data
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// Checks if a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.data
            .get_column_names()
            .iter()
            .any(|s| s.as_str() == name)
    }

    /// Gets a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.data.column(name).ok()
    }

    /// Returns whether `name` is one of the index columns.
    pub fn is_index(&self, name: &str) -> bool {
        self.index.iter().any(|s| s.as_str() == name)
    }

    /// The non-index columns, in frame order.
    pub fn value_columns(&self) -> Vec<PlSmallStr> {
        self.data
            .get_column_names()
            .into_iter()
            .filter(|name| !self.is_index(name))
            .cloned()
            .collect()
    }

    /// Whether this dataset behaves as a named series or as a frame.
    pub fn arity(&self) -> Arity {
        if self.value_columns().len() == 1 {
            Arity::Series
        } else {
            Arity::Frame
        }
    }
}

impl AsRef<DataFrame> for Dataset {
    fn as_ref(&self) -> &DataFrame {
        &self.data
    }
}

impl From<DataFrame> for Dataset {
    fn from(data: DataFrame) -> Self {
        Self::cross_section(data)
    }
}
