//! A dataset paired with its shape.

use crate::{
    Dataset, Periods, Result, RondaError, Selected, Selector, Shape, ShapeTag, classify,
    keys::is_numeric,
};
use polars::prelude::*;

/// A [`Dataset`] together with the [`Shape`] the classifier assigned to it.
///
/// A `Frame` can only be built through [`Frame::new`], so every frame carries
/// exactly one shape for its lifetime. Changing the index means building a
/// new frame.
///
/// # Example
///
/// ```no_run
/// use ronda_frame::{Dataset, Frame, ShapeTag};
/// use polars::prelude::*;
///
/// # fn main() -> ronda_frame::Result<()> {
/// let df = df! {
///     "asset" => &["a", "b"],
///     "close" => &[150.0, 300.0],
/// }?;
///
/// let frame = Frame::new(Dataset::new(df, ["asset"])?)?;
/// assert_eq!(frame.tag(), ShapeTag::CrossSection);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Frame {
    dataset: Dataset,
    shape: Shape,
}

impl Frame {
    /// Classifies `dataset` and wraps it.
    pub fn new(dataset: Dataset) -> Result<Self> {
        let shape = classify(&dataset)?;
        Ok(Self { dataset, shape })
    }

    /// Builds a frame over a subset of this frame's rows.
    ///
    /// The index is unchanged, so the shape is carried over without
    /// re-classification. `rows` must keep every index column.
    pub fn with_rows(&self, rows: DataFrame) -> Result<Self> {
        let dataset = Dataset::new(rows, self.dataset.index().iter().cloned())?;
        Ok(Self {
            dataset,
            shape: self.shape.clone(),
        })
    }

    /// The classified shape.
    pub const fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The shape tag.
    pub const fn tag(&self) -> ShapeTag {
        self.shape.tag()
    }

    /// The wrapped dataset.
    pub const fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// The underlying DataFrame.
    pub const fn data(&self) -> &DataFrame {
        self.dataset.data()
    }

    /// Consumes self and returns the dataset.
    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.dataset.len()
    }

    /// Whether the frame has no rows (only possible for row subsets).
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Non-index columns.
    pub fn value_columns(&self) -> Vec<PlSmallStr> {
        self.dataset.value_columns()
    }

    /// Non-index columns holding plain numbers.
    pub fn numeric_columns(&self) -> Vec<PlSmallStr> {
        let data = self.data();
        self.value_columns()
            .into_iter()
            .filter(|name| data.column(name).is_ok_and(|c| is_numeric(c.dtype())))
            .collect()
    }

    /// The temporal index column.
    ///
    /// # Errors
    ///
    /// [`RondaError::Shape`] for cross-sections; `operation` names the caller
    /// in the message.
    pub fn require_time(&self, operation: &str) -> Result<&PlSmallStr> {
        self.shape.time().ok_or_else(|| {
            RondaError::Shape(format!(
                "{} requires panel or time-series data, got {}",
                operation,
                self.tag()
            ))
        })
    }

    /// The entity index column of a panel.
    ///
    /// # Errors
    ///
    /// [`RondaError::Shape`] unless the frame is a panel.
    pub fn require_panel(&self, operation: &str) -> Result<(&PlSmallStr, &PlSmallStr)> {
        match &self.shape {
            Shape::Panel { time, entity } => Ok((time, entity)),
            other => Err(RondaError::Shape(format!(
                "{} requires panel data, got {}",
                operation,
                other.tag()
            ))),
        }
    }

    /// Sorts the rows by time and splits them into distinct periods.
    pub fn periods(&self) -> Result<Periods> {
        let time = self.require_time("grouping by period")?;
        Periods::new(self.data(), time)
    }

    /// Shape-aware positional selection; see [`Selector`].
    pub fn select(&self, selector: &Selector) -> Result<Selected> {
        selector.apply(self)
    }
}

impl TryFrom<Dataset> for Frame {
    type Error = RondaError;

    fn try_from(dataset: Dataset) -> Result<Self> {
        Self::new(dataset)
    }
}

impl AsRef<Dataset> for Frame {
    fn as_ref(&self) -> &Dataset {
        &self.dataset
    }
}
