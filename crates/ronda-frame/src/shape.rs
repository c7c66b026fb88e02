//! Shape classification.
//!
//! The classifier looks only at the index structure of a [`Dataset`], never
//! at its values:
//!
//! | index                                   | shape          |
//! |-----------------------------------------|----------------|
//! | none, or one non-temporal column        | cross-section  |
//! | one temporal column                     | time-series    |
//! | `(temporal, entity)`                    | panel          |
//! | anything deeper, or a non-temporal outer level | error   |

use crate::{Dataset, Result, RondaError, keys::is_temporal};
use log::debug;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// The semantic shape of a dataset, without the key names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum ShapeTag {
    /// Many entities, no temporal axis.
    #[display("cross-section")]
    CrossSection,
    /// One temporal axis, no entity axis.
    #[display("time-series")]
    TimeSeries,
    /// Temporal key × entity key.
    #[display("panel")]
    Panel,
}

/// The shape of a dataset together with the columns that carry each axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    /// Cross-section; `entity` is `None` when rows are in implicit order.
    CrossSection {
        /// The entity index column, if any.
        entity: Option<PlSmallStr>,
    },
    /// Time-series indexed by `time`.
    TimeSeries {
        /// The temporal index column.
        time: PlSmallStr,
    },
    /// Panel indexed by `(time, entity)`.
    Panel {
        /// The temporal (outer) index column.
        time: PlSmallStr,
        /// The entity (inner) index column.
        entity: PlSmallStr,
    },
}

impl Shape {
    /// The field-less tag of this shape.
    pub const fn tag(&self) -> ShapeTag {
        match self {
            Self::CrossSection { .. } => ShapeTag::CrossSection,
            Self::TimeSeries { .. } => ShapeTag::TimeSeries,
            Self::Panel { .. } => ShapeTag::Panel,
        }
    }

    /// The temporal index column, for time-series and panels.
    pub const fn time(&self) -> Option<&PlSmallStr> {
        match self {
            Self::TimeSeries { time } | Self::Panel { time, .. } => Some(time),
            Self::CrossSection { .. } => None,
        }
    }

    /// The entity index column, for panels and indexed cross-sections.
    pub const fn entity(&self) -> Option<&PlSmallStr> {
        match self {
            Self::Panel { entity, .. } => Some(entity),
            Self::CrossSection { entity } => entity.as_ref(),
            Self::TimeSeries { .. } => None,
        }
    }

    /// Whether the shape has a temporal axis.
    pub const fn is_temporal(&self) -> bool {
        self.time().is_some()
    }
}

/// Classifies a dataset by its index structure.
///
/// # Errors
///
/// - [`RondaError::EmptyDataset`] when the dataset has zero rows
/// - [`RondaError::Shape`] when the index has more than two levels, or two
///   levels whose outer level is not temporal
pub fn classify(dataset: &Dataset) -> Result<Shape> {
    if dataset.is_empty() {
        return Err(RondaError::EmptyDataset);
    }

    let data = dataset.data();
    let dtype = |name: &PlSmallStr| -> Result<DataType> {
        data.column(name)
            .map(|c| c.dtype().clone())
            .map_err(|_| RondaError::MissingColumn(name.to_string()))
    };

    let shape = match dataset.index() {
        [] => Ok(Shape::CrossSection { entity: None }),
        [only] => {
            if is_temporal(&dtype(only)?) {
                Ok(Shape::TimeSeries { time: only.clone() })
            } else {
                Ok(Shape::CrossSection {
                    entity: Some(only.clone()),
                })
            }
        }
        [outer, inner] => {
            let outer_dtype = dtype(outer)?;
            if is_temporal(&outer_dtype) {
                Ok(Shape::Panel {
                    time: outer.clone(),
                    entity: inner.clone(),
                })
            } else {
                Err(RondaError::Shape(format!(
                    "a panel index must have a temporal outer level, but {} is {}",
                    outer, outer_dtype
                )))
            }
        }
        deeper => Err(RondaError::Shape(format!(
            "a panel index must have exactly 2 levels, got {}",
            deeper.len()
        ))),
    }?;

    debug!("classified {} rows as {}", dataset.len(), shape.tag());
    Ok(shape)
}
