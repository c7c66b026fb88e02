//! Shape-aware positional selection.
//!
//! A [`Selector`] pins up to three axes: temporal key, entity key and value
//! column. Each axis defaults to [`Pick::All`]. Pinning an index axis to a
//! single key drops that level from the result, so a panel collapses the way
//! a `time × entity × value` cube does when one axis is fixed:
//!
//! - one date of a panel is a cross-section indexed by entity
//! - one entity of a panel is a time-series indexed by date
//! - one value of an otherwise unpinned panel is unstacked into a
//!   `time × entity` table
//! - every applicable axis pinned yields a scalar

use crate::{
    Dataset, Frame, Periods, Result, RondaError, Shape,
    keys::{date_key, entity_keys, numeric_values, temporal_keys},
};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeMap;

/// Restriction on one axis of a selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pick<T> {
    /// Wildcard: keep everything, keep the level.
    All,
    /// A single key: keep matching rows and drop the level.
    One(T),
    /// Several keys: keep matching rows, keep the level.
    Many(Vec<T>),
}

impl<T> Default for Pick<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T> Pick<T> {
    /// Whether this is the wildcard.
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Whether this pins a single key.
    pub const fn is_one(&self) -> bool {
        matches!(self, Self::One(_))
    }

    /// The pinned keys, or `None` for the wildcard.
    pub fn keys(&self) -> Option<&[T]> {
        match self {
            Self::All => None,
            Self::One(key) => Some(std::slice::from_ref(key)),
            Self::Many(keys) => Some(keys),
        }
    }
}

/// Result of a selection.
#[derive(Debug, Clone)]
pub enum Selected {
    /// A single cell.
    Scalar(AnyValue<'static>),
    /// A reduced dataset; classify it again to get its shape.
    Data(Dataset),
}

impl Selected {
    /// The dataset, if the selection did not reduce to a scalar.
    pub fn into_dataset(self) -> Option<Dataset> {
        match self {
            Self::Data(dataset) => Some(dataset),
            Self::Scalar(_) => None,
        }
    }

    /// The scalar as `f64`, if the selection reduced to a numeric cell.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Scalar(value) => value.extract::<f64>(),
            Self::Data(_) => None,
        }
    }
}

/// Builder for a `(time, entity, value)` selection.
///
/// # Example
///
/// ```no_run
/// use ronda_frame::{Frame, Selector};
/// use chrono::NaiveDate;
///
/// # fn run(panel: &Frame) -> ronda_frame::Result<()> {
/// let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
/// // cross-section of every asset on one date
/// let cross_section = panel.select(&Selector::new().time(date))?;
/// // one cell
/// let close = panel.select(&Selector::new().time(date).entity("a").value("close"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    time: Pick<NaiveDate>,
    entity: Pick<String>,
    value: Pick<String>,
}

impl Selector {
    /// A selector with every axis set to the wildcard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins the temporal axis to one date.
    pub fn time(mut self, date: NaiveDate) -> Self {
        self.time = Pick::One(date);
        self
    }

    /// Restricts the temporal axis to several dates.
    pub fn times(mut self, dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.time = Pick::Many(dates.into_iter().collect());
        self
    }

    /// Pins the entity axis to one key.
    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Pick::One(entity.into());
        self
    }

    /// Restricts the entity axis to several keys.
    pub fn entities<S: Into<String>>(mut self, entities: impl IntoIterator<Item = S>) -> Self {
        self.entity = Pick::Many(entities.into_iter().map(Into::into).collect());
        self
    }

    /// Pins the value axis to one column.
    pub fn value(mut self, column: impl Into<String>) -> Self {
        self.value = Pick::One(column.into());
        self
    }

    /// Restricts the value axis to several columns.
    pub fn values<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.value = Pick::Many(columns.into_iter().map(Into::into).collect());
        self
    }

    pub(crate) fn apply(&self, frame: &Frame) -> Result<Selected> {
        let data = frame.data();
        let values = self.value_columns(frame)?;

        match frame.shape() {
            Shape::CrossSection { entity } => {
                if !self.time.is_all() {
                    return Err(RondaError::Shape(
                        "a cross-section has no temporal key to select on".to_string(),
                    ));
                }
                let mask = match (entity, self.entity.keys()) {
                    (_, None) => None,
                    (None, Some(_)) => {
                        return Err(RondaError::Shape(
                            "this cross-section has no entity index to select on".to_string(),
                        ));
                    }
                    (Some(column), Some(keys)) => Some(entity_mask(data, column, keys)?),
                };
                let rows = filter_rows(data, mask)?;
                let index = entity
                    .iter()
                    .filter(|_| !self.entity.is_one())
                    .cloned()
                    .collect();
                self.finish(rows, index, &values, self.entity.is_one())
            }
            Shape::TimeSeries { time } => {
                if !self.entity.is_all() {
                    return Err(RondaError::Shape(
                        "a time-series has no entity key to select on".to_string(),
                    ));
                }
                let mask = match self.time.keys() {
                    None => None,
                    Some(dates) => Some(time_mask(data, time, dates)?),
                };
                let rows = filter_rows(data, mask)?;
                let index = if self.time.is_one() {
                    Vec::new()
                } else {
                    vec![time.clone()]
                };
                self.finish(rows, index, &values, self.time.is_one())
            }
            Shape::Panel { time, entity } => {
                let time_rows = match self.time.keys() {
                    None => None,
                    Some(dates) => Some(time_mask(data, time, dates)?),
                };
                let entity_rows = match self.entity.keys() {
                    None => None,
                    Some(keys) => Some(entity_mask(data, entity, keys)?),
                };
                let mask = match (time_rows, entity_rows) {
                    (Some(a), Some(b)) => Some(a.iter().zip(&b).map(|(x, y)| *x && *y).collect()),
                    (a, b) => a.or(b),
                };
                let rows = filter_rows(data, mask)?;

                if !self.time.is_one() && !self.entity.is_one() {
                    if let Pick::One(value) = &self.value {
                        return unstack_rows(&rows, time, entity, value).map(Selected::Data);
                    }
                }

                let mut index = Vec::with_capacity(2);
                if !self.time.is_one() {
                    index.push(time.clone());
                }
                if !self.entity.is_one() {
                    index.push(entity.clone());
                }
                let scalar = self.time.is_one() && self.entity.is_one();
                self.finish(rows, index, &values, scalar)
            }
        }
    }

    fn value_columns(&self, frame: &Frame) -> Result<Vec<PlSmallStr>> {
        let Some(keys) = self.value.keys() else {
            return Ok(frame.value_columns());
        };

        let dataset = frame.dataset();
        keys.iter()
            .map(|name| {
                if !dataset.has_column(name) {
                    Err(RondaError::MissingColumn(name.clone()))
                } else if dataset.is_index(name) {
                    Err(RondaError::InvalidData(format!(
                        "{} is an index column, not a value column",
                        name
                    )))
                } else {
                    Ok(PlSmallStr::from(name.as_str()))
                }
            })
            .collect()
    }

    fn finish(
        &self,
        rows: DataFrame,
        index: Vec<PlSmallStr>,
        values: &[PlSmallStr],
        keys_pinned: bool,
    ) -> Result<Selected> {
        let any_one = self.time.is_one() || self.entity.is_one();
        if rows.height() == 0 && any_one {
            return Err(RondaError::KeyNotFound(self.describe()));
        }

        let projected = rows.select(index.iter().chain(values).cloned())?;

        if keys_pinned && self.value.is_one() && projected.height() == 1 {
            let cell = projected.column(&values[0])?.get(0)?.into_static();
            return Ok(Selected::Scalar(cell));
        }

        Dataset::new(projected, index).map(Selected::Data)
    }

    fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Pick::One(date) = &self.time {
            parts.push(format!("time={}", date));
        }
        if let Pick::One(entity) = &self.entity {
            parts.push(format!("entity={}", entity));
        }
        parts.join(", ")
    }
}

fn filter_rows(data: &DataFrame, mask: Option<Vec<bool>>) -> Result<DataFrame> {
    match mask {
        None => Ok(data.clone()),
        Some(mask) => {
            let mask: BooleanChunked = mask.into_iter().collect();
            Ok(data.filter(&mask)?)
        }
    }
}

fn time_mask(data: &DataFrame, time: &PlSmallStr, dates: &[NaiveDate]) -> Result<Vec<bool>> {
    let column = data.column(time)?;
    let wanted = dates
        .iter()
        .map(|d| date_key(*d, column.dtype()))
        .collect::<Result<Vec<i64>>>()?;
    Ok(temporal_keys(column)?
        .iter()
        .map(|k| wanted.contains(k))
        .collect())
}

fn entity_mask(data: &DataFrame, entity: &PlSmallStr, keys: &[String]) -> Result<Vec<bool>> {
    Ok(entity_keys(data.column(entity)?)?
        .iter()
        .map(|k| keys.contains(k))
        .collect())
}

/// Pivots one value column of a panel into a `time × entity` table.
///
/// The result is indexed by time, with one `f64` column per entity in
/// sorted entity order; missing `(time, entity)` pairs are null.
///
/// # Errors
///
/// - [`RondaError::Shape`] unless `frame` is a panel
/// - [`RondaError::InvalidData`] if a `(time, entity)` pair occurs twice
pub fn unstack(frame: &Frame, value: &str) -> Result<Dataset> {
    let (time, entity) = frame.require_panel("unstack")?;
    unstack_rows(frame.data(), time, entity, value)
}

fn unstack_rows(
    data: &DataFrame,
    time: &PlSmallStr,
    entity: &PlSmallStr,
    value: &str,
) -> Result<Dataset> {
    let periods = Periods::new(data, time)?;
    let sorted = periods.data();
    let entities = entity_keys(sorted.column(entity)?)?;
    let values = numeric_values(sorted, value)?;

    let mut table: BTreeMap<&str, Vec<Option<f64>>> = entities
        .iter()
        .map(|e| (e.as_str(), vec![None; periods.len()]))
        .collect();

    for (p, period) in periods.periods().iter().enumerate() {
        for row in period.offset..period.end() {
            let slot = table
                .get_mut(entities[row].as_str())
                .map(|column| &mut column[p]);
            match slot {
                Some(cell @ None) => *cell = Some(values[row]),
                Some(Some(_)) => {
                    return Err(RondaError::InvalidData(format!(
                        "duplicate entry for ({}, {})",
                        period.label, entities[row]
                    )));
                }
                None => {}
            }
        }
    }

    let mut columns = Vec::with_capacity(table.len() + 1);
    columns.push(periods.keys()?);
    for (name, cells) in table {
        columns.push(Column::new(name.into(), cells));
    }

    Dataset::new(DataFrame::new(columns)?, [time.clone()])
}
