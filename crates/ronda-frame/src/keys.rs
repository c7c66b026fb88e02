//! Conversions between index columns and comparable keys.
//!
//! Temporal keys are compared on their physical integer representation
//! (days for `Date`, the column's time unit for `Datetime`). Entity keys
//! are compared on their string rendering.

use crate::{Result, RondaError};
use chrono::{DateTime, Duration, NaiveDate, Timelike};
use polars::prelude::*;

/// Returns whether a dtype can serve as an ordered temporal index level.
pub const fn is_temporal(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Date | DataType::Datetime(_, _))
}

/// Returns whether a dtype holds plain numbers.
pub const fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

const fn units_per_day(unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Nanoseconds => 86_400_000_000_000,
        TimeUnit::Microseconds => 86_400_000_000,
        TimeUnit::Milliseconds => 86_400_000,
    }
}

/// Physical keys of a temporal column, row by row.
///
/// Null keys are rejected.
pub fn temporal_keys(column: &Column) -> Result<Vec<i64>> {
    if !is_temporal(column.dtype()) {
        return Err(RondaError::Shape(format!(
            "column {} is not temporal (dtype {})",
            column.name(),
            column.dtype()
        )));
    }

    let physical = column
        .as_materialized_series()
        .to_physical_repr()
        .cast(&DataType::Int64)?;

    physical
        .i64()?
        .into_iter()
        .map(|key| {
            key.ok_or_else(|| {
                RondaError::InvalidData(format!("null temporal key in column {}", column.name()))
            })
        })
        .collect()
}

/// Converts a calendar date into the physical key of a temporal column.
pub fn date_key(date: NaiveDate, dtype: &DataType) -> Result<i64> {
    let days = date.signed_duration_since(epoch()).num_days();
    match dtype {
        DataType::Date => Ok(days),
        DataType::Datetime(unit, _) => days.checked_mul(units_per_day(*unit)).ok_or_else(|| {
            RondaError::InvalidData(format!("{} is out of range for a {} column", date, dtype))
        }),
        other => Err(RondaError::Shape(format!(
            "cannot compare a date with a {} column",
            other
        ))),
    }
}

/// Renders a physical temporal key for messages and labels.
///
/// Datetimes at midnight render as plain dates.
pub fn format_key(key: i64, dtype: &DataType) -> String {
    match dtype {
        DataType::Date => Duration::try_days(key)
            .and_then(|days| epoch().checked_add_signed(days))
            .map_or_else(|| key.to_string(), |d| d.to_string()),
        DataType::Datetime(unit, _) => {
            let per_second = units_per_day(*unit) / 86_400;
            let secs = key.div_euclid(per_second);
            let nanos = (key.rem_euclid(per_second) * (1_000_000_000 / per_second)) as u32;
            match DateTime::from_timestamp(secs, nanos) {
                Some(dt) if dt.num_seconds_from_midnight() == 0 && dt.nanosecond() == 0 => {
                    dt.date_naive().to_string()
                }
                Some(dt) => dt.naive_utc().to_string(),
                None => key.to_string(),
            }
        }
        _ => key.to_string(),
    }
}

/// String renderings of an entity column, row by row.
///
/// Null keys are rejected.
pub fn entity_keys(column: &Column) -> Result<Vec<String>> {
    let rendered = column.as_materialized_series().cast(&DataType::String)?;
    rendered
        .str()?
        .into_iter()
        .map(|key| {
            key.map(str::to_string).ok_or_else(|| {
                RondaError::InvalidData(format!("null entity key in column {}", column.name()))
            })
        })
        .collect()
}

/// Repeats row `i` of `column` `counts[i]` times.
pub fn repeat_each(column: &Column, counts: &[usize]) -> Result<Column> {
    if counts.len() != column.len() {
        return Err(RondaError::InvalidData(format!(
            "{} repeat counts for {} rows of {}",
            counts.len(),
            column.len(),
            column.name()
        )));
    }
    let idx: Vec<IdxSize> = counts
        .iter()
        .enumerate()
        .flat_map(|(row, &count)| std::iter::repeat_n(row as IdxSize, count))
        .collect();
    let repeated = column
        .as_materialized_series()
        .take(&IdxCa::from_vec(column.name().clone(), idx))?;
    Ok(repeated.into_column())
}

/// Values of a column as `f64`, with nulls mapped to NaN.
pub fn numeric_values(data: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = data
        .column(name)
        .map_err(|_| RondaError::MissingColumn(name.to_string()))?;
    let values = column.as_materialized_series().cast(&DataType::Float64)?;
    Ok(values
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}
