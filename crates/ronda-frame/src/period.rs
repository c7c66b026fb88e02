//! Grouping of temporally indexed rows by distinct temporal key.

use crate::{
    Result,
    keys::{format_key, repeat_each, temporal_keys},
};
use log::debug;
use polars::prelude::*;

/// A run of rows sharing one temporal key in a time-sorted frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    /// Physical key (see [`crate::keys`]).
    pub key: i64,
    /// Rendered key, e.g. `2020-01-03`.
    pub label: String,
    /// First row of the run.
    pub offset: usize,
    /// Number of rows in the run.
    pub len: usize,
}

impl Period {
    /// One past the last row of the run.
    pub const fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// A frame stably sorted by its temporal column, split into distinct keys.
///
/// Rows that share a temporal key keep their original relative order.
#[derive(Debug, Clone)]
pub struct Periods {
    data: DataFrame,
    time: PlSmallStr,
    periods: Vec<Period>,
}

impl Periods {
    /// Sorts `data` by `time` and splits it into runs of equal keys.
    pub fn new(data: &DataFrame, time: &PlSmallStr) -> Result<Self> {
        let sorted = data.sort(
            [time.clone()],
            SortMultipleOptions::default().with_maintain_order(true),
        )?;

        let column = sorted.column(time)?;
        let dtype = column.dtype().clone();
        let keys = temporal_keys(column)?;

        let mut periods: Vec<Period> = Vec::new();
        for (row, &key) in keys.iter().enumerate() {
            match periods.last_mut() {
                Some(last) if last.key == key => last.len += 1,
                _ => periods.push(Period {
                    key,
                    label: format_key(key, &dtype),
                    offset: row,
                    len: 1,
                }),
            }
        }

        debug!("split {} rows into {} periods on {}", keys.len(), periods.len(), time);
        Ok(Self {
            data: sorted,
            time: time.clone(),
            periods,
        })
    }

    /// The sorted frame.
    pub const fn data(&self) -> &DataFrame {
        &self.data
    }

    /// The temporal column name.
    pub const fn time(&self) -> &PlSmallStr {
        &self.time
    }

    /// The distinct periods in ascending order.
    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Number of distinct temporal keys.
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    /// Whether there are no periods.
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// Rows of a single period.
    pub fn rows(&self, period: &Period) -> DataFrame {
        self.data.slice(period.offset as i64, period.len)
    }

    /// Rows of periods `first..=last` (by position), contiguous in the
    /// sorted frame.
    pub fn span(&self, first: usize, last: usize) -> DataFrame {
        let start = self.periods[first].offset;
        let end = self.periods[last].end();
        self.data.slice(start as i64, end - start)
    }

    /// The temporal key of `period` repeated `len` times, as a column named
    /// like the temporal index.
    pub fn key_column(&self, period: &Period, len: usize) -> Result<Column> {
        let key = self
            .data
            .column(&self.time)?
            .as_materialized_series()
            .new_from_index(period.offset, len);
        Ok(key.with_name(self.time.clone()).into_column())
    }

    /// The temporal key of each period, period `i` repeated `counts[i]`
    /// times.
    pub fn repeat_keys(&self, counts: &[usize]) -> Result<Column> {
        let firsts = self.first_rows()?;
        repeat_each(&firsts, counts)
    }

    /// One temporal key per period.
    pub fn keys(&self) -> Result<Column> {
        self.first_rows()
    }

    fn first_rows(&self) -> Result<Column> {
        let firsts: Vec<IdxSize> = self
            .periods
            .iter()
            .map(|p| p.offset as IdxSize)
            .collect();
        let keys = self
            .data
            .column(&self.time)?
            .as_materialized_series()
            .take(&IdxCa::from_vec(self.time.clone(), firsts))?;
        Ok(keys.into_column())
    }

    /// Iterates over `(period, rows)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Period, DataFrame)> + '_ {
        self.periods.iter().map(move |p| (p, self.rows(p)))
    }
}
