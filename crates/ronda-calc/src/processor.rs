//! Preprocessing of prices and cumulative values.
//!
//! Resampling and bucket returns group the temporal index into calendar
//! buckets with polars dynamic grouping. A panel is bucketed per entity, so
//! each `(bucket, entity)` pair yields one row.

use log::debug;
use polars::prelude::*;
use ronda_frame::{
    Dataset, Frame, Result, RondaError, Shape,
    keys::{entity_keys, numeric_values},
};
use std::collections::HashMap;

/// Name of the bucket return column.
pub const RETURN_COLUMN: &str = "ret";

/// Name of the forward return column.
pub const FORWARD_COLUMN: &str = "fwd";

/// How the rows of one bucket are reduced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Aggregation {
    /// First row of the bucket
    First,
    /// Last row of the bucket
    #[default]
    Last,
    /// Mean of the bucket
    Mean,
    /// Sum of the bucket
    Sum,
    /// Minimum of the bucket
    Min,
    /// Maximum of the bucket
    Max,
}

impl Aggregation {
    fn apply(self, expr: Expr) -> Expr {
        match self {
            Self::First => expr.first(),
            Self::Last => expr.last(),
            Self::Mean => expr.mean(),
            Self::Sum => expr.sum(),
            Self::Min => expr.min(),
            Self::Max => expr.max(),
        }
    }

    const fn numeric_only(self) -> bool {
        matches!(self, Self::Mean | Self::Sum | Self::Min | Self::Max)
    }
}

/// Buckets the temporal index by `every` and evaluates `aggs` per bucket
/// (and per entity for a panel).
fn bucketed(frame: &Frame, every: &str, label: Label, aggs: Vec<Expr>) -> Result<Dataset> {
    let time = frame.require_time("resampling")?.clone();
    let entity = match frame.shape() {
        Shape::Panel { entity, .. } => Some(entity.clone()),
        _ => None,
    };
    let every = Duration::try_parse(every)?;
    let keys: Vec<Expr> = entity.iter().map(|e| col(e.clone())).collect();

    let sorted = frame.data().sort(
        [time.clone()],
        SortMultipleOptions::default().with_maintain_order(true),
    )?;
    let out = sorted
        .lazy()
        .group_by_dynamic(
            col(time.clone()),
            keys,
            DynamicGroupOptions {
                every,
                period: every,
                offset: Duration::parse("0ns"),
                label,
                include_boundaries: false,
                closed_window: ClosedWindow::Left,
                start_by: StartBy::WindowBound,
                ..Default::default()
            },
        )
        .agg(aggs)
        .collect()?;

    let Some(entity) = entity else {
        return Dataset::new(out, [time]);
    };

    // group keys come out first; put the index back in (time, entity) order
    let mut names = vec![time.clone(), entity.clone()];
    names.extend(
        out.get_column_names()
            .into_iter()
            .filter(|name| **name != time && **name != entity)
            .cloned(),
    );
    let out = out.select(names)?.sort(
        [time.clone(), entity.clone()],
        SortMultipleOptions::default().with_maintain_order(true),
    )?;
    Dataset::new(out, [time, entity])
}

/// Reduces every value column per calendar bucket of length `every`
/// (a polars duration string such as `"1w"` or `"1mo"`).
///
/// Buckets are closed on the left; `label` picks whether a bucket is keyed
/// by its start or its end. [`Aggregation::First`] and
/// [`Aggregation::Last`] carry every value column; the arithmetic
/// aggregations only the numeric ones.
///
/// # Errors
///
/// - [`RondaError::Shape`] for a cross-section
/// - [`RondaError::InvalidData`] if no column can be aggregated
/// - [`RondaError::Polars`] for a malformed duration
pub fn resample(frame: &Frame, every: &str, label: Label, agg: Aggregation) -> Result<Dataset> {
    let columns = if agg.numeric_only() {
        frame.numeric_columns()
    } else {
        frame.value_columns()
    };
    if columns.is_empty() {
        return Err(RondaError::InvalidData(format!(
            "no columns to aggregate with {:?}",
            agg
        )));
    }

    debug!("resampling {} columns every {} with {:?}", columns.len(), every, agg);
    let aggs = columns.into_iter().map(|name| agg.apply(col(name))).collect();
    bucketed(frame, every, label, aggs)
}

fn bucket_return(
    frame: &Frame,
    every: &str,
    open: &str,
    close: &str,
    label: Label,
    name: &str,
) -> Result<Dataset> {
    for column in [open, close] {
        if !frame.dataset().has_column(column) {
            return Err(RondaError::MissingColumn(column.to_string()));
        }
    }
    let first_open = col(open).first();
    let change = ((col(close).last() - first_open.clone()) / first_open).alias(name);
    bucketed(frame, every, label, vec![change])
}

/// Return over each bucket, `(last close - first open) / first open`,
/// keyed by the bucket's end.
///
/// # Errors
///
/// As [`resample`], plus [`RondaError::MissingColumn`] for an absent price
/// column.
pub fn price_to_return(frame: &Frame, every: &str, open: &str, close: &str) -> Result<Dataset> {
    bucket_return(frame, every, open, close, Label::Right, RETURN_COLUMN)
}

/// Return realised over each bucket, keyed by the bucket's start.
///
/// Joined back onto factor values observed at the bucket start, this is
/// the forward return column that IC and quantile layering consume.
///
/// # Errors
///
/// As [`price_to_return`].
pub fn price_to_forward(frame: &Frame, every: &str, open: &str, close: &str) -> Result<Dataset> {
    bucket_return(frame, every, open, close, Label::Left, FORWARD_COLUMN)
}

/// Turns cumulative numeric columns into differences over `period` rows,
/// per entity for a panel.
///
/// The first `period` rows of each entity keep their cumulative value when
/// `keep` is set and are NaN otherwise. Rows come back sorted by time.
///
/// # Errors
///
/// - [`RondaError::Shape`] for a cross-section
/// - [`RondaError::InvalidData`] for a zero period
pub fn cum_to_diff(frame: &Frame, period: usize, keep: bool) -> Result<Dataset> {
    if period == 0 {
        return Err(RondaError::InvalidData(
            "differencing period must be positive".to_string(),
        ));
    }

    let periods = frame.periods()?;
    let mut data = periods.data().clone();
    let owners = match frame.shape() {
        Shape::Panel { entity, .. } => entity_keys(data.column(entity)?)?,
        _ => vec![String::new(); data.height()],
    };
    let mut rows_by_owner: HashMap<&str, Vec<usize>> = HashMap::new();
    for (row, owner) in owners.iter().enumerate() {
        rows_by_owner.entry(owner.as_str()).or_default().push(row);
    }

    for name in frame.numeric_columns() {
        let values = numeric_values(&data, &name)?;
        let mut diff = vec![f64::NAN; values.len()];
        for rows in rows_by_owner.values() {
            for (pos, &row) in rows.iter().enumerate() {
                diff[row] = if pos >= period {
                    values[row] - values[rows[pos - period]]
                } else if keep {
                    values[row]
                } else {
                    f64::NAN
                };
            }
        }
        data.with_column(Column::new(name, diff))?;
    }

    debug!("differenced {} entities over {} rows", rows_by_owner.len(), period);
    Dataset::new(data, frame.dataset().index().iter().cloned())
}

/// Preprocessing as methods on [`Frame`].
pub trait Processor {
    /// See [`resample`].
    fn resample(&self, every: &str, label: Label, agg: Aggregation) -> Result<Dataset>;

    /// See [`price_to_return`].
    fn price_to_return(&self, every: &str, open: &str, close: &str) -> Result<Dataset>;

    /// See [`price_to_forward`].
    fn price_to_forward(&self, every: &str, open: &str, close: &str) -> Result<Dataset>;

    /// See [`cum_to_diff`].
    fn cum_to_diff(&self, period: usize, keep: bool) -> Result<Dataset>;
}

impl Processor for Frame {
    fn resample(&self, every: &str, label: Label, agg: Aggregation) -> Result<Dataset> {
        resample(self, every, label, agg)
    }

    fn price_to_return(&self, every: &str, open: &str, close: &str) -> Result<Dataset> {
        price_to_return(self, every, open, close)
    }

    fn price_to_forward(&self, every: &str, open: &str, close: &str) -> Result<Dataset> {
        price_to_forward(self, every, open, close)
    }

    fn cum_to_diff(&self, period: usize, keep: bool) -> Result<Dataset> {
        cum_to_diff(self, period, keep)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use ronda_frame::{
        ShapeTag, classify,
        keys::{format_key, temporal_keys},
    };

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, day).unwrap()
    }

    fn labels(dataset: &Dataset, name: &str) -> Vec<String> {
        let column = dataset.column(name).unwrap();
        temporal_keys(column)
            .unwrap()
            .into_iter()
            .map(|k| format_key(k, column.dtype()))
            .collect()
    }

    /// Six days from 2020-01-01; asset `a` closes at `day`, `b` at `2 * day`.
    fn prices() -> Frame {
        let mut dates = Vec::new();
        let mut assets = Vec::new();
        let mut close = Vec::new();
        for day in 1..=6u32 {
            for (asset, scale) in [("a", 1.0), ("b", 2.0)] {
                dates.push(d(day));
                assets.push(asset);
                close.push(scale * f64::from(day));
            }
        }
        let df = df! {
            "date" => dates,
            "asset" => assets,
            "close" => close,
        }
        .unwrap();
        Frame::new(Dataset::panel(df, "date", "asset").unwrap()).unwrap()
    }

    #[test]
    fn test_forward_return_per_entity() {
        let fwd = price_to_forward(&prices(), "2d", "close", "close").unwrap();

        assert_eq!(fwd.columns(), vec!["date", "asset", FORWARD_COLUMN]);
        assert_eq!(classify(&fwd).unwrap().tag(), ShapeTag::Panel);
        assert_eq!(
            labels(&fwd, "date"),
            vec!["2020-01-01", "2020-01-01", "2020-01-03", "2020-01-03", "2020-01-05", "2020-01-05"]
        );

        let values = numeric_values(fwd.data(), FORWARD_COLUMN).unwrap();
        let expected = [1.0, 1.0, 1.0 / 3.0, 1.0 / 3.0, 0.2, 0.2];
        for (v, e) in values.iter().zip(expected) {
            assert_relative_eq!(*v, e, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_return_keyed_by_bucket_end() {
        let ret = prices().price_to_return("2d", "close", "close").unwrap();
        assert_eq!(labels(&ret, "date")[0], "2020-01-03");
        assert_eq!(ret.len(), 6);
        assert!(matches!(
            price_to_return(&prices(), "2d", "open", "close"),
            Err(RondaError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_resample_time_series() {
        let df = prices().data().clone();
        let only_a = df
            .filter(&df.column("asset").unwrap().str().unwrap().equal("a"))
            .unwrap()
            .drop("asset")
            .unwrap();
        let frame = Frame::new(Dataset::time_series(only_a, "date").unwrap()).unwrap();

        let last = resample(&frame, "2d", Label::Right, Aggregation::Last).unwrap();
        assert_eq!(classify(&last).unwrap().tag(), ShapeTag::TimeSeries);
        assert_eq!(labels(&last, "date"), vec!["2020-01-03", "2020-01-05", "2020-01-07"]);
        assert_eq!(numeric_values(last.data(), "close").unwrap(), vec![2.0, 4.0, 6.0]);

        let sum = frame.resample("2d", Label::Left, Aggregation::Sum).unwrap();
        assert_eq!(numeric_values(sum.data(), "close").unwrap(), vec![3.0, 7.0, 11.0]);
    }

    #[test]
    fn test_resample_errors() {
        let flat = Frame::new(Dataset::cross_section(prices().data().clone())).unwrap();
        assert!(matches!(
            resample(&flat, "2d", Label::Left, Aggregation::Last),
            Err(RondaError::Shape(_))
        ));
        assert!(resample(&prices(), "two days", Label::Left, Aggregation::Last).is_err());
    }

    #[test]
    fn test_cum_to_diff_per_entity() {
        let df = df! {
            "date" => [d(1), d(1), d(2), d(2), d(3), d(3)],
            "asset" => ["a", "b", "a", "b", "a", "b"],
            "volume" => [1.0, 10.0, 3.0, 20.0, 6.0, 30.0],
        }
        .unwrap();
        let frame = Frame::new(Dataset::panel(df, "date", "asset").unwrap()).unwrap();

        let kept = cum_to_diff(&frame, 1, true).unwrap();
        assert_eq!(
            numeric_values(kept.data(), "volume").unwrap(),
            vec![1.0, 10.0, 2.0, 10.0, 3.0, 10.0]
        );

        let dropped = frame.cum_to_diff(2, false).unwrap();
        let values = numeric_values(dropped.data(), "volume").unwrap();
        assert!(values[..4].iter().all(|v| v.is_nan()));
        assert_eq!(&values[4..], &[5.0, 20.0]);

        assert!(matches!(
            cum_to_diff(&frame, 0, true),
            Err(RondaError::InvalidData(_))
        ));
    }
}
