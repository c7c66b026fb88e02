//! Windowed aggregation.
//!
//! A rolling aggregation sorts its input by the temporal key, enumerates the
//! distinct keys `t0..tn-1` and, for every right edge `ti` with
//! `i >= window - 1`, hands the rows with keys in `[t(i-window+1), ti]` to a
//! unit function. Windows shorter than `window` keys are never emitted.
//! The per-window outputs are stamped with `ti` and stacked in ascending key
//! order.

use crate::Grouper;
use log::{debug, trace, warn};
use polars::prelude::*;
use ronda_frame::{Dataset, Frame, Periods, Result, RondaError, Shape};
use serde::{Deserialize, Serialize};

/// Configuration for rolling aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingConfig {
    /// Number of distinct temporal keys per window
    pub window: usize,

    /// Column that receives scalar unit outputs
    pub value_column: String,

    /// Column that receives the group label when grouping
    pub group_column: String,
}

impl Default for RollingConfig {
    fn default() -> Self {
        Self {
            window: 20, // ~1 month of daily data
            value_column: "value".to_string(),
            group_column: "group".to_string(),
        }
    }
}

impl RollingConfig {
    /// Default configuration with the given window length.
    pub fn with_window(window: usize) -> Self {
        Self {
            window,
            ..Self::default()
        }
    }
}

/// One window handed to a unit function.
#[derive(Debug)]
pub struct Window<'a> {
    frame: Frame,
    key: &'a str,
    position: usize,
    group: Option<&'a str>,
}

impl<'a> Window<'a> {
    /// The rows of this window, with the input's shape.
    pub const fn frame(&self) -> &Frame {
        &self.frame
    }

    /// The rows of this window as a DataFrame.
    pub const fn data(&self) -> &DataFrame {
        self.frame.data()
    }

    /// Rendered temporal key of the window's right edge.
    pub const fn key(&self) -> &'a str {
        self.key
    }

    /// Zero-based position of the window in the emitted sequence.
    pub const fn position(&self) -> usize {
        self.position
    }

    /// The group label, when the aggregation is grouped.
    pub const fn group(&self) -> Option<&'a str> {
        self.group
    }
}

/// Result of a unit function on one window.
#[derive(Debug, Clone)]
pub enum WindowOutput {
    /// A single number, placed in [`RollingConfig::value_column`].
    Scalar(f64),
    /// A single column.
    Series(Series),
    /// Any number of rows and columns.
    Frame(DataFrame),
}

impl From<f64> for WindowOutput {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Series> for WindowOutput {
    fn from(series: Series) -> Self {
        Self::Series(series)
    }
}

impl From<DataFrame> for WindowOutput {
    fn from(frame: DataFrame) -> Self {
        Self::Frame(frame)
    }
}

/// Rolling-window aggregator.
///
/// # Examples
///
/// ```no_run
/// use ronda_calc::{Rolling, RollingConfig, unit};
/// use ronda_frame::Frame;
///
/// # fn run(prices: &Frame) -> ronda_frame::Result<()> {
/// let rolling = Rolling::new(RollingConfig::with_window(5));
/// let means = rolling.apply(prices, None, unit::mean)?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Rolling {
    config: RollingConfig,
}

impl Rolling {
    /// Creates an aggregator with the given configuration.
    pub const fn new(config: RollingConfig) -> Self {
        Self { config }
    }

    /// The configuration.
    pub const fn config(&self) -> &RollingConfig {
        &self.config
    }

    /// Runs `unit` over every full window of `frame`.
    ///
    /// With a `grouper`, each window is further split by the group label of
    /// each row's entity and `unit` runs once per non-empty group, in sorted
    /// label order. The result is then indexed by `[group, time]` and sorted.
    /// An empty grouper means no grouping.
    ///
    /// # Errors
    ///
    /// - [`RondaError::Shape`] for cross-sections, or for a grouped
    ///   time-series
    /// - [`RondaError::InvalidData`] for a zero window
    /// - [`RondaError::UnitFunction`] carrying the right-edge key of the
    ///   first window whose unit function failed; no partial result is
    ///   returned
    pub fn apply<F>(&self, frame: &Frame, grouper: Option<&Grouper>, mut unit: F) -> Result<Dataset>
    where
        F: FnMut(&Window<'_>) -> Result<WindowOutput>,
    {
        let window = self.config.window;
        if window == 0 {
            return Err(RondaError::InvalidData(
                "rolling window must span at least one key".to_string(),
            ));
        }

        let time = frame.require_time("rolling")?.clone();
        let grouper = match grouper {
            Some(g) if g.is_empty() => {
                warn!("empty grouper passed to rolling, aggregating without groups");
                None
            }
            other => other,
        };
        let entity = match (grouper, frame.shape()) {
            (Some(_), Shape::Panel { entity, .. }) => Some(entity.clone()),
            (Some(_), _) => {
                return Err(RondaError::Shape(format!(
                    "grouped rolling requires panel data, got {}",
                    frame.tag()
                )));
            }
            (None, Shape::Panel { entity, .. }) => Some(entity.clone()),
            (None, _) => None,
        };

        let periods = frame.periods()?;
        let n = periods.len();
        debug!(
            "rolling {} over {} rows: {} keys, window {}, grouped {}",
            frame.tag(),
            frame.len(),
            n,
            window,
            grouper.is_some()
        );

        if window > n {
            debug!("window {} exceeds {} keys, no windows emitted", window, n);
            return Self::empty(&periods);
        }

        let labels = match (grouper, &entity) {
            (Some(g), Some(entity)) => Some(g.label_rows(periods.data().column(entity)?)?),
            _ => None,
        };
        let groups = grouper.map(Grouper::groups).unwrap_or_default();

        let mut parts: Vec<DataFrame> = Vec::with_capacity(n + 1 - window);
        for (position, last) in (window - 1..n).enumerate() {
            let first = last + 1 - window;
            let period = &periods.periods()[last];
            let span = periods.span(first, last);
            trace!(
                "window {} [{} .. {}]: {} rows",
                position,
                periods.periods()[first].label,
                period.label,
                span.height()
            );

            let Some(labels) = &labels else {
                let current = Window {
                    frame: frame.with_rows(span)?,
                    key: &period.label,
                    position,
                    group: None,
                };
                let output = unit(&current).map_err(|e| RondaError::in_window(&period.label, e))?;
                parts.push(self.stamp(output, &periods, last, None)?);
                continue;
            };

            let start = periods.periods()[first].offset;
            for &group in &groups {
                let mask: BooleanChunked = labels[start..period.end()]
                    .iter()
                    .map(|label| *label == Some(group))
                    .collect();
                if !mask.any() {
                    continue;
                }

                let current = Window {
                    frame: frame.with_rows(span.filter(&mask)?)?,
                    key: &period.label,
                    position,
                    group: Some(group),
                };
                let output = unit(&current).map_err(|e| RondaError::in_window(&period.label, e))?;
                parts.push(self.stamp(output, &periods, last, Some(group))?);
            }
        }

        let mut parts = parts.into_iter();
        let Some(mut result) = parts.next() else {
            return Self::empty(&periods);
        };
        for part in parts {
            result.vstack_mut(&part)?;
        }

        let mut index = Vec::with_capacity(3);
        if grouper.is_some() {
            index.push(PlSmallStr::from(self.config.group_column.as_str()));
        }
        index.push(time);
        if let Some(entity) = entity.filter(|e| result.get_column_index(e).is_some()) {
            index.push(entity);
        }

        if grouper.is_some() {
            result = result.sort(
                index[..2].to_vec(),
                SortMultipleOptions::default().with_maintain_order(true),
            )?;
        }

        debug!("rolling produced {} rows", result.height());
        Dataset::new(result, index)
    }

    /// Like [`Rolling::apply`], threading an explicit `context` into every
    /// unit call instead of capturing it.
    pub fn apply_with<C, F>(
        &self,
        frame: &Frame,
        grouper: Option<&Grouper>,
        context: &C,
        mut unit: F,
    ) -> Result<Dataset>
    where
        F: FnMut(&Window<'_>, &C) -> Result<WindowOutput>,
    {
        self.apply(frame, grouper, |window| unit(window, context))
    }

    fn empty(periods: &Periods) -> Result<Dataset> {
        let time = periods.time().clone();
        let keys = periods.data().select([time.clone()])?.head(Some(0));
        Dataset::new(keys, [time])
    }

    /// Turns one unit output into rows keyed by the window's right edge.
    fn stamp(
        &self,
        output: WindowOutput,
        periods: &Periods,
        last: usize,
        group: Option<&str>,
    ) -> Result<DataFrame> {
        let mut rows = match output {
            WindowOutput::Scalar(value) => DataFrame::new(vec![Column::new(
                self.config.value_column.as_str().into(),
                [value],
            )])?,
            WindowOutput::Series(series) => series.into_frame(),
            WindowOutput::Frame(frame) => frame,
        };
        let height = rows.height();

        let time = periods.time();
        if rows.get_column_index(time).is_some() {
            rows.drop_in_place(time)?;
        }
        rows.insert_column(0, periods.key_column(&periods.periods()[last], height)?)?;

        if let Some(group) = group {
            let name = self.config.group_column.as_str();
            if rows.get_column_index(name).is_some() {
                rows.drop_in_place(name)?;
            }
            rows.insert_column(1, Column::new(name.into(), vec![group; height]))?;
        }

        Ok(rows)
    }
}

/// Runs `unit` over windows of `window` keys with the default configuration.
pub fn rolling<F>(frame: &Frame, window: usize, grouper: Option<&Grouper>, unit: F) -> Result<Dataset>
where
    F: FnMut(&Window<'_>) -> Result<WindowOutput>,
{
    Rolling::new(RollingConfig::with_window(window)).apply(frame, grouper, unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use ronda_frame::keys::{entity_keys, numeric_values, temporal_keys};
    use ronda_frame::{ShapeTag, classify};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, day).unwrap()
    }

    fn series(n: u32) -> Frame {
        let dates: Vec<NaiveDate> = (1..=n).map(d).collect();
        let values: Vec<f64> = (0..n).map(f64::from).collect();
        let df = df! {
            "date" => dates,
            "v" => values,
        }
        .unwrap();
        Frame::new(Dataset::time_series(df, "date").unwrap()).unwrap()
    }

    fn panel() -> Frame {
        let df = df! {
            "date" => [d(1), d(1), d(1), d(2), d(2), d(2), d(3), d(3), d(3)],
            "asset" => ["a", "b", "c", "a", "b", "c", "a", "b", "c"],
            "v" => [1.0, 10.0, 100.0, 2.0, 20.0, 200.0, 3.0, 30.0, 300.0],
        }
        .unwrap();
        Frame::new(Dataset::panel(df, "date", "asset").unwrap()).unwrap()
    }

    #[test]
    fn test_scalar_output_goes_to_value_column() {
        let result = rolling(&series(4), 2, None, |w| {
            Ok(WindowOutput::Scalar(w.data().height() as f64))
        })
        .unwrap();

        assert_eq!(result.columns(), vec!["date", "value"]);
        assert_eq!(result.index()[0].as_str(), "date");
        assert_eq!(numeric_values(result.data(), "value").unwrap(), vec![2.0; 3]);
    }

    #[test]
    fn test_window_metadata() {
        let mut seen = Vec::new();
        rolling(&series(4), 3, None, |w| {
            seen.push((w.position(), w.key().to_string(), w.group().is_none()));
            Ok(0.0.into())
        })
        .unwrap();

        assert_eq!(
            seen,
            vec![
                (0, "2020-01-03".to_string(), true),
                (1, "2020-01-04".to_string(), true),
            ]
        );
    }

    #[test]
    fn test_panel_window_spans_distinct_keys() {
        let result = rolling(&panel(), 2, None, |w| {
            assert_eq!(w.frame().tag(), ShapeTag::Panel);
            Ok(WindowOutput::Scalar(w.data().height() as f64))
        })
        .unwrap();
        assert_eq!(numeric_values(result.data(), "value").unwrap(), vec![6.0, 6.0]);
    }

    #[test]
    fn test_entity_output_keeps_panel_index() {
        let result = rolling(&panel(), 2, None, unit::entity_mean).unwrap();
        assert_eq!(classify(&result).unwrap().tag(), ShapeTag::Panel);
        assert_eq!(result.len(), 6);

        let v = numeric_values(result.data(), "v").unwrap();
        assert_relative_eq!(v[0], 1.5);
        assert_relative_eq!(v[1], 15.0);
        assert_relative_eq!(v[5], 250.0);
    }

    #[test]
    fn test_output_time_column_is_replaced() {
        let result = rolling(&series(3), 1, None, |w| Ok(w.data().clone().into())).unwrap();
        assert_eq!(result.columns(), vec!["date", "v"]);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_grouped_index_and_order() {
        let grouper: Grouper = [("a", "small"), ("b", "small"), ("c", "large")]
            .into_iter()
            .collect();
        let result = rolling(&panel(), 2, Some(&grouper), unit::sum).unwrap();

        assert_eq!(result.columns(), vec!["date", "group", "v"]);
        assert_eq!(result.index()[0].as_str(), "group");
        assert_eq!(result.index()[1].as_str(), "date");

        let groups = entity_keys(result.data().column("group").unwrap()).unwrap();
        assert_eq!(groups, vec!["large", "large", "small", "small"]);
        let v = numeric_values(result.data(), "v").unwrap();
        assert_eq!(v, vec![300.0, 500.0, 33.0, 55.0]);
    }

    #[test]
    fn test_grouped_window_sees_group() {
        let grouper: Grouper = [("a", "g")].into_iter().collect();
        let mut groups = Vec::new();
        rolling(&panel(), 3, Some(&grouper), |w| {
            groups.push(w.group().map(str::to_string));
            assert_eq!(w.data().height(), 3);
            Ok(0.0.into())
        })
        .unwrap();
        assert_eq!(groups, vec![Some("g".to_string())]);
    }

    #[test]
    fn test_empty_grouper_means_no_grouping() {
        let plain = rolling(&panel(), 2, None, unit::sum).unwrap();
        let grouped = rolling(&panel(), 2, Some(&Grouper::new()), unit::sum).unwrap();
        assert_eq!(plain.columns(), grouped.columns());
        assert_eq!(plain.len(), grouped.len());
    }

    #[test]
    fn test_grouping_a_time_series_fails() {
        let grouper: Grouper = [("a", "g")].into_iter().collect();
        let err = rolling(&series(3), 2, Some(&grouper), unit::mean).unwrap_err();
        assert!(matches!(err, RondaError::Shape(_)));
    }

    #[test]
    fn test_cross_section_rejected() {
        let df = df! { "v" => [1.0, 2.0] }.unwrap();
        let frame = Frame::new(Dataset::cross_section(df)).unwrap();
        let err = rolling(&frame, 1, None, unit::mean).unwrap_err();
        assert!(matches!(err, RondaError::Shape(_)));
    }

    #[test]
    fn test_zero_window_rejected() {
        let err = rolling(&series(3), 0, None, unit::mean).unwrap_err();
        assert!(matches!(err, RondaError::InvalidData(_)));
    }

    #[test]
    fn test_context_is_threaded() {
        let scale = 10.0;
        let result = Rolling::new(RollingConfig::with_window(1))
            .apply_with(&series(2), None, &scale, |w, scale| {
                let v = numeric_values(w.data(), "v")?;
                Ok(WindowOutput::Scalar(v[0] * scale))
            })
            .unwrap();
        assert_eq!(numeric_values(result.data(), "value").unwrap(), vec![0.0, 10.0]);
    }

    #[test]
    fn test_duplicate_keys_stay_in_one_window() {
        let df = df! {
            "date" => [d(2), d(1), d(1), d(3)],
            "v" => [3.0, 1.0, 2.0, 4.0],
        }
        .unwrap();
        let frame = Frame::new(Dataset::time_series(df, "date").unwrap()).unwrap();
        let result = rolling(&frame, 2, None, |w| {
            Ok(WindowOutput::Scalar(w.data().height() as f64))
        })
        .unwrap();

        assert_eq!(numeric_values(result.data(), "value").unwrap(), vec![3.0, 2.0]);
        let keys = temporal_keys(result.data().column("date").unwrap()).unwrap();
        assert!(keys.windows(2).all(|k| k[0] < k[1]));
    }

    #[test]
    fn test_config_defaults() {
        let config = RollingConfig::default();
        assert_eq!(config.window, 20);
        assert_eq!(config.value_column, "value");
        assert_eq!(config.group_column, "group");
        assert_eq!(RollingConfig::with_window(3).window, 3);
    }
}
