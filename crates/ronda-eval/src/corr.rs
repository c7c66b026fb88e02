//! Correlation matrices.
//!
//! Panels are correlated period by period; other shapes once over all rows.
//! Pairs where either side is non-finite are dropped pairwise.

use log::debug;
use ndarray::Array2;
use polars::prelude::*;
use ronda_frame::{
    Dataset, Frame, Result, RondaError, Shape,
    keys::{numeric_values, repeat_each},
    stats::Moments,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Name of the column that labels the rows of a rendered matrix.
pub const VARIABLE_COLUMN: &str = "variable";

/// Correlation coefficient.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum CorrMethod {
    /// Rank correlation; ties get their average rank.
    #[default]
    #[display("spearman")]
    Spearman,
    /// Linear correlation.
    #[display("pearson")]
    Pearson,
}

impl FromStr for CorrMethod {
    type Err = RondaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "spearman" => Ok(Self::Spearman),
            "pearson" => Ok(Self::Pearson),
            other => Err(RondaError::InvalidData(format!(
                "unknown correlation method: {}",
                other
            ))),
        }
    }
}

/// Correlation between two equally long slices.
///
/// Returns NaN when the lengths differ, fewer than two finite pairs remain,
/// or either side has no dispersion.
///
/// # Example
///
/// ```
/// use ronda_eval::{CorrMethod, correlate};
///
/// let scores = [1.5, 0.3, -0.8, 2.1];
/// let returns = [0.02, 0.01, -0.01, 0.03];
/// let ic = correlate(&scores, &returns, CorrMethod::Spearman);
/// assert!((ic - 1.0).abs() < 1e-12);
/// ```
pub fn correlate(x: &[f64], y: &[f64], method: CorrMethod) -> f64 {
    if x.len() != y.len() {
        return f64::NAN;
    }

    // Filter out NaN values
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .unzip();

    if xs.len() < 2 {
        return f64::NAN;
    }

    match method {
        CorrMethod::Spearman => pearson(&ranks(&xs), &ranks(&ys)),
        CorrMethod::Pearson => pearson(&xs, &ys),
    }
}

/// Zero-based ranks of values, ties sharing their average rank.
pub(crate) fn ranks(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut indexed: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();

    indexed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut ranks = vec![0.0; n];
    let mut i = 0;

    while i < n {
        let mut j = i;
        // Find ties
        while j < n && indexed[j].1 == indexed[i].1 {
            j += 1;
        }

        let avg_rank = (i + j - 1) as f64 / 2.0;
        for item in &indexed[i..j] {
            ranks[item.0] = avg_rank;
        }

        i = j;
    }

    ranks
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;

    if n < 2.0 {
        return f64::NAN;
    }

    let mean_x: f64 = x.iter().sum::<f64>() / n;
    let mean_y: f64 = y.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;

    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return f64::NAN;
    }

    cov / (var_x.sqrt() * var_y.sqrt())
}

/// A square correlation matrix over named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrMatrix {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl CorrMatrix {
    /// Correlates every pair of `columns` of `data`.
    pub fn compute(data: &DataFrame, columns: &[PlSmallStr], method: CorrMethod) -> Result<Self> {
        let series = columns
            .iter()
            .map(|name| numeric_values(data, name))
            .collect::<Result<Vec<_>>>()?;

        let k = columns.len();
        let mut values = Array2::from_elem((k, k), f64::NAN);
        for i in 0..k {
            for j in i..k {
                let c = correlate(&series[i], &series[j], method);
                values[[i, j]] = c;
                values[[j, i]] = c;
            }
        }

        Ok(Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            values,
        })
    }

    /// Column names, in row and column order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The coefficients.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// The coefficient between two named columns.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[[i, j]])
    }

    /// Long form: a `variable` column naming each row, then one column per
    /// matrix column.
    fn to_frame(&self) -> Result<DataFrame> {
        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        columns.push(Column::new(VARIABLE_COLUMN.into(), &self.columns));
        for (j, name) in self.columns.iter().enumerate() {
            columns.push(Column::new(name.as_str().into(), self.values.column(j).to_vec()));
        }
        Ok(DataFrame::new(columns)?)
    }
}

/// Result of [`correlation`].
#[derive(Debug, Clone)]
pub enum Correlation {
    /// One matrix over all rows of a time-series or cross-section.
    Single(CorrMatrix),
    /// One matrix per temporal key of a panel.
    Panel {
        /// Temporal key of each matrix.
        keys: Column,
        /// Matrices in ascending key order.
        matrices: Vec<CorrMatrix>,
    },
}

impl Correlation {
    /// The per-period (or single) matrices.
    pub fn matrices(&self) -> &[CorrMatrix] {
        match self {
            Self::Single(matrix) => std::slice::from_ref(matrix),
            Self::Panel { matrices, .. } => matrices,
        }
    }

    /// Significance of the time-averaged correlation of a panel.
    ///
    /// Each entry is `mean / std * sqrt(n)`, with the moments taken over the
    /// finite per-period coefficients and `n` the number of periods.
    /// Degenerate entries (such as the diagonal) are NaN.
    ///
    /// # Errors
    ///
    /// [`RondaError::Shape`] unless the correlation came from a panel.
    pub fn t_stat(&self) -> Result<CorrMatrix> {
        let Self::Panel { matrices, .. } = self else {
            return Err(RondaError::Shape(
                "a correlation t-statistic needs per-period matrices from panel data".to_string(),
            ));
        };
        let Some(first) = matrices.first() else {
            return Err(RondaError::InsufficientData(
                "no periods to average over".to_string(),
            ));
        };

        let k = first.columns.len();
        let mut values = Array2::from_elem((k, k), f64::NAN);
        for i in 0..k {
            for j in 0..k {
                let per_period: Vec<f64> = matrices.iter().map(|m| m.values[[i, j]]).collect();
                // moments over finite coefficients, scaled by every period
                let moments = Moments {
                    n: matrices.len(),
                    ..Moments::of(&per_period)
                };
                values[[i, j]] = moments.t_stat();
            }
        }

        Ok(CorrMatrix {
            columns: first.columns.clone(),
            values,
        })
    }

    /// Renders the matrices as a dataset.
    ///
    /// A single matrix is indexed by `variable`; panel matrices are stacked
    /// and indexed by `(time, variable)`.
    pub fn to_dataset(&self) -> Result<Dataset> {
        match self {
            Self::Single(matrix) => Dataset::new(matrix.to_frame()?, [VARIABLE_COLUMN]),
            Self::Panel { keys, matrices } => {
                let mut frames = matrices.iter().map(CorrMatrix::to_frame);
                let Some(first) = frames.next() else {
                    return Err(RondaError::InsufficientData(
                        "no periods to render".to_string(),
                    ));
                };
                let mut stacked = first?;
                for frame in frames {
                    stacked.vstack_mut(&frame?)?;
                }

                let counts: Vec<usize> = matrices.iter().map(|m| m.columns.len()).collect();
                let time = keys.name().clone();
                stacked.insert_column(0, repeat_each(keys, &counts)?)?;
                Dataset::new(stacked, [time, VARIABLE_COLUMN.into()])
            }
        }
    }
}

/// Correlation matrix of the numeric value columns of `frame`.
///
/// # Errors
///
/// [`RondaError::InvalidData`] if the frame has no numeric value columns.
pub fn correlation(frame: &Frame, method: CorrMethod) -> Result<Correlation> {
    let columns = frame.numeric_columns();
    if columns.is_empty() {
        return Err(RondaError::InvalidData(
            "correlation needs at least one numeric value column".to_string(),
        ));
    }

    match frame.shape() {
        Shape::Panel { .. } => {
            let periods = frame.periods()?;
            let matrices = periods
                .iter()
                .map(|(_, rows)| CorrMatrix::compute(&rows, &columns, method))
                .collect::<Result<Vec<_>>>()?;
            debug!(
                "{} correlation of {} columns over {} periods",
                method,
                columns.len(),
                matrices.len()
            );
            Ok(Correlation::Panel {
                keys: periods.keys()?,
                matrices,
            })
        }
        _ => {
            debug!("{} correlation of {} columns", method, columns.len());
            CorrMatrix::compute(frame.data(), &columns, method).map(Correlation::Single)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use ronda_frame::{ShapeTag, classify};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, day).unwrap()
    }

    fn panel() -> Frame {
        let df = df! {
            "date" => [d(1), d(1), d(1), d(2), d(2), d(2), d(3), d(3), d(3)],
            "asset" => ["a", "b", "c", "a", "b", "c", "a", "b", "c"],
            "x" => [1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0, 3.0],
            "y" => [1.0, 2.0, 3.0, 1.0, 3.0, 2.0, 2.0, 1.0, 3.0],
        }
        .unwrap();
        Frame::new(Dataset::panel(df, "date", "asset").unwrap()).unwrap()
    }

    #[test]
    fn test_correlate_perfect() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [0.01, 0.02, 0.03, 0.04, 0.05];
        assert_relative_eq!(correlate(&x, &y, CorrMethod::Spearman), 1.0, epsilon = 1e-10);
        assert_relative_eq!(correlate(&x, &y, CorrMethod::Pearson), 1.0, epsilon = 1e-10);

        let reversed: Vec<f64> = y.iter().rev().copied().collect();
        assert_relative_eq!(
            correlate(&x, &reversed, CorrMethod::Spearman),
            -1.0,
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_correlate_spearman_ignores_scale() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 4.0, 9.0, 100.0];
        assert_relative_eq!(correlate(&x, &y, CorrMethod::Spearman), 1.0, epsilon = 1e-10);
        assert!(correlate(&x, &y, CorrMethod::Pearson) < 1.0);
    }

    #[test]
    fn test_correlate_degenerate() {
        assert!(correlate(&[1.0], &[1.0], CorrMethod::Pearson).is_nan());
        assert!(correlate(&[1.0, 2.0], &[1.0], CorrMethod::Pearson).is_nan());
        assert!(correlate(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0], CorrMethod::Spearman).is_nan());
        let with_nan = correlate(&[1.0, f64::NAN, 3.0, 4.0], &[1.0, 2.0, 3.0, 4.0], CorrMethod::Pearson);
        assert_relative_eq!(with_nan, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_ranks_with_ties() {
        assert_eq!(ranks(&[3.0, 1.0, 2.0, 5.0, 4.0]), vec![2.0, 0.0, 1.0, 4.0, 3.0]);
        assert_eq!(ranks(&[1.0, 2.0, 2.0, 3.0]), vec![0.0, 1.5, 1.5, 3.0]);
    }

    #[test]
    fn test_method_parse_and_display() {
        assert_eq!("Pearson".parse::<CorrMethod>().unwrap(), CorrMethod::Pearson);
        assert!("kendall".parse::<CorrMethod>().is_err());
        assert_eq!(CorrMethod::default().to_string(), "spearman");
    }

    #[test]
    fn test_panel_correlation_per_period() {
        let corr = correlation(&panel(), CorrMethod::Spearman).unwrap();
        let matrices = corr.matrices();
        assert_eq!(matrices.len(), 3);
        assert_relative_eq!(matrices[0].get("x", "y").unwrap(), 1.0, epsilon = 1e-10);
        assert_relative_eq!(matrices[1].get("x", "y").unwrap(), 0.5, epsilon = 1e-10);
        assert_relative_eq!(matrices[2].get("y", "x").unwrap(), 0.5, epsilon = 1e-10);
        assert_relative_eq!(matrices[0].get("x", "x").unwrap(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_panel_t_stat() {
        let corr = correlation(&panel(), CorrMethod::Spearman).unwrap();
        let t = corr.t_stat().unwrap();
        // per-period [1.0, 0.5, 0.5]: mean 2/3, std sqrt(1/12)
        let expected = (2.0 / 3.0) / (1.0f64 / 12.0).sqrt() * 3f64.sqrt();
        assert_relative_eq!(t.get("x", "y").unwrap(), expected, epsilon = 1e-10);
        assert!(t.get("x", "x").unwrap().is_nan());
    }

    #[test]
    fn test_panel_t_stat_scales_by_all_periods() {
        let mut df = panel().data().clone();
        let flat = df! {
            "date" => [d(4), d(4), d(4)],
            "asset" => ["a", "b", "c"],
            "x" => [1.0, 2.0, 3.0],
            "y" => [2.0, 2.0, 2.0],
        }
        .unwrap();
        df.vstack_mut(&flat).unwrap();
        let frame = Frame::new(Dataset::panel(df, "date", "asset").unwrap()).unwrap();

        let corr = correlation(&frame, CorrMethod::Spearman).unwrap();
        assert!(corr.matrices()[3].get("x", "y").unwrap().is_nan());
        // per-period [1.0, 0.5, 0.5, NaN]: moments of the finite three, n = 4
        let expected = (2.0 / 3.0) / (1.0f64 / 12.0).sqrt() * 2.0;
        assert_relative_eq!(corr.t_stat().unwrap().get("x", "y").unwrap(), expected, epsilon = 1e-10);
    }

    #[test]
    fn test_ranks_large_magnitude_ties() {
        assert_eq!(ranks(&[1e20, 3.0, 1e20]), vec![1.5, 0.0, 1.5]);
        assert_eq!(ranks(&[1e20, 1e20 + 1e5]), vec![0.0, 1.0]);
    }

    #[test]
    fn test_panel_to_dataset() {
        let corr = correlation(&panel(), CorrMethod::Pearson).unwrap();
        let dataset = corr.to_dataset().unwrap();
        assert_eq!(dataset.len(), 6);
        assert_eq!(dataset.columns(), vec!["date", "variable", "x", "y"]);
        assert_eq!(classify(&dataset).unwrap().tag(), ShapeTag::Panel);
    }

    #[test]
    fn test_single_correlation() {
        let df = panel().data().clone();
        let frame = Frame::new(Dataset::time_series(df.drop("asset").unwrap(), "date").unwrap())
            .unwrap();
        let corr = correlation(&frame, CorrMethod::Pearson).unwrap();
        assert!(matches!(corr, Correlation::Single(_)));
        assert!(matches!(corr.t_stat(), Err(RondaError::Shape(_))));

        let dataset = corr.to_dataset().unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(classify(&dataset).unwrap().tag(), ShapeTag::CrossSection);
    }
}
