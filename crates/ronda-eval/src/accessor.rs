//! Statistics as methods on [`Frame`].

use crate::{CorrMethod, Correlation, correlation, information_coefficient, ols};
use ronda_calc::Grouper;
use ronda_frame::{Dataset, Frame, Result};

/// Descriptive statistics on shape-tagged frames.
pub trait Describer {
    /// Correlation matrix of the numeric value columns; see [`correlation`].
    fn corr(&self, method: CorrMethod) -> Result<Correlation>;

    /// IC of `factor` against `forward`; see [`information_coefficient`].
    fn ic(
        &self,
        factor: &str,
        forward: &str,
        method: CorrMethod,
        grouper: Option<&Grouper>,
    ) -> Result<Dataset>;
}

/// Regression on shape-tagged frames.
pub trait Regressor {
    /// Least squares fit of `target` on the other numeric columns; see [`ols`].
    fn ols(&self, target: &str) -> Result<Dataset>;
}

impl Describer for Frame {
    fn corr(&self, method: CorrMethod) -> Result<Correlation> {
        correlation(self, method)
    }

    fn ic(
        &self,
        factor: &str,
        forward: &str,
        method: CorrMethod,
        grouper: Option<&Grouper>,
    ) -> Result<Dataset> {
        information_coefficient(self, factor, forward, method, grouper)
    }
}

impl Regressor for Frame {
    fn ols(&self, target: &str) -> Result<Dataset> {
        ols(self, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use polars::prelude::*;

    #[test]
    fn test_methods_dispatch_on_shape() {
        let d = |day| NaiveDate::from_ymd_opt(2020, 1, day).unwrap();
        let df = df! {
            "date" => [d(1), d(1), d(1), d(2), d(2), d(2)],
            "asset" => ["a", "b", "c", "a", "b", "c"],
            "x" => [1.0, 2.0, 3.0, 3.0, 2.0, 1.0],
            "y" => [1.0, 2.0, 3.0, 1.0, 2.0, 3.0],
        }
        .unwrap();
        let frame = Frame::new(Dataset::panel(df, "date", "asset").unwrap()).unwrap();

        assert_eq!(frame.corr(CorrMethod::Spearman).unwrap().matrices().len(), 2);
        assert_eq!(frame.ic("x", "y", CorrMethod::Spearman, None).unwrap().len(), 2);
        let fitted = Regressor::ols(&frame, "y").unwrap();
        assert_eq!(fitted.len(), 4);
    }
}
