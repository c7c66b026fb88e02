//! Ordinary least squares.
//!
//! The target column is regressed on an intercept plus every other numeric
//! value column. Rows with any non-finite value are dropped. Panels are
//! regressed once per temporal key.

use log::debug;
use nalgebra::{DMatrix, DVector};
use polars::prelude::*;
use ronda_frame::{Dataset, Frame, Result, RondaError, Shape, keys::numeric_values};

/// Name of the column that labels regression terms.
pub const TERM_COLUMN: &str = "term";

/// Name of the intercept term.
pub const INTERCEPT: &str = "const";

/// Coefficients and t-values of one regression.
#[derive(Debug, Clone, PartialEq)]
pub struct OlsFit {
    /// Term names, intercept first.
    pub terms: Vec<String>,
    /// Estimated coefficients.
    pub coef: Vec<f64>,
    /// Coefficient divided by its standard error.
    pub t: Vec<f64>,
    /// Number of rows used.
    pub n: usize,
}

impl OlsFit {
    /// Regresses `y` on an intercept plus `regressors`.
    ///
    /// # Errors
    ///
    /// - [`RondaError::InsufficientData`] if no more complete rows than
    ///   terms remain
    /// - [`RondaError::InvalidData`] if the design matrix is rank deficient
    pub fn fit(y: &[f64], regressors: &[(String, Vec<f64>)]) -> Result<Self> {
        let k = regressors.len() + 1;
        let rows: Vec<usize> = (0..y.len())
            .filter(|&i| y[i].is_finite() && regressors.iter().all(|(_, x)| x[i].is_finite()))
            .collect();
        let n = rows.len();
        if n <= k {
            return Err(RondaError::InsufficientData(format!(
                "{} complete rows for {} terms",
                n, k
            )));
        }

        let design = DMatrix::from_fn(n, k, |r, c| match c {
            0 => 1.0,
            _ => regressors[c - 1].1[rows[r]],
        });
        let target = DVector::from_iterator(n, rows.iter().map(|&r| y[r]));

        let svd = design.clone().svd(true, true);
        let sigma = &svd.singular_values;
        // Rank cutoff relative to the largest singular value
        let tol = sigma.max() * n.max(k) as f64 * f64::EPSILON;
        if sigma.iter().any(|s| *s <= tol) {
            return Err(RondaError::InvalidData(
                "design matrix is rank deficient".to_string(),
            ));
        }
        let coef = svd
            .solve(&target, tol)
            .map_err(|e| RondaError::InvalidData(e.to_string()))?;
        let Some(v_t) = svd.v_t.as_ref() else {
            return Err(RondaError::Other("svd did not produce V".to_string()));
        };

        let residuals = &target - &design * &coef;
        let sigma2 = residuals.norm_squared() / (n - k) as f64;

        // diag((X'X)^-1) = sum_j (V[i, j] / s_j)^2
        let t = (0..k)
            .map(|i| {
                let var: f64 = (0..k).map(|j| (v_t[(j, i)] / sigma[j]).powi(2)).sum();
                let se = (sigma2 * var).sqrt();
                if se > 0.0 { coef[i] / se } else { f64::NAN }
            })
            .collect();

        let mut terms = Vec::with_capacity(k);
        terms.push(INTERCEPT.to_string());
        terms.extend(regressors.iter().map(|(name, _)| name.clone()));

        Ok(Self {
            terms,
            coef: coef.iter().copied().collect(),
            t,
            n,
        })
    }

    /// A fit whose coefficients and t-values are all NaN.
    pub fn missing(terms: Vec<String>) -> Self {
        let k = terms.len();
        Self {
            terms,
            coef: vec![f64::NAN; k],
            t: vec![f64::NAN; k],
            n: 0,
        }
    }

    /// The coefficient of a named term.
    pub fn coef_of(&self, term: &str) -> Option<f64> {
        self.terms.iter().position(|t| t == term).map(|i| self.coef[i])
    }

    /// The t-value of a named term.
    pub fn t_of(&self, term: &str) -> Option<f64> {
        self.terms.iter().position(|t| t == term).map(|i| self.t[i])
    }
}

fn regressors(data: &DataFrame, names: &[PlSmallStr]) -> Result<Vec<(String, Vec<f64>)>> {
    names
        .iter()
        .map(|name| Ok((name.to_string(), numeric_values(data, name)?)))
        .collect()
}

fn fit_frame(fits: &[OlsFit]) -> Result<DataFrame> {
    let terms: Vec<&str> = fits
        .iter()
        .flat_map(|f| f.terms.iter().map(String::as_str))
        .collect();
    let coef: Vec<f64> = fits.iter().flat_map(|f| f.coef.iter().copied()).collect();
    let t: Vec<f64> = fits.iter().flat_map(|f| f.t.iter().copied()).collect();

    Ok(DataFrame::new(vec![
        Column::new(TERM_COLUMN.into(), terms),
        Column::new("coef".into(), coef),
        Column::new("t".into(), t),
    ])?)
}

/// Regresses `target` on an intercept plus every other numeric value
/// column.
///
/// The result has one row per term with columns `coef` and `t`, indexed by
/// `term`; for a panel there is one regression per temporal key, indexed by
/// `(time, term)`. A period that cannot be fitted yields NaN rows instead of
/// failing the whole panel.
///
/// # Errors
///
/// - [`RondaError::MissingColumn`] if `target` is absent
/// - for non-panel frames, any error from [`OlsFit::fit`]
pub fn ols(frame: &Frame, target: &str) -> Result<Dataset> {
    if !frame.dataset().has_column(target) {
        return Err(RondaError::MissingColumn(target.to_string()));
    }
    let names: Vec<PlSmallStr> = frame
        .numeric_columns()
        .into_iter()
        .filter(|name| name.as_str() != target)
        .collect();

    match frame.shape() {
        Shape::Panel { time, .. } => {
            let periods = frame.periods()?;
            let data = periods.data();
            let y = numeric_values(data, target)?;
            let xs = regressors(data, &names)?;

            let mut terms = vec![INTERCEPT.to_string()];
            terms.extend(names.iter().map(|n| n.to_string()));

            let fits: Vec<OlsFit> = periods
                .periods()
                .iter()
                .map(|p| {
                    let range = p.offset..p.end();
                    let xs: Vec<(String, Vec<f64>)> = xs
                        .iter()
                        .map(|(name, x)| (name.clone(), x[range.clone()].to_vec()))
                        .collect();
                    OlsFit::fit(&y[range], &xs).unwrap_or_else(|e| {
                        debug!("ols on {} left empty: {}", p.label, e);
                        OlsFit::missing(terms.clone())
                    })
                })
                .collect();

            let counts: Vec<usize> = fits.iter().map(|f| f.terms.len()).collect();
            let mut df = fit_frame(&fits)?;
            df.insert_column(0, periods.repeat_keys(&counts)?)?;
            debug!("ols of {} on {} terms over {} periods", target, names.len() + 1, fits.len());
            Dataset::new(df, [time.clone(), TERM_COLUMN.into()])
        }
        _ => {
            let data = frame.data();
            let fit = OlsFit::fit(&numeric_values(data, target)?, &regressors(data, &names)?)?;
            debug!("ols of {} on {} terms, {} rows", target, fit.terms.len(), fit.n);
            Dataset::new(fit_frame(std::slice::from_ref(&fit))?, [TERM_COLUMN])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use ronda_frame::{ShapeTag, classify};

    #[test]
    fn test_fit_rank_deficient() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let doubled: Vec<f64> = x.iter().map(|v| v * 2.0).collect();
        let err = OlsFit::fit(
            &[1.0, 2.0, 3.0, 5.0],
            &[("x".to_string(), x), ("x2".to_string(), doubled)],
        )
        .unwrap_err();
        assert!(matches!(err, RondaError::InvalidData(_)));
    }

    #[test]
    fn test_fit_small_scale_regressor() {
        let x: Vec<f64> = (1..=5).map(|v| f64::from(v) * 1e-6).collect();
        let y = vec![3.1, 4.9, 7.0, 9.1, 10.9];
        let fit = OlsFit::fit(&y, &[("x".to_string(), x)]).unwrap();

        assert_relative_eq!(fit.coef_of("x").unwrap(), 1.98e6, max_relative = 1e-8);
        assert_relative_eq!(fit.coef_of("const").unwrap(), 1.06, max_relative = 1e-8);
        // t-values do not depend on the regressor's scale
        let unit = OlsFit::fit(&y, &[("x".to_string(), vec![1.0, 2.0, 3.0, 4.0, 5.0])]).unwrap();
        assert_relative_eq!(fit.t_of("x").unwrap(), unit.t_of("x").unwrap(), max_relative = 1e-6);
    }

    #[test]
    fn test_fit_recovers_line() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![3.1, 4.9, 7.0, 9.1, 10.9];
        let fit = OlsFit::fit(&y, &[("x".to_string(), x)]).unwrap();

        assert_eq!(fit.terms, vec!["const", "x"]);
        assert_eq!(fit.n, 5);
        assert_relative_eq!(fit.coef_of("x").unwrap(), 1.98, epsilon = 1e-10);
        assert_relative_eq!(fit.coef_of("const").unwrap(), 1.06, epsilon = 1e-10);
        assert!(fit.t_of("x").unwrap() > 20.0);
    }

    #[test]
    fn test_fit_drops_incomplete_rows() {
        let x = vec![1.0, 2.0, f64::NAN, 3.0, 4.0];
        let y = vec![2.0, 4.0, 100.0, 6.0, f64::NAN];
        let fit = OlsFit::fit(&y, &[("x".to_string(), x)]).unwrap();
        assert_eq!(fit.n, 3);
        assert_relative_eq!(fit.coef_of("x").unwrap(), 2.0, epsilon = 1e-10);
        assert_relative_eq!(fit.coef_of("const").unwrap(), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_fit_insufficient() {
        let err = OlsFit::fit(&[1.0, 2.0], &[("x".to_string(), vec![1.0, 2.0])]).unwrap_err();
        assert!(matches!(err, RondaError::InsufficientData(_)));
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, day).unwrap()
    }

    #[test]
    fn test_panel_ols_per_period() {
        let df = df! {
            "date" => [d(1), d(1), d(1), d(1), d(2), d(2), d(2), d(2)],
            "asset" => ["a", "b", "c", "d", "a", "b", "c", "d"],
            "x" => [1.0, 2.0, 3.0, 4.0, 1.0, 1.0, 1.0, 1.0],
            "ret" => [2.1, 3.9, 6.1, 7.9, 1.0, 2.0, 3.0, 4.0],
        }
        .unwrap();
        let frame = Frame::new(Dataset::panel(df, "date", "asset").unwrap()).unwrap();
        let result = ols(&frame, "ret").unwrap();

        assert_eq!(result.columns(), vec!["date", "term", "coef", "t"]);
        assert_eq!(classify(&result).unwrap().tag(), ShapeTag::Panel);
        assert_eq!(result.len(), 4);

        let coef = numeric_values(result.data(), "coef").unwrap();
        assert_relative_eq!(coef[1], 1.96, epsilon = 1e-10);
        // constant regressor in the second period
        assert!(coef[2].is_nan());
        assert!(coef[3].is_nan());
    }

    #[test]
    fn test_cross_section_ols() {
        let df = df! {
            "asset" => ["a", "b", "c", "d", "e"],
            "x" => [1.0, 2.0, 3.0, 4.0, 5.0],
            "ret" => [3.1, 4.9, 7.0, 9.1, 10.9],
            "name" => ["p", "q", "r", "s", "t"],
        }
        .unwrap();
        let frame = Frame::new(Dataset::new(df, ["asset"]).unwrap()).unwrap();
        let result = ols(&frame, "ret").unwrap();

        assert_eq!(result.index()[0].as_str(), TERM_COLUMN);
        assert_eq!(result.len(), 2);
        assert!(matches!(ols(&frame, "missing"), Err(RondaError::MissingColumn(_))));
    }
}
