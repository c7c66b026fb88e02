//! Single-factor evaluation.
//!
//! Runs the regression, IC and layering steps of a factor test in one call.

use crate::{
    CorrMethod, IC_COLUMN, IcSummary, MetricsConfig, information_coefficient, ols,
    quantile_layers,
};
use log::debug;
use ronda_frame::{Dataset, Frame, Result, RondaError, keys::numeric_values};
use serde::{Deserialize, Serialize};

/// Configuration for factor evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorConfig {
    /// Correlation used for the IC
    pub method: CorrMethod,
    /// Number of layering buckets
    pub quantiles: usize,
    /// Minimum number of IC observations for the summary
    pub min_observations: usize,
    /// Whether to annualize the information ratio
    pub annualize: bool,
    /// Periods per year for annualization
    pub periods_per_year: usize,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            method: CorrMethod::Spearman,
            quantiles: 5,
            min_observations: 20,
            annualize: false,
            periods_per_year: 252,
        }
    }
}

impl EvaluatorConfig {
    /// The summary settings of this configuration.
    pub const fn metrics(&self) -> MetricsConfig {
        MetricsConfig {
            min_observations: self.min_observations,
            annualize: self.annualize,
            periods_per_year: self.periods_per_year,
        }
    }
}

/// Evaluation of one factor against one forward return.
#[derive(Debug, Clone)]
pub struct FactorReport {
    /// Factor column
    pub factor: String,
    /// Forward return column
    pub forward: String,
    /// Per-period regression of the forward return on the factor
    pub regression: Dataset,
    /// Per-period IC
    pub ic: Dataset,
    /// Summary of the IC series
    pub summary: IcSummary,
    /// Quantile layering of the forward return by factor
    pub layers: Dataset,
}

impl FactorReport {
    /// Evaluates `factor` against `forward` on a panel.
    ///
    /// Only the index columns and the two named columns take part.
    ///
    /// # Errors
    ///
    /// - [`RondaError::Shape`] unless `frame` is a panel
    /// - [`RondaError::InvalidData`] if `factor` and `forward` name the
    ///   same column
    /// - [`RondaError::MissingColumn`] if either column is absent
    /// - anything raised by the layering step
    pub fn run(frame: &Frame, factor: &str, forward: &str, config: &EvaluatorConfig) -> Result<Self> {
        let (time, entity) = frame.require_panel("factor evaluation")?;
        if factor == forward {
            return Err(RondaError::InvalidData(format!(
                "factor and forward return must be different columns, both are {}",
                factor
            )));
        }
        for name in [factor, forward] {
            if !frame.dataset().has_column(name) {
                return Err(RondaError::MissingColumn(name.to_string()));
            }
        }

        let columns = [time.as_str(), entity.as_str(), factor, forward];
        let subset = frame.with_rows(frame.data().select(columns)?)?;

        let regression = ols(&subset, forward)?;
        let ic = information_coefficient(&subset, factor, forward, config.method, None)?;
        let summary = IcSummary::from_series(&numeric_values(ic.data(), IC_COLUMN)?, &config.metrics());
        let layers = quantile_layers(&subset, factor, forward, config.quantiles)?;

        debug!(
            "{} on {}: mean ic {:.4}, ir {:.4} over {} periods",
            factor, forward, summary.mean, summary.ir, summary.n_obs
        );

        Ok(Self {
            factor: factor.to_string(),
            forward: forward.to_string(),
            regression,
            ic,
            summary,
            layers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use polars::prelude::*;

    fn panel(days: u32) -> Frame {
        let mut dates = Vec::new();
        let mut assets = Vec::new();
        let mut factor = Vec::new();
        let mut ret = Vec::new();
        for day in 1..=days {
            for k in 0..6 {
                dates.push(NaiveDate::from_ymd_opt(2020, 1, day).unwrap());
                assets.push(format!("s{}", k));
                factor.push(f64::from(k));
                ret.push(0.01 * f64::from(k) + 0.001 * f64::from(day % 3));
            }
        }
        let df = df! {
            "date" => dates,
            "asset" => assets,
            "factor" => factor,
            "ret" => ret,
            "noise" => vec![1.0; (days * 6) as usize],
        }
        .unwrap();
        Frame::new(Dataset::panel(df, "date", "asset").unwrap()).unwrap()
    }

    #[test]
    fn test_report() {
        let config = EvaluatorConfig {
            quantiles: 3,
            min_observations: 2,
            ..Default::default()
        };
        let report = FactorReport::run(&panel(4), "factor", "ret", &config).unwrap();

        assert_eq!(report.ic.len(), 4);
        assert_eq!(report.summary.n_obs, 4);
        assert!((report.summary.mean - 1.0).abs() < 1e-10);
        assert_eq!(report.layers.len(), 12);
        // const and factor per period; the noise column is left out
        assert_eq!(report.regression.len(), 8);
    }

    #[test]
    fn test_report_errors() {
        let config = EvaluatorConfig::default();
        assert!(matches!(
            FactorReport::run(&panel(2), "factor", "nope", &config),
            Err(RondaError::MissingColumn(_))
        ));
        assert!(matches!(
            FactorReport::run(&panel(2), "factor", "factor", &config),
            Err(RondaError::InvalidData(_))
        ));
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: EvaluatorConfig =
            serde_json::from_str(r#"{"method": "pearson", "quantiles": 10}"#).unwrap();
        assert_eq!(config.method, CorrMethod::Pearson);
        assert_eq!(config.quantiles, 10);
        assert_eq!(config.min_observations, 20);
        assert_eq!(config.metrics().periods_per_year, 252);
    }
}
