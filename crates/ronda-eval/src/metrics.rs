//! Summary statistics of an IC series.

use polars::prelude::*;
use ronda_frame::{Dataset, Result, stats::Moments};
use serde::{Deserialize, Serialize};

/// Configuration for metrics calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Minimum number of observations required for metric calculation
    pub min_observations: usize,
    /// Whether to annualize the information ratio
    pub annualize: bool,
    /// Number of periods per year for annualization
    pub periods_per_year: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            min_observations: 20,
            annualize: false,
            periods_per_year: 252,
        }
    }
}

/// Summary of an IC time series.
///
/// The information ratio measures how consistently a factor predicts
/// returns; the t-statistic tests whether the mean IC differs from zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcSummary {
    /// Mean IC
    pub mean: f64,
    /// Standard deviation of IC
    pub std: f64,
    /// Information ratio, mean over std (annualized if configured)
    pub ir: f64,
    /// Mean over std, scaled by sqrt of the observation count
    pub t_stat: f64,
    /// Share of positive ICs
    pub hit_rate: f64,
    /// Number of finite observations
    pub n_obs: usize,
}

impl IcSummary {
    /// Summarizes an IC series, skipping non-finite values.
    ///
    /// Every statistic is NaN when fewer than `min_observations` finite
    /// values remain.
    ///
    /// # Example
    ///
    /// ```
    /// use ronda_eval::{IcSummary, MetricsConfig};
    ///
    /// let config = MetricsConfig { min_observations: 3, ..Default::default() };
    /// let summary = IcSummary::from_series(&[0.05, 0.03, 0.07, f64::NAN], &config);
    /// assert_eq!(summary.n_obs, 3);
    /// assert_eq!(summary.hit_rate, 1.0);
    /// ```
    pub fn from_series(ics: &[f64], config: &MetricsConfig) -> Self {
        let moments = Moments::of(ics);
        let n_obs = moments.n;

        if n_obs < config.min_observations || n_obs == 0 {
            return Self {
                mean: f64::NAN,
                std: f64::NAN,
                ir: f64::NAN,
                t_stat: f64::NAN,
                hit_rate: f64::NAN,
                n_obs,
            };
        }

        let ir = if moments.std > 0.0 {
            if config.annualize {
                moments.mean / moments.std * (config.periods_per_year as f64).sqrt()
            } else {
                moments.mean / moments.std
            }
        } else {
            f64::NAN
        };

        let positive = ics.iter().filter(|ic| ic.is_finite() && **ic > 0.0).count();

        Self {
            mean: moments.mean,
            std: moments.std,
            ir,
            t_stat: moments.t_stat(),
            hit_rate: positive as f64 / n_obs as f64,
            n_obs,
        }
    }

    /// One-row dataset with a column per statistic.
    pub fn to_dataset(&self) -> Result<Dataset> {
        let df = df! {
            "mean" => [self.mean],
            "std" => [self.std],
            "ir" => [self.ir],
            "t" => [self.t_stat],
            "hit_rate" => [self.hit_rate],
            "n" => [self.n_obs as u64],
        }?;
        Ok(Dataset::cross_section(df))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn config(min_observations: usize) -> MetricsConfig {
        MetricsConfig {
            min_observations,
            ..Default::default()
        }
    }

    #[test]
    fn test_summary() {
        let ics = [0.1, 0.2, 0.3, -0.1];
        let summary = IcSummary::from_series(&ics, &config(2));

        assert_eq!(summary.n_obs, 4);
        assert_relative_eq!(summary.mean, 0.125, epsilon = 1e-12);
        assert_relative_eq!(summary.ir, summary.mean / summary.std, epsilon = 1e-12);
        assert_relative_eq!(summary.t_stat, summary.ir * 2.0, epsilon = 1e-12);
        assert_relative_eq!(summary.hit_rate, 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_annualized_ir() {
        let ics = [0.1, 0.2, 0.3];
        let plain = IcSummary::from_series(&ics, &config(2));
        let annual = IcSummary::from_series(
            &ics,
            &MetricsConfig {
                min_observations: 2,
                annualize: true,
                periods_per_year: 12,
            },
        );
        assert_relative_eq!(annual.ir, plain.ir * 12f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(annual.t_stat, plain.t_stat, epsilon = 1e-12);
    }

    #[test]
    fn test_below_min_observations() {
        let summary = IcSummary::from_series(&[0.1, f64::NAN, 0.2], &config(3));
        assert_eq!(summary.n_obs, 2);
        assert!(summary.mean.is_nan());
        assert!(summary.hit_rate.is_nan());
    }

    #[test]
    fn test_to_dataset() {
        let summary = IcSummary::from_series(&[0.1, 0.2], &config(1));
        let dataset = summary.to_dataset().unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.columns().len(), 6);
    }

    #[test]
    fn test_config_default() {
        let config = MetricsConfig::default();
        assert_eq!(config.min_observations, 20);
        assert_eq!(config.periods_per_year, 252);
        assert!(!config.annualize);
    }
}
