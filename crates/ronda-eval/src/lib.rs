//! Shape-aware statistics for ronda.
//!
//! Each operation reads the [`Shape`](ronda_frame::Shape) of its input to
//! decide between one computation over all rows and one computation per
//! temporal key:
//! - correlation matrices, with a t-statistic of the time-averaged
//!   correlation of a panel
//! - Information Coefficient (IC), optionally per entity group
//! - OLS regression with t-values
//! - IC summary metrics, quantile layering and weighted profit for factor
//!   testing
//!
//! # Example
//!
//! ```rust,no_run
//! use ronda_eval::{CorrMethod, Describer, EvaluatorConfig, FactorReport};
//! use ronda_frame::Frame;
//!
//! # fn run(panel: &Frame) -> ronda_frame::Result<()> {
//! let ic = panel.ic("momentum", "ret_1m", CorrMethod::Spearman, None)?;
//! let t = panel.corr(CorrMethod::Spearman)?.t_stat()?;
//!
//! let report = FactorReport::run(panel, "momentum", "ret_1m", &EvaluatorConfig::default())?;
//! println!("IR: {:.3}", report.summary.ir);
//! # Ok(())
//! # }
//! ```

mod accessor;
pub mod corr;
pub mod evaluator;
pub mod ic;
pub mod layering;
pub mod metrics;
pub mod profit;
pub mod regress;

// Re-export main types
pub use accessor::{Describer, Regressor};
pub use corr::{CorrMatrix, CorrMethod, Correlation, correlate, correlation};
pub use evaluator::{EvaluatorConfig, FactorReport};
pub use ic::{IC_COLUMN, information_coefficient};
pub use layering::quantile_layers;
pub use metrics::{IcSummary, MetricsConfig};
pub use profit::weighted_profit;
pub use regress::{OlsFit, ols};
