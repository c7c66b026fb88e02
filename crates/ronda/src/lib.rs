#![doc(issue_tracker_base_url = "https://github.com/factordynamics/ronda/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! # ronda
//!
//! Shape-aware rolling aggregation and statistics over time-series and panel
//! data.
//!
//! ronda is an umbrella crate that re-exports all ronda sub-crates for
//! convenience. Every dataset is classified once as a cross-section, a
//! time-series or a panel, and each operation picks its behaviour from that
//! tag.
//!
//! ## Quick Start
//!
//! ```ignore
//! use ronda::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let panel = Frame::new(Dataset::panel(df, "date", "asset")?)?;
//!
//! // 20-day rolling mean, one row per window
//! let smoothed = panel.rolling(20, None, unit::mean)?;
//!
//! // Per-date IC of a factor against forward returns
//! let ic = panel.ic("momentum", "ret_1m", CorrMethod::Spearman, None)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Organization
//!
//! - [`frame`] - Dataset, shape classification, positional selection
//! - [`calc`] - Windowed aggregation, groupers and preprocessing
//! - [`eval`] - Correlation, IC, regression and factor evaluation
//!
//! ## Architecture
//!
//! 1. **Datasets** pair a DataFrame with its index columns
//! 2. **The classifier** tags each dataset with its shape once
//! 3. **Operations** dispatch on the tag instead of re-inspecting the index

/// Dataset, shape and selection types.
pub use ronda_frame as frame;

/// Rolling aggregation.
pub use ronda_calc as calc;

/// Statistics and factor evaluation.
pub use ronda_eval as eval;

pub use ronda_frame::{Dataset, Frame, Result, RondaError, Shape, ShapeTag, classify};

/// The version of the ronda crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports for working with ronda.
pub mod prelude {
    pub use ronda_calc::{
        Aggregation, Calculator, Grouper, Label, Processor, RollingConfig, Window, WindowOutput,
        unit,
    };
    pub use ronda_eval::{CorrMethod, Describer, EvaluatorConfig, FactorReport, Regressor};
    pub use ronda_frame::{
        Arity, Dataset, Frame, Pick, Result, RondaError, Selected, Selector, Shape, ShapeTag,
        classify,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use chrono::NaiveDate;
    use polars::prelude::*;

    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }

    #[test]
    fn test_prelude_round() {
        let d = |day| NaiveDate::from_ymd_opt(2020, 1, day).unwrap();
        let df = df! {
            "date" => [d(1), d(1), d(2), d(2), d(3), d(3)],
            "asset" => ["a", "b", "a", "b", "a", "b"],
            "x" => [1.0, 2.0, 2.0, 1.0, 1.0, 2.0],
            "y" => [1.0, 2.0, 1.0, 2.0, 1.0, 2.0],
        }
        .unwrap();
        let panel = Frame::new(Dataset::panel(df, "date", "asset").unwrap()).unwrap();
        assert_eq!(panel.tag(), ShapeTag::Panel);

        let rolled = panel.rolling(2, None, unit::mean).unwrap();
        assert_eq!(rolled.len(), 2);

        let ic = panel.ic("x", "y", CorrMethod::Pearson, None).unwrap();
        assert_eq!(ic.len(), 3);
    }
}
