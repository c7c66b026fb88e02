//! Portfolio profit from weights and forward returns.

use log::debug;
use polars::prelude::*;
use ronda_frame::{Arity, Dataset, Frame, Result, RondaError, keys::numeric_values, stats::Moments};

/// Name of the profit column.
pub const PROFIT_COLUMN: &str = "profit";

/// Per-period profit `Σ w·r / Σ w` of a panel.
///
/// A panel with a single value column is read as forward returns held in
/// equal weight, so both column names may be omitted. Otherwise both are
/// required. Pairs with a non-finite member are skipped.
///
/// # Errors
///
/// - [`RondaError::Shape`] unless `frame` is a panel
/// - [`RondaError::InvalidData`] if a multi-column panel lacks a weight or
///   forward column name
pub fn weighted_profit(frame: &Frame, weight: Option<&str>, forward: Option<&str>) -> Result<Dataset> {
    let (time, _) = frame.require_panel("profit")?;
    let periods = frame.periods()?;
    let data = periods.data();

    let profits: Vec<f64> = match (weight, forward, frame.dataset().arity()) {
        (Some(weight), Some(forward), _) => {
            let w = numeric_values(data, weight)?;
            let r = numeric_values(data, forward)?;
            periods
                .periods()
                .iter()
                .map(|p| {
                    let (num, den) = w[p.offset..p.end()]
                        .iter()
                        .zip(&r[p.offset..p.end()])
                        .filter(|(w, r)| w.is_finite() && r.is_finite())
                        .fold((0.0, 0.0), |(num, den), (w, r)| (num + w * r, den + w));
                    if den == 0.0 { f64::NAN } else { num / den }
                })
                .collect()
        }
        (None, forward, Arity::Series) => {
            let column = match forward {
                Some(name) => name.to_string(),
                None => frame.value_columns()[0].to_string(),
            };
            let r = numeric_values(data, &column)?;
            periods
                .periods()
                .iter()
                .map(|p| Moments::of(&r[p.offset..p.end()]).mean)
                .collect()
        }
        _ => {
            return Err(RondaError::InvalidData(
                "profit of a multi-column panel needs weight and forward columns".to_string(),
            ));
        }
    };

    debug!("profit over {} periods", profits.len());
    let df = DataFrame::new(vec![
        periods.keys()?,
        Column::new(PROFIT_COLUMN.into(), profits),
    ])?;
    Dataset::new(df, [time.clone()])
}
