//! Quantile layering.
//!
//! Within every period, entities are split into equal-count buckets by the
//! rank of their factor value (bucket 1 holds the lowest values). Each
//! bucket's profit is the mean forward return of its members, compounded
//! across periods into `cum_profit`.

use crate::corr::ranks;
use log::debug;
use polars::prelude::*;
use ronda_frame::{Dataset, Frame, Result, RondaError, keys::numeric_values, stats::Moments};

/// Name of the bucket column.
pub const QUANTILE_COLUMN: &str = "quantile";

/// Bucket (1-based) of each value; `None` for non-finite values.
fn buckets(values: &[f64], quantiles: usize) -> Vec<Option<usize>> {
    let finite: Vec<(usize, f64)> = values
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .collect();
    let m = finite.len();
    let rank = ranks(&finite.iter().map(|(_, v)| *v).collect::<Vec<_>>());

    let mut out = vec![None; values.len()];
    for ((row, _), r) in finite.iter().zip(rank) {
        let bucket = (r * quantiles as f64 / m as f64).floor() as usize + 1;
        out[*row] = Some(bucket.min(quantiles));
    }
    out
}

/// Mean forward return per factor bucket and period, plus its compounded
/// value.
///
/// The result is indexed by `(quantile, time)` with columns `profit` and
/// `cum_profit`. Periods where a bucket is empty have NaN profit and do not
/// move the compounded value.
///
/// # Errors
///
/// - [`RondaError::Shape`] unless `frame` is a panel
/// - [`RondaError::InvalidData`] for zero quantiles
/// - [`RondaError::MissingColumn`] if either column is absent
pub fn quantile_layers(
    frame: &Frame,
    factor: &str,
    forward: &str,
    quantiles: usize,
) -> Result<Dataset> {
    let (time, _) = frame.require_panel("quantile layering")?;
    if quantiles == 0 {
        return Err(RondaError::InvalidData(
            "quantile layering needs at least one bucket".to_string(),
        ));
    }

    let periods = frame.periods()?;
    let data = periods.data();
    let x = numeric_values(data, factor)?;
    let y = numeric_values(data, forward)?;

    // profit[q][period]
    let mut profit = vec![Vec::with_capacity(periods.len()); quantiles];
    for p in periods.periods() {
        let range = p.offset..p.end();
        let assigned = buckets(&x[range.clone()], quantiles);
        for (q, series) in profit.iter_mut().enumerate() {
            let members: Vec<f64> = assigned
                .iter()
                .zip(&y[range.clone()])
                .filter(|(b, _)| **b == Some(q + 1))
                .map(|(_, r)| *r)
                .collect();
            series.push(Moments::of(&members).mean);
        }
    }

    let mut cum_profit = Vec::with_capacity(quantiles * periods.len());
    for series in &profit {
        let mut level = 1.0;
        for r in series {
            if r.is_finite() {
                level *= 1.0 + r;
                cum_profit.push(level);
            } else {
                cum_profit.push(f64::NAN);
            }
        }
    }

    let keys = periods.keys()?.as_materialized_series().clone();
    let mut stacked = keys.clone();
    for _ in 1..quantiles {
        stacked.append(&keys)?;
    }
    let labels: Vec<u32> = (1..=quantiles as u32)
        .flat_map(|q| std::iter::repeat_n(q, periods.len()))
        .collect();

    debug!(
        "layered {} into {} buckets over {} periods",
        factor,
        quantiles,
        periods.len()
    );

    let df = DataFrame::new(vec![
        Column::new(QUANTILE_COLUMN.into(), labels),
        stacked.into_column(),
        Column::new("profit".into(), profit.concat()),
        Column::new("cum_profit".into(), cum_profit),
    ])?;
    Dataset::new(df, [QUANTILE_COLUMN.into(), time.clone()])
}
