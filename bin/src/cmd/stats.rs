//! Statistics command implementations.

use crate::data;
use anyhow::Result;
use ronda_eval::{CorrMethod, Correlation, Describer, Regressor, quantile_layers, weighted_profit};
use ronda_frame::Frame;
use std::path::Path;

/// Correlation matrices, or their t-statistic for a panel.
pub(crate) fn corr(frame: &Frame, method: CorrMethod, tstat: bool) -> Result<()> {
    let correlation = frame.corr(method)?;
    let dataset = if tstat {
        Correlation::Single(correlation.t_stat()?).to_dataset()?
    } else {
        correlation.to_dataset()?
    };
    data::write_csv(dataset)?;
    Ok(())
}

/// IC of a factor against a forward return.
pub(crate) fn ic(
    frame: &Frame,
    factor: &str,
    forward: &str,
    method: CorrMethod,
    grouper: Option<&Path>,
) -> Result<()> {
    let grouper = grouper.map(data::load_grouper).transpose()?;
    data::write_csv(frame.ic(factor, forward, method, grouper.as_ref())?)?;
    Ok(())
}

/// OLS of a target on the other numeric columns.
pub(crate) fn ols(frame: &Frame, target: &str) -> Result<()> {
    data::write_csv(frame.ols(target)?)?;
    Ok(())
}

/// Quantile layering of a factor.
pub(crate) fn layering(frame: &Frame, factor: &str, forward: &str, quantiles: usize) -> Result<()> {
    data::write_csv(quantile_layers(frame, factor, forward, quantiles)?)?;
    Ok(())
}

/// Weighted per-period profit.
pub(crate) fn profit(frame: &Frame, weight: Option<&str>, forward: Option<&str>) -> Result<()> {
    data::write_csv(weighted_profit(frame, weight, forward)?)?;
    Ok(())
}
