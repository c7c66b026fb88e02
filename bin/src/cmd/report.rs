//! Report command implementation.

use crate::data;
use anyhow::{Context, Result};
use clap::ValueEnum;
use ronda_eval::{CorrMethod, EvaluatorConfig, FactorReport};
use ronda_frame::Frame;
use std::path::Path;

/// Which table of a report to print.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Part {
    /// IC summary
    Summary,
    /// Per-period IC
    Ic,
    /// Per-period regression
    Regression,
    /// Quantile layers
    Layers,
}

/// Load an evaluator configuration, or the default without a file.
pub(crate) fn load_config(path: Option<&Path>) -> Result<EvaluatorConfig> {
    let Some(path) = path else {
        return Ok(EvaluatorConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    Ok(config)
}

/// Evaluate one factor and print the requested table.
pub(crate) fn report(
    frame: &Frame,
    factor: &str,
    forward: &str,
    config: Option<&Path>,
    method: Option<CorrMethod>,
    quantiles: Option<usize>,
    part: Part,
) -> Result<()> {
    let mut config = load_config(config)?;
    if let Some(method) = method {
        config.method = method;
    }
    if let Some(quantiles) = quantiles {
        config.quantiles = quantiles;
    }

    let report = FactorReport::run(frame, factor, forward, &config)?;
    let dataset = match part {
        Part::Summary => report.summary.to_dataset()?,
        Part::Ic => report.ic,
        Part::Regression => report.regression,
        Part::Layers => report.layers,
    };
    data::write_csv(dataset)?;
    Ok(())
}
