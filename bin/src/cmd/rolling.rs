//! Rolling command implementation.

use crate::data;
use anyhow::Result;
use clap::ValueEnum;
use ronda_calc::{Calculator, Window, WindowOutput, unit};
use ronda_frame::Frame;
use std::path::Path;

/// Built-in unit functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Unit {
    /// Column means
    Mean,
    /// Column sums
    Sum,
    /// Sample standard deviations
    Std,
    /// Last row
    Last,
    /// Per-entity means
    EntityMean,
}

impl Unit {
    fn function(self) -> fn(&Window<'_>) -> ronda_frame::Result<WindowOutput> {
        match self {
            Self::Mean => unit::mean,
            Self::Sum => unit::sum,
            Self::Std => unit::std,
            Self::Last => unit::last,
            Self::EntityMean => unit::entity_mean,
        }
    }
}

/// Roll a built-in unit function over the frame.
pub(crate) fn rolling(frame: &Frame, window: usize, unit: Unit, grouper: Option<&Path>) -> Result<()> {
    let grouper = grouper.map(data::load_grouper).transpose()?;
    let result = frame.rolling(window, grouper.as_ref(), unit.function())?;
    data::write_csv(result)?;
    Ok(())
}
