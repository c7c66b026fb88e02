//! Preprocessing command implementations.

use crate::data;
use anyhow::Result;
use clap::ValueEnum;
use ronda_calc::{Aggregation, Label, Processor};
use ronda_frame::Frame;

/// Bucket reductions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Agg {
    /// First row
    First,
    /// Last row
    Last,
    /// Mean
    Mean,
    /// Sum
    Sum,
    /// Minimum
    Min,
    /// Maximum
    Max,
}

impl From<Agg> for Aggregation {
    fn from(agg: Agg) -> Self {
        match agg {
            Agg::First => Self::First,
            Agg::Last => Self::Last,
            Agg::Mean => Self::Mean,
            Agg::Sum => Self::Sum,
            Agg::Min => Self::Min,
            Agg::Max => Self::Max,
        }
    }
}

/// Resample to calendar buckets.
pub(crate) fn resample(frame: &Frame, every: &str, agg: Agg, left: bool) -> Result<()> {
    let label = if left { Label::Left } else { Label::Right };
    data::write_csv(frame.resample(every, label, agg.into())?)?;
    Ok(())
}

/// Bucket returns from prices, keyed by bucket end, or forward returns
/// keyed by bucket start.
pub(crate) fn returns(frame: &Frame, every: &str, open: &str, close: &str, forward: bool) -> Result<()> {
    let dataset = if forward {
        frame.price_to_forward(every, open, close)?
    } else {
        frame.price_to_return(every, open, close)?
    };
    data::write_csv(dataset)?;
    Ok(())
}

/// Differences of cumulative columns.
pub(crate) fn diff(frame: &Frame, period: usize, keep: bool) -> Result<()> {
    data::write_csv(frame.cum_to_diff(period, keep)?)?;
    Ok(())
}
