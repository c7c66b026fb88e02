//! Windowed aggregation for ronda.
//!
//! This crate rolls a caller-supplied *unit function* over consecutive
//! windows of distinct temporal keys of a time-series or panel [`Frame`],
//! optionally split by an entity [`Grouper`], and stacks the per-window
//! results back into one [`Dataset`].
//!
//! It also carries the preprocessing steps that feed those windows:
//! calendar resampling, bucket and forward returns, and differencing of
//! cumulative columns.
//!
//! # Examples
//!
//! ```rust,no_run
//! use ronda_calc::{Calculator, Grouper, unit};
//! use ronda_frame::{Dataset, Frame};
//! use polars::prelude::*;
//!
//! # fn main() -> ronda_frame::Result<()> {
//! let df = CsvReadOptions::default()
//!     .try_into_reader_with_file_path(Some("prices.csv".into()))?
//!     .finish()?;
//! let panel = Frame::new(Dataset::panel(df, "date", "asset")?)?;
//!
//! let industry: Grouper = [("AAPL", "tech"), ("XOM", "energy")].into_iter().collect();
//! let by_industry = panel.rolling(20, Some(&industry), unit::mean)?;
//! # Ok(())
//! # }
//! ```
//!
//! [`Frame`]: ronda_frame::Frame
//! [`Dataset`]: ronda_frame::Dataset

mod calculator;
mod grouper;
mod processor;
mod rolling;
pub mod unit;

pub use calculator::Calculator;
pub use grouper::Grouper;
pub use processor::{
    Aggregation, FORWARD_COLUMN, Processor, RETURN_COLUMN, cum_to_diff, price_to_forward,
    price_to_return, resample,
};
/// Bucket labelling used by [`resample`].
pub use polars::prelude::Label;
pub use rolling::{Rolling, RollingConfig, Window, WindowOutput, rolling};
