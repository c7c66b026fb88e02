//! Rolling aggregation as a method on [`Frame`].

use crate::{Grouper, Rolling, RollingConfig, Window, WindowOutput};
use ronda_frame::{Dataset, Frame, Result};

/// Windowed computations on shape-tagged frames.
///
/// # Examples
///
/// ```no_run
/// use ronda_calc::{Calculator, unit};
/// use ronda_frame::Frame;
///
/// # fn run(prices: &Frame) -> ronda_frame::Result<()> {
/// let smoothed = prices.rolling(10, None, unit::entity_mean)?;
/// # Ok(())
/// # }
/// ```
pub trait Calculator {
    /// Runs `unit` over windows of `window` distinct temporal keys.
    ///
    /// See [`Rolling::apply`].
    fn rolling<F>(&self, window: usize, grouper: Option<&Grouper>, unit: F) -> Result<Dataset>
    where
        F: FnMut(&Window<'_>) -> Result<WindowOutput>;

    /// Runs `unit` with an explicit context under the given configuration.
    ///
    /// See [`Rolling::apply_with`].
    fn rolling_with<C, F>(
        &self,
        config: &RollingConfig,
        grouper: Option<&Grouper>,
        context: &C,
        unit: F,
    ) -> Result<Dataset>
    where
        F: FnMut(&Window<'_>, &C) -> Result<WindowOutput>;
}

impl Calculator for Frame {
    fn rolling<F>(&self, window: usize, grouper: Option<&Grouper>, unit: F) -> Result<Dataset>
    where
        F: FnMut(&Window<'_>) -> Result<WindowOutput>,
    {
        crate::rolling(self, window, grouper, unit)
    }

    fn rolling_with<C, F>(
        &self,
        config: &RollingConfig,
        grouper: Option<&Grouper>,
        context: &C,
        unit: F,
    ) -> Result<Dataset>
    where
        F: FnMut(&Window<'_>, &C) -> Result<WindowOutput>,
    {
        Rolling::new(config.clone()).apply_with(self, grouper, context, unit)
    }
}
