//! Small statistical helpers shared across the workspace.
//!
//! All helpers ignore non-finite values, matching how the research scripts
//! skip missing observations.

/// Minimum threshold for standard deviation to avoid division by zero.
/// Values below this threshold are treated as zero variance.
pub const MIN_STD_THRESHOLD: f64 = 1e-10;

/// Mean and sample standard deviation of the finite values in a slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    /// Mean of the finite values (NaN if there are none).
    pub mean: f64,
    /// Sample standard deviation, N-1 denominator (NaN below two values).
    pub std: f64,
    /// Number of finite values.
    pub n: usize,
}

impl Moments {
    /// Computes the moments of `values`, skipping NaN and infinities.
    ///
    /// # Examples
    ///
    /// ```
    /// use ronda_frame::stats::Moments;
    ///
    /// let m = Moments::of(&[1.0, 2.0, f64::NAN, 3.0]);
    /// assert_eq!(m.n, 3);
    /// assert!((m.mean - 2.0).abs() < 1e-12);
    /// assert!((m.std - 1.0).abs() < 1e-12);
    /// ```
    pub fn of(values: &[f64]) -> Self {
        let finite: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
        let n = finite.len();

        if n == 0 {
            return Self {
                mean: f64::NAN,
                std: f64::NAN,
                n,
            };
        }

        let mean = finite.iter().sum::<f64>() / n as f64;

        // Sample variance with N-1 denominator (Bessel's correction)
        let std = if n > 1 {
            (finite.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
        } else {
            f64::NAN
        };

        Self { mean, std, n }
    }

    /// Mean divided by standard deviation, scaled by `sqrt(n)`.
    ///
    /// This is the t-statistic of a time-averaged quantity. Degenerate
    /// cases (zero or undefined dispersion) give NaN rather than infinity.
    pub fn t_stat(&self) -> f64 {
        if !self.std.is_finite() || self.std < MIN_STD_THRESHOLD {
            return f64::NAN;
        }
        self.mean / self.std * (self.n as f64).sqrt()
    }
}

/// Sum of the finite values (0 for none).
pub fn finite_sum(values: &[f64]) -> f64 {
    values.iter().filter(|x| x.is_finite()).sum()
}
