use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use super::quadrature;

/// Fewest knots a not-a-knot cubic spline can be built from.
pub const MIN_POINTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SplineError {
    #[error("cubic spline needs at least 4 points, got {0}")]
    TooFewPoints(usize),
    #[error("x has {x} values but y has {y}")]
    LengthMismatch { x: usize, y: usize },
    #[error("duplicate abscissa {0}")]
    DuplicateAbscissa(f64),
    #[error("non-finite sample at index {0}")]
    NonFinite(usize),
    #[error("{x} is outside the interpolation range [{lo}, {hi}]")]
    OutOfRange { x: f64, lo: f64, hi: f64 },
    #[error("spline system is singular")]
    Singular,
}

/// C² piecewise cubic interpolant with not-a-knot end conditions.
///
/// Stored as knot positions, knot values and the second derivative at each
/// knot. Evaluation outside `[x[0], x[n-1]]` is rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    m: Vec<f64>,
}

impl CubicSpline {
    /// Fit through `(x[i], y[i])`. Points may arrive in any order.
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self, SplineError> {
        if x.len() != y.len() {
            return Err(SplineError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        let n = x.len();
        if n < MIN_POINTS {
            return Err(SplineError::TooFewPoints(n));
        }
        if let Some(i) = x
            .iter()
            .zip(y)
            .position(|(a, b)| !a.is_finite() || !b.is_finite())
        {
            return Err(SplineError::NonFinite(i));
        }

        let mut pts: Vec<(f64, f64)> = x.iter().copied().zip(y.iter().copied()).collect();
        pts.sort_by(|a, b| a.0.total_cmp(&b.0));
        if let Some(w) = pts.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(SplineError::DuplicateAbscissa(w[0].0));
        }
        let (x, y): (Vec<f64>, Vec<f64>) = pts.into_iter().unzip();

        let m = solve_second_derivatives(&x, &y)?;
        log::debug!(
            "Built cubic spline over [{}, {}] with {n} knots",
            x[0],
            x[n - 1]
        );
        Ok(CubicSpline { x, y, m })
    }

    /// Interpolation range `(lo, hi)`.
    pub fn range(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    /// Sorted knot positions.
    pub fn knots(&self) -> &[f64] {
        &self.x
    }

    fn check_range(&self, x: f64) -> Result<(), SplineError> {
        let (lo, hi) = self.range();
        if x.is_nan() || x < lo || x > hi {
            return Err(SplineError::OutOfRange { x, lo, hi });
        }
        Ok(())
    }

    /// Value at `x`.
    pub fn eval(&self, x: f64) -> Result<f64, SplineError> {
        self.check_range(x)?;
        Ok(self.eval_in_range(x))
    }

    fn eval_in_range(&self, x: f64) -> f64 {
        let last = self.x.len() - 2;
        let i = self.x.partition_point(|&k| k <= x).saturating_sub(1).min(last);

        let (x0, x1) = (self.x[i], self.x[i + 1]);
        let (y0, y1) = (self.y[i], self.y[i + 1]);
        let (m0, m1) = (self.m[i], self.m[i + 1]);
        let h = x1 - x0;
        let a = x1 - x;
        let b = x - x0;

        m0 * a.powi(3) / (6.0 * h)
            + m1 * b.powi(3) / (6.0 * h)
            + (y0 / h - m0 * h / 6.0) * a
            + (y1 / h - m1 * h / 6.0) * b
    }

    /// Definite integral over `[a, b]` by adaptive quadrature, split at the
    /// knots so each piece integrates a single cubic.
    pub fn integrate(&self, a: f64, b: f64) -> Result<f64, SplineError> {
        self.check_range(a)?;
        self.check_range(b)?;
        Ok(quadrature::integrate_piecewise(
            |x| self.eval_in_range(x),
            &self.x,
            a,
            b,
            quadrature::DEFAULT_ABS_TOL,
        ))
    }
}

/// Second derivatives at the knots. Interior rows enforce C² continuity; the
/// first and last rows make the third derivative continuous across the
/// second and penultimate knots.
fn solve_second_derivatives(x: &[f64], y: &[f64]) -> Result<Vec<f64>, SplineError> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

    let mut a = DMatrix::<f64>::zeros(n, n);
    let mut rhs = DVector::<f64>::zeros(n);

    a[(0, 0)] = h[1];
    a[(0, 1)] = -(h[0] + h[1]);
    a[(0, 2)] = h[0];

    for i in 1..n - 1 {
        a[(i, i - 1)] = h[i - 1];
        a[(i, i)] = 2.0 * (h[i - 1] + h[i]);
        a[(i, i + 1)] = h[i];
        rhs[i] = 6.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]);
    }

    a[(n - 1, n - 3)] = h[n - 2];
    a[(n - 1, n - 2)] = -(h[n - 3] + h[n - 2]);
    a[(n - 1, n - 1)] = h[n - 3];

    let m = a.lu().solve(&rhs).ok_or(SplineError::Singular)?;
    if m.iter().any(|v| !v.is_finite()) {
        return Err(SplineError::Singular);
    }
    Ok(m.iter().copied().collect())
}
