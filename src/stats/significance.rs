use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::spline::{CubicSpline, SplineError};
use crate::data::filter::{EnergyWindow, filtered_indices, in_window};
use crate::data::model::{BackgroundCurve, Spectrum};

/// SR1 exposure [tonne-years].
pub const SR1_EXPOSURE: f64 = 0.65;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignificanceError {
    #[error("background interpolation failed: {0}")]
    Spline(#[from] SplineError),
    #[error("expected count must be positive and finite, got {0}")]
    NonPositiveExpectation(f64),
}

/// Observed vs. expected counts in an energy window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Significance {
    pub observed: f64,
    pub expected: f64,
    pub z: f64,
    /// Spectrum samples that fell inside the window.
    pub samples_in_window: usize,
}

/// Σ rate inside the window, scaled by exposure.
pub fn observed_counts(spectrum: &Spectrum, window: &EnergyWindow, exposure: f64) -> f64 {
    in_window(spectrum, window).map(|s| s.rate).sum::<f64>() * exposure
}

/// ∫ B(E) dE over the window, scaled by exposure. B is a cubic spline
/// through the background samples.
pub fn expected_counts(
    background: &BackgroundCurve,
    window: &EnergyWindow,
    exposure: f64,
) -> Result<f64, SignificanceError> {
    let spline = CubicSpline::new(&background.energies(), &background.rates())?;
    Ok(spline.integrate(window.lo, window.hi)? * exposure)
}

/// `(observed - expected) / sqrt(expected)`.
pub fn z_score(observed: f64, expected: f64) -> Result<f64, SignificanceError> {
    if !(expected.is_finite() && expected > 0.0) {
        return Err(SignificanceError::NonPositiveExpectation(expected));
    }
    Ok((observed - expected) / expected.sqrt())
}

/// Full calculation for one spectrum/background pair.
pub fn compute(
    spectrum: &Spectrum,
    background: &BackgroundCurve,
    window: &EnergyWindow,
    exposure: f64,
) -> Result<Significance, SignificanceError> {
    let samples_in_window = filtered_indices(spectrum, window).len();
    if samples_in_window == 0 {
        log::warn!(
            "No spectrum samples inside ({}, {}) keV",
            window.lo,
            window.hi
        );
    }
    log::debug!(
        "{samples_in_window} of {} samples inside ({}, {}) keV",
        spectrum.len(),
        window.lo,
        window.hi
    );

    let observed = observed_counts(spectrum, window, exposure);
    let expected = expected_counts(background, window, exposure)?;
    let z = z_score(observed, expected)?;

    Ok(Significance {
        observed,
        expected,
        z,
        samples_in_window,
    })
}
