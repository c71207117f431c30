use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;

use super::model::{BackgroundCurve, BackgroundSample, Spectrum, SpectrumSample};

// ---------------------------------------------------------------------------
// Synthetic SR1-like input tables
// ---------------------------------------------------------------------------

/// Smooth falling background with a mild low-energy rise [events/(t·y·keV)].
pub fn background_model(energy: f64) -> f64 {
    76.0 + 0.12 * (energy - 15.0) + 8.0 * (-energy / 3.0).exp()
}

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Background sampled every keV over [0, 30].
pub fn generate_background() -> BackgroundCurve {
    BackgroundCurve::new(
        (0..=30)
            .map(|i| {
                let energy = i as f64;
                BackgroundSample {
                    energy,
                    rate: background_model(energy),
                }
            })
            .collect(),
    )
}

/// One bin per keV from 1.5 to 29.5 keV with a small excess near 2.3 keV.
///
/// Bounds are a ±1σ Gaussian interval of the per-bin rate uncertainty and
/// the residual is the pull against [`background_model`].
pub fn generate_spectrum<R: Rng>(rng: &mut R) -> Spectrum {
    let sigma_rate = 9.0;
    Spectrum::new(
        (0..29)
            .map(|i| {
                let energy = 1.5 + i as f64;
                let expected = background_model(energy);
                let noise: f64 = rng.sample(StandardNormal);
                let rate = expected + gaussian(energy, 2.3, 0.6, 18.0) + sigma_rate * noise;
                SpectrumSample {
                    energy,
                    rate,
                    upper: rate + sigma_rate,
                    lower: rate - sigma_rate,
                    residual: (rate - expected) / sigma_rate,
                }
            })
            .collect(),
    )
}

/// Both tables from one seed.
pub fn generate(seed: u64) -> (Spectrum, BackgroundCurve) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (generate_spectrum(&mut rng), generate_background())
}

/// Write a spectrum in the five-column whitespace layout.
pub fn write_spectrum(path: &Path, spectrum: &Spectrum) -> Result<()> {
    let mut out = String::new();
    for s in &spectrum.samples {
        let _ = writeln!(
            out,
            "{:.6} {:.6} {:.6} {:.6} {:.6}",
            s.energy, s.rate, s.upper, s.lower, s.residual
        );
    }
    std::fs::write(path, out).with_context(|| format!("writing {}", path.display()))
}

/// Write a background curve in the two-column whitespace layout.
pub fn write_background(path: &Path, background: &BackgroundCurve) -> Result<()> {
    let mut out = String::new();
    for s in &background.samples {
        let _ = writeln!(out, "{:.6} {:.6}", s.energy, s.rate);
    }
    std::fs::write(path, out).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_tables() {
        assert_eq!(generate(42), generate(42));
        assert_ne!(generate(42).0, generate(43).0);
    }

    #[test]
    fn noise_is_roughly_unit_pull() {
        // Pulls away from the excess are plain N(0, 1) draws.
        let pulls: Vec<f64> = (0..40)
            .flat_map(|seed| generate(seed).0.samples)
            .filter(|s| s.energy > 6.0)
            .map(|s| s.residual)
            .collect();
        let n = pulls.len() as f64;
        let mean = pulls.iter().sum::<f64>() / n;
        let var = pulls.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n;
        assert!(mean.abs() < 0.15, "mean {mean}");
        assert!((var - 1.0).abs() < 0.2, "variance {var}");
    }

    #[test]
    fn spectrum_bounds_bracket_rate() {
        let (sp, bg) = generate(7);
        assert_eq!(sp.len(), 29);
        assert_eq!(bg.len(), 31);
        for s in &sp.samples {
            assert!(s.lower < s.rate && s.rate < s.upper);
        }
    }
}
