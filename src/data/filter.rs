use serde::{Deserialize, Serialize};

use super::model::{Spectrum, SpectrumSample};

// ---------------------------------------------------------------------------
// Energy window predicate
// ---------------------------------------------------------------------------

/// Open energy interval `(lo, hi)` in keV. Both edges are excluded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyWindow {
    pub lo: f64,
    pub hi: f64,
}

impl Default for EnergyWindow {
    fn default() -> Self {
        EnergyWindow { lo: 1.0, hi: 7.0 }
    }
}

impl EnergyWindow {
    pub fn new(lo: f64, hi: f64) -> Self {
        EnergyWindow { lo, hi }
    }

    /// Strict on both sides.
    pub fn contains(&self, energy: f64) -> bool {
        self.lo < energy && energy < self.hi
    }

    pub fn width(&self) -> f64 {
        self.hi - self.lo
    }
}

/// Return indices of samples whose energy lies inside `window`.
pub fn filtered_indices(spectrum: &Spectrum, window: &EnergyWindow) -> Vec<usize> {
    spectrum
        .samples
        .iter()
        .enumerate()
        .filter(|(_, s)| window.contains(s.energy))
        .map(|(i, _)| i)
        .collect()
}

/// Iterate the samples inside `window`, in file order.
pub fn in_window<'a>(
    spectrum: &'a Spectrum,
    window: &'a EnergyWindow,
) -> impl Iterator<Item = &'a SpectrumSample> + 'a {
    spectrum
        .samples
        .iter()
        .filter(move |s| window.contains(s.energy))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(energy: f64) -> SpectrumSample {
        SpectrumSample {
            energy,
            rate: 1.0,
            upper: 1.0,
            lower: 1.0,
            residual: 0.0,
        }
    }

    #[test]
    fn edges_are_excluded() {
        let w = EnergyWindow::default();
        assert!(!w.contains(1.0));
        assert!(!w.contains(7.0));
        assert!(w.contains(1.0 + f64::EPSILON * 4.0));
        assert!(w.contains(6.999));
    }

    #[test]
    fn indices_keep_file_order() {
        let sp = Spectrum::new(
            [0.5, 1.0, 3.0, 7.0, 2.0, 9.0]
                .into_iter()
                .map(sample)
                .collect(),
        );
        assert_eq!(filtered_indices(&sp, &EnergyWindow::default()), vec![2, 4]);
        assert_eq!(in_window(&sp, &EnergyWindow::default()).count(), 2);
    }
}
