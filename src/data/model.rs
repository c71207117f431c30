use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SpectrumSample – one measured energy bin
// ---------------------------------------------------------------------------

/// One row of the measured spectrum table.
///
/// `upper` and `lower` are absolute bounds on `rate`, not error sizes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumSample {
    /// Bin energy [keV].
    pub energy: f64,
    /// Measured rate [events/(t·y·keV)].
    pub rate: f64,
    /// Upper bound of the rate interval.
    pub upper: f64,
    /// Lower bound of the rate interval.
    pub lower: f64,
    /// Residual significance of the bin against the background [σ].
    pub residual: f64,
}

impl SpectrumSample {
    /// Distance from the rate down to the lower bound.
    pub fn lower_error(&self) -> f64 {
        self.rate - self.lower
    }

    /// Distance from the rate up to the upper bound.
    pub fn upper_error(&self) -> f64 {
        self.upper - self.rate
    }
}

// ---------------------------------------------------------------------------
// BackgroundSample – one point of the B0 curve
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackgroundSample {
    pub energy: f64,
    pub rate: f64,
}

// ---------------------------------------------------------------------------
// Spectrum – the complete measured table
// ---------------------------------------------------------------------------

/// The measured spectrum in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Spectrum {
    pub samples: Vec<SpectrumSample>,
}

impl Spectrum {
    pub fn new(samples: Vec<SpectrumSample>) -> Self {
        Spectrum { samples }
    }

    /// Build from the five raw columns of a table row.
    pub(crate) fn from_rows(rows: &[Vec<f64>]) -> Self {
        let samples = rows
            .iter()
            .map(|r| SpectrumSample {
                energy: r[0],
                rate: r[1],
                upper: r[2],
                lower: r[3],
                residual: r[4],
            })
            .collect();
        Spectrum { samples }
    }

    pub fn energies(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.energy).collect()
    }

    pub fn rates(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.rate).collect()
    }

    pub fn residuals(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.residual).collect()
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the spectrum is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// ---------------------------------------------------------------------------
// BackgroundCurve – sparse sampling of the background model
// ---------------------------------------------------------------------------

/// Background model samples in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackgroundCurve {
    pub samples: Vec<BackgroundSample>,
}

impl BackgroundCurve {
    pub fn new(samples: Vec<BackgroundSample>) -> Self {
        BackgroundCurve { samples }
    }

    /// Build from the two raw columns of a table row.
    pub(crate) fn from_rows(rows: &[Vec<f64>]) -> Self {
        let samples = rows
            .iter()
            .map(|r| BackgroundSample {
                energy: r[0],
                rate: r[1],
            })
            .collect();
        BackgroundCurve { samples }
    }

    pub fn energies(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.energy).collect()
    }

    pub fn rates(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.rate).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_sizes_follow_bounds() {
        let s = SpectrumSample {
            energy: 2.0,
            rate: 10.0,
            upper: 12.5,
            lower: 7.0,
            residual: 0.5,
        };
        assert_eq!(s.lower_error(), 3.0);
        assert_eq!(s.upper_error(), 2.5);
    }

    #[test]
    fn columns_preserve_file_order() {
        let sp = Spectrum::from_rows(&[
            vec![5.0, 20.0, 22.0, 18.0, -0.3],
            vec![2.0, 10.0, 12.0, 8.0, 0.5],
        ]);
        assert_eq!(sp.energies(), vec![5.0, 2.0]);
        assert_eq!(sp.rates(), vec![20.0, 10.0]);
        assert_eq!(sp.residuals(), vec![-0.3, 0.5]);
    }
}
