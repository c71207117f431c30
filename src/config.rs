use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::color::{FigurePalette, parse_hex};
use crate::data::filter::EnergyWindow;
use crate::stats::significance::SR1_EXPOSURE;

/// Hex colours used by the figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureStyle {
    pub background_line: String,
    pub data: String,
    pub outer_band: String,
    pub inner_band: String,
}

impl Default for FigureStyle {
    fn default() -> Self {
        Self {
            background_line: "#FF0000".to_string(),
            data: "#000000".to_string(),
            outer_band: "#CCF24C".to_string(),
            inner_band: "#FFFF7F".to_string(),
        }
    }
}

impl FigureStyle {
    pub fn resolve(&self) -> anyhow::Result<FigurePalette> {
        Ok(FigurePalette {
            background_line: parse_hex(&self.background_line)?,
            data: parse_hex(&self.data)?,
            outer_band: parse_hex(&self.outer_band)?,
            inner_band: parse_hex(&self.inner_band)?,
        })
    }
}

/// Inputs, outputs and constants for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Five-column spectrum table.
    pub data_path: PathBuf,
    /// Two-column background table.
    pub background_path: PathBuf,
    /// Vector figure to write.
    pub output_path: PathBuf,
    /// Exposure [tonne-years]
    pub exposure: f64,
    pub window: EnergyWindow,
    pub style: FigureStyle,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("fig_4.dat"),
            background_path: PathBuf::from("b0.txt"),
            output_path: PathBuf::from("fig_4.pdf"),
            exposure: SR1_EXPOSURE,
            window: EnergyWindow::default(),
            style: FigureStyle::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.exposure.is_finite() && self.exposure > 0.0,
            "exposure must be > 0"
        );
        anyhow::ensure!(
            self.window.lo < self.window.hi,
            "energy window must satisfy lo < hi"
        );
        self.style.resolve()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_the_published_setup() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.data_path, PathBuf::from("fig_4.dat"));
        assert_eq!(cfg.background_path, PathBuf::from("b0.txt"));
        assert_eq!(cfg.output_path, PathBuf::from("fig_4.pdf"));
        assert_eq!(cfg.exposure, 0.65);
        assert_eq!(cfg.window, EnergyWindow::new(1.0, 7.0));
        cfg.validate().unwrap();
    }

    #[test]
    fn rejects_bad_values() {
        let mut cfg = AnalysisConfig::default();
        cfg.exposure = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = AnalysisConfig::default();
        cfg.window = EnergyWindow::new(7.0, 1.0);
        assert!(cfg.validate().is_err());

        let mut cfg = AnalysisConfig::default();
        cfg.style.inner_band = "yellowish".to_string();
        assert!(cfg.validate().is_err());
    }
}
