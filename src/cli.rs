use std::path::PathBuf;

use clap::Args;

use crate::config::AnalysisConfig;

/// Flags shared by both figure binaries. Unset flags keep the defaults of
/// [`AnalysisConfig`].
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Five-column spectrum table (energy, rate, upper, lower, residual)
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Two-column background table (energy, rate)
    #[arg(long)]
    pub background: Option<PathBuf>,

    /// Figure to write (.pdf, or .svg for SVG)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Exposure in tonne-years
    #[arg(long)]
    pub exposure: Option<f64>,

    /// Lower edge of the energy window [keV], excluded
    #[arg(long)]
    pub window_lo: Option<f64>,

    /// Upper edge of the energy window [keV], excluded
    #[arg(long)]
    pub window_hi: Option<f64>,

    /// Also write a JSON summary of the run
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

impl RunArgs {
    pub fn to_config(&self) -> AnalysisConfig {
        let mut cfg = AnalysisConfig::default();
        if let Some(v) = &self.data {
            cfg.data_path = v.clone();
        }
        if let Some(v) = &self.background {
            cfg.background_path = v.clone();
        }
        if let Some(v) = &self.output {
            cfg.output_path = v.clone();
        }
        if let Some(v) = self.exposure {
            cfg.exposure = v;
        }
        if let Some(v) = self.window_lo {
            cfg.window.lo = v;
        }
        if let Some(v) = self.window_hi {
            cfg.window.hi = v;
        }
        cfg
    }
}
