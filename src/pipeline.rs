use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::data::loader::{load_background, load_spectrum};
use crate::data::model::{BackgroundCurve, Spectrum};
use crate::render::render_figure;
use crate::stats::significance::{self, Significance};

// ---------------------------------------------------------------------------
// Run variants
// ---------------------------------------------------------------------------

/// Which outputs a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Variant {
    /// Excess significance, then the figure.
    WithSignificance,
    /// Figure only.
    FigureOnly,
}

/// Both input tables, loaded once.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub spectrum: Spectrum,
    pub background: BackgroundCurve,
}

/// What a run did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub config: AnalysisConfig,
    pub variant: Variant,
    pub spectrum_rows: usize,
    pub background_points: usize,
    pub significance: Option<Significance>,
    pub figure_path: PathBuf,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub fn load_inputs(cfg: &AnalysisConfig) -> Result<Inputs> {
    Ok(Inputs {
        spectrum: load_spectrum(&cfg.data_path)?,
        background: load_background(&cfg.background_path)?,
    })
}

/// Load, optionally compute the significance, render.
pub fn run(cfg: &AnalysisConfig, variant: Variant) -> Result<Summary> {
    cfg.validate()?;
    let palette = cfg.style.resolve()?;
    let inputs = load_inputs(cfg)?;

    let significance = match variant {
        Variant::WithSignificance => {
            let sig = significance::compute(
                &inputs.spectrum,
                &inputs.background,
                &cfg.window,
                cfg.exposure,
            )
            .context("computing excess significance")?;
            log::info!(
                "Observed {:.3}, expected {:.3}, z = {:.3}",
                sig.observed,
                sig.expected,
                sig.z
            );
            Some(sig)
        }
        Variant::FigureOnly => None,
    };

    render_figure(
        &cfg.output_path,
        &inputs.spectrum,
        &inputs.background,
        &palette,
    )?;

    Ok(Summary {
        config: cfg.clone(),
        variant,
        spectrum_rows: inputs.spectrum.len(),
        background_points: inputs.background.len(),
        significance,
        figure_path: cfg.output_path.clone(),
    })
}

pub fn write_summary(path: &Path, summary: &Summary) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }

    let data = serde_json::to_string_pretty(summary)?;
    fs::write(path, data).with_context(|| format!("writing summary {}", path.display()))?;
    Ok(())
}
