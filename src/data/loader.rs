use std::path::Path;

use anyhow::{Context, Result, bail};

use super::model::{BackgroundCurve, Spectrum};

/// Columns in the spectrum table: energy, rate, upper, lower, residual.
pub const SPECTRUM_COLUMNS: usize = 5;
/// Columns in the background table: energy, rate.
pub const BACKGROUND_COLUMNS: usize = 2;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the measured spectrum (`fig_4.dat`).
pub fn load_spectrum(path: &Path) -> Result<Spectrum> {
    let rows = load_table(path, SPECTRUM_COLUMNS)?;
    log::info!("Loaded {} spectrum rows from {}", rows.len(), path.display());
    Ok(Spectrum::from_rows(&rows))
}

/// Load the background curve (`b0.txt`).
pub fn load_background(path: &Path) -> Result<BackgroundCurve> {
    let rows = load_table(path, BACKGROUND_COLUMNS)?;
    log::info!(
        "Loaded {} background points from {}",
        rows.len(),
        path.display()
    );
    Ok(BackgroundCurve::from_rows(&rows))
}

/// Read a headerless numeric table with exactly `n_cols` columns per row.
/// Dispatch by extension.
///
/// Supported formats:
/// * `.csv` – comma-separated
/// * anything else – whitespace-separated
pub fn load_table(path: &Path, n_cols: usize) -> Result<Vec<Vec<f64>>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path, n_cols),
        _ => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            parse_columns(&text, n_cols).with_context(|| format!("parsing {}", path.display()))
        }
    }
}

// ---------------------------------------------------------------------------
// Whitespace tables
// ---------------------------------------------------------------------------

/// Parse whitespace-separated numeric rows.
///
/// Everything from `#` to the end of a line is a comment. Lines left blank
/// are skipped; every other line must hold exactly `n_cols` floats.
pub fn parse_columns(text: &str, n_cols: usize) -> Result<Vec<Vec<f64>>> {
    let mut rows = Vec::new();

    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        let trimmed = strip_comment(line).trim();
        if trimmed.is_empty() {
            continue;
        }

        let row = trimmed
            .split_whitespace()
            .enumerate()
            .map(|(j, tok)| parse_float(tok, line_no, j))
            .collect::<Result<Vec<f64>>>()?;

        if row.len() != n_cols {
            bail!(
                "Line {line_no}: expected {n_cols} columns, found {}",
                row.len()
            );
        }
        rows.push(row);
    }

    Ok(rows)
}

fn strip_comment(line: &str) -> &str {
    line.split_once('#').map_or(line, |(data, _)| data)
}

fn parse_float(tok: &str, line: usize, col: usize) -> Result<f64> {
    tok.parse::<f64>()
        .with_context(|| format!("Line {line}, column {col}: '{tok}' is not a number"))
}

// ---------------------------------------------------------------------------
// CSV tables
// ---------------------------------------------------------------------------

/// Headerless CSV with the same column layout as the whitespace tables.
fn load_csv(path: &Path, n_cols: usize) -> Result<Vec<Vec<f64>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening CSV {}", path.display()))?;

    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        // Fields up to an inline `#` comment.
        let mut fields = Vec::new();
        for field in record.iter() {
            match field.split_once('#') {
                Some((data, _)) => {
                    if !data.trim().is_empty() {
                        fields.push(data.trim());
                    }
                    break;
                }
                None => fields.push(field),
            }
        }
        if fields.iter().all(|f| f.is_empty()) {
            continue;
        }

        let row = fields
            .into_iter()
            .enumerate()
            .map(|(j, tok)| parse_float(tok, row_no + 1, j))
            .collect::<Result<Vec<f64>>>()?;

        if row.len() != n_cols {
            bail!(
                "CSV row {row_no}: expected {n_cols} columns, found {}",
                row.len()
            );
        }
        rows.push(row);
    }

    Ok(rows)
}
