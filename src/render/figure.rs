use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;

use super::pdf::PdfBackend;
use crate::color::FigurePalette;
use crate::data::model::{BackgroundCurve, Spectrum};

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Canvas size in SVG user units (PDF points).
pub const FIGURE_SIZE: (u32, u32) = (960, 720);

/// Shared energy axis [keV].
pub const ENERGY_RANGE: (f64, f64) = (0.0, 30.0);
pub const RATE_RANGE: (f64, f64) = (0.0, 120.0);
pub const RESIDUAL_RANGE: (f64, f64) = (-5.0, 5.0);

/// `(lo, hi)` of the 1σ–2σ bands.
pub const OUTER_BANDS: [(f64, f64); 2] = [(-2.0, -1.0), (1.0, 2.0)];
pub const INNER_BAND: (f64, f64) = (-1.0, 1.0);
pub const RESIDUAL_TICKS: [f64; 2] = [-2.0, 2.0];

const TOP_MARGIN: i32 = 20;
const RIGHT_MARGIN: i32 = 30;
const X_LABEL_AREA: i32 = 50;
const Y_LABEL_AREA: i32 = 80;

/// Pixel row where the data panel ends and the residual panel begins.
/// Plot heights come out 3:1.
fn panel_split(height: u32) -> i32 {
    let plot_height = height as i32 - TOP_MARGIN - X_LABEL_AREA;
    TOP_MARGIN + plot_height * 3 / 4
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Render the two-panel figure to `path`, replacing any existing file.
/// A `.svg` extension writes SVG; anything else writes PDF.
pub fn render_figure(
    path: &Path,
    spectrum: &Spectrum,
    background: &BackgroundCurve,
    palette: &FigurePalette,
) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }

    if is_svg(path) {
        let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
        draw_figure(&root, spectrum, background, palette)?;
        root.present()
            .with_context(|| format!("writing figure {}", path.display()))?;
    } else {
        let backend = PdfBackend::new(path, FIGURE_SIZE)
            .with_context(|| format!("creating PDF {}", path.display()))?;
        let root = backend.into_drawing_area();
        draw_figure(&root, spectrum, background, palette)?;
        root.present()
            .with_context(|| format!("writing figure {}", path.display()))?;
    }

    log::info!("Wrote figure to {}", path.display());
    Ok(())
}

fn is_svg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
}

/// Same figure as [`render_figure`], returned as an SVG document.
pub fn render_svg_string(
    spectrum: &Spectrum,
    background: &BackgroundCurve,
    palette: &FigurePalette,
) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, FIGURE_SIZE).into_drawing_area();
        draw_figure(&root, spectrum, background, palette)?;
        root.present()?;
    }
    Ok(svg)
}

/// Same figure as [`render_figure`], returned as PDF bytes.
pub fn render_pdf_bytes(
    spectrum: &Spectrum,
    background: &BackgroundCurve,
    palette: &FigurePalette,
) -> Result<Vec<u8>> {
    let mut pdf = Vec::new();
    {
        let root = PdfBackend::with_buffer(&mut pdf, FIGURE_SIZE)?.into_drawing_area();
        draw_figure(&root, spectrum, background, palette)?;
        root.present()?;
    }
    Ok(pdf)
}

// ---------------------------------------------------------------------------
// Clipping
// ---------------------------------------------------------------------------

fn in_range(v: f64, range: (f64, f64)) -> bool {
    v >= range.0 && v <= range.1
}

/// Liang–Barsky clip of one segment. Returns the visible part and whether
/// the segment leaves the box before reaching `p1`.
fn clip_segment(
    p0: (f64, f64),
    p1: (f64, f64),
    x: (f64, f64),
    y: (f64, f64),
) -> Option<((f64, f64), (f64, f64), bool)> {
    if ![p0.0, p0.1, p1.0, p1.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (p1.0 - p0.0, p1.1 - p0.1);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);

    for (p, q) in [
        (-dx, p0.0 - x.0),
        (dx, x.1 - p0.0),
        (-dy, p0.1 - y.0),
        (dy, y.1 - p0.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let at = |t: f64| (p0.0 + t * dx, p0.1 + t * dy);
    Some((at(t0), at(t1), t1 < 1.0))
}

/// Cut a polyline to the box `x` × `y`. Each returned run is a connected
/// visible piece; points where the line crosses the box edge are kept.
pub fn clip_polyline(
    points: &[(f64, f64)],
    x: (f64, f64),
    y: (f64, f64),
) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();

    for seg in points.windows(2) {
        match clip_segment(seg[0], seg[1], x, y) {
            Some((a, b, leaves)) => {
                if current.is_empty() {
                    if a == b {
                        // Only grazes the box.
                        continue;
                    }
                    current.push(a);
                }
                if current.last() != Some(&b) {
                    current.push(b);
                }
                if leaves {
                    runs.push(std::mem::take(&mut current));
                }
            }
            None => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

// ---------------------------------------------------------------------------
// Panels
// ---------------------------------------------------------------------------

fn draw_figure<DB>(
    root: &DrawingArea<DB, Shift>,
    spectrum: &Spectrum,
    background: &BackgroundCurve,
    palette: &FigurePalette,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let (top, bottom) = root.split_vertically(panel_split(FIGURE_SIZE.1));
    draw_data_panel(&top, spectrum, background, palette)?;
    draw_residual_panel(&bottom, spectrum, palette)?;
    Ok(())
}

/// Background curve and measured rates with asymmetric error bars, all cut
/// to the panel ranges. No x labels: the energy axis belongs to the residual
/// panel.
fn draw_data_panel<DB>(
    area: &DrawingArea<DB, Shift>,
    spectrum: &Spectrum,
    background: &BackgroundCurve,
    palette: &FigurePalette,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let mut chart = ChartBuilder::on(area)
        .margin_top(TOP_MARGIN)
        .margin_right(RIGHT_MARGIN)
        .x_label_area_size(0)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(
            ENERGY_RANGE.0..ENERGY_RANGE.1,
            RATE_RANGE.0..RATE_RANGE.1,
        )?;

    chart
        .configure_mesh()
        .disable_mesh()
        .y_desc("Events/(t·y·keV)")
        .draw()?;

    let line = palette.background_line;
    let curve: Vec<(f64, f64)> = background.samples.iter().map(|s| (s.energy, s.rate)).collect();
    chart
        .draw_series(
            clip_polyline(&curve, ENERGY_RANGE, RATE_RANGE)
                .into_iter()
                .map(|run| PathElement::new(run, line.stroke_width(2))),
        )?
        .label("B₀")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 25, y)], line.stroke_width(2)));

    let data = palette.data;
    let visible = spectrum
        .samples
        .iter()
        .filter(|s| in_range(s.energy, ENERGY_RANGE));

    // Error bars: the vertical stroke is clamped to the panel, caps are only
    // drawn where the bar really ends.
    let bars: Vec<_> = visible
        .clone()
        .filter(|s| s.upper >= RATE_RANGE.0 && s.lower <= RATE_RANGE.1)
        .collect();
    chart.draw_series(bars.iter().map(|s| {
        PathElement::new(
            vec![
                (s.energy, s.lower.max(RATE_RANGE.0)),
                (s.energy, s.upper.min(RATE_RANGE.1)),
            ],
            data.stroke_width(2),
        )
    }))?;
    chart.draw_series(
        bars.iter()
            .flat_map(|s| [(s.energy, s.lower), (s.energy, s.upper)])
            .filter(|&(_, v)| in_range(v, RATE_RANGE))
            .map(|pos| {
                EmptyElement::at(pos)
                    + PathElement::new(vec![(-2, 0), (2, 0)], data.stroke_width(2))
            }),
    )?;

    chart
        .draw_series(
            visible
                .filter(|s| in_range(s.rate, RATE_RANGE))
                .map(|s| Circle::new((s.energy, s.rate), 3, data.filled())),
        )?
        .label("SR1 data")
        .legend(move |(x, y)| Circle::new((x + 12, y), 3, data.filled()));

    chart.draw_series(std::iter::once(Rectangle::new(
        [
            (ENERGY_RANGE.0, RATE_RANGE.0),
            (ENERGY_RANGE.1, RATE_RANGE.1),
        ],
        BLACK.stroke_width(1),
    )))?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(TRANSPARENT)
        .border_style(TRANSPARENT)
        .draw()?;

    Ok(())
}

/// `WithKeyPoints<RangedCoordf64>` inherits `NoDefaultFormatting`, which
/// keeps `configure_mesh` unavailable; this pass-through opts into the
/// default formatter (labels are overridden by the mesh formatter anyway).
struct KeyPointsAxis(plotters::coord::combinators::WithKeyPoints<plotters::coord::types::RangedCoordf64>);

impl Ranged for KeyPointsAxis {
    type ValueType = f64;
    type FormatOption = plotters::coord::ranged1d::DefaultFormatting;

    fn range(&self) -> std::ops::Range<f64> {
        self.0.range()
    }

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        self.0.map(value, limit)
    }

    fn key_points<Hint: plotters::coord::ranged1d::KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        self.0.key_points(hint)
    }

    fn axis_pixel_range(&self, limit: (i32, i32)) -> std::ops::Range<i32> {
        self.0.axis_pixel_range(limit)
    }
}

/// Residual significances over the shaded ±1σ / ±2σ bands.
fn draw_residual_panel<DB>(
    area: &DrawingArea<DB, Shift>,
    spectrum: &Spectrum,
    palette: &FigurePalette,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let mut chart = ChartBuilder::on(area)
        .margin_right(RIGHT_MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(
            ENERGY_RANGE.0..ENERGY_RANGE.1,
            KeyPointsAxis((RESIDUAL_RANGE.0..RESIDUAL_RANGE.1).with_key_points(RESIDUAL_TICKS.to_vec())),
        )?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(7)
        .x_label_formatter(&|e| format!("{e:.0}"))
        .y_label_formatter(&|s| format!("{s:.0}"))
        .x_desc("Energy [keV]")
        .y_desc("σ")
        .draw()?;

    // Bands first so the points sit on top.
    let outer = palette.outer_band;
    chart.draw_series(OUTER_BANDS.iter().map(|&(lo, hi)| {
        Rectangle::new([(ENERGY_RANGE.0, lo), (ENERGY_RANGE.1, hi)], outer.filled())
    }))?;
    chart.draw_series(std::iter::once(Rectangle::new(
        [(ENERGY_RANGE.0, INNER_BAND.0), (ENERGY_RANGE.1, INNER_BAND.1)],
        palette.inner_band.filled(),
    )))?;

    let data = palette.data;
    chart.draw_series(
        spectrum
            .samples
            .iter()
            .filter(|s| in_range(s.energy, ENERGY_RANGE) && in_range(s.residual, RESIDUAL_RANGE))
            .map(|s| Circle::new((s.energy, s.residual), 2, data.filled())),
    )?;

    chart.draw_series(std::iter::once(Rectangle::new(
        [
            (ENERGY_RANGE.0, RESIDUAL_RANGE.0),
            (ENERGY_RANGE.1, RESIDUAL_RANGE.1),
        ],
        BLACK.stroke_width(1),
    )))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FigureStyle;
    use crate::data::model::{BackgroundSample, SpectrumSample};
    use crate::data::synthetic;

    // Plotting rectangle of the default canvas, in SVG units.
    const PLOT_X: (f64, f64) = (80.0, 930.0);
    const DATA_Y: (f64, f64) = (20.0, 507.0);
    const RESIDUAL_Y: (f64, f64) = (507.0, 670.0);

    /// Every `<tag ...>` opening in the document.
    fn tags<'a>(svg: &'a str, name: &str) -> Vec<&'a str> {
        let open = format!("<{name} ");
        svg.match_indices(&open)
            .filter_map(|(i, _)| svg[i..].find('>').map(|end| &svg[i..i + end]))
            .collect()
    }

    fn attr<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
        let key = format!(" {name}=\"");
        let start = tag.find(&key)? + key.len();
        let len = tag[start..].find('"')?;
        Some(&tag[start..start + len])
    }

    fn num(tag: &str, name: &str) -> f64 {
        attr(tag, name).and_then(|v| v.parse().ok()).unwrap()
    }

    /// `(x, y, content)` of every `<text>` node.
    fn texts(svg: &str) -> Vec<(f64, f64, String)> {
        svg.match_indices("<text ")
            .filter_map(|(i, _)| {
                let rest = &svg[i..];
                let open_end = rest.find('>')?;
                let close = rest.find("</text>")?;
                let tag = &rest[..open_end];
                Some((num(tag, "x"), num(tag, "y"), rest[open_end + 1..close].to_string()))
            })
            .collect()
    }

    fn palette() -> FigurePalette {
        FigureStyle::default().resolve().unwrap()
    }

    fn sample(energy: f64, rate: f64, residual: f64) -> SpectrumSample {
        SpectrumSample {
            energy,
            rate,
            upper: rate + 9.0,
            lower: rate - 9.0,
            residual,
        }
    }

    #[test]
    fn panels_split_three_to_one() {
        let split = panel_split(FIGURE_SIZE.1);
        let top = split - TOP_MARGIN;
        let bottom = FIGURE_SIZE.1 as i32 - split - X_LABEL_AREA;
        assert!((top as f64 / bottom as f64 - 3.0).abs() < 0.05);
    }

    #[test]
    fn svg_contains_band_colours_and_labels() {
        let (sp, bg) = synthetic::generate(3);
        let svg = render_svg_string(&sp, &bg, &palette()).unwrap();
        assert!(svg.contains("<svg"));
        let lower = svg.to_ascii_lowercase();
        assert!(lower.contains("#ccf24c"));
        assert!(lower.contains("#ffff7f"));
        assert!(svg.contains("SR1 data"));
        assert!(svg.contains("Energy [keV]"));
    }

    #[test]
    fn empty_tables_still_render() {
        let svg = render_svg_string(&Spectrum::default(), &BackgroundCurve::default(), &palette())
            .unwrap();
        assert!(!svg.is_empty());
    }

    #[test]
    fn pdf_output_has_pdf_header() {
        let (sp, bg) = synthetic::generate(3);
        let pdf = render_pdf_bytes(&sp, &bg, &palette()).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn file_format_follows_extension() {
        let dir = tempfile::tempdir().unwrap();
        let (sp, bg) = synthetic::generate(3);

        let pdf = dir.path().join("fig_4.pdf");
        render_figure(&pdf, &sp, &bg, &palette()).unwrap();
        assert!(fs::read(&pdf).unwrap().starts_with(b"%PDF"));

        let svg = dir.path().join("fig_4.svg");
        render_figure(&svg, &sp, &bg, &palette()).unwrap();
        assert!(fs::read_to_string(&svg).unwrap().contains("<svg"));
    }

    #[test]
    fn polyline_is_cut_at_box_edges() {
        let runs = clip_polyline(
            &[(0.0, 0.0), (10.0, 100.0), (20.0, 200.0), (30.0, 100.0), (40.0, 0.0)],
            (0.0, 30.0),
            (0.0, 120.0),
        );
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], vec![(0.0, 0.0), (10.0, 100.0), (12.0, 120.0)]);
        assert_eq!(runs[1], vec![(28.0, 120.0), (30.0, 100.0)]);
    }

    #[test]
    fn polyline_fully_outside_is_dropped() {
        assert!(clip_polyline(&[(40.0, 10.0), (60.0, 10.0)], (0.0, 30.0), (0.0, 120.0)).is_empty());
        assert!(clip_polyline(&[(5.0, 10.0)], (0.0, 30.0), (0.0, 120.0)).is_empty());
    }

    #[test]
    fn out_of_range_data_stays_inside_the_panels() {
        // Background to 60 keV and 370 events, one residual far off scale.
        let background = BackgroundCurve::new(
            (0..=60)
                .map(|e| BackgroundSample {
                    energy: e as f64,
                    rate: 10.0 + 6.0 * e as f64,
                })
                .collect(),
        );
        let spectrum = Spectrum::new(vec![
            sample(2.0, 50.0, 40.0),
            sample(10.0, 150.0, -1.0),
            sample(45.0, 60.0, 0.5),
        ]);
        let svg = render_svg_string(&spectrum, &background, &palette()).unwrap();
        let inside = |x: f64, y: f64| {
            x >= PLOT_X.0 - 1.0
                && x <= PLOT_X.1 + 1.0
                && y >= DATA_Y.0 - 1.0
                && y <= RESIDUAL_Y.1 + 1.0
        };

        let red: Vec<&str> = tags(&svg, "polyline")
            .into_iter()
            .filter(|t| attr(t, "stroke") == Some("#FF0000"))
            .collect();
        assert!(!red.is_empty());
        for line in red {
            for pair in attr(line, "points").unwrap().split_whitespace() {
                let (x, y) = pair.split_once(',').unwrap();
                let (x, y): (f64, f64) = (x.parse().unwrap(), y.parse().unwrap());
                assert!(inside(x, y), "background point ({x}, {y}) outside the plot");
            }
        }

        let circles = tags(&svg, "circle");
        // Two points in the data panel, one residual, two legend markers at most.
        assert!(circles.len() <= 4);
        for c in circles {
            let (x, y) = (num(c, "cx"), num(c, "cy"));
            assert!(inside(x, y), "marker ({x}, {y}) outside the plot");
        }
    }

    #[test]
    fn residual_axis_labels_only_two_sigma() {
        let (sp, bg) = synthetic::generate(3);
        let svg = render_svg_string(&sp, &bg, &palette()).unwrap();

        let mut labels: Vec<String> = texts(&svg)
            .into_iter()
            .filter(|(x, y, t)| {
                *x < PLOT_X.0 && *y > RESIDUAL_Y.0 + 5.0 && *y < RESIDUAL_Y.1 && t.parse::<f64>().is_ok()
            })
            .map(|(_, _, t)| t)
            .collect();
        labels.sort();
        assert_eq!(labels, vec!["-2".to_string(), "2".to_string()]);
    }

    #[test]
    fn legend_sits_lower_right_of_data_panel() {
        let (sp, bg) = synthetic::generate(3);
        let svg = render_svg_string(&sp, &bg, &palette()).unwrap();
        let all = texts(&svg);

        for label in ["B₀", "SR1 data"] {
            let (x, y, _) = all
                .iter()
                .find(|(_, _, t)| t == label)
                .unwrap_or_else(|| panic!("no legend entry {label}"));
            assert!(*x > (PLOT_X.0 + PLOT_X.1) / 2.0, "{label} at x={x}");
            assert!(*y > (DATA_Y.0 + DATA_Y.1) / 2.0 && *y < DATA_Y.1, "{label} at y={y}");
        }
    }

    #[test]
    fn drawn_frames_are_three_to_one() {
        let (sp, bg) = synthetic::generate(3);
        let svg = render_svg_string(&sp, &bg, &palette()).unwrap();

        let mut heights: Vec<f64> = tags(&svg, "rect")
            .into_iter()
            .filter(|t| {
                attr(t, "fill") == Some("none")
                    && attr(t, "stroke") == Some("#000000")
                    && attr(t, "opacity") != Some("0")
            })
            .map(|t| num(t, "height"))
            .collect();
        heights.sort_by(|a, b| b.total_cmp(a));
        assert_eq!(heights.len(), 2);
        assert!((heights[0] / heights[1] - 3.0).abs() < 0.05, "{heights:?}");
    }
}
