use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use plotters_backend::text_anchor::{HPos, VPos};
use plotters_backend::{
    BackendColor, BackendCoord, BackendStyle, BackendTextStyle, DrawingBackend, DrawingErrorKind,
    FontTransform,
};
use printpdf::{
    path::{PaintMode, WindingOrder},
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Polygon, Rgb, TextMatrix,
};
use thiserror::Error;

/// One plotters pixel is one PDF point.
const MM_PER_PT: f32 = 25.4 / 72.0;

/// Segments used to approximate a circle.
const CIRCLE_SEGMENTS: usize = 24;

/// Mean Helvetica advance as a fraction of the font size.
const GLYPH_WIDTH: f64 = 0.55;

#[derive(Debug, Error)]
pub enum PdfBackendError {
    #[error("PDF document error: {0}")]
    Document(String),
    #[error("writing PDF: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF document already written")]
    AlreadyPresented,
}

enum Target<'a> {
    File(PathBuf),
    Buffer(&'a mut Vec<u8>),
}

/// plotters backend drawing vector primitives onto a single printpdf page.
///
/// Text uses the builtin Helvetica and Symbol fonts, so no font files are
/// needed. Characters outside those fonts are transliterated (see
/// [`text_runs`]).
pub struct PdfBackend<'a> {
    size: (u32, u32),
    target: Target<'a>,
    doc: Option<PdfDocumentReference>,
    layer: PdfLayerReference,
    text_font: IndirectFontRef,
    symbol_font: IndirectFontRef,
}

impl<'a> PdfBackend<'a> {
    /// Backend writing to `path` on [`DrawingBackend::present`].
    pub fn new(path: &Path, size: (u32, u32)) -> Result<Self, PdfBackendError> {
        Self::with_target(Target::File(path.to_path_buf()), size)
    }

    /// Backend writing the PDF bytes into `buf` on present.
    pub fn with_buffer(buf: &'a mut Vec<u8>, size: (u32, u32)) -> Result<Self, PdfBackendError> {
        Self::with_target(Target::Buffer(buf), size)
    }

    fn with_target(target: Target<'a>, size: (u32, u32)) -> Result<Self, PdfBackendError> {
        let (doc, page, layer) = PdfDocument::new(
            "fig_4",
            Mm(size.0 as f32 * MM_PER_PT),
            Mm(size.1 as f32 * MM_PER_PT),
            "figure",
        );
        let text_font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| PdfBackendError::Document(e.to_string()))?;
        let symbol_font = doc
            .add_builtin_font(BuiltinFont::Symbol)
            .map_err(|e| PdfBackendError::Document(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(PdfBackend {
            size,
            target,
            doc: Some(doc),
            layer,
            text_font,
            symbol_font,
        })
    }

    /// Backend pixel → PDF point. PDF's origin is bottom-left.
    fn point(&self, (x, y): (f64, f64)) -> Point {
        Point::new(
            Mm(x as f32 * MM_PER_PT),
            Mm((self.size.1 as f64 - y) as f32 * MM_PER_PT),
        )
    }

    fn ring(&self, coords: &[(f64, f64)]) -> Vec<(Point, bool)> {
        coords.iter().map(|&c| (self.point(c), false)).collect()
    }

    fn stroke(&self, coords: &[(f64, f64)], color: BackendColor, width: u32, closed: bool) {
        if coords.len() < 2 || color.alpha == 0.0 {
            return;
        }
        self.layer.set_outline_color(pdf_color(color));
        self.layer.set_outline_thickness(width.max(1) as f32);
        self.layer.add_line(Line {
            points: self.ring(coords),
            is_closed: closed,
        });
    }

    fn fill(&self, coords: &[(f64, f64)], color: BackendColor) {
        if coords.len() < 3 || color.alpha == 0.0 {
            return;
        }
        self.layer.set_fill_color(pdf_color(color));
        self.layer.add_polygon(Polygon {
            rings: vec![self.ring(coords)],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }
}

fn pdf_color(color: BackendColor) -> Color {
    let (r, g, b) = color.rgb;
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

fn to_f64((x, y): BackendCoord) -> (f64, f64) {
    (x as f64, y as f64)
}

/// Which builtin font a run of text is set in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunFont {
    Text,
    Symbol,
}

/// Split `text` into runs the builtin fonts can show. Greek sigma goes to
/// the Symbol font; subscript digits, middle dot and minus sign fall back to
/// their ASCII forms; anything else non-ASCII becomes `?`.
pub fn text_runs(text: &str) -> Vec<(RunFont, String)> {
    let mut runs: Vec<(RunFont, String)> = Vec::new();
    for c in text.chars() {
        let (font, mapped) = match c {
            'σ' => (RunFont::Symbol, 's'),
            '₀'..='₉' => (
                RunFont::Text,
                char::from(b'0' + (c as u32 - '₀' as u32) as u8),
            ),
            '·' => (RunFont::Text, '.'),
            '−' => (RunFont::Text, '-'),
            c if c.is_ascii() => (RunFont::Text, c),
            _ => (RunFont::Text, '?'),
        };
        match runs.last_mut() {
            Some((f, s)) if *f == font => s.push(mapped),
            _ => runs.push((font, mapped.to_string())),
        }
    }
    runs
}

fn text_width(text: &str, size: f64) -> f64 {
    text.chars().count() as f64 * size * GLYPH_WIDTH
}

/// Clockwise screen rotation in degrees.
fn rotation_degrees(transform: FontTransform) -> f64 {
    match transform {
        FontTransform::Rotate90 => 90.0,
        FontTransform::Rotate180 => 180.0,
        FontTransform::Rotate270 => 270.0,
        _ => 0.0,
    }
}

impl DrawingBackend for PdfBackend<'_> {
    type ErrorType = PdfBackendError;

    fn get_size(&self) -> (u32, u32) {
        self.size
    }

    fn ensure_prepared(&mut self) -> Result<(), DrawingErrorKind<PdfBackendError>> {
        Ok(())
    }

    fn present(&mut self) -> Result<(), DrawingErrorKind<PdfBackendError>> {
        let doc = self
            .doc
            .take()
            .ok_or(DrawingErrorKind::DrawingError(PdfBackendError::AlreadyPresented))?;
        let bytes = doc
            .save_to_bytes()
            .map_err(|e| DrawingErrorKind::DrawingError(PdfBackendError::Document(e.to_string())))?;

        match &mut self.target {
            Target::File(path) => std::fs::write(path, bytes)
                .map_err(|e| DrawingErrorKind::DrawingError(PdfBackendError::Io(e)))?,
            Target::Buffer(buf) => **buf = bytes,
        }
        Ok(())
    }

    fn draw_pixel(
        &mut self,
        point: BackendCoord,
        color: BackendColor,
    ) -> Result<(), DrawingErrorKind<PdfBackendError>> {
        let (x, y) = to_f64(point);
        self.fill(&[(x, y), (x + 1.0, y), (x + 1.0, y + 1.0), (x, y + 1.0)], color);
        Ok(())
    }

    fn draw_line<S: BackendStyle>(
        &mut self,
        from: BackendCoord,
        to: BackendCoord,
        style: &S,
    ) -> Result<(), DrawingErrorKind<PdfBackendError>> {
        self.stroke(
            &[to_f64(from), to_f64(to)],
            style.color(),
            style.stroke_width(),
            false,
        );
        Ok(())
    }

    fn draw_rect<S: BackendStyle>(
        &mut self,
        upper_left: BackendCoord,
        bottom_right: BackendCoord,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<PdfBackendError>> {
        let (x0, y0) = to_f64(upper_left);
        let (x1, y1) = to_f64(bottom_right);
        let corners = [(x0, y0), (x1, y0), (x1, y1), (x0, y1)];
        if fill {
            self.fill(&corners, style.color());
        } else {
            self.stroke(&corners, style.color(), style.stroke_width(), true);
        }
        Ok(())
    }

    fn draw_path<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        path: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<PdfBackendError>> {
        let coords: Vec<(f64, f64)> = path.into_iter().map(to_f64).collect();
        self.stroke(&coords, style.color(), style.stroke_width(), false);
        Ok(())
    }

    fn draw_circle<S: BackendStyle>(
        &mut self,
        center: BackendCoord,
        radius: u32,
        style: &S,
        fill: bool,
    ) -> Result<(), DrawingErrorKind<PdfBackendError>> {
        let (cx, cy) = to_f64(center);
        let r = radius as f64;
        let coords: Vec<(f64, f64)> = (0..CIRCLE_SEGMENTS)
            .map(|i| {
                let t = 2.0 * PI * i as f64 / CIRCLE_SEGMENTS as f64;
                (cx + r * t.cos(), cy + r * t.sin())
            })
            .collect();
        if fill {
            self.fill(&coords, style.color());
        } else {
            self.stroke(&coords, style.color(), style.stroke_width(), true);
        }
        Ok(())
    }

    fn fill_polygon<S: BackendStyle, I: IntoIterator<Item = BackendCoord>>(
        &mut self,
        vert: I,
        style: &S,
    ) -> Result<(), DrawingErrorKind<PdfBackendError>> {
        let coords: Vec<(f64, f64)> = vert.into_iter().map(to_f64).collect();
        self.fill(&coords, style.color());
        Ok(())
    }

    fn draw_text<TStyle: BackendTextStyle>(
        &mut self,
        text: &str,
        style: &TStyle,
        pos: BackendCoord,
    ) -> Result<(), DrawingErrorKind<PdfBackendError>> {
        let color = style.color();
        if color.alpha == 0.0 || text.is_empty() {
            return Ok(());
        }
        let size = style.size();
        let anchor = style.anchor();

        // Offset from the anchor to the baseline start, in the text's own
        // frame (x along the text, y downwards).
        let width = text_width(text, size);
        let dx = match anchor.h_pos {
            HPos::Left => 0.0,
            HPos::Center => -width / 2.0,
            HPos::Right => -width,
        };
        let dy = match anchor.v_pos {
            VPos::Top => size * 0.8,
            VPos::Center => size * 0.35,
            VPos::Bottom => 0.0,
        };

        let angle = rotation_degrees(style.transform());
        let (sin, cos) = angle.to_radians().sin_cos();
        let (px, py) = to_f64(pos);
        let x = px + dx * cos - dy * sin;
        let y = py + dx * sin + dy * cos;
        let origin = self.point((x, y));

        self.layer.set_fill_color(pdf_color(color));
        self.layer.begin_text_section();
        self.layer.set_text_matrix(TextMatrix::TranslateRotate(
            origin.x,
            origin.y,
            -angle as f32,
        ));
        for (font, run) in text_runs(text) {
            let font = match font {
                RunFont::Text => &self.text_font,
                RunFont::Symbol => &self.symbol_font,
            };
            self.layer.set_font(font, size as f32);
            self.layer.write_text(run, font);
        }
        self.layer.end_text_section();
        Ok(())
    }

    fn estimate_text_size<TStyle: BackendTextStyle>(
        &self,
        text: &str,
        style: &TStyle,
    ) -> Result<(u32, u32), DrawingErrorKind<PdfBackendError>> {
        let size = style.size();
        Ok((text_width(text, size).ceil() as u32, size.ceil() as u32))
    }
}

impl Drop for PdfBackend<'_> {
    fn drop(&mut self) {
        if self.doc.is_some() {
            // Errors are ignored here; call present() to see them.
            let _ = self.present();
        }
    }
}
