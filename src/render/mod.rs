//! Vector figure output: PDF by default, SVG when asked for by extension.

pub mod figure;
pub mod pdf;

pub use figure::{render_figure, render_pdf_bytes, render_svg_string};
