//! Per-draw display glyphs.

use std::sync::Arc;

use crate::atlas::bytes_key::BytesKey;
use crate::font::{Font, GlyphId};
use crate::geom::{Matrix, Rect};
use crate::text::simple_glyph::SimpleGlyph;
use crate::text::{Color, GlyphDocument, TextPaint, TextStyle};

/// A single character prepared for drawing.
///
/// The derived fields (advance, ascent/descent, bounds, `extra_matrix`) are
/// computed once at construction; the style fields (transform, colors,
/// alpha, stroke width) stay writable so an animator can update them per
/// frame.
pub struct Glyph {
    simple_glyph: Arc<SimpleGlyph>,
    // read-only attributes:
    advance: f32,
    ascent: f32,
    descent: f32,
    bounds: Rect,
    is_vertical: bool,
    stroke_over_fill: bool,
    extra_matrix: Matrix,
    // writable attributes:
    matrix: Matrix,
    text_style: TextStyle,
    alpha: f32,
    fill_color: Color,
    stroke_color: Color,
    stroke_width: f32,
}

impl Glyph {
    /// Builds one display glyph per entry of the document's glyph list, in
    /// document order.
    pub fn build_from_text(glyph_document: &GlyphDocument) -> Vec<Glyph> {
        glyph_document
            .glyphs
            .iter()
            .map(|glyph| Glyph::new(glyph.clone(), &glyph_document.paint))
            .collect()
    }

    fn new(simple_glyph: Arc<SimpleGlyph>, text_paint: &TextPaint) -> Glyph {
        let font = simple_glyph.font().clone();
        let metrics = font.metrics();
        let mut ascent = metrics.ascent;
        let mut descent = metrics.descent;
        let glyph_id = simple_glyph.glyph_id();
        let mut advance = font.glyph_advance(glyph_id, false);
        let mut bounds = simple_glyph.bounds();
        if simple_glyph.name() == " " {
            // Whitespace bounds from real fonts sit anomalously high and
            // narrow; pin the vertical extent to the letter "A" so line
            // metrics stay stable.
            let a_glyph_id = font.glyph_id("A");
            if a_glyph_id > 0 {
                let a_bounds = font.glyph_bounds(a_glyph_id);
                bounds.top = a_bounds.top;
                bounds.bottom = a_bounds.bottom;
            }
        }
        let mut extra_matrix = Matrix::IDENTITY;
        if text_paint.is_vertical {
            if simple_glyph.name().len() == 1 {
                // Letters, digits and punctuation rotate 90° so the
                // horizontal baseline becomes a vertical one, then shift
                // left to center the glyph inside the column.
                extra_matrix = Matrix::rotate(90.0);
                let offset_x = (metrics.cap_height + metrics.x_height) * 0.25;
                extra_matrix.post_translate(-offset_x, 0.0);
                ascent += offset_x;
                descent += offset_x;
            } else {
                let offset = font.glyph_vertical_offset(glyph_id);
                extra_matrix.post_translate(offset.x, offset.y);
                let width = advance;
                advance = font.glyph_advance(glyph_id, true);
                ascent = -width * 0.5;
                descent = width * 0.5;
            }
            bounds = extra_matrix.map_rect(&bounds);
        }
        Glyph {
            simple_glyph,
            advance,
            ascent,
            descent,
            bounds,
            is_vertical: text_paint.is_vertical,
            stroke_over_fill: text_paint.stroke_over_fill,
            extra_matrix,
            matrix: Matrix::IDENTITY,
            text_style: text_paint.style,
            alpha: 1.0,
            fill_color: text_paint.fill_color,
            stroke_color: text_paint.stroke_color,
            stroke_width: text_paint.stroke_width,
        }
    }

    #[inline]
    pub fn font(&self) -> &Font {
        self.simple_glyph.font()
    }

    #[inline]
    pub fn glyph_id(&self) -> GlyphId {
        self.simple_glyph.glyph_id()
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.simple_glyph.name()
    }

    /// True when drawing this glyph could produce output.
    pub fn is_visible(&self) -> bool {
        self.matrix.invertible() && self.alpha != 0.0 && !self.bounds.is_empty()
    }

    #[inline]
    pub fn is_vertical(&self) -> bool {
        self.is_vertical
    }

    #[inline]
    pub fn advance(&self) -> f32 {
        self.advance
    }

    #[inline]
    pub fn ascent(&self) -> f32 {
        self.ascent
    }

    #[inline]
    pub fn descent(&self) -> f32 {
        self.descent
    }

    /// Bounding box relative to the glyph origin, after the extra matrix.
    /// May be larger than the exact ink bounds.
    #[inline]
    pub fn bounds(&self) -> &Rect {
        &self.bounds
    }

    #[inline]
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn set_matrix(&mut self, matrix: Matrix) {
        self.matrix = matrix;
    }

    #[inline]
    pub fn style(&self) -> TextStyle {
        self.text_style
    }

    pub fn set_style(&mut self, style: TextStyle) {
        self.text_style = style;
    }

    #[inline]
    pub fn stroke_over_fill(&self) -> bool {
        self.stroke_over_fill
    }

    #[inline]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn set_alpha(&mut self, alpha: f32) {
        self.alpha = alpha;
    }

    #[inline]
    pub fn fill_color(&self) -> Color {
        self.fill_color
    }

    pub fn set_fill_color(&mut self, color: Color) {
        self.fill_color = color;
    }

    #[inline]
    pub fn stroke_color(&self) -> Color {
        self.stroke_color
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        self.stroke_color = color;
    }

    #[inline]
    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    pub fn set_stroke_width(&mut self, width: f32) {
        self.stroke_width = width;
    }

    /// The per-glyph layout matrix applied before the writable transform.
    #[inline]
    pub fn extra_matrix(&self) -> &Matrix {
        &self.extra_matrix
    }

    /// The full transform of this glyph: `matrix * extra_matrix`.
    pub fn total_matrix(&self) -> Matrix {
        let mut m = self.extra_matrix;
        m.post_concat(&self.matrix);
        m
    }

    /// Writes the bitmap identity of the underlying glyph record.
    pub fn compute_atlas_key(&self, bytes_key: &mut BytesKey) {
        self.simple_glyph.compute_atlas_key(bytes_key);
    }
}
