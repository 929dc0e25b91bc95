//! A deterministic synthetic typeface.
//!
//! Every metric is a fixed fraction of the font size, so tests and headless
//! bring-up get stable, font-file-free behavior. Fractions are exact binary
//! values to keep integer truncation of scaled bounds deterministic.
//!
//! Coverage model:
//! - the mask face covers code points below U+E000 (glyph id = code point)
//! - the color face covers supplementary-plane code points (emoji and
//!   friends) and reports `has_color`
//! - everything else maps to glyph id 0 (tofu)

use std::sync::Arc;

use lyon::math::point;
use lyon::path::Path;

use crate::font::{FontManager, FontMetrics, GlyphId, Typeface, next_typeface_id};
use crate::geom::{Point, Rect};

const ADVANCE: f32 = 0.75;
const VERTICAL_ADVANCE: f32 = 1.0;
const ASCENT: f32 = -0.75;
const DESCENT: f32 = 0.25;
const CAP_HEIGHT: f32 = 0.6875;
const X_HEIGHT: f32 = 0.4375;
const FAUX_BOLD_OUTSET: f32 = 1.0 / 32.0;
const FAUX_ITALIC_SKEW: f32 = 0.25;

/// A synthetic face with metrics derived from the font size alone.
pub struct DebugTypeface {
    unique_id: u32,
    has_color: bool,
}

impl DebugTypeface {
    /// A mask (non-color) face covering code points below U+E000.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            unique_id: next_typeface_id(),
            has_color: false,
        })
    }

    /// A color face covering supplementary-plane code points.
    pub fn color() -> Arc<Self> {
        Arc::new(Self {
            unique_id: next_typeface_id(),
            has_color: true,
        })
    }

    fn base_bounds(&self, glyph_id: GlyphId, size: f32) -> Rect {
        if glyph_id == b' ' as GlyphId && !self.has_color {
            // Mimics the anomalously high and narrow whitespace box real
            // fonts report, which the space correction in Glyph normalizes.
            return Rect::from_ltrb(0.0625 * size, -0.9375 * size, 0.25 * size, -0.5 * size);
        }
        Rect::from_ltrb(0.0625 * size, -0.75 * size, 0.6875 * size, 0.0625 * size)
    }
}

impl Typeface for DebugTypeface {
    fn unique_id(&self) -> u32 {
        self.unique_id
    }

    fn has_color(&self) -> bool {
        self.has_color
    }

    fn glyph_id(&self, name: &str) -> GlyphId {
        let Some(ch) = name.chars().next() else {
            return 0;
        };
        let code_point = ch as u32;
        if self.has_color {
            if code_point > 0xFFFF {
                ((code_point - 0x10000) % 0xFFFF + 1) as GlyphId
            } else {
                0
            }
        } else if code_point < 0xE000 {
            code_point as GlyphId
        } else {
            0
        }
    }

    fn glyph_bounds(
        &self,
        glyph_id: GlyphId,
        size: f32,
        faux_bold: bool,
        faux_italic: bool,
    ) -> Rect {
        let mut bounds = self.base_bounds(glyph_id, size);
        if faux_bold {
            let outset = size * FAUX_BOLD_OUTSET;
            bounds.outset(outset, outset);
        }
        if faux_italic {
            let shear_top = -FAUX_ITALIC_SKEW * bounds.top;
            let shear_bottom = -FAUX_ITALIC_SKEW * bounds.bottom;
            bounds.left = (bounds.left + shear_top).min(bounds.left + shear_bottom);
            bounds.right = (bounds.right + shear_top).max(bounds.right + shear_bottom);
        }
        bounds
    }

    fn glyph_advance(&self, _glyph_id: GlyphId, size: f32, vertical: bool) -> f32 {
        if vertical {
            size * VERTICAL_ADVANCE
        } else {
            size * ADVANCE
        }
    }

    fn glyph_vertical_offset(&self, glyph_id: GlyphId, size: f32) -> Point {
        let advance = self.glyph_advance(glyph_id, size, false);
        Point::new(-0.5 * advance, -ASCENT * size)
    }

    fn metrics(&self, size: f32) -> FontMetrics {
        FontMetrics {
            ascent: ASCENT * size,
            descent: DESCENT * size,
            cap_height: CAP_HEIGHT * size,
            x_height: X_HEIGHT * size,
        }
    }

    fn glyph_path(&self, glyph_id: GlyphId, size: f32) -> Option<Path> {
        if glyph_id == 0 {
            return None;
        }
        let bounds = self.base_bounds(glyph_id, size);
        let mut builder = Path::builder();
        builder.begin(point(bounds.left, bounds.top));
        builder.line_to(point(bounds.right, bounds.top));
        builder.line_to(point(bounds.right, bounds.bottom));
        builder.line_to(point(bounds.left, bounds.bottom));
        builder.close();
        Some(builder.build())
    }
}

/// A [`FontManager`] over the two debug faces.
pub struct DebugFontManager {
    family: String,
    primary: Arc<DebugTypeface>,
    color: Arc<DebugTypeface>,
}

impl DebugFontManager {
    /// `family` is the only family the primary lookup resolves.
    pub fn new(family: &str) -> Self {
        Self {
            family: family.to_string(),
            primary: DebugTypeface::new(),
            color: DebugTypeface::color(),
        }
    }

    pub fn primary(&self) -> &Arc<DebugTypeface> {
        &self.primary
    }

    pub fn color(&self) -> &Arc<DebugTypeface> {
        &self.color
    }
}

impl FontManager for DebugFontManager {
    fn typeface_without_fallback(&self, family: &str, _style: &str) -> Option<Arc<dyn Typeface>> {
        if family == self.family {
            Some(self.primary.clone())
        } else {
            None
        }
    }

    fn fallback_typeface(&self, name: &str) -> (Arc<dyn Typeface>, GlyphId) {
        let glyph_id = self.color.glyph_id(name);
        if glyph_id != 0 {
            return (self.color.clone(), glyph_id);
        }
        (self.primary.clone(), self.primary.glyph_id(name))
    }
}
