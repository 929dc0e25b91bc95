//! Font abstraction consumed by the atlas pipeline.
//!
//! The atlas never loads fonts itself. It drives two seams:
//! - [`Typeface`]: one parsed font face. Everything the pipeline needs from a
//!   face (glyph ids, bounds, advances, metrics, outline paths) goes through
//!   this trait so the face backend stays swappable.
//! - [`FontManager`]: resolves a `(family, style)` request to a typeface
//!   without fallback, and finds a fallback face for a single character.
//!
//! A [`Font`] bundles a typeface handle with a size and the faux-bold /
//! faux-italic synthesis flags. Synthesis changes the rasterized bitmap, so
//! the flags are part of every atlas key.
//!
//! Concrete implementations:
//! - [`face`]: system fonts via `fontdb` + `ttf-parser`.
//! - [`debug`]: a deterministic synthetic face for tests and bring-up.

pub mod debug;
pub mod face;

mod cache;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::geom::{Point, Rect};

/// The id of a glyph within its typeface. Zero is the missing-glyph (tofu) id.
pub type GlyphId = u16;

/// Vertical metrics of a face at a given size.
///
/// `ascent` is negative (y-down coordinates); `descent`, `cap_height` and
/// `x_height` are positive distances.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct FontMetrics {
    pub ascent: f32,
    pub descent: f32,
    pub cap_height: f32,
    pub x_height: f32,
}

/// A single font face.
///
/// All geometry is returned in y-down render space, already scaled to the
/// requested `size`.
pub trait Typeface {
    /// A process-unique id for this face, stable for its lifetime. Part of
    /// every glyph key.
    fn unique_id(&self) -> u32;

    /// True when the face carries color glyph data (e.g. emoji). Color faces
    /// are rendered into the color atlas and never stroked.
    fn has_color(&self) -> bool;

    /// Maps a single-code-point utf8 name to a glyph id, 0 when missing.
    fn glyph_id(&self, name: &str) -> GlyphId;

    /// Bounding box of a glyph, with faux bold/italic synthesis applied.
    fn glyph_bounds(&self, glyph_id: GlyphId, size: f32, faux_bold: bool, faux_italic: bool)
    -> Rect;

    /// Horizontal advance, or the vertical advance when `vertical` is set.
    fn glyph_advance(&self, glyph_id: GlyphId, size: f32, vertical: bool) -> f32;

    /// Offset from the horizontal origin to the vertical-layout origin.
    fn glyph_vertical_offset(&self, glyph_id: GlyphId, size: f32) -> Point;

    fn metrics(&self, size: f32) -> FontMetrics;

    /// The glyph outline, or `None` when the glyph has no outline (bitmaps,
    /// whitespace, missing glyphs).
    fn glyph_path(&self, glyph_id: GlyphId, size: f32) -> Option<lyon::path::Path>;
}

/// Resolves typefaces for documents.
pub trait FontManager {
    /// Resolves `(family, style)` exactly, without any fallback.
    fn typeface_without_fallback(&self, family: &str, style: &str) -> Option<Arc<dyn Typeface>>;

    /// Finds a face containing `name`, together with the glyph id it maps to.
    /// A last-resort face with glyph id 0 is returned when nothing matches.
    fn fallback_typeface(&self, name: &str) -> (Arc<dyn Typeface>, GlyphId);
}

/// A typeface handle plus the attributes that affect rasterization.
#[derive(Clone)]
pub struct Font {
    typeface: Arc<dyn Typeface>,
    size: f32,
    faux_bold: bool,
    faux_italic: bool,
}

impl Font {
    pub fn new(typeface: Arc<dyn Typeface>, size: f32) -> Self {
        Self {
            typeface,
            size,
            faux_bold: false,
            faux_italic: false,
        }
    }

    #[inline]
    pub fn typeface(&self) -> &Arc<dyn Typeface> {
        &self.typeface
    }

    pub fn set_typeface(&mut self, typeface: Arc<dyn Typeface>) {
        self.typeface = typeface;
    }

    #[inline]
    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn set_size(&mut self, size: f32) {
        self.size = size;
    }

    #[inline]
    pub fn is_faux_bold(&self) -> bool {
        self.faux_bold
    }

    pub fn set_faux_bold(&mut self, faux_bold: bool) {
        self.faux_bold = faux_bold;
    }

    #[inline]
    pub fn is_faux_italic(&self) -> bool {
        self.faux_italic
    }

    pub fn set_faux_italic(&mut self, faux_italic: bool) {
        self.faux_italic = faux_italic;
    }

    #[inline]
    pub fn glyph_id(&self, name: &str) -> GlyphId {
        self.typeface.glyph_id(name)
    }

    #[inline]
    pub fn glyph_bounds(&self, glyph_id: GlyphId) -> Rect {
        self.typeface
            .glyph_bounds(glyph_id, self.size, self.faux_bold, self.faux_italic)
    }

    #[inline]
    pub fn glyph_advance(&self, glyph_id: GlyphId, vertical: bool) -> f32 {
        self.typeface.glyph_advance(glyph_id, self.size, vertical)
    }

    #[inline]
    pub fn glyph_vertical_offset(&self, glyph_id: GlyphId) -> Point {
        self.typeface.glyph_vertical_offset(glyph_id, self.size)
    }

    #[inline]
    pub fn metrics(&self) -> FontMetrics {
        self.typeface.metrics(self.size)
    }

    #[inline]
    pub fn glyph_path(&self, glyph_id: GlyphId) -> Option<lyon::path::Path> {
        self.typeface.glyph_path(glyph_id, self.size)
    }
}

/// Errors produced by the font backend.
#[derive(thiserror::Error, Debug)]
pub enum FontError {
    #[error("no fonts found on this system")]
    NoFontsAvailable,

    #[error("failed to read font file from disk: {0}")]
    ReadFailed(String),

    #[error("failed to parse font face")]
    ParseFailed,
}

/// Hands out process-unique typeface ids.
pub(crate) fn next_typeface_id() -> u32 {
    static NEXT_ID: AtomicU32 = AtomicU32::new(1);
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}
