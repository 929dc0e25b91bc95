//! Document tokenization into shared glyph records.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::atlas::bytes_key::BytesKey;
use crate::font::{Font, FontManager, GlyphId};
use crate::geom::Rect;
use crate::text::{GlyphDocument, TextDirection, TextDocument, TextPaint, TextStyle};

/// One character of a document: glyph id, utf8 name, and the font it
/// resolved to. Immutable after construction and shared between the
/// document's glyph list and the atlas.
pub struct SimpleGlyph {
    glyph_id: GlyphId,
    name: String,
    font: Font,
    bounds: OnceLock<Rect>,
}

impl SimpleGlyph {
    pub fn new(glyph_id: GlyphId, name: String, font: Font) -> Self {
        Self {
            glyph_id,
            name,
            font,
            bounds: OnceLock::new(),
        }
    }

    #[inline]
    pub fn glyph_id(&self) -> GlyphId {
        self.glyph_id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn font(&self) -> &Font {
        &self.font
    }

    /// The glyph's bounding box, queried from the font once and memoized.
    pub fn bounds(&self) -> Rect {
        *self
            .bounds
            .get_or_init(|| self.font.glyph_bounds(self.glyph_id))
    }

    /// Writes the bitmap identity of this glyph: the glyph id with the
    /// synthesis flags folded in, then the typeface id. The font size is
    /// deliberately absent; bitmap scaling happens at draw time through the
    /// atlas-wide scale.
    pub fn compute_atlas_key(&self, bytes_key: &mut BytesKey) {
        let mut flags = u32::from(self.glyph_id);
        if self.font.is_faux_bold() {
            flags |= 1 << 16;
        }
        if self.font.is_faux_italic() {
            flags |= 1 << 17;
        }
        bytes_key.write_u32(flags);
        bytes_key.write_u32(self.font.typeface().unique_id());
    }
}

/// Tokenizes a document into an ordered glyph list, one entry per code
/// point, deduplicating by name: a repeated character reuses the same
/// `SimpleGlyph`.
///
/// Typeface resolution per unseen name: the document's primary typeface when
/// it covers the character, otherwise a fallback face from the manager. The
/// fallback may still yield glyph id 0 (tofu); the glyph is recorded anyway.
pub fn get_simple_glyphs(
    document: &TextDocument,
    font_manager: &dyn FontManager,
) -> Vec<Arc<SimpleGlyph>> {
    let typeface =
        font_manager.typeface_without_fallback(&document.font_family, &document.font_style);
    let mut glyph_map: HashMap<String, Arc<SimpleGlyph>> = HashMap::new();
    let mut glyph_list = Vec::new();
    for ch in document.text.chars() {
        let name = ch.to_string();
        if let Some(glyph) = glyph_map.get(&name) {
            glyph_list.push(glyph.clone());
            continue;
        }
        let (face, glyph_id) = match &typeface {
            Some(primary) => {
                let glyph_id = primary.glyph_id(&name);
                if glyph_id != 0 {
                    (primary.clone(), glyph_id)
                } else {
                    font_manager.fallback_typeface(&name)
                }
            }
            None => font_manager.fallback_typeface(&name),
        };
        let mut font = Font::new(face, document.font_size);
        font.set_faux_bold(document.faux_bold);
        font.set_faux_italic(document.faux_italic);
        let glyph = Arc::new(SimpleGlyph::new(glyph_id, name.clone(), font));
        glyph_map.insert(name, glyph.clone());
        glyph_list.push(glyph);
    }
    glyph_list
}

fn create_text_paint(document: &TextDocument) -> TextPaint {
    let style = if document.apply_fill && document.apply_stroke {
        TextStyle::StrokeAndFill
    } else if document.apply_stroke {
        TextStyle::Stroke
    } else {
        TextStyle::Fill
    };
    TextPaint {
        style,
        fill_color: document.fill_color,
        stroke_color: document.stroke_color,
        stroke_width: document.stroke_width,
        stroke_over_fill: document.stroke_over_fill,
        font_family: document.font_family.clone(),
        font_style: document.font_style.clone(),
        font_size: document.font_size,
        faux_bold: document.faux_bold,
        faux_italic: document.faux_italic,
        is_vertical: document.direction == TextDirection::Vertical,
    }
}

/// Tokenizes a document and pairs the glyph list with its derived paint.
pub fn create_glyph_document(
    document: &TextDocument,
    font_manager: &dyn FontManager,
) -> Arc<GlyphDocument> {
    Arc::new(GlyphDocument {
        glyphs: get_simple_glyphs(document, font_manager),
        paint: create_text_paint(document),
    })
}
