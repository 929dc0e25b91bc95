//! The glyph texture atlas.
//!
//! A [`TextAtlas`] owns two per-color-class atlases:
//! - the **mask atlas** holds alpha-only bitmaps of outline glyphs, filled
//!   and stroked;
//! - the **color atlas** holds RGBA bitmaps of color typefaces (emoji).
//!
//! Construction collects every distinct document of a (possibly animated)
//! text property, tokenizes them, and schedules one [`AtlasGlyph`] per
//! distinct (glyph, style, stroke width) across all documents. The actual
//! textures are built lazily by [`TextAtlas::generate_if_needed`] and
//! rebuilt whenever the asset's rendering scale moves by more than 1%.
//!
//! Locators are **not** stable across regenerations; callers re-query every
//! frame through [`TextAtlas::get_locator`].
//!
//! [`AtlasGlyph`]: page::AtlasGlyph

pub mod bytes_key;
pub mod pack;

mod page;

use std::sync::Arc;

use crate::atlas::bytes_key::BytesKey;
use crate::atlas::page::{Atlas, AtlasGlyph};
use crate::font::FontManager;
use crate::geom::Rect;
use crate::render::{AssetId, Context, PaintStyle, RenderCache, Texture};
use crate::text::glyph::Glyph;
use crate::text::simple_glyph::create_glyph_document;
use crate::text::{GlyphDocument, Property, TextDocumentHandle, TextStyle};

/// Where a glyph's bitmap lives: the page and the source rectangle inside
/// it, in page pixel space.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct AtlasLocator {
    pub page_index: usize,
    pub location: Rect,
}

/// Mask + color atlases for one text asset.
pub struct TextAtlas {
    asset_id: AssetId,
    documents: Vec<(TextDocumentHandle, Arc<GlyphDocument>)>,
    scale: f32,
    mask_glyphs: Vec<AtlasGlyph>,
    color_glyphs: Vec<AtlasGlyph>,
    mask_atlas: Option<Atlas>,
    color_atlas: Option<Atlas>,
}

impl TextAtlas {
    /// Collects every distinct document the property can produce (the first
    /// keyframe's start value and every keyframe's end value, or the single
    /// static value) and prepares the atlas glyphs. Returns `None` when the
    /// property holds no documents.
    pub fn make(
        asset_id: AssetId,
        source_text: &Property<TextDocumentHandle>,
        font_manager: &dyn FontManager,
    ) -> Option<TextAtlas> {
        let mut handles: Vec<TextDocumentHandle> = Vec::new();
        match source_text {
            Property::Value(document) => handles.push(document.clone()),
            Property::Animated(keyframes) => {
                if let Some(first) = keyframes.first() {
                    handles.push(first.start_value.clone());
                }
                for keyframe in keyframes {
                    handles.push(keyframe.end_value.clone());
                }
            }
        }
        let mut documents: Vec<(TextDocumentHandle, Arc<GlyphDocument>)> = Vec::new();
        for handle in handles {
            if documents
                .iter()
                .any(|(existing, _)| Arc::ptr_eq(existing, &handle))
            {
                continue;
            }
            let glyph_document = create_glyph_document(&handle, font_manager);
            documents.push((handle, glyph_document));
        }
        if documents.is_empty() {
            return None;
        }
        let mut atlas = TextAtlas {
            asset_id,
            documents,
            scale: 1.0,
            mask_glyphs: Vec::new(),
            color_glyphs: Vec::new(),
            mask_atlas: None,
            color_atlas: None,
        };
        atlas.init_atlas_glyphs();
        Some(atlas)
    }

    /// Splits the collected glyphs into the two color classes and dedups by
    /// atlas key. Color typefaces only ever get a Fill entry; stroking emoji
    /// is not supported. Each class is sorted large-first so the online
    /// packer stays dense.
    fn init_atlas_glyphs(&mut self) {
        let mut atlas_keys: Vec<BytesKey> = Vec::new();
        for (_, document) in &self.documents {
            let paint = &document.paint;
            for glyph in &document.glyphs {
                let has_color = glyph.font().typeface().has_color();
                if !has_color
                    && matches!(paint.style, TextStyle::Stroke | TextStyle::StrokeAndFill)
                {
                    push_unique(
                        &mut self.mask_glyphs,
                        &mut atlas_keys,
                        AtlasGlyph::stroke(glyph.clone(), paint.stroke_width),
                    );
                }
                if matches!(paint.style, TextStyle::Fill | TextStyle::StrokeAndFill) {
                    let target = if has_color {
                        &mut self.color_glyphs
                    } else {
                        &mut self.mask_glyphs
                    };
                    push_unique(target, &mut atlas_keys, AtlasGlyph::fill(glyph.clone()));
                }
            }
        }
        sort_atlas_glyphs(&mut self.mask_glyphs);
        sort_atlas_glyphs(&mut self.color_glyphs);
    }

    /// Rebuilds the atlases when absent or when the asset's scale moved by
    /// more than 0.01 since the last build.
    pub fn generate_if_needed(&mut self, context: &mut dyn Context, render_cache: &dyn RenderCache) {
        let scale = render_cache.asset_max_scale(self.asset_id);
        let scale_changed = (self.scale - scale).abs() > 0.01;
        let max_texture_size = context.max_texture_size();
        if self.mask_atlas.is_none() || scale_changed {
            log::debug!(
                "rebuilding mask atlas for asset {} at scale {scale}",
                self.asset_id
            );
            self.mask_atlas = Atlas::make(context, scale, &self.mask_glyphs, max_texture_size, true);
        }
        if self.color_atlas.is_none() || scale_changed {
            log::debug!(
                "rebuilding color atlas for asset {} at scale {scale}",
                self.asset_id
            );
            self.color_atlas =
                Atlas::make(context, scale, &self.color_glyphs, max_texture_size, false);
        }
        self.scale = scale;
    }

    /// The scale both atlases were last built at.
    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Resolves a display glyph + paint style to its atlas location,
    /// dispatching on the typeface's color class. `None` when the relevant
    /// atlas is absent or has no entry; the caller skips that pair.
    pub fn get_locator(&self, glyph: &Glyph, style: PaintStyle) -> Option<AtlasLocator> {
        if glyph.font().typeface().has_color() {
            self.color_atlas.as_ref()?.get_locator(glyph, style)
        } else {
            self.mask_atlas.as_ref()?.get_locator(glyph, style)
        }
    }

    pub fn mask_atlas_texture(&self, page_index: usize) -> Option<Arc<dyn Texture>> {
        self.mask_atlas.as_ref()?.page_texture(page_index)
    }

    pub fn color_atlas_texture(&self, page_index: usize) -> Option<Arc<dyn Texture>> {
        self.color_atlas.as_ref()?.page_texture(page_index)
    }

    pub fn mask_page_count(&self) -> usize {
        self.mask_atlas.as_ref().map_or(0, Atlas::page_count)
    }

    pub fn color_page_count(&self) -> usize {
        self.color_atlas.as_ref().map_or(0, Atlas::page_count)
    }

    /// The tokenized form of `document`, when it belongs to this atlas.
    pub fn glyph_document(&self, document: &TextDocumentHandle) -> Option<Arc<GlyphDocument>> {
        self.documents
            .iter()
            .find(|(existing, _)| Arc::ptr_eq(existing, document))
            .map(|(_, glyph_document)| glyph_document.clone())
    }
}

fn push_unique(glyphs: &mut Vec<AtlasGlyph>, atlas_keys: &mut Vec<BytesKey>, glyph: AtlasGlyph) {
    let mut atlas_key = BytesKey::default();
    glyph.compute_atlas_key(&mut atlas_key);
    if atlas_keys.contains(&atlas_key) {
        return;
    }
    atlas_keys.push(atlas_key);
    glyphs.push(glyph);
}

/// Large rectangles first: descending by area, then width, then height.
fn sort_atlas_glyphs(glyphs: &mut [AtlasGlyph]) {
    glyphs.sort_by(|a, b| {
        let a_bounds = a.bounds();
        let b_bounds = b.bounds();
        let (a_width, a_height) = (a_bounds.width(), a_bounds.height());
        let (b_width, b_height) = (b_bounds.width(), b_bounds.height());
        (b_width * b_height)
            .total_cmp(&(a_width * a_height))
            .then(b_width.total_cmp(&a_width))
            .then(b_height.total_cmp(&a_height))
    });
}
