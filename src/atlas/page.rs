//! Atlas page building and drawing.

use std::collections::HashMap;
use std::sync::Arc;

use crate::atlas::AtlasLocator;
use crate::atlas::bytes_key::BytesKey;
use crate::atlas::pack::RectanglePack;
use crate::font::{Font, GlyphId};
use crate::geom::{Matrix, Point, Rect};
use crate::render::{Canvas, Context, Paint, PaintStyle, Texture};
use crate::text::glyph::Glyph;
use crate::text::simple_glyph::SimpleGlyph;

/// A glyph scheduled for packing: the shared glyph record plus the paint
/// style it will be rasterized with.
pub(crate) struct AtlasGlyph {
    glyph: Arc<SimpleGlyph>,
    stroke_width: f32,
    style: PaintStyle,
}

impl AtlasGlyph {
    pub fn fill(glyph: Arc<SimpleGlyph>) -> Self {
        Self {
            glyph,
            stroke_width: 0.0,
            style: PaintStyle::Fill,
        }
    }

    pub fn stroke(glyph: Arc<SimpleGlyph>, stroke_width: f32) -> Self {
        Self {
            glyph,
            stroke_width,
            style: PaintStyle::Stroke,
        }
    }

    #[inline]
    pub fn glyph_id(&self) -> GlyphId {
        self.glyph.glyph_id()
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        self.glyph.bounds()
    }

    #[inline]
    pub fn font(&self) -> &Font {
        self.glyph.font()
    }

    #[inline]
    pub fn style(&self) -> PaintStyle {
        self.style
    }

    #[inline]
    pub fn stroke_width(&self) -> f32 {
        self.stroke_width
    }

    /// Groups glyphs that can be emitted as one text run with one paint.
    pub fn compute_style_key(&self, style_key: &mut BytesKey) {
        style_key.write_u32(self.style as u32);
        style_key.write_f32(self.stroke_width);
        style_key.write_u32(self.font().typeface().unique_id());
        style_key.write_f32(self.font().size());
    }

    /// Uniquely identifies this glyph's bitmap in the atlas.
    pub fn compute_atlas_key(&self, bytes_key: &mut BytesKey) {
        self.glyph.compute_atlas_key(bytes_key);
        bytes_key.write_u32(self.style as u32);
        bytes_key.write_f32(self.stroke_width);
    }
}

/// One canvas draw call on a page at unit scale: glyphs sharing a font and
/// paint, with parallel id/position arrays.
struct TextRun {
    paint: Paint,
    font: Font,
    glyph_ids: Vec<GlyphId>,
    positions: Vec<Point>,
}

impl TextRun {
    fn new(glyph: &AtlasGlyph) -> Self {
        let mut paint = Paint {
            style: glyph.style(),
            stroke_width: 0.0,
        };
        if glyph.style() == PaintStyle::Stroke {
            paint.stroke_width = glyph.stroke_width();
        }
        Self {
            paint,
            font: glyph.font().clone(),
            glyph_ids: Vec::new(),
            positions: Vec::new(),
        }
    }
}

/// One atlas page: its text runs, the packed extent scaled to pixels, and
/// the texture once drawn.
#[derive(Default)]
struct Page {
    text_runs: Vec<TextRun>,
    width: i32,
    height: i32,
    texture: Option<Arc<dyn Texture>>,
}

/// A per-color-class atlas: pages plus the locator map.
pub(crate) struct Atlas {
    pages: Vec<Page>,
    glyph_locators: HashMap<BytesKey, AtlasLocator>,
}

impl Atlas {
    /// Builds and draws an atlas, or `None` when there is nothing to pack.
    pub fn make(
        context: &mut dyn Context,
        scale: f32,
        glyphs: &[AtlasGlyph],
        max_texture_size: i32,
        alpha_only: bool,
    ) -> Option<Atlas> {
        if glyphs.is_empty() {
            return None;
        }
        let mut atlas = Atlas {
            pages: Vec::new(),
            glyph_locators: HashMap::new(),
        };
        atlas.init_pages(glyphs, scale, max_texture_size);
        atlas.draw(context, scale, alpha_only);
        Some(atlas)
    }

    /// Lays out every glyph. Glyphs are grouped by style key in encounter
    /// order so each group becomes one text run per page; a page closes when
    /// the pack extent would exceed the page budget, using the extent
    /// snapshot from before the overflowing insert.
    fn init_pages(&mut self, glyphs: &[AtlasGlyph], scale: f32, max_texture_size: i32) {
        let mut style_keys: Vec<BytesKey> = Vec::new();
        let mut style_map: HashMap<BytesKey, Vec<&AtlasGlyph>> = HashMap::new();
        for glyph in glyphs {
            let mut style_key = BytesKey::default();
            glyph.compute_style_key(&mut style_key);
            let group = style_map.entry(style_key.clone()).or_default();
            if group.is_empty() {
                style_keys.push(style_key);
            }
            group.push(glyph);
        }
        let max_page_size = (max_texture_size as f32 / scale).floor() as i32;
        let mut pack = RectanglePack::new();
        let mut page = Page::default();
        let mut page_index: usize = 0;
        for key in &style_keys {
            let group = &style_map[key];
            let first_glyph = group[0];
            let mut text_run = TextRun::new(first_glyph);
            for glyph in group {
                let bounds = glyph.bounds();
                let glyph_width = bounds.width() as i32;
                let glyph_height = bounds.height() as i32;
                let stroke_inset = if glyph.style() == PaintStyle::Stroke {
                    glyph.stroke_width().ceil() as i32
                } else {
                    0
                };
                let x = bounds.x() - stroke_inset as f32;
                let y = bounds.y() - stroke_inset as f32;
                let width = glyph_width + stroke_inset * 2;
                let height = glyph_height + stroke_inset * 2;
                let pack_width = pack.width();
                let pack_height = pack.height();
                let mut point = pack.add_rect(width, height);
                if pack.width() > max_page_size || pack.height() > max_page_size {
                    page.text_runs
                        .push(std::mem::replace(&mut text_run, TextRun::new(first_glyph)));
                    page.width = (pack_width as f32 * scale).ceil() as i32;
                    page.height = (pack_height as f32 * scale).ceil() as i32;
                    log::debug!(
                        "atlas page {page_index} closed at {}x{}",
                        page.width,
                        page.height
                    );
                    self.pages.push(std::mem::take(&mut page));
                    pack.reset();
                    point = pack.add_rect(width, height);
                    page_index += 1;
                }
                text_run.glyph_ids.push(glyph.glyph_id());
                text_run.positions.push(Point::new(-x + point.x, -y + point.y));
                let mut location = Rect::from_xywh(point.x, point.y, width as f32, height as f32);
                location.scale(scale, scale);
                let locator = AtlasLocator {
                    page_index,
                    location,
                };
                let mut atlas_key = BytesKey::default();
                glyph.compute_atlas_key(&mut atlas_key);
                self.glyph_locators.insert(atlas_key, locator);
            }
            page.text_runs.push(text_run);
        }
        page.width = (pack.width() as f32 * scale).ceil() as i32;
        page.height = (pack.height() as f32 * scale).ceil() as i32;
        self.pages.push(page);
    }

    /// Renders every page into an offscreen surface and keeps the texture.
    /// A failed surface allocation leaves that page without a texture.
    fn draw(&mut self, context: &mut dyn Context, scale: f32, alpha_only: bool) {
        for page in &mut self.pages {
            let Some(mut surface) = context.make_surface(page.width, page.height, alpha_only)
            else {
                log::warn!(
                    "atlas surface allocation failed ({}x{})",
                    page.width,
                    page.height
                );
                continue;
            };
            draw_text_runs(surface.canvas(), &page.text_runs, scale);
            page.texture = Some(surface.texture());
        }
    }

    /// Looks up the packed location of `glyph` drawn with `style`.
    pub fn get_locator(&self, glyph: &Glyph, style: PaintStyle) -> Option<AtlasLocator> {
        let mut bytes_key = BytesKey::default();
        compute_atlas_key(glyph, style, &mut bytes_key);
        self.glyph_locators.get(&bytes_key).copied()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page_texture(&self, page_index: usize) -> Option<Arc<dyn Texture>> {
        self.pages.get(page_index)?.texture.clone()
    }
}

/// The display-glyph side of [`AtlasGlyph::compute_atlas_key`]; both must
/// produce the same byte layout.
fn compute_atlas_key(glyph: &Glyph, style: PaintStyle, bytes_key: &mut BytesKey) {
    glyph.compute_atlas_key(bytes_key);
    bytes_key.write_u32(style as u32);
    bytes_key.write_f32(if style == PaintStyle::Fill {
        0.0
    } else {
        glyph.stroke_width()
    });
}

fn draw_text_runs(canvas: &mut dyn Canvas, text_runs: &[TextRun], scale: f32) {
    let total_matrix = canvas.matrix();
    for text_run in text_runs {
        canvas.set_matrix(total_matrix);
        canvas.concat(Matrix::scale(scale, scale));
        canvas.draw_glyphs(
            &text_run.glyph_ids,
            &text_run.positions,
            &text_run.font,
            &text_run.paint,
        );
    }
    canvas.set_matrix(total_matrix);
}
