//! Render-bridge scenarios: resolving display glyphs through the atlas into
//! batched `draw_atlas` calls.

use std::sync::Arc;

use tessera::font::debug::DebugFontManager;
use tessera::render::recording::{ConstantRenderCache, RecordingContext};
use tessera::text::glyph::Glyph;
use tessera::text::graphic::Text;
use tessera::{Color, Property, TextAtlas, TextDocument, TextDocumentHandle};

fn document(text: &str, size: f32) -> TextDocumentHandle {
    Arc::new(TextDocument {
        text: text.to_string(),
        font_family: "Debug".to_string(),
        font_size: size,
        ..TextDocument::default()
    })
}

fn setup(handle: &TextDocumentHandle) -> (TextAtlas, Vec<Glyph>) {
    let font_manager = DebugFontManager::new("Debug");
    let atlas = TextAtlas::make(7, &Property::Value(handle.clone()), &font_manager).unwrap();
    let glyphs = Glyph::build_from_text(&atlas.glyph_document(handle).unwrap());
    (atlas, glyphs)
}

#[test]
fn fill_text_draws_one_batch_per_page() {
    let handle = document("AB", 64.0);
    let (mut atlas, glyphs) = setup(&handle);
    let text = Text::make_from(glyphs, None).unwrap();

    let mut context = RecordingContext::new(1024);
    let mut canvas = context.target_canvas();
    text.draw(
        &mut canvas,
        &mut context,
        &ConstantRenderCache::new(1.0),
        &mut atlas,
    );

    let draws = context.atlas_draws();
    assert_eq!(draws.len(), 1);
    let draw = &draws[0];
    assert_eq!(draw.matrices.len(), 2);
    assert_eq!(draw.rects.len(), 2);
    assert_eq!(draw.alphas, vec![1.0, 1.0]);
    // Mask batches carry per-entry colors.
    assert!(draw.colors.is_some());
}

#[test]
fn page_transitions_flush_batches() {
    // 20 large glyphs spread across several pages.
    let text_content: String = (0..20u32)
        .map(|i| char::from_u32(0x4E00 + i).unwrap())
        .collect();
    let handle = document(&text_content, 480.0);
    let (mut atlas, glyphs) = setup(&handle);
    let text = Text::make_from(glyphs, None).unwrap();

    let mut context = RecordingContext::new(1024);
    let mut canvas = context.target_canvas();
    text.draw(
        &mut canvas,
        &mut context,
        &ConstantRenderCache::new(1.0),
        &mut atlas,
    );

    let pages = atlas.mask_page_count();
    assert!(pages > 1, "expected a multi-page atlas, got {pages}");
    let draws = context.atlas_draws();
    assert_eq!(draws.len(), pages);
    let total: usize = draws.iter().map(|draw| draw.matrices.len()).sum();
    assert_eq!(total, 20);
}

#[test]
fn color_and_mask_passes_are_separate_draws() {
    let handle = document("A😀", 64.0);
    let (mut atlas, glyphs) = setup(&handle);
    let text = Text::make_from(glyphs, None).unwrap();

    let mut context = RecordingContext::new(1024);
    let mut canvas = context.target_canvas();
    text.draw(
        &mut canvas,
        &mut context,
        &ConstantRenderCache::new(1.0),
        &mut atlas,
    );

    let draws = context.atlas_draws();
    assert_eq!(draws.len(), 2);
    // The mask pass runs first and carries colors; the color pass does not.
    assert!(draws[0].colors.is_some());
    assert!(draws[1].colors.is_none());
    assert_eq!(draws[0].matrices.len(), 1);
    assert_eq!(draws[1].matrices.len(), 1);
}

#[test]
fn stroke_order_follows_stroke_over_fill() {
    let mut base = TextDocument {
        text: "A".to_string(),
        font_family: "Debug".to_string(),
        font_size: 64.0,
        apply_stroke: true,
        stroke_width: 4.0,
        fill_color: Color::BLACK,
        stroke_color: Color::WHITE,
        ..TextDocument::default()
    };

    // stroke_over_fill: fill is drawn first, stroke second.
    let handle = Arc::new(base.clone());
    let (mut atlas, glyphs) = setup(&handle);
    let text = Text::make_from(glyphs, None).unwrap();
    let mut context = RecordingContext::new(1024);
    let mut canvas = context.target_canvas();
    text.draw(
        &mut canvas,
        &mut context,
        &ConstantRenderCache::new(1.0),
        &mut atlas,
    );
    let draws = context.atlas_draws();
    let colors = draws[0].colors.clone().unwrap();
    assert_eq!(colors, vec![Color::BLACK, Color::WHITE]);

    // Flipped ordering: stroke first, fill on top.
    base.stroke_over_fill = false;
    let handle = Arc::new(base);
    let (mut atlas, glyphs) = setup(&handle);
    let text = Text::make_from(glyphs, None).unwrap();
    let mut context = RecordingContext::new(1024);
    let mut canvas = context.target_canvas();
    text.draw(
        &mut canvas,
        &mut context,
        &ConstantRenderCache::new(1.0),
        &mut atlas,
    );
    let draws = context.atlas_draws();
    let colors = draws[0].colors.clone().unwrap();
    assert_eq!(colors, vec![Color::WHITE, Color::BLACK]);
}

#[test]
fn invisible_glyphs_are_skipped() {
    let handle = document("AB", 64.0);
    let (mut atlas, mut glyphs) = setup(&handle);
    glyphs[0].set_alpha(0.0);
    let text = Text::make_from(glyphs, None).unwrap();

    let mut context = RecordingContext::new(1024);
    let mut canvas = context.target_canvas();
    text.draw(
        &mut canvas,
        &mut context,
        &ConstantRenderCache::new(1.0),
        &mut atlas,
    );

    let draws = context.atlas_draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].matrices.len(), 1);
}

#[test]
fn sprite_matrices_map_the_bitmap_onto_the_glyph_bounds() {
    let handle = document("A", 64.0);
    let (mut atlas, glyphs) = setup(&handle);
    let bounds = *glyphs[0].bounds();
    let text = Text::make_from(glyphs, None).unwrap();

    let mut context = RecordingContext::new(1024);
    let mut canvas = context.target_canvas();
    text.draw(
        &mut canvas,
        &mut context,
        &ConstantRenderCache::new(1.0),
        &mut atlas,
    );

    let draws = context.atlas_draws();
    let matrix = draws[0].matrices[0];
    let rect = draws[0].rects[0];
    // Mapping the source rect (normalized to its own origin) through the
    // sprite matrix must land exactly on the glyph bounds.
    let mapped = matrix.map_rect(&tessera::Rect::from_xywh(
        0.0,
        0.0,
        rect.width(),
        rect.height(),
    ));
    assert!((mapped.left - bounds.left).abs() < 1e-4);
    assert!((mapped.top - bounds.top).abs() < 1e-4);
    assert!((mapped.width() - bounds.width()).abs() < 1e-4);
    assert!((mapped.height() - bounds.height()).abs() < 1e-4);
}
