//! End-to-end atlas scenarios on the debug typeface and the recording
//! render backend.

use std::sync::Arc;

use tessera::font::debug::DebugFontManager;
use tessera::render::recording::{ConstantRenderCache, RecordingContext};
use tessera::text::glyph::Glyph;
use tessera::{
    Keyframe, PaintStyle, Property, Rect, TextAtlas, TextDocument, TextDocumentHandle,
};

fn document(text: &str, size: f32) -> TextDocumentHandle {
    Arc::new(TextDocument {
        text: text.to_string(),
        font_family: "Debug".to_string(),
        font_size: size,
        ..TextDocument::default()
    })
}

fn build_atlas(handle: &TextDocumentHandle) -> (TextAtlas, Vec<Glyph>) {
    let font_manager = DebugFontManager::new("Debug");
    let atlas = TextAtlas::make(1, &Property::Value(handle.clone()), &font_manager)
        .expect("atlas for non-empty document");
    let glyph_document = atlas.glyph_document(handle).expect("document is collected");
    let glyphs = Glyph::build_from_text(&glyph_document);
    (atlas, glyphs)
}

fn generate(atlas: &mut TextAtlas, max_texture_size: i32, scale: f32) -> RecordingContext {
    let mut context = RecordingContext::new(max_texture_size);
    atlas.generate_if_needed(&mut context, &ConstantRenderCache::new(scale));
    context
}

fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    a.left < b.right && b.left < a.right && a.top < b.bottom && b.top < a.bottom
}

#[test]
fn single_page_fill_document() {
    let handle = document("AB", 64.0);
    let (mut atlas, glyphs) = build_atlas(&handle);
    generate(&mut atlas, 1024, 1.0);

    assert_eq!(atlas.mask_page_count(), 1);
    assert_eq!(atlas.color_page_count(), 0);
    assert!(atlas.mask_atlas_texture(0).is_some());
    assert!(atlas.color_atlas_texture(0).is_none());

    let a = atlas
        .get_locator(&glyphs[0], PaintStyle::Fill)
        .expect("locator for A");
    let b = atlas
        .get_locator(&glyphs[1], PaintStyle::Fill)
        .expect("locator for B");
    assert!(!rects_overlap(&a.location, &b.location));

    // Repeated lookups return the same locator.
    let again = atlas.get_locator(&glyphs[0], PaintStyle::Fill).unwrap();
    assert_eq!(again, a);

    // Both locators lie within their page's pixel extent.
    let texture = atlas.mask_atlas_texture(0).unwrap();
    for locator in [&a, &b] {
        assert_eq!(locator.page_index, 0);
        assert!(locator.location.left >= 0.0 && locator.location.top >= 0.0);
        assert!(locator.location.right <= texture.width() as f32);
        assert!(locator.location.bottom <= texture.height() as f32);
    }
}

#[test]
fn pagination_splits_large_glyph_sets() {
    // 200 distinct CJK characters; the debug face renders each as a
    // 300 x 390 box at size 480.
    let text: String = (0..200u32)
        .map(|i| char::from_u32(0x4E00 + i).unwrap())
        .collect();
    let handle = document(&text, 480.0);
    let (mut atlas, glyphs) = build_atlas(&handle);
    generate(&mut atlas, 1024, 1.0);

    // Lower bound from total padded area over the page budget.
    let padded_area = 301.0f32 * 391.0;
    let min_pages = (200.0 * padded_area / (1024.0 * 1024.0)).ceil() as usize;
    let pages = atlas.mask_page_count();
    assert!(pages >= min_pages, "{pages} pages < {min_pages}");

    // Every page respects the budget and every locator lies inside both the
    // budget square and its page.
    for page_index in 0..pages {
        let texture = atlas.mask_atlas_texture(page_index).unwrap();
        assert!(texture.width() <= 1024);
        assert!(texture.height() <= 1024);
    }
    for glyph in &glyphs {
        let locator = atlas.get_locator(glyph, PaintStyle::Fill).unwrap();
        let texture = atlas.mask_atlas_texture(locator.page_index).unwrap();
        assert!(locator.location.right <= 1024.0);
        assert!(locator.location.bottom <= 1024.0);
        assert!(locator.location.right <= texture.width() as f32);
        assert!(locator.location.bottom <= texture.height() as f32);
    }
}

#[test]
fn stroke_and_fill_schedules_two_bitmaps() {
    let handle = Arc::new(TextDocument {
        text: "A".to_string(),
        font_family: "Debug".to_string(),
        font_size: 64.0,
        apply_stroke: true,
        stroke_width: 4.0,
        ..TextDocument::default()
    });
    let (mut atlas, glyphs) = build_atlas(&handle);
    generate(&mut atlas, 1024, 1.0);

    let fill = atlas.get_locator(&glyphs[0], PaintStyle::Fill).unwrap();
    let stroke = atlas.get_locator(&glyphs[0], PaintStyle::Stroke).unwrap();
    assert_ne!(fill, stroke);
    // The stroke bitmap is inflated by ceil(stroke_width) on each side.
    assert_eq!(stroke.location.width(), fill.location.width() + 8.0);
    assert_eq!(stroke.location.height(), fill.location.height() + 8.0);
}

#[test]
fn color_typefaces_route_to_the_color_atlas() {
    let handle = Arc::new(TextDocument {
        text: "😀".to_string(),
        font_family: "Debug".to_string(),
        font_size: 64.0,
        apply_stroke: true,
        stroke_width: 4.0,
        ..TextDocument::default()
    });
    let (mut atlas, glyphs) = build_atlas(&handle);
    generate(&mut atlas, 1024, 1.0);

    // Only a Fill bitmap exists, in the color atlas; the stroke request was
    // never scheduled and the mask atlas has nothing at all.
    assert!(atlas.get_locator(&glyphs[0], PaintStyle::Fill).is_some());
    assert!(atlas.get_locator(&glyphs[0], PaintStyle::Stroke).is_none());
    assert_eq!(atlas.color_page_count(), 1);
    assert_eq!(atlas.mask_page_count(), 0);
    assert!(atlas.mask_atlas_texture(0).is_none());
}

#[test]
fn mask_and_color_glyphs_never_share_a_page() {
    let handle = document("A😀", 64.0);
    let (mut atlas, glyphs) = build_atlas(&handle);
    let context = generate(&mut atlas, 1024, 1.0);

    assert_eq!(atlas.mask_page_count(), 1);
    assert_eq!(atlas.color_page_count(), 1);
    assert!(!glyphs[0].font().typeface().has_color());
    assert!(glyphs[1].font().typeface().has_color());

    let a_id = glyphs[0].glyph_id();
    let emoji_id = glyphs[1].glyph_id();
    for draw in context.glyph_draws() {
        let has_a = draw.glyph_ids.contains(&a_id);
        let has_emoji = draw.glyph_ids.contains(&emoji_id);
        assert!(!(has_a && has_emoji), "color classes drawn onto one page");
    }
}

#[test]
fn scale_change_rebuilds_both_atlases() {
    let handle = document("AB", 64.0);
    let (mut atlas, _) = build_atlas(&handle);
    generate(&mut atlas, 1024, 1.0);
    let first = atlas.mask_atlas_texture(0).unwrap();
    assert_eq!(atlas.scale(), 1.0);

    // A scale delta under the 1% threshold keeps the textures.
    generate(&mut atlas, 1024, 1.005);
    let unchanged = atlas.mask_atlas_texture(0).unwrap();
    assert!(Arc::ptr_eq(&first, &unchanged));

    // A real scale change rebuilds.
    generate(&mut atlas, 1024, 1.5);
    let rebuilt = atlas.mask_atlas_texture(0).unwrap();
    assert!(!Arc::ptr_eq(&first, &rebuilt));
    assert_eq!(atlas.scale(), 1.5);

    // Locator rectangles now carry the new scale.
    let glyph_document = atlas.glyph_document(&handle).unwrap();
    let glyphs = Glyph::build_from_text(&glyph_document);
    let locator = atlas.get_locator(&glyphs[0], PaintStyle::Fill).unwrap();
    assert_eq!(locator.location.width(), 40.0 * 1.5);
}

#[test]
fn keyframed_documents_dedup_shared_glyphs() {
    let start = document("AB", 64.0);
    let end = document("AB", 64.0);
    let property = Property::Animated(vec![Keyframe {
        start_time: 0.0,
        end_time: 1.0,
        start_value: start.clone(),
        end_value: end.clone(),
    }]);
    let font_manager = DebugFontManager::new("Debug");
    let mut atlas = TextAtlas::make(1, &property, &font_manager).unwrap();
    let context = generate(&mut atlas, 1024, 1.0);

    // Two documents, but only two bitmaps land in the mask atlas.
    let drawn: usize = context
        .glyph_draws()
        .iter()
        .map(|draw| draw.glyph_ids.len())
        .sum();
    assert_eq!(drawn, 2);
    assert!(atlas.glyph_document(&start).is_some());
    assert!(atlas.glyph_document(&end).is_some());
}

#[test]
fn repeated_characters_dedup_within_one_document() {
    let handle = document("ABABAB", 64.0);
    let (mut atlas, _) = build_atlas(&handle);
    let context = generate(&mut atlas, 1024, 1.0);

    let drawn: usize = context
        .glyph_draws()
        .iter()
        .map(|draw| draw.glyph_ids.len())
        .sum();
    assert_eq!(drawn, 2);
}

#[test]
fn oversized_glyph_opens_an_over_budget_page() {
    let handle = document("永", 480.0);
    let (mut atlas, glyphs) = build_atlas(&handle);
    generate(&mut atlas, 256, 1.0);

    // The first page closes empty at the pre-insert snapshot; the oversized
    // glyph lands alone on the next page, which exceeds the budget.
    assert_eq!(atlas.mask_page_count(), 2);
    let locator = atlas.get_locator(&glyphs[0], PaintStyle::Fill).unwrap();
    assert_eq!(locator.page_index, 1);
    let texture = atlas.mask_atlas_texture(1).unwrap();
    assert!(texture.width() > 256 || texture.height() > 256);
}

#[test]
fn tofu_glyphs_are_packed_like_any_other() {
    let handle = document("\u{E000}", 64.0);
    let (mut atlas, glyphs) = build_atlas(&handle);
    generate(&mut atlas, 1024, 1.0);

    assert_eq!(glyphs[0].glyph_id(), 0);
    assert!(atlas.get_locator(&glyphs[0], PaintStyle::Fill).is_some());
}

#[test]
fn empty_inputs_produce_no_atlas() {
    let font_manager = DebugFontManager::new("Debug");
    let empty: Property<TextDocumentHandle> = Property::Animated(Vec::new());
    assert!(TextAtlas::make(1, &empty, &font_manager).is_none());

    // A document with no characters builds a TextAtlas but no pages.
    let handle = document("", 64.0);
    let (mut atlas, glyphs) = build_atlas(&handle);
    generate(&mut atlas, 1024, 1.0);
    assert!(glyphs.is_empty());
    assert_eq!(atlas.mask_page_count(), 0);
    assert!(atlas.mask_atlas_texture(0).is_none());
}

#[test]
fn text_runs_are_drawn_at_the_atlas_scale() {
    let handle = document("AB", 64.0);
    let (mut atlas, _) = build_atlas(&handle);
    let context = generate(&mut atlas, 1024, 2.0);

    let draws = context.glyph_draws();
    assert!(!draws.is_empty());
    for draw in &draws {
        assert_eq!(draw.matrix.a, 2.0);
        assert_eq!(draw.matrix.d, 2.0);
        assert_eq!(draw.glyph_ids.len(), draw.positions.len());
    }
}
