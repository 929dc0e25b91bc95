//! The drawable text graphic.
//!
//! Owns the display glyphs of one text layer and knows how to:
//! - measure the union bounds (stroke-inflated),
//! - hit test a point against glyph outlines,
//! - extract the combined outline path,
//! - draw through the atlas: resolve each visible (glyph, style) pair to a
//!   locator and emit batched `draw_atlas` calls, flushing on page changes.

use lyon::algorithms::hit_test::hit_test_path;
use lyon::math::point;
use lyon::path::{Event, Path};
use lyon::tessellation::{
    BuffersBuilder, FillRule, StrokeOptions, StrokeTessellator, StrokeVertex,
    StrokeVertexConstructor, VertexBuffers,
};

use crate::atlas::TextAtlas;
use crate::geom::{Matrix, Point, Rect};
use crate::render::{Canvas, Context, PaintStyle, RenderCache};
use crate::text::glyph::Glyph;
use crate::text::{Color, TextStyle};

const HIT_TEST_TOLERANCE: f32 = 0.1;

/// A text layer prepared for drawing.
pub struct Text {
    glyphs: Vec<Glyph>,
    bounds: Rect,
    has_alpha: bool,
}

impl Text {
    /// Wraps a glyph list, measuring the union of transformed glyph bounds
    /// (unless the caller supplies precomputed bounds) inflated by the
    /// largest stroke width. `None` for an empty list.
    pub fn make_from(glyphs: Vec<Glyph>, calculated_bounds: Option<Rect>) -> Option<Text> {
        if glyphs.is_empty() {
            return None;
        }
        let mut has_alpha = false;
        let mut bounds = calculated_bounds.unwrap_or(Rect::EMPTY);
        let mut max_stroke_width = 0.0f32;
        for glyph in &glyphs {
            let glyph_bounds = glyph.matrix().map_rect(glyph.bounds());
            if calculated_bounds.is_none() {
                bounds.join(&glyph_bounds);
            }
            if glyph.stroke_width() > max_stroke_width {
                max_stroke_width = glyph.stroke_width();
            }
            if glyph.alpha() != 1.0 {
                has_alpha = true;
            }
        }
        bounds.outset(max_stroke_width, max_stroke_width);
        Some(Text {
            glyphs,
            bounds,
            has_alpha,
        })
    }

    #[inline]
    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    #[inline]
    pub fn measure_bounds(&self) -> Rect {
        self.bounds
    }

    /// Tests `(x, y)` against the drawn glyph outlines. Fill styles test
    /// point-in-path; stroke styles test the stroked outline. Glyphs with no
    /// outline are skipped.
    pub fn hit_test(&self, x: f32, y: f32) -> bool {
        for glyph in &self.glyphs {
            let Some(inverted) = glyph.total_matrix().invert() else {
                continue;
            };
            let local = inverted.map_point(Point::new(x, y));
            let Some(glyph_path) = glyph.font().glyph_path(glyph.glyph_id()) else {
                continue;
            };
            let style = glyph.style();
            if matches!(style, TextStyle::Fill | TextStyle::StrokeAndFill)
                && hit_test_path(
                    &point(local.x, local.y),
                    glyph_path.iter(),
                    FillRule::NonZero,
                    HIT_TEST_TOLERANCE,
                )
            {
                return true;
            }
            if matches!(style, TextStyle::Stroke | TextStyle::StrokeAndFill)
                && stroke_contains(&glyph_path, glyph.stroke_width(), local)
            {
                return true;
            }
        }
        false
    }

    /// The union of the fill outline paths mapped through each glyph's total
    /// matrix.
    ///
    /// Returns `None` when any glyph has non-opaque alpha, has no outline,
    /// or uses a stroke style (a stroked outline has no path-space
    /// representation here); callers then fall back to atlas drawing.
    pub fn path(&self) -> Option<Path> {
        if self.has_alpha {
            return None;
        }
        let mut builder = Path::builder();
        for glyph in &self.glyphs {
            if glyph.style() != TextStyle::Fill {
                return None;
            }
            let glyph_path = glyph.font().glyph_path(glyph.glyph_id())?;
            append_transformed(&mut builder, &glyph_path, &glyph.total_matrix());
        }
        Some(builder.build())
    }

    /// Draws every visible glyph through the atlas: a mask pass for outline
    /// glyphs, then a color pass for color typefaces.
    pub fn draw(
        &self,
        canvas: &mut dyn Canvas,
        context: &mut dyn Context,
        render_cache: &dyn RenderCache,
        atlas: &mut TextAtlas,
    ) {
        atlas.generate_if_needed(context, render_cache);
        self.draw_pass(canvas, atlas, false);
        self.draw_pass(canvas, atlas, true);
    }

    fn draw_pass(&self, canvas: &mut dyn Canvas, atlas: &TextAtlas, color_glyph: bool) {
        let mut parameters = Parameters::default();
        for glyph in &self.glyphs {
            if !glyph.is_visible() || color_glyph != glyph.font().typeface().has_color() {
                continue;
            }
            for style in paint_styles(glyph) {
                let Some(locator) = atlas.get_locator(glyph, style) else {
                    continue;
                };
                if parameters.page_index != locator.page_index {
                    flush(canvas, atlas, &parameters, color_glyph);
                    parameters = Parameters {
                        page_index: locator.page_index,
                        ..Parameters::default()
                    };
                }
                let mut stroke_width = 0.0;
                let mut color = glyph.fill_color();
                if style == PaintStyle::Stroke {
                    stroke_width = glyph.stroke_width();
                    color = glyph.stroke_color();
                }
                // Map the packed bitmap back onto the glyph's pre-layout
                // bounds, inflated by the stroke, then into the scene.
                let inverted = glyph.extra_matrix().invert().unwrap_or(Matrix::IDENTITY);
                let origin_bounds = inverted.map_rect(glyph.bounds());
                let mut matrix = Matrix::IDENTITY;
                matrix.post_scale(
                    (origin_bounds.width() + stroke_width * 2.0) / locator.location.width(),
                    (origin_bounds.height() + stroke_width * 2.0) / locator.location.height(),
                );
                matrix.post_translate(
                    origin_bounds.x() - stroke_width,
                    origin_bounds.y() - stroke_width,
                );
                matrix.post_concat(&glyph.total_matrix());
                parameters.matrices.push(matrix);
                parameters.rects.push(locator.location);
                parameters.colors.push(color);
                parameters.alphas.push(glyph.alpha());
            }
        }
        flush(canvas, atlas, &parameters, color_glyph);
    }
}

/// One pending `draw_atlas` batch, all entries on the same page.
#[derive(Default)]
struct Parameters {
    page_index: usize,
    matrices: Vec<Matrix>,
    rects: Vec<Rect>,
    colors: Vec<Color>,
    alphas: Vec<f32>,
}

fn flush(canvas: &mut dyn Canvas, atlas: &TextAtlas, parameters: &Parameters, color_glyph: bool) {
    if parameters.matrices.is_empty() {
        return;
    }
    let texture = if color_glyph {
        atlas.color_atlas_texture(parameters.page_index)
    } else {
        atlas.mask_atlas_texture(parameters.page_index)
    };
    let Some(texture) = texture else {
        return;
    };
    canvas.draw_atlas(
        texture.as_ref(),
        &parameters.matrices,
        &parameters.rects,
        if color_glyph {
            None
        } else {
            Some(&parameters.colors)
        },
        &parameters.alphas,
    );
}

/// The paint styles a glyph resolves to, in draw order.
fn paint_styles(glyph: &Glyph) -> Vec<PaintStyle> {
    match glyph.style() {
        TextStyle::Fill => vec![PaintStyle::Fill],
        TextStyle::Stroke => vec![PaintStyle::Stroke],
        TextStyle::StrokeAndFill => {
            if glyph.stroke_over_fill() {
                vec![PaintStyle::Fill, PaintStyle::Stroke]
            } else {
                vec![PaintStyle::Stroke, PaintStyle::Fill]
            }
        }
    }
}

/// Appends `path` into `builder` with every point mapped through `matrix`.
fn append_transformed(builder: &mut lyon::path::Builder, path: &Path, matrix: &Matrix) {
    let map = |p: lyon::math::Point| {
        let mapped = matrix.map_point(Point::new(p.x, p.y));
        point(mapped.x, mapped.y)
    };
    for event in path.iter() {
        match event {
            Event::Begin { at } => {
                builder.begin(map(at));
            }
            Event::Line { to, .. } => {
                builder.line_to(map(to));
            }
            Event::Quadratic { ctrl, to, .. } => {
                builder.quadratic_bezier_to(map(ctrl), map(to));
            }
            Event::Cubic {
                ctrl1, ctrl2, to, ..
            } => {
                builder.cubic_bezier_to(map(ctrl1), map(ctrl2), map(to));
            }
            Event::End { close, .. } => {
                builder.end(close);
            }
        }
    }
}

struct StrokePointCtor;

impl StrokeVertexConstructor<[f32; 2]> for StrokePointCtor {
    fn new_vertex(&mut self, vertex: StrokeVertex) -> [f32; 2] {
        let position = vertex.position();
        [position.x, position.y]
    }
}

/// Tests whether `local` lies on the stroked outline of `path` by
/// tessellating the stroke and scanning the triangles.
fn stroke_contains(path: &Path, stroke_width: f32, local: Point) -> bool {
    if stroke_width <= 0.0 {
        return false;
    }
    let mut tessellator = StrokeTessellator::new();
    let mut buffers: VertexBuffers<[f32; 2], u16> = VertexBuffers::new();
    let options = StrokeOptions::tolerance(HIT_TEST_TOLERANCE).with_line_width(stroke_width);
    let result = tessellator.tessellate_path(
        path,
        &options,
        &mut BuffersBuilder::new(&mut buffers, StrokePointCtor),
    );
    if result.is_err() {
        return false;
    }
    buffers.indices.chunks_exact(3).any(|triangle| {
        point_in_triangle(
            local,
            buffers.vertices[triangle[0] as usize],
            buffers.vertices[triangle[1] as usize],
            buffers.vertices[triangle[2] as usize],
        )
    })
}

fn point_in_triangle(p: Point, a: [f32; 2], b: [f32; 2], c: [f32; 2]) -> bool {
    let sign = |p1: [f32; 2], p2: [f32; 2], p3: [f32; 2]| {
        (p1[0] - p3[0]) * (p2[1] - p3[1]) - (p2[0] - p3[0]) * (p1[1] - p3[1])
    };
    let point = [p.x, p.y];
    let d1 = sign(point, a, b);
    let d2 = sign(point, b, c);
    let d3 = sign(point, c, a);
    let has_negative = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_positive = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_negative && has_positive)
}
