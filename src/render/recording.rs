//! A software reference backend.
//!
//! Implements the render traits by recording draw commands instead of
//! rasterizing. Hosts use it to exercise the full atlas lifecycle without a
//! GPU; the test suite runs entirely on it.
//!
//! Every surface shares one command log owned by the [`RecordingContext`],
//! keyed by the texture id the surface hands out, so commands stay
//! inspectable after the surfaces are dropped.

use std::sync::{Arc, Mutex, PoisonError};

use crate::font::{Font, GlyphId};
use crate::geom::{Matrix, Point, Rect};
use crate::render::{AssetId, Canvas, Context, Paint, RenderCache, Surface, Texture};
use crate::text::Color;

/// A CPU-side texture handle with identity.
#[derive(Debug)]
pub struct RecordingTexture {
    id: u32,
    width: i32,
    height: i32,
    alpha_only: bool,
}

impl RecordingTexture {
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn is_alpha_only(&self) -> bool {
        self.alpha_only
    }
}

impl Texture for RecordingTexture {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }
}

/// One recorded `draw_glyphs` call.
#[derive(Debug, Clone)]
pub struct GlyphDraw {
    pub texture_id: u32,
    pub matrix: Matrix,
    pub glyph_ids: Vec<GlyphId>,
    pub positions: Vec<Point>,
    pub font_size: f32,
    pub paint: Paint,
}

/// One recorded `draw_atlas` call. `texture_id` is the destination canvas;
/// the sampled atlas page is identified by its dimensions.
#[derive(Debug, Clone)]
pub struct AtlasDraw {
    pub texture_id: u32,
    pub source_width: i32,
    pub source_height: i32,
    pub matrices: Vec<Matrix>,
    pub rects: Vec<Rect>,
    pub colors: Option<Vec<Color>>,
    pub alphas: Vec<f32>,
}

#[derive(Debug, Default)]
struct CommandLog {
    glyph_draws: Vec<GlyphDraw>,
    atlas_draws: Vec<AtlasDraw>,
}

type SharedLog = Arc<Mutex<CommandLog>>;

fn locked(log: &SharedLog) -> std::sync::MutexGuard<'_, CommandLog> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Canvas writing into the shared command log.
pub struct RecordingCanvas {
    matrix: Matrix,
    texture_id: u32,
    log: SharedLog,
}

impl Canvas for RecordingCanvas {
    fn matrix(&self) -> Matrix {
        self.matrix
    }

    fn set_matrix(&mut self, matrix: Matrix) {
        self.matrix = matrix;
    }

    fn concat(&mut self, matrix: Matrix) {
        let mut concatenated = matrix;
        concatenated.post_concat(&self.matrix);
        self.matrix = concatenated;
    }

    fn draw_glyphs(
        &mut self,
        glyph_ids: &[GlyphId],
        positions: &[Point],
        font: &Font,
        paint: &Paint,
    ) {
        locked(&self.log).glyph_draws.push(GlyphDraw {
            texture_id: self.texture_id,
            matrix: self.matrix,
            glyph_ids: glyph_ids.to_vec(),
            positions: positions.to_vec(),
            font_size: font.size(),
            paint: *paint,
        });
    }

    fn draw_atlas(
        &mut self,
        texture: &dyn Texture,
        matrices: &[Matrix],
        rects: &[Rect],
        colors: Option<&[Color]>,
        alphas: &[f32],
    ) {
        locked(&self.log).atlas_draws.push(AtlasDraw {
            texture_id: self.texture_id,
            source_width: texture.width(),
            source_height: texture.height(),
            matrices: matrices.to_vec(),
            rects: rects.to_vec(),
            colors: colors.map(|c| c.to_vec()),
            alphas: alphas.to_vec(),
        });
    }
}

/// An offscreen surface handing out a [`RecordingCanvas`].
pub struct RecordingSurface {
    canvas: RecordingCanvas,
    texture: Arc<RecordingTexture>,
}

impl Surface for RecordingSurface {
    fn canvas(&mut self) -> &mut dyn Canvas {
        &mut self.canvas
    }

    fn texture(&self) -> Arc<dyn Texture> {
        self.texture.clone()
    }
}

/// A GPU-less [`Context`].
pub struct RecordingContext {
    max_texture_size: i32,
    next_texture_id: u32,
    log: SharedLog,
}

impl RecordingContext {
    pub fn new(max_texture_size: i32) -> Self {
        Self {
            max_texture_size,
            next_texture_id: 1,
            log: SharedLog::default(),
        }
    }

    /// All `draw_glyphs` commands recorded so far, across all surfaces.
    pub fn glyph_draws(&self) -> Vec<GlyphDraw> {
        locked(&self.log).glyph_draws.clone()
    }

    /// All `draw_atlas` commands recorded so far, across all surfaces.
    pub fn atlas_draws(&self) -> Vec<AtlasDraw> {
        locked(&self.log).atlas_draws.clone()
    }

    /// Creates a standalone target canvas (e.g. the frame the text is
    /// composited into), with texture id 0.
    pub fn target_canvas(&self) -> RecordingCanvas {
        RecordingCanvas {
            matrix: Matrix::IDENTITY,
            texture_id: 0,
            log: self.log.clone(),
        }
    }
}

impl Context for RecordingContext {
    fn max_texture_size(&self) -> i32 {
        self.max_texture_size
    }

    fn make_surface(
        &mut self,
        width: i32,
        height: i32,
        alpha_only: bool,
    ) -> Option<Box<dyn Surface>> {
        if width <= 0 || height <= 0 {
            return None;
        }
        let id = self.next_texture_id;
        self.next_texture_id += 1;
        let texture = Arc::new(RecordingTexture {
            id,
            width,
            height,
            alpha_only,
        });
        Some(Box::new(RecordingSurface {
            canvas: RecordingCanvas {
                matrix: Matrix::IDENTITY,
                texture_id: id,
                log: self.log.clone(),
            },
            texture,
        }))
    }
}

/// A [`RenderCache`] reporting one fixed scale for every asset.
#[derive(Debug, Copy, Clone)]
pub struct ConstantRenderCache {
    pub scale: f32,
}

impl ConstantRenderCache {
    pub fn new(scale: f32) -> Self {
        Self { scale }
    }
}

impl RenderCache for ConstantRenderCache {
    fn asset_max_scale(&self, _asset_id: AssetId) -> f32 {
        self.scale
    }
}
