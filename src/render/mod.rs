//! Render abstraction consumed by the atlas.
//!
//! The GPU device, its surfaces and the canvas that rasterizes glyph runs
//! all belong to the host renderer. The atlas only borrows them through the
//! traits below:
//! - [`Context`]: owns the device caps and creates offscreen [`Surface`]s.
//! - [`Surface`]: one offscreen render target; hands out its [`Canvas`] for
//!   drawing and its [`Texture`] once drawn.
//! - [`Canvas`]: a 2D canvas with a current matrix, a glyph-run draw call,
//!   and the batched `draw_atlas` call the render bridge emits.
//! - [`RenderCache`]: per-asset state owned by the host; the atlas only
//!   reads the current maximum scale.
//!
//! [`recording`] implements all of these without a GPU.

pub mod recording;

use std::sync::Arc;

use crate::font::{Font, GlyphId};
use crate::geom::{Matrix, Point, Rect};
use crate::text::Color;

/// Host-assigned id of a text asset.
pub type AssetId = u32;

/// How a paint is applied. Discriminants are stable; they are written into
/// atlas and style keys.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum PaintStyle {
    #[default]
    Fill = 0,
    Stroke = 1,
}

/// Paint state for one glyph run.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Paint {
    pub style: PaintStyle,
    pub stroke_width: f32,
}

/// A GPU texture handle owned by the atlas page that produced it.
pub trait Texture {
    fn width(&self) -> i32;
    fn height(&self) -> i32;
}

/// A 2D canvas.
pub trait Canvas {
    fn matrix(&self) -> Matrix;

    fn set_matrix(&mut self, matrix: Matrix);

    /// Appends `matrix` to the current transform.
    fn concat(&mut self, matrix: Matrix);

    /// Draws one glyph run: `glyph_ids[i]` at `positions[i]`, all with the
    /// same font and paint.
    fn draw_glyphs(&mut self, glyph_ids: &[GlyphId], positions: &[Point], font: &Font, paint: &Paint);

    /// Draws a batch of sprites from `texture`. `rects[i]` selects the
    /// source region, `matrices[i]` places it. `colors` is `None` for color
    /// glyph batches (the texture already carries color).
    fn draw_atlas(
        &mut self,
        texture: &dyn Texture,
        matrices: &[Matrix],
        rects: &[Rect],
        colors: Option<&[Color]>,
        alphas: &[f32],
    );
}

/// One offscreen render target.
pub trait Surface {
    fn canvas(&mut self) -> &mut dyn Canvas;

    /// The texture holding everything drawn so far.
    fn texture(&self) -> Arc<dyn Texture>;
}

/// The device-owning context.
pub trait Context {
    /// Upper bound for any page dimension in pixels.
    fn max_texture_size(&self) -> i32;

    /// Creates an offscreen surface, alpha-only for mask pages. `None` on
    /// allocation failure; the page then simply holds no texture.
    fn make_surface(&mut self, width: i32, height: i32, alpha_only: bool)
    -> Option<Box<dyn Surface>>;
}

/// Host-side per-asset render state.
pub trait RenderCache {
    /// The maximum scale the asset is currently drawn at. Drives atlas
    /// (re)generation.
    fn asset_max_scale(&self, asset_id: AssetId) -> f32;
}
