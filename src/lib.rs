//! `tessera` library crate root.
//!
//! A glyph texture atlas engine for animated text rendering. Given text
//! documents (possibly animated across keyframes), it pre-rasterizes every
//! needed glyph bitmap into a compact set of GPU textures and maintains a
//! lookup table from glyph identity + paint style to a sub-rectangle of an
//! atlas page. A renderer resolves visible glyphs through that table and
//! draws whole layers with a few batched atlas calls per frame.
//!
//! What the crate does **not** do: it neither loads fonts nor owns a GPU.
//! Both arrive through traits: [`font::Typeface`]/[`font::FontManager`] for
//! faces (a `fontdb` + `ttf-parser` backend ships in [`font::face`]) and
//! [`render::Context`]/[`render::Canvas`] for surfaces (a recording backend
//! ships in [`render::recording`]).
//!
//! Typical flow:
//! 1. [`atlas::TextAtlas::make`] with the document property of a text layer.
//! 2. Per frame: [`text::glyph::Glyph::build_from_text`] +
//!    [`text::graphic::Text::make_from`], then [`text::graphic::Text::draw`],
//!    which regenerates the atlas when the rendering scale changed.

pub mod atlas;
pub mod font;
pub mod geom;
pub mod render;
pub mod text;

pub use atlas::{AtlasLocator, TextAtlas};
pub use font::{Font, FontManager, FontMetrics, GlyphId, Typeface};
pub use geom::{Matrix, Point, Rect};
pub use render::{AssetId, Canvas, Context, Paint, PaintStyle, RenderCache, Surface, Texture};
pub use text::glyph::Glyph;
pub use text::graphic::Text;
pub use text::{
    Color, GlyphDocument, Keyframe, Property, TextDocument, TextDocumentHandle, TextPaint,
    TextStyle,
};
