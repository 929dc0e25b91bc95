//! Text documents and the glyph objects derived from them.
//!
//! Pipeline:
//! 1. A host hands over [`TextDocument`]s, possibly animated across
//!    keyframes ([`Property`]).
//! 2. [`simple_glyph::get_simple_glyphs`] tokenizes a document into shared
//!    [`SimpleGlyph`]s (one per distinct character name).
//! 3. [`glyph::Glyph::build_from_text`] produces per-draw display glyphs with
//!    layout metrics and the vertical-layout extra matrix.
//! 4. [`graphic::Text`] draws display glyphs through a
//!    [`TextAtlas`](crate::atlas::TextAtlas).
//!
//! [`SimpleGlyph`]: simple_glyph::SimpleGlyph

pub mod glyph;
pub mod graphic;
pub mod simple_glyph;

use std::sync::Arc;

use crate::text::simple_glyph::SimpleGlyph;

/// How a glyph is painted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TextStyle {
    #[default]
    Fill,
    Stroke,
    StrokeAndFill,
}

/// Text layout direction of a document.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TextDirection {
    #[default]
    Horizontal,
    Vertical,
}

/// An opaque RGB color. Alpha lives on the glyph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Color {
    pub const BLACK: Self = Self {
        red: 0,
        green: 0,
        blue: 0,
    };
    pub const WHITE: Self = Self {
        red: 255,
        green: 255,
        blue: 255,
    };
}

/// One text layer's content and styling, as authored.
#[derive(Debug, Clone)]
pub struct TextDocument {
    pub text: String,
    pub font_family: String,
    pub font_style: String,
    pub font_size: f32,
    pub faux_bold: bool,
    pub faux_italic: bool,
    pub fill_color: Color,
    pub stroke_color: Color,
    pub stroke_width: f32,
    pub apply_fill: bool,
    pub apply_stroke: bool,
    pub stroke_over_fill: bool,
    pub direction: TextDirection,
}

impl Default for TextDocument {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_family: String::new(),
            font_style: String::new(),
            font_size: 24.0,
            faux_bold: false,
            faux_italic: false,
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            stroke_width: 0.0,
            apply_fill: true,
            apply_stroke: false,
            stroke_over_fill: true,
            direction: TextDirection::Horizontal,
        }
    }
}

/// Shared handle to a document. Handle identity (`Arc::ptr_eq`) is document
/// identity for the atlas.
pub type TextDocumentHandle = Arc<TextDocument>;

/// Drawing attributes derived from a document, carried alongside its glyphs.
#[derive(Debug, Clone, Default)]
pub struct TextPaint {
    pub style: TextStyle,
    pub fill_color: Color,
    pub stroke_color: Color,
    pub stroke_width: f32,
    pub stroke_over_fill: bool,
    pub font_family: String,
    pub font_style: String,
    pub font_size: f32,
    pub faux_bold: bool,
    pub faux_italic: bool,
    pub is_vertical: bool,
}

/// One keyframe of an animated property. Values change discretely for text
/// documents; there is no interpolation between `start_value` and
/// `end_value` of neighboring keyframes.
#[derive(Debug, Clone)]
pub struct Keyframe<T> {
    pub start_time: f32,
    pub end_time: f32,
    pub start_value: T,
    pub end_value: T,
}

/// A possibly animated property value.
#[derive(Debug, Clone)]
pub enum Property<T> {
    Value(T),
    Animated(Vec<Keyframe<T>>),
}

impl<T> Property<T> {
    pub fn animatable(&self) -> bool {
        matches!(self, Property::Animated(_))
    }

    /// The value in effect at `time`, with hold semantics between keyframes.
    /// `None` only for an animated property without keyframes.
    pub fn value_at(&self, time: f32) -> Option<&T> {
        match self {
            Property::Value(value) => Some(value),
            Property::Animated(keyframes) => {
                let mut current = &keyframes.first()?.start_value;
                for keyframe in keyframes {
                    if time < keyframe.start_time {
                        break;
                    }
                    current = if time < keyframe.end_time {
                        &keyframe.start_value
                    } else {
                        &keyframe.end_value
                    };
                }
                Some(current)
            }
        }
    }
}

/// A tokenized document: the shared glyph list plus its paint.
#[derive(Clone)]
pub struct GlyphDocument {
    pub glyphs: Vec<Arc<SimpleGlyph>>,
    pub paint: TextPaint,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyframe(start_time: f32, end_time: f32, start: &str, end: &str) -> Keyframe<String> {
        Keyframe {
            start_time,
            end_time,
            start_value: start.to_string(),
            end_value: end.to_string(),
        }
    }

    #[test]
    fn constant_property_holds_its_value() {
        let property = Property::Value("A".to_string());
        assert!(!property.animatable());
        assert_eq!(property.value_at(0.0).unwrap(), "A");
        assert_eq!(property.value_at(100.0).unwrap(), "A");
    }

    #[test]
    fn animated_property_steps_through_keyframes() {
        let property = Property::Animated(vec![
            keyframe(1.0, 2.0, "A", "B"),
            keyframe(3.0, 4.0, "B", "C"),
        ]);
        assert!(property.animatable());
        assert_eq!(property.value_at(0.0).unwrap(), "A");
        assert_eq!(property.value_at(1.5).unwrap(), "A");
        assert_eq!(property.value_at(2.5).unwrap(), "B");
        assert_eq!(property.value_at(5.0).unwrap(), "C");
    }

    #[test]
    fn empty_animated_property_has_no_value() {
        let property: Property<String> = Property::Animated(Vec::new());
        assert!(property.value_at(0.0).is_none());
    }
}
