//! System font backend: `fontdb` discovery + `ttf-parser` parsing.
//!
//! A [`FaceTypeface`] keeps the raw font bytes (`Arc<[u8]>`) plus the face
//! index and re-parses on each query. Parsing is header-only and cheap; a
//! parsed-face cache can be layered here later without touching callers.
//!
//! Coordinate conversion: font units are y-up, the pipeline is y-down. All
//! outputs are scaled by `size / units_per_em` and flipped.

use std::fs;
use std::path::Path as FilePath;
use std::sync::Arc;

use fontdb::{Database, Family, Query, Source, Stretch, Style, Weight};
use lyon::math::point;
use lyon::path::Path;

use crate::font::{FontError, FontManager, FontMetrics, GlyphId, Typeface, cache, next_typeface_id};
use crate::geom::{Point, Rect};

// Synthetic-bold outset and italic skew, as fractions of the font size.
const FAUX_BOLD_OUTSET: f32 = 1.0 / 32.0;
const FAUX_ITALIC_SKEW: f32 = 0.25;

/// A font face backed by raw TTF/OTF bytes.
pub struct FaceTypeface {
    unique_id: u32,
    family: String,
    style: String,
    bytes: Arc<[u8]>,
    index: u32,
    units_per_em: f32,
    has_color: bool,
}

impl FaceTypeface {
    /// Parses enough of the face to validate it and capture per-face
    /// constants (units per em, color table presence).
    pub fn from_data(
        bytes: Arc<[u8]>,
        index: u32,
        family: String,
        style: String,
    ) -> Result<Self, FontError> {
        let face = ttf_parser::Face::parse(&bytes, index).map_err(|_| FontError::ParseFailed)?;
        let units_per_em = f32::from(face.units_per_em());
        let tables = face.tables();
        let has_color = tables.colr.is_some()
            || tables.cbdt.is_some()
            || tables.sbix.is_some()
            || tables.svg.is_some();
        Ok(Self {
            unique_id: next_typeface_id(),
            family,
            style,
            bytes,
            index,
            units_per_em,
            has_color,
        })
    }

    /// The family name this face was resolved under.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// The style name this face was resolved under.
    pub fn style(&self) -> &str {
        &self.style
    }

    fn parse(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.bytes, self.index).ok()
    }

    fn scale_for(&self, size: f32) -> f32 {
        if self.units_per_em > 0.0 {
            size / self.units_per_em
        } else {
            0.0
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests(family: String, style: &str) -> Self {
        Self {
            unique_id: next_typeface_id(),
            family,
            style: style.to_string(),
            bytes: Arc::from(Vec::new()),
            index: 0,
            units_per_em: 1000.0,
            has_color: false,
        }
    }
}

impl Typeface for FaceTypeface {
    fn unique_id(&self) -> u32 {
        self.unique_id
    }

    fn has_color(&self) -> bool {
        self.has_color
    }

    fn glyph_id(&self, name: &str) -> GlyphId {
        let Some(ch) = name.chars().next() else {
            return 0;
        };
        let Some(face) = self.parse() else {
            return 0;
        };
        face.glyph_index(ch).map(|gid| gid.0).unwrap_or(0)
    }

    fn glyph_bounds(
        &self,
        glyph_id: GlyphId,
        size: f32,
        faux_bold: bool,
        faux_italic: bool,
    ) -> Rect {
        let Some(face) = self.parse() else {
            return Rect::EMPTY;
        };
        let Some(bbox) = face.glyph_bounding_box(ttf_parser::GlyphId(glyph_id)) else {
            return Rect::EMPTY;
        };
        let scale = self.scale_for(size);
        // Flip from y-up font units into y-down render space.
        let mut bounds = Rect::from_ltrb(
            f32::from(bbox.x_min) * scale,
            -f32::from(bbox.y_max) * scale,
            f32::from(bbox.x_max) * scale,
            -f32::from(bbox.y_min) * scale,
        );
        if faux_bold {
            let outset = size * FAUX_BOLD_OUTSET;
            bounds.outset(outset, outset);
        }
        if faux_italic {
            // The skew leans the glyph right at the top; widen the box to
            // cover both sheared edges.
            let shear_top = -FAUX_ITALIC_SKEW * bounds.top;
            let shear_bottom = -FAUX_ITALIC_SKEW * bounds.bottom;
            bounds.left = (bounds.left + shear_top).min(bounds.left + shear_bottom);
            bounds.right = (bounds.right + shear_top).max(bounds.right + shear_bottom);
        }
        bounds
    }

    fn glyph_advance(&self, glyph_id: GlyphId, size: f32, vertical: bool) -> f32 {
        let Some(face) = self.parse() else {
            return 0.0;
        };
        let gid = ttf_parser::GlyphId(glyph_id);
        let advance = if vertical {
            face.glyph_ver_advance(gid)
                .or_else(|| face.glyph_hor_advance(gid))
        } else {
            face.glyph_hor_advance(gid)
        };
        advance.map(f32::from).unwrap_or(0.0) * self.scale_for(size)
    }

    fn glyph_vertical_offset(&self, glyph_id: GlyphId, size: f32) -> Point {
        // Move the horizontal origin to the vertical one: center the advance
        // and drop the baseline by the ascent.
        let advance = self.glyph_advance(glyph_id, size, false);
        let metrics = self.metrics(size);
        Point::new(-0.5 * advance, -metrics.ascent)
    }

    fn metrics(&self, size: f32) -> FontMetrics {
        let Some(face) = self.parse() else {
            return FontMetrics::default();
        };
        let scale = self.scale_for(size);
        // Prefer the typographic (OS/2) metrics, fall back to hhea.
        let ascender = face
            .typographic_ascender()
            .unwrap_or_else(|| face.ascender());
        let descender = face
            .typographic_descender()
            .unwrap_or_else(|| face.descender());
        let cap_height = face
            .capital_height()
            .map(f32::from)
            .unwrap_or(0.7 * self.units_per_em);
        let x_height = face
            .x_height()
            .map(f32::from)
            .unwrap_or(0.5 * self.units_per_em);
        FontMetrics {
            ascent: -f32::from(ascender) * scale,
            descent: -f32::from(descender) * scale,
            cap_height: cap_height * scale,
            x_height: x_height * scale,
        }
    }

    fn glyph_path(&self, glyph_id: GlyphId, size: f32) -> Option<Path> {
        let face = self.parse()?;
        let scale = self.scale_for(size);
        let mut builder = OutlineBuilder::new(scale);
        face.outline_glyph(ttf_parser::GlyphId(glyph_id), &mut builder)?;
        Some(builder.build())
    }
}

/// Converts `ttf-parser` outline callbacks into a lyon `Path`, scaling into
/// y-down render space on the fly.
///
/// A glyph may contain multiple contours; `move_to` starts a new one.
struct OutlineBuilder {
    builder: lyon::path::Builder,
    scale: f32,
    contour_open: bool,
}

impl OutlineBuilder {
    fn new(scale: f32) -> Self {
        Self {
            builder: Path::builder(),
            scale,
            contour_open: false,
        }
    }

    fn map(&self, x: f32, y: f32) -> lyon::math::Point {
        point(x * self.scale, -y * self.scale)
    }

    fn build(mut self) -> Path {
        if self.contour_open {
            self.builder.close();
            self.contour_open = false;
        }
        self.builder.build()
    }
}

impl ttf_parser::OutlineBuilder for OutlineBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        if self.contour_open {
            self.builder.close();
        }
        self.builder.begin(self.map(x, y));
        self.contour_open = true;
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(self.map(x, y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder
            .quadratic_bezier_to(self.map(x1, y1), self.map(x, y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder
            .cubic_bezier_to(self.map(x1, y1), self.map(x2, y2), self.map(x, y));
    }

    fn close(&mut self) {
        if self.contour_open {
            self.builder.close();
            self.contour_open = false;
        }
    }
}

/// A [`FontManager`] over the system font database.
pub struct SystemFontManager {
    db: Database,
    last_resort: Arc<FaceTypeface>,
}

impl SystemFontManager {
    /// Loads system fonts. Fails when no face can be loaded at all.
    pub fn new() -> Result<Self, FontError> {
        let mut db = Database::new();
        db.load_system_fonts();
        Self::with_database(db)
    }

    /// Builds a manager over a prepared database (e.g. with embedded fonts).
    pub fn with_database(db: Database) -> Result<Self, FontError> {
        let ids: Vec<fontdb::ID> = db.faces().map(|info| info.id).collect();
        let last_resort = ids
            .iter()
            .find_map(|id| load_typeface(&db, *id))
            .ok_or(FontError::NoFontsAvailable)?;
        Ok(Self { db, last_resort })
    }
}

impl FontManager for SystemFontManager {
    fn typeface_without_fallback(&self, family: &str, style: &str) -> Option<Arc<dyn Typeface>> {
        if let Some(typeface) =
            cache::find_by_predicate(|t| t.family() == family && t.style() == style)
        {
            return Some(typeface);
        }
        let (weight, face_style) = parse_style(style);
        let families = [Family::Name(family)];
        let query = Query {
            families: &families,
            weight,
            stretch: Stretch::Normal,
            style: face_style,
        };
        let id = self.db.query(&query)?;
        let info = self.db.face(id)?;
        let typeface = load_face(info, family.to_string(), style.to_string())?;
        cache::add(typeface.clone());
        Some(typeface)
    }

    fn fallback_typeface(&self, name: &str) -> (Arc<dyn Typeface>, GlyphId) {
        // Previously loaded faces first.
        if let Some(typeface) = cache::find_by_predicate(|t| t.glyph_id(name) != 0) {
            let glyph_id = typeface.glyph_id(name);
            return (typeface, glyph_id);
        }
        for info in self.db.faces() {
            let Some(typeface) = load_typeface(&self.db, info.id) else {
                continue;
            };
            let glyph_id = typeface.glyph_id(name);
            if glyph_id != 0 {
                cache::add(typeface.clone());
                return (typeface, glyph_id);
            }
        }
        log::debug!("no fallback face found for {name:?}, using last resort");
        (self.last_resort.clone(), 0)
    }
}

fn parse_style(style: &str) -> (Weight, Style) {
    let lower = style.to_ascii_lowercase();
    let weight = if lower.contains("bold") {
        Weight::BOLD
    } else {
        Weight::NORMAL
    };
    let face_style = if lower.contains("italic") {
        Style::Italic
    } else if lower.contains("oblique") {
        Style::Oblique
    } else {
        Style::Normal
    };
    (weight, face_style)
}

fn load_typeface(db: &Database, id: fontdb::ID) -> Option<Arc<FaceTypeface>> {
    let info = db.face(id)?;
    let family = info
        .families
        .first()
        .map(|(name, _)| name.clone())
        .unwrap_or_default();
    let style = info.post_script_name.clone();
    load_face(info, family, style)
}

fn load_face(info: &fontdb::FaceInfo, family: String, style: String) -> Option<Arc<FaceTypeface>> {
    match try_load_face(info, family, style) {
        Ok(typeface) => Some(typeface),
        Err(error) => {
            log::warn!("failed to load face {:?}: {error}", info.post_script_name);
            None
        }
    }
}

fn try_load_face(
    info: &fontdb::FaceInfo,
    family: String,
    style: String,
) -> Result<Arc<FaceTypeface>, FontError> {
    let bytes = match &info.source {
        Source::File(path) | Source::SharedFile(path, _) => read_font_bytes(path)?,
        Source::Binary(data) => Arc::from((*data).as_ref().as_ref()),
    };
    let typeface = FaceTypeface::from_data(bytes, info.index, family, style)?;
    Ok(Arc::new(typeface))
}

fn read_font_bytes(path: &FilePath) -> Result<Arc<[u8]>, FontError> {
    match fs::read(path) {
        Ok(data) => Ok(Arc::<[u8]>::from(data)),
        Err(_) => Err(FontError::ReadFailed(path.display().to_string())),
    }
}
