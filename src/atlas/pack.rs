//! Online rectangle packing.

use crate::geom::Point;

const PADDING: i32 = 1;

/// An O(1)-per-insert online packer.
///
/// The packer tracks the current extent and an insertion cursor. Each
/// insert either continues the current row/column or, when the rectangle
/// would protrude too far past the extent relative to the remaining free
/// slab, opens a new one: growing right while the pack is taller than wide,
/// growing down otherwise. This keeps the pack roughly square without
/// backtracking. Feeding rectangles in descending size order (the caller
/// sorts) is what makes the approximation dense.
///
/// Every rectangle is inflated by a 1-pixel padding ring.
pub struct RectanglePack {
    width: i32,
    height: i32,
    x: i32,
    y: i32,
}

impl Default for RectanglePack {
    fn default() -> Self {
        Self::new()
    }
}

impl RectanglePack {
    pub fn new() -> Self {
        Self {
            width: PADDING,
            height: PADDING,
            x: PADDING,
            y: PADDING,
        }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Reserves a `w` x `h` rectangle and returns its top-left corner.
    pub fn add_rect(&mut self, w: i32, h: i32) -> Point {
        let w = w + PADDING;
        let h = h + PADDING;
        let area = (self.width - self.x) * (self.height - self.y);
        if (self.x + w - self.width) * self.y > area
            || (self.y + h - self.height) * self.x > area
        {
            if self.width <= self.height {
                self.x = self.width;
                self.y = PADDING;
                self.width += w;
            } else {
                self.x = PADDING;
                self.y = self.height;
                self.height += h;
            }
        }
        let point = Point::new(self.x as f32, self.y as f32);
        if self.x + w - self.width < self.y + h - self.height {
            self.x += w;
            self.height = self.height.max(self.y + h);
        } else {
            self.y += h;
            self.width = self.width.max(self.x + w);
        }
        point
    }

    pub fn reset(&mut self) {
        self.width = PADDING;
        self.height = PADDING;
        self.x = PADDING;
        self.y = PADDING;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Placed {
        x: i32,
        y: i32,
        w: i32,
        h: i32,
    }

    fn place(pack: &mut RectanglePack, w: i32, h: i32) -> Placed {
        let point = pack.add_rect(w, h);
        Placed {
            x: point.x as i32,
            y: point.y as i32,
            w,
            h,
        }
    }

    fn overlaps(a: &Placed, b: &Placed) -> bool {
        a.x < b.x + b.w && b.x < a.x + a.w && a.y < b.y + b.h && b.y < a.y + a.h
    }

    fn assert_disjoint(placed: &[Placed]) {
        for (i, a) in placed.iter().enumerate() {
            for b in &placed[i + 1..] {
                assert!(!overlaps(a, b), "rectangles overlap");
            }
        }
    }

    #[test]
    fn uniform_rects_tile_without_overlap() {
        let mut pack = RectanglePack::new();
        let placed: Vec<Placed> = (0..24).map(|_| place(&mut pack, 30, 30)).collect();
        assert_disjoint(&placed);
        // Extents stay roughly square.
        let ratio = pack.width() as f32 / pack.height() as f32;
        assert!(ratio > 0.3 && ratio < 3.0, "pack degenerated: {ratio}");
    }

    #[test]
    fn extents_cover_every_uniform_rect() {
        let mut pack = RectanglePack::new();
        let placed: Vec<Placed> = (0..16).map(|_| place(&mut pack, 40, 25)).collect();
        for p in &placed {
            assert!(p.x + p.w <= pack.width() + 1);
            assert!(p.y + p.h <= pack.height() + 1);
        }
    }

    #[test]
    fn first_rect_lands_at_the_padding_origin() {
        let mut pack = RectanglePack::new();
        let point = pack.add_rect(10, 10);
        assert_eq!(point, Point::new(1.0, 1.0));
        assert_eq!(pack.width(), 12);
        assert_eq!(pack.height(), 12);
    }

    #[test]
    fn reset_restores_the_initial_state() {
        let mut pack = RectanglePack::new();
        pack.add_rect(100, 50);
        pack.add_rect(30, 30);
        pack.reset();
        assert_eq!(pack.width(), 1);
        assert_eq!(pack.height(), 1);
        let point = pack.add_rect(10, 10);
        assert_eq!(point, Point::new(1.0, 1.0));
    }

    #[test]
    fn descending_mixed_sizes_stay_disjoint() {
        // Two descending runs the size of typical glyph boxes.
        let sizes: &[(i32, i32)] = &[
            (64, 80),
            (64, 80),
            (60, 74),
            (60, 74),
            (48, 60),
            (48, 60),
            (48, 60),
            (32, 40),
            (32, 40),
            (32, 40),
            (32, 40),
            (12, 16),
            (12, 16),
        ];
        let mut pack = RectanglePack::new();
        let placed: Vec<Placed> = sizes.iter().map(|&(w, h)| place(&mut pack, w, h)).collect();
        assert_disjoint(&placed);
    }
}
