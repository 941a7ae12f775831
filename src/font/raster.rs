//! # Glyph Rasterization
//!
//! Converts TrueType glyph outlines into anti-aliased coverage masks.
//!
//! Outlines are flattened into line segments, and each segment deposits
//! signed area into an accumulation buffer. A running prefix sum over the
//! buffer then yields per-pixel coverage under the nonzero winding rule.

use image::{Rgb, RgbImage};
use ttf_parser::{Face, GlyphId, OutlineBuilder};

use super::blend_pixel;

const QUAD_STEPS: usize = 8;
const CUBIC_STEPS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: f32,
    y: f32,
}

/// An anti-aliased glyph mask positioned on the canvas.
#[derive(Debug, Clone)]
pub struct GlyphCoverage {
    /// Canvas x of the mask's left column.
    pub x: i64,
    /// Canvas y of the mask's top row.
    pub y: i64,
    pub width: usize,
    pub height: usize,
    /// Row-major coverage in `0.0..=1.0`.
    pub coverage: Vec<f32>,
}

impl GlyphCoverage {
    pub fn blit(&self, canvas: &mut RgbImage, color: Rgb<u8>) {
        for row in 0..self.height {
            for col in 0..self.width {
                let alpha = self.coverage[row * self.width + col];
                if alpha > 0.0 {
                    blend_pixel(canvas, self.x + col as i64, self.y + row as i64, color, alpha);
                }
            }
        }
    }
}

/// Rasterize one glyph with its origin at `(pen_x, baseline)`.
///
/// Returns `None` for glyphs without an outline (spaces).
pub fn rasterize_glyph(
    face: &Face<'_>,
    glyph: GlyphId,
    scale: f32,
    pen_x: f32,
    baseline: f32,
) -> Option<GlyphCoverage> {
    let bbox = face.glyph_bounding_box(glyph)?;

    // One pixel of slack on every side keeps segment endpoints in bounds.
    let left = (pen_x + bbox.x_min as f32 * scale).floor() as i64 - 1;
    let top = (baseline - bbox.y_max as f32 * scale).floor() as i64 - 1;
    let right = (pen_x + bbox.x_max as f32 * scale).ceil() as i64 + 1;
    let bottom = (baseline - bbox.y_min as f32 * scale).ceil() as i64 + 1;
    let width = (right - left).max(1) as usize + 1;
    let height = (bottom - top).max(1) as usize + 1;

    let mut flattener = Flattener {
        scale,
        offset_x: pen_x - left as f32,
        offset_y: baseline - top as f32,
        start: Point { x: 0.0, y: 0.0 },
        last: Point { x: 0.0, y: 0.0 },
        acc: Accumulator::new(width, height),
    };
    face.outline_glyph(glyph, &mut flattener)?;

    Some(GlyphCoverage {
        x: left,
        y: top,
        width,
        height,
        coverage: flattener.acc.into_coverage(),
    })
}

/// Walks an outline in font units and feeds flattened segments, in mask
/// pixel space, to the accumulator.
struct Flattener {
    scale: f32,
    offset_x: f32,
    offset_y: f32,
    start: Point,
    last: Point,
    acc: Accumulator,
}

impl Flattener {
    fn map(&self, x: f32, y: f32) -> Point {
        Point {
            x: self.offset_x + x * self.scale,
            y: self.offset_y - y * self.scale,
        }
    }
}

impl OutlineBuilder for Flattener {
    fn move_to(&mut self, x: f32, y: f32) {
        let p = self.map(x, y);
        self.start = p;
        self.last = p;
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let p = self.map(x, y);
        self.acc.line(self.last, p);
        self.last = p;
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let p0 = self.last;
        let c = self.map(x1, y1);
        let p = self.map(x, y);
        let mut prev = p0;
        for step in 1..=QUAD_STEPS {
            let t = step as f32 / QUAD_STEPS as f32;
            let mt = 1.0 - t;
            let next = Point {
                x: mt * mt * p0.x + 2.0 * mt * t * c.x + t * t * p.x,
                y: mt * mt * p0.y + 2.0 * mt * t * c.y + t * t * p.y,
            };
            self.acc.line(prev, next);
            prev = next;
        }
        self.last = p;
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let p0 = self.last;
        let c1 = self.map(x1, y1);
        let c2 = self.map(x2, y2);
        let p = self.map(x, y);
        let mut prev = p0;
        for step in 1..=CUBIC_STEPS {
            let t = step as f32 / CUBIC_STEPS as f32;
            let mt = 1.0 - t;
            let a = mt * mt * mt;
            let b = 3.0 * mt * mt * t;
            let c = 3.0 * mt * t * t;
            let d = t * t * t;
            let next = Point {
                x: a * p0.x + b * c1.x + c * c2.x + d * p.x,
                y: a * p0.y + b * c1.y + c * c2.y + d * p.y,
            };
            self.acc.line(prev, next);
            prev = next;
        }
        self.last = p;
    }

    fn close(&mut self) {
        if self.last != self.start {
            self.acc.line(self.last, self.start);
        }
        self.last = self.start;
    }
}

/// Signed-area accumulation buffer.
struct Accumulator {
    width: usize,
    height: usize,
    cells: Vec<f32>,
}

impl Accumulator {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0.0; width * height + 2],
        }
    }

    fn add(&mut self, index: i64, value: f32) {
        if index < 0 {
            return;
        }
        if let Some(cell) = self.cells.get_mut(index as usize) {
            *cell += value;
        }
    }

    /// Deposit the area contribution of one segment, row by row.
    fn line(&mut self, p0: Point, p1: Point) {
        if p0.y == p1.y {
            return;
        }
        let (dir, p0, p1) = if p0.y < p1.y {
            (1.0, p0, p1)
        } else {
            (-1.0, p1, p0)
        };
        let dxdy = (p1.x - p0.x) / (p1.y - p0.y);
        let mut x = p0.x;
        let y_start = p0.y.max(0.0) as usize;
        let y_end = self.height.min(p1.y.ceil().max(0.0) as usize);

        for y in y_start..y_end {
            let row_start = (y * self.width) as i64;
            let dy = ((y + 1) as f32).min(p1.y) - (y as f32).max(p0.y);
            let x_next = x + dxdy * dy;
            let d = dy * dir;
            let (x0, x1) = if x < x_next { (x, x_next) } else { (x_next, x) };
            let x0_floor = x0.floor();
            let x0i = x0_floor as i64;
            let x1_ceil = x1.ceil();
            let x1i = x1_ceil as i64;

            if x1i <= x0i + 1 {
                // Segment stays within one pixel column on this row.
                let xmf = 0.5 * (x + x_next) - x0_floor;
                self.add(row_start + x0i, d - d * xmf);
                self.add(row_start + x0i + 1, d * xmf);
            } else {
                let s = (x1 - x0).recip();
                let x0f = x0 - x0_floor;
                let a0 = 0.5 * s * (1.0 - x0f) * (1.0 - x0f);
                let x1f = x1 - x1_ceil + 1.0;
                let am = 0.5 * s * x1f * x1f;
                self.add(row_start + x0i, d * a0);
                if x1i == x0i + 2 {
                    self.add(row_start + x0i + 1, d * (1.0 - a0 - am));
                } else {
                    let a1 = s * (1.5 - x0f);
                    self.add(row_start + x0i + 1, d * (a1 - a0));
                    for xi in (x0i + 2)..(x1i - 1) {
                        self.add(row_start + xi, d * s);
                    }
                    let a2 = a1 + (x1i - x0i - 3) as f32 * s;
                    self.add(row_start + x1i - 1, d * (1.0 - a2 - am));
                }
                self.add(row_start + x1i, d * am);
            }
            x = x_next;
        }
    }

    fn into_coverage(self) -> Vec<f32> {
        let mut running = 0.0f32;
        self.cells
            .into_iter()
            .take(self.width * self.height)
            .map(|cell| {
                running += cell;
                running.abs().min(1.0)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(acc: &mut Accumulator, x0: f32, y0: f32, x1: f32, y1: f32) {
        let a = Point { x: x0, y: y0 };
        let b = Point { x: x1, y: y0 };
        let c = Point { x: x1, y: y1 };
        let d = Point { x: x0, y: y1 };
        acc.line(a, b);
        acc.line(b, c);
        acc.line(c, d);
        acc.line(d, a);
    }

    #[test]
    fn test_pixel_aligned_square_is_fully_covered() {
        let mut acc = Accumulator::new(6, 6);
        square(&mut acc, 1.0, 1.0, 4.0, 4.0);
        let cov = acc.into_coverage();
        for y in 0..6 {
            for x in 0..6 {
                let v = cov[y * 6 + x];
                let inside = (1..4).contains(&x) && (1..4).contains(&y);
                if inside {
                    assert!((v - 1.0).abs() < 1e-4, "({}, {}) = {}", x, y, v);
                } else {
                    assert!(v.abs() < 1e-4, "({}, {}) = {}", x, y, v);
                }
            }
        }
    }

    #[test]
    fn test_half_pixel_edge_gives_partial_coverage() {
        let mut acc = Accumulator::new(6, 4);
        square(&mut acc, 1.5, 1.0, 3.0, 2.0);
        let cov = acc.into_coverage();
        assert!((cov[6 + 1] - 0.5).abs() < 1e-4);
        assert!((cov[6 + 2] - 1.0).abs() < 1e-4);
        assert!(cov[6 + 3].abs() < 1e-4);
    }

    #[test]
    fn test_winding_direction_does_not_matter() {
        let mut cw = Accumulator::new(5, 5);
        square(&mut cw, 1.0, 1.0, 3.0, 3.0);
        let mut ccw = Accumulator::new(5, 5);
        square(&mut ccw, 3.0, 3.0, 1.0, 1.0);
        assert_eq!(cw.into_coverage(), ccw.into_coverage());
    }

    #[test]
    fn test_horizontal_line_deposits_nothing() {
        let mut acc = Accumulator::new(4, 4);
        acc.line(Point { x: 0.0, y: 2.0 }, Point { x: 3.0, y: 2.0 });
        assert!(acc.into_coverage().iter().all(|v| *v == 0.0));
    }
}
