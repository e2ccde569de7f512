//! Rasterization of brush dabs. Geometry is computed once per dab and then
//! applied to each buffer with its own [`PaintTarget`].

use emath::{Pos2, Vec2};
use image::{Rgba, RgbaImage};

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
pub const MASK_KEEP: Rgba<u8> = Rgba([0, 0, 0, 255]);
pub const MASK_FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compositing {
    /// Alpha blend over what is already there.
    SourceOver,
    /// Overwrite, no blending at the edges.
    Replace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaintTarget {
    pub color: Rgba<u8>,
    pub compositing: Compositing,
}

impl PaintTarget {
    pub fn brush(color: Rgba<u8>) -> Self {
        Self {
            color,
            compositing: Compositing::SourceOver,
        }
    }

    pub fn mask() -> Self {
        Self {
            color: MASK_FILL,
            compositing: Compositing::Replace,
        }
    }

    fn paint(&self, dst: &mut Rgba<u8>) {
        match self.compositing {
            Compositing::Replace => *dst = self.color,
            Compositing::SourceOver => *dst = source_over(*dst, self.color),
        }
    }
}

/// One stroke event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dab {
    /// Filled circle.
    Dot { center: Pos2, radius: f32 },
    /// Line with round caps, `radius` is half the line width.
    Segment { from: Pos2, to: Pos2, radius: f32 },
}

impl Dab {
    fn covers(&self, p: Pos2) -> bool {
        match *self {
            Dab::Dot { center, radius } => center.distance_sq(p) <= radius * radius,
            Dab::Segment { from, to, radius } => {
                distance_sq_to_segment(p, from, to) <= radius * radius
            }
        }
    }

    fn bounds(&self) -> (Pos2, Pos2) {
        match *self {
            Dab::Dot { center, radius } => {
                let r = Vec2::splat(radius);
                (center - r, center + r)
            }
            Dab::Segment { from, to, radius } => {
                let r = Vec2::splat(radius);
                (from.min(to) - r, from.max(to) + r)
            }
        }
    }

    /// Pixels whose centers fall inside the dab, clipped to `width`x`height`.
    pub fn pixels(&self, width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> + '_ {
        let (min, max) = self.bounds();
        let clip = |v: f32, limit: u32| (v.floor().max(0.0) as u32).min(limit);
        let (x0, x1) = (clip(min.x, width), clip(max.x + 1.0, width));
        let (y0, y1) = (clip(min.y, height), clip(max.y + 1.0, height));

        (y0..y1)
            .flat_map(move |y| (x0..x1).map(move |x| (x, y)))
            .filter(move |&(x, y)| self.covers(emath::pos2(x as f32 + 0.5, y as f32 + 0.5)))
    }

    pub fn apply(&self, buffer: &mut RgbaImage, target: &PaintTarget) {
        let (width, height) = buffer.dimensions();
        for (x, y) in self.pixels(width, height) {
            target.paint(buffer.get_pixel_mut(x, y));
        }
    }
}

fn distance_sq_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return a.distance_sq(p);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (a + ab * t).distance_sq(p)
}

/// Unpremultiplied "over" operator.
fn source_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return TRANSPARENT;
    }
    let channel = |s: u8, d: u8| {
        let c = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(src[0], dst[0]),
        channel(src[1], dst[1]),
        channel(src[2], dst[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

#[cfg(test)]
mod tests {
    use emath::pos2;

    use super::*;

    #[test]
    fn dot_covers_pixel_centers_within_radius() {
        let dab = Dab::Dot {
            center: pos2(5.0, 5.0),
            radius: 1.0,
        };
        let mut pixels: Vec<_> = dab.pixels(10, 10).collect();
        pixels.sort_unstable();
        assert_eq!(pixels, vec![(4, 4), (4, 5), (5, 4), (5, 5)]);
    }

    #[test]
    fn dabs_are_clipped_to_the_buffer() {
        let dab = Dab::Dot {
            center: pos2(0.0, 0.0),
            radius: 3.0,
        };
        assert!(dab.pixels(4, 4).all(|(x, y)| x < 4 && y < 4));

        let outside = Dab::Dot {
            center: pos2(-50.0, 80.0),
            radius: 3.0,
        };
        assert_eq!(outside.pixels(4, 4).count(), 0);
    }

    #[test]
    fn segment_has_round_caps() {
        let dab = Dab::Segment {
            from: pos2(5.0, 10.5),
            to: pos2(15.0, 10.5),
            radius: 2.0,
        };
        let covered: Vec<_> = dab.pixels(30, 30).collect();
        // Along the line and one radius beyond each end point
        assert!(covered.contains(&(10, 10)));
        assert!(covered.contains(&(3, 10)));
        assert!(covered.contains(&(16, 10)));
        assert!(!covered.contains(&(2, 10)));
        // Corners of the bounding box stay empty
        assert!(!covered.contains(&(3, 8)));
        assert!(!covered.contains(&(16, 12)));
    }

    #[test]
    fn degenerate_segment_is_a_dot() {
        let segment = Dab::Segment {
            from: pos2(5.0, 5.0),
            to: pos2(5.0, 5.0),
            radius: 2.0,
        };
        let dot = Dab::Dot {
            center: pos2(5.0, 5.0),
            radius: 2.0,
        };
        assert_eq!(
            segment.pixels(10, 10).collect::<Vec<_>>(),
            dot.pixels(10, 10).collect::<Vec<_>>()
        );
    }

    #[test]
    fn replace_target_writes_exact_color() {
        let mut buffer = RgbaImage::from_pixel(8, 8, MASK_KEEP);
        let dab = Dab::Dot {
            center: pos2(4.0, 4.0),
            radius: 2.0,
        };
        dab.apply(&mut buffer, &PaintTarget::mask());
        dab.apply(&mut buffer, &PaintTarget::mask());
        assert!(buffer.pixels().all(|p| *p == MASK_KEEP || *p == MASK_FILL));
        assert_eq!(buffer.get_pixel(4, 4), &MASK_FILL);
    }

    #[test]
    fn source_over_accumulates_translucent_paint() {
        let color = Rgba([236, 101, 13, 128]);
        let once = source_over(TRANSPARENT, color);
        assert_eq!(once, color);
        let twice = source_over(once, color);
        assert_eq!([twice[0], twice[1], twice[2]], [236, 101, 13]);
        assert!(twice[3] > once[3]);
    }
}
