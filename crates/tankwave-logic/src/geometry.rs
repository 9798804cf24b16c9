//! 2D geometry primitives shared by steering, combat, and the spatial index.

use serde::{Deserialize, Serialize};

/// 2D position/direction vector.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector for a heading angle.
    pub fn from_angle(angle: f32) -> Self {
        Self {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    pub fn length_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance_squared(&self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > 1e-6 {
            Self {
                x: self.x / len,
                y: self.y / len,
            }
        } else {
            Self::ZERO
        }
    }

    pub fn dot(&self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Perpendicular (rotated 90 degrees counter-clockwise).
    pub fn perp(&self) -> Self {
        Self {
            x: -self.y,
            y: self.x,
        }
    }

    pub fn angle(&self) -> f32 {
        self.y.atan2(self.x)
    }

    /// True if every component is finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn clamp_length(&self, max: f32) -> Self {
        let len = self.length();
        if len > max && len > 1e-6 {
            *self * (max / len)
        } else {
            *self
        }
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl std::ops::AddAssign for Vec2 {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl std::ops::Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, scalar: f32) -> Self {
        Self {
            x: self.x * scalar,
            y: self.y * scalar,
        }
    }
}

impl std::ops::Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

/// Smallest signed difference from `from` to `to`, in (-PI, PI].
pub fn angle_diff(from: f32, to: f32) -> f32 {
    let mut d = (to - from) % (std::f32::consts::PI * 2.0);
    if d > std::f32::consts::PI {
        d -= std::f32::consts::PI * 2.0;
    } else if d <= -std::f32::consts::PI {
        d += std::f32::consts::PI * 2.0;
    }
    d
}

/// Axis-aligned rectangle, origin at top-left.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }

    /// Rect grown by `margin` on every side.
    pub fn expanded(&self, margin: f32) -> Rect {
        Rect {
            x: self.x - margin,
            y: self.y - margin,
            w: self.w + margin * 2.0,
            h: self.h + margin * 2.0,
        }
    }

    /// True if a circle at `center` with `radius` overlaps this rect.
    pub fn overlaps_circle(&self, center: Vec2, radius: f32) -> bool {
        let nx = center.x.clamp(self.x, self.x + self.w);
        let ny = center.y.clamp(self.y, self.y + self.h);
        Vec2::new(nx, ny).distance_squared(center) <= radius * radius
    }

    /// True if the segment a->b crosses this rect.
    pub fn intersects_segment(&self, a: Vec2, b: Vec2) -> bool {
        self.segment_entry(a, b).is_some()
    }

    /// Entry parameter t in [0, 1] where the segment a->b first touches
    /// this rect, or `None` if it misses. Slab test; degenerate segments
    /// fall back to a containment check.
    pub fn segment_entry(&self, a: Vec2, b: Vec2) -> Option<f32> {
        let d = b - a;
        if d.length_squared() < 1e-12 {
            return if self.contains(a) { Some(0.0) } else { None };
        }
        let mut tmin = 0.0f32;
        let mut tmax = 1.0f32;
        for (start, delta, lo, hi) in [
            (a.x, d.x, self.x, self.x + self.w),
            (a.y, d.y, self.y, self.y + self.h),
        ] {
            if delta.abs() < 1e-9 {
                if start < lo || start > hi {
                    return None;
                }
            } else {
                let inv = 1.0 / delta;
                let (mut t0, mut t1) = ((lo - start) * inv, (hi - start) * inv);
                if t0 > t1 {
                    std::mem::swap(&mut t0, &mut t1);
                }
                tmin = tmin.max(t0);
                tmax = tmax.min(t1);
                if tmin > tmax {
                    return None;
                }
            }
        }
        Some(tmin)
    }
}

/// Closest distance from point `p` to segment a->b.
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-12 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}
