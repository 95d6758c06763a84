//! Planar geometry shared by every navigation module.
//!
//! Worker navigation happens on the ground plane, so everything here is 2D:
//! [`Vec2`] for positions and directions, [`Aabb`] for building footprints
//! (center + half-extents), and [`Shape`] for anything an obstacle can occupy.

use serde::{Deserialize, Serialize};

/// Below this length a vector is treated as having no direction.
pub const EPSILON: f32 = 1e-5;

/// 2D position or direction on the ground plane.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };
    pub const X: Self = Self { x: 1.0, y: 0.0 };
    pub const Y: Self = Self { x: 0.0, y: 1.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `radians` (counter-clockwise from +X).
    pub fn from_angle(radians: f32) -> Self {
        Self {
            x: radians.cos(),
            y: radians.sin(),
        }
    }

    pub fn dot(&self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    pub fn length_squared(&self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(&self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance_squared(&self, other: Self) -> f32 {
        (*self - other).length_squared()
    }

    pub fn distance(&self, other: Self) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Unit vector in the same direction, or [`Vec2::ZERO`] for a
    /// (near) zero vector.
    pub fn normalize(&self) -> Self {
        let len = self.length();
        if len > EPSILON {
            Self {
                x: self.x / len,
                y: self.y / len,
            }
        } else {
            Self::ZERO
        }
    }

    /// Counter-clockwise perpendicular (rotated +90°).
    pub fn perp(&self) -> Self {
        Self {
            x: -self.y,
            y: self.x,
        }
    }

    pub fn is_near_zero(&self) -> bool {
        self.length_squared() <= EPSILON * EPSILON
    }

    /// Move toward `target` by at most `max_step`, never overshooting.
    pub fn move_toward(&self, target: Self, max_step: f32) -> Self {
        let diff = target - *self;
        let dist = diff.length();
        if dist <= max_step || dist <= EPSILON {
            target
        } else {
            *self + diff * (max_step / dist)
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

/// Axis-aligned footprint (center + half-extents).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub cx: f32,
    pub cy: f32,
    pub half_w: f32,
    pub half_h: f32,
}

impl Aabb {
    /// Footprint centered on (`x`, `y`) with full `width` and `height`.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            cx: x,
            cy: y,
            half_w: width / 2.0,
            half_h: height / 2.0,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.cx, self.cy)
    }

    pub fn min_x(&self) -> f32 {
        self.cx - self.half_w
    }
    pub fn max_x(&self) -> f32 {
        self.cx + self.half_w
    }
    pub fn min_y(&self) -> f32 {
        self.cy - self.half_h
    }
    pub fn max_y(&self) -> f32 {
        self.cy + self.half_h
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x > self.min_x() && p.x < self.max_x() && p.y > self.min_y() && p.y < self.max_y()
    }

    pub fn corners(&self) -> [Vec2; 4] {
        [
            Vec2::new(self.min_x(), self.min_y()),
            Vec2::new(self.max_x(), self.min_y()),
            Vec2::new(self.max_x(), self.max_y()),
            Vec2::new(self.min_x(), self.max_y()),
        ]
    }

    /// Closest point of the (filled) box to `p`.
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x.clamp(self.min_x(), self.max_x()),
            p.y.clamp(self.min_y(), self.max_y()),
        )
    }

    /// Closest point on the box outline to `p`, also for points inside.
    pub fn boundary_point(&self, p: Vec2) -> Vec2 {
        if !self.contains(p) {
            return self.closest_point(p);
        }
        let to_left = p.x - self.min_x();
        let to_right = self.max_x() - p.x;
        let to_bottom = p.y - self.min_y();
        let to_top = self.max_y() - p.y;
        let nearest = to_left.min(to_right).min(to_bottom).min(to_top);
        if nearest == to_left {
            Vec2::new(self.min_x(), p.y)
        } else if nearest == to_right {
            Vec2::new(self.max_x(), p.y)
        } else if nearest == to_bottom {
            Vec2::new(p.x, self.min_y())
        } else {
            Vec2::new(p.x, self.max_y())
        }
    }

    /// Outward normal of the side `p` lies closest to.
    pub fn outward_normal(&self, p: Vec2) -> Vec2 {
        let d = [
            (p.x - self.min_x()).abs(),
            (p.x - self.max_x()).abs(),
            (p.y - self.min_y()).abs(),
            (p.y - self.max_y()).abs(),
        ];
        let min_val = d[0].min(d[1]).min(d[2]).min(d[3]);
        if d[0] == min_val {
            -Vec2::X
        } else if d[1] == min_val {
            Vec2::X
        } else if d[2] == min_val {
            -Vec2::Y
        } else {
            Vec2::Y
        }
    }

    /// Slab test: parametric entry `t` in `[0, 1]` of segment `a`→`b`.
    ///
    /// Segments starting inside the box never report an entry.
    pub fn segment_entry(&self, a: Vec2, b: Vec2) -> Option<f32> {
        if self.contains(a) {
            return None;
        }
        let d = b - a;
        let mut t_min = 0.0f32;
        let mut t_max = 1.0f32;
        for (origin, dir, lo, hi) in [
            (a.x, d.x, self.min_x(), self.max_x()),
            (a.y, d.y, self.min_y(), self.max_y()),
        ] {
            if dir.abs() < EPSILON {
                if origin <= lo || origin >= hi {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / dir;
            let mut t0 = (lo - origin) * inv;
            let mut t1 = (hi - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min >= t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

/// Area occupied by an obstacle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Rect(Aabb),
    Circle { center: Vec2, radius: f32 },
}

impl Shape {
    /// Bounding box of the occupied area.
    pub fn bounds(&self) -> Aabb {
        match *self {
            Shape::Rect(aabb) => aabb,
            Shape::Circle { center, radius } => {
                Aabb::new(center.x, center.y, radius * 2.0, radius * 2.0)
            }
        }
    }


    pub fn contains(&self, p: Vec2) -> bool {
        match *self {
            Shape::Rect(aabb) => aabb.contains(p),
            Shape::Circle { center, radius } => center.distance_squared(p) < radius * radius,
        }
    }

    /// Whether a circle of `radius` around `p` overlaps the shape.
    pub fn overlaps_circle(&self, p: Vec2, radius: f32) -> bool {
        match *self {
            Shape::Rect(aabb) => aabb.closest_point(p).distance_squared(p) < radius * radius,
            Shape::Circle {
                center,
                radius: own,
            } => center.distance_squared(p) < (own + radius) * (own + radius),
        }
    }

    /// First crossing of segment `a`→`b` into the shape: `(t, outward normal)`.
    pub fn segment_entry(&self, a: Vec2, b: Vec2) -> Option<(f32, Vec2)> {
        match *self {
            Shape::Rect(aabb) => aabb.segment_entry(a, b).map(|t| {
                let hit = a + (b - a) * t;
                (t, aabb.outward_normal(hit))
            }),
            Shape::Circle { center, radius } => {
                let d = b - a;
                let f = a - center;
                let c = f.length_squared() - radius * radius;
                if c <= 0.0 {
                    return None;
                }
                let qa = d.length_squared();
                if qa < EPSILON * EPSILON {
                    return None;
                }
                let qb = 2.0 * f.dot(d);
                let disc = qb * qb - 4.0 * qa * c;
                if disc < 0.0 {
                    return None;
                }
                let t = (-qb - disc.sqrt()) / (2.0 * qa);
                if !(0.0..=1.0).contains(&t) {
                    return None;
                }
                let hit = a + d * t;
                Some((t, (hit - center).normalize()))
            }
        }
    }

    /// First contact of a circle of `radius` swept from `a` to `b`:
    /// `(t, outward normal)`.
    ///
    /// Rects grow rounded corners, so the contact region is exactly the set
    /// of centers where [`Shape::overlaps_circle`] holds. The swept circle
    /// must start clear of the shape.
    pub fn swept_entry(&self, a: Vec2, b: Vec2, radius: f32) -> Option<(f32, Vec2)> {
        match *self {
            Shape::Circle {
                center,
                radius: own,
            } => Shape::Circle {
                center,
                radius: own + radius,
            }
            .segment_entry(a, b),
            Shape::Rect(aabb) if radius <= 0.0 => Shape::Rect(aabb).segment_entry(a, b),
            Shape::Rect(aabb) => {
                // Two crossed slabs plus one disc per corner
                let wide = Aabb {
                    half_w: aabb.half_w + radius,
                    ..aabb
                };
                let tall = Aabb {
                    half_h: aabb.half_h + radius,
                    ..aabb
                };
                let corners = aabb.corners().map(|corner| {
                    Shape::Circle {
                        center: corner,
                        radius,
                    }
                    .segment_entry(a, b)
                });
                [
                    Shape::Rect(wide).segment_entry(a, b),
                    Shape::Rect(tall).segment_entry(a, b),
                ]
                .into_iter()
                .chain(corners)
                .flatten()
                .min_by(|x, y| x.0.total_cmp(&y.0))
            }
        }
    }
}
