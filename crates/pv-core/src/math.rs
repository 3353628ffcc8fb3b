//! Minimal 2D/3D vector and axis-aligned bounding box types, grounded on
//! `rf-spatial::position::Position3D`'s shape (plain value type, `Copy`,
//! `serde`-derived, arithmetic helpers as inherent methods) but narrowed to
//! the 2D plane the FDTD grid actually simulates in, plus a `Vec3` used only
//! where the source exposes a 3D world position (listener/emitter transform)
//! whose Y (height) component the grid ignores.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    #[inline]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len < 1e-10 {
            Self::ZERO
        } else {
            Self::new(self.x / len, self.y / len)
        }
    }

    #[inline]
    pub fn distance_to(self, other: Self) -> f64 {
        (self - other).length()
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl std::ops::Add for Vec2 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Vec2 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Mul<f64> for Vec2 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Projects onto the grid's horizontal plane (x, z), matching the
    /// source's convention that the simulated plane is world X/Z and Y is
    /// height (ignored by the 2D solver).
    #[inline]
    pub fn to_plane(self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }
}

/// Axis-aligned bounding box: a world-space obstacle footprint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec2,
    pub width: f64,
    pub height: f64,
    pub absorption: f64,
}

impl Aabb {
    pub fn new(center: Vec2, width: f64, height: f64, absorption: f64) -> Self {
        debug_assert!(width >= 0.0 && height >= 0.0);
        Self {
            center,
            width,
            height,
            absorption,
        }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        Vec2::new(self.center.x - self.width * 0.5, self.center.y - self.height * 0.5)
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        Vec2::new(self.center.x + self.width * 0.5, self.center.y + self.height * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_zero_is_zero() {
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
    }

    #[test]
    fn normalize_unit_length() {
        let v = Vec2::new(3.0, 4.0).normalized();
        assert!((v.length() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn aabb_bounds() {
        let a = Aabb::new(Vec2::new(5.0, 5.0), 2.0, 4.0, 0.5);
        assert_eq!(a.min(), Vec2::new(4.0, 3.0));
        assert_eq!(a.max(), Vec2::new(6.0, 7.0));
    }
}
