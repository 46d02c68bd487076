//! Minimal geometry types shared by the simulation crates.
#![forbid(unsafe_code)]

use core::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};

/// World axes: +x east, +y north, +z skyward.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);
    pub const EAST: Vec3 = Vec3::new(1.0, 0.0, 0.0);
    pub const WEST: Vec3 = Vec3::new(-1.0, 0.0, 0.0);
    pub const NORTH: Vec3 = Vec3::new(0.0, 1.0, 0.0);
    pub const SOUTH: Vec3 = Vec3::new(0.0, -1.0, 0.0);
    pub const SKYWARD: Vec3 = Vec3::new(0.0, 0.0, 1.0);
    pub const GROUNDWARD: Vec3 = Vec3::new(0.0, 0.0, -1.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn dot(self, rhs: Vec3) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[inline]
    pub fn length_sq(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    #[inline]
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len > 0.0 { self / len } else { self }
    }

    /// Squared distance between the horizontal (x, y) projections.
    #[inline]
    pub fn distance_sq_xy(self, rhs: Vec3) -> f32 {
        let dx = self.x - rhs.x;
        let dy = self.y - rhs.y;
        dx * dx + dy * dy
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec3) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Vec3) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn div(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x < self.max.x
            && p.y >= self.min.y
            && p.y < self.max.y
            && p.z >= self.min.z
            && p.z < self.max.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn normalized_is_unit_or_zero(v: Vec3) {
            prop_assume!(v.x.is_finite() && v.y.is_finite() && v.z.is_finite());
            prop_assume!(v.length_sq() < 1.0e12);
            let n = v.normalized();
            if v.length() > 0.0 {
                prop_assert!((n.length() - 1.0).abs() < 1.0e-3);
            } else {
                prop_assert_eq!(n, v);
            }
        }

        #[test]
        fn aabb_contains_its_min_not_its_max(a in -100.0f32..100.0, b in 0.5f32..100.0) {
            let min = Vec3::new(a, a, a);
            let max = min + Vec3::new(b, b, b);
            let bb = Aabb::new(min, max);
            prop_assert!(bb.contains(min));
            prop_assert!(!bb.contains(max));
        }
    }

    #[test]
    fn direction_constants_are_unit_axes() {
        assert_eq!(Vec3::EAST + Vec3::WEST, Vec3::ZERO);
        assert_eq!(Vec3::NORTH + Vec3::SOUTH, Vec3::ZERO);
        assert_eq!(Vec3::SKYWARD + Vec3::GROUNDWARD, Vec3::ZERO);
        assert_eq!(Vec3::EAST.dot(Vec3::NORTH), 0.0);
    }
}
