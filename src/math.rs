//! Small value types shared by the affector model and the project format
//!
//! Vectors, colors and rectangles used by step sequences, descriptors and
//! the persisted state. All of them interpolate linearly through [`Lerp`].

use serde::{Deserialize, Serialize};

/// Linear interpolation between two values of the same type.
///
/// `t` is expected in `[0, 1]`; callers clamp before interpolating.
pub trait Lerp: Copy {
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(&self, other: &f32, t: f32) -> f32 {
        self + (other - self) * t
    }
}

/// A 2D float vector (positions, velocities, non-uniform scales)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector2f {
    pub x: f32,
    pub y: f32,
}

impl Vector2f {
    pub const ZERO: Vector2f = Vector2f { x: 0.0, y: 0.0 };
    pub const ONE: Vector2f = Vector2f { x: 1.0, y: 1.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Vector with both components set to `v`
    pub fn splat(v: f32) -> Self {
        Self { x: v, y: v }
    }

    /// True when both components are equal (a uniform scale)
    pub fn is_uniform(&self) -> bool {
        self.x == self.y
    }

    /// Component-wise product
    pub fn mul(&self, other: Vector2f) -> Vector2f {
        Vector2f { x: self.x * other.x, y: self.y * other.y }
    }

    /// Component-wise division, leaving a component unchanged when the divisor is zero
    pub fn div(&self, other: Vector2f) -> Vector2f {
        Vector2f {
            x: if other.x != 0.0 { self.x / other.x } else { self.x },
            y: if other.y != 0.0 { self.y / other.y } else { self.y },
        }
    }
}

impl std::ops::Add for Vector2f {
    type Output = Vector2f;

    fn add(self, rhs: Vector2f) -> Vector2f {
        Vector2f { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

impl std::ops::AddAssign for Vector2f {
    fn add_assign(&mut self, rhs: Vector2f) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Lerp for Vector2f {
    fn lerp(&self, other: &Vector2f, t: f32) -> Vector2f {
        Vector2f { x: self.x.lerp(&other.x, t), y: self.y.lerp(&other.y, t) }
    }
}

/// A 2D integer vector, used for integer ranges such as the emission amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Vector2i {
    pub x: i32,
    pub y: i32,
}

impl Vector2i {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An RGBA color with float channels in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Colorf {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Colorf {
    pub const BLACK: Colorf = Colorf { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };
    pub const WHITE: Colorf = Colorf { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Colorf {
    fn default() -> Self {
        Colorf::WHITE
    }
}

impl Lerp for Colorf {
    fn lerp(&self, other: &Colorf, t: f32) -> Colorf {
        Colorf {
            r: self.r.lerp(&other.r, t),
            g: self.g.lerp(&other.g, t),
            b: self.b.lerp(&other.b, t),
            a: self.a.lerp(&other.a, t),
        }
    }
}

/// An integer rectangle (texture regions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Recti {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Recti {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_lerp() {
        assert_eq!(1.0f32.lerp(&3.0, 0.5), 2.0);
        assert_eq!(1.0f32.lerp(&3.0, 0.0), 1.0);
        assert_eq!(1.0f32.lerp(&3.0, 1.0), 3.0);
    }

    #[test]
    fn test_vector_lerp() {
        let a = Vector2f::new(0.0, 0.0);
        let b = Vector2f::new(100.0, 50.0);
        assert_eq!(a.lerp(&b, 0.5), Vector2f::new(50.0, 25.0));
    }

    #[test]
    fn test_color_lerp() {
        let mid = Colorf::BLACK.lerp(&Colorf::WHITE, 0.5);
        assert_eq!(mid, Colorf::new(0.5, 0.5, 0.5, 1.0));
    }

    #[test]
    fn test_vector_div_by_zero_keeps_component() {
        let v = Vector2f::new(4.0, 6.0).div(Vector2f::new(2.0, 0.0));
        assert_eq!(v, Vector2f::new(2.0, 6.0));
    }

    #[test]
    fn test_uniform() {
        assert!(Vector2f::splat(2.0).is_uniform());
        assert!(!Vector2f::new(1.0, 2.0).is_uniform());
    }
}
