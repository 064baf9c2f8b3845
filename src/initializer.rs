//! Emission-time randomization ranges
//!
//! A [`ParticleInitializer`] holds the `(lo, hi)` ranges sampled once per
//! emitted particle. Edits may leave a range inverted or out of bounds;
//! [`ParticleInitializer::sanitize`] restores the invariants before the
//! ranges are used.
//!
//! Position and velocity have alternate editing views (center plus radius,
//! base velocity plus scale). Those views are computed from the canonical
//! ranges on demand and never stored.

use crate::config::GuiLimits;
use crate::math::{Vector2f, Vector2i};
use serde::{Deserialize, Serialize};

/// Upper bound of the emission rotation range, in degrees
pub const MAX_EMISSION_ROTATION: f32 = 180.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleInitializer {
    /// Particles per emission (x = min, y = max)
    pub amount: Vector2i,
    /// Life in seconds
    pub life: Vector2f,
    pub position_x: Vector2f,
    pub position_y: Vector2f,
    pub velocity_x: Vector2f,
    pub velocity_y: Vector2f,
    /// Rotation in degrees
    pub rotation: Vector2f,
    /// Particles take the emitter's rotation instead of `rotation`
    pub emitter_rotation: bool,
}

impl Default for ParticleInitializer {
    fn default() -> Self {
        Self {
            amount: Vector2i::new(1, 1),
            life: Vector2f::new(1.0, 1.0),
            position_x: Vector2f::ZERO,
            position_y: Vector2f::ZERO,
            velocity_x: Vector2f::ZERO,
            velocity_y: Vector2f::ZERO,
            rotation: Vector2f::ZERO,
            emitter_rotation: true,
        }
    }
}

/// Center plus radius view of the two position ranges
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionRadius {
    pub center: Vector2f,
    pub radius: f32,
}

/// Base velocity plus scale view of the two velocity ranges
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VelocityScale {
    pub velocity: Vector2f,
    /// x = min scale, y = max scale
    pub scale: Vector2f,
}

fn sort_range(range: &mut Vector2f) {
    if range.x > range.y {
        std::mem::swap(&mut range.x, &mut range.y);
    }
}

/// Both ends end up inside `[min, max]` with `x <= y`. When `min > max`
/// both ends collapse onto `max`.
fn clamp_range(range: &mut Vector2f, min: f32, max: f32) {
    range.x = range.x.max(min).min(max);
    range.y = range.y.max(min).min(max);
    sort_range(range);
}

impl ParticleInitializer {
    /// Swap inverted ranges and clamp them to the configured limits.
    ///
    /// `num_particles` is the pool size of the owning system and caps the
    /// amount range.
    pub fn sanitize(&mut self, num_particles: i32, limits: &GuiLimits) {
        // An empty pool still emits one particle per burst
        let max_amount = num_particles.max(1);
        self.amount.x = self.amount.x.max(1).min(max_amount);
        self.amount.y = self.amount.y.max(1).min(max_amount);
        if self.amount.x > self.amount.y {
            std::mem::swap(&mut self.amount.x, &mut self.amount.y);
        }

        clamp_range(&mut self.life, 0.0, limits.max_random_life);

        let pos = limits.random_position_range;
        clamp_range(&mut self.position_x, -pos, pos);
        clamp_range(&mut self.position_y, -pos, pos);

        let vel = limits.random_velocity_range;
        clamp_range(&mut self.velocity_x, -vel, vel);
        clamp_range(&mut self.velocity_y, -vel, vel);

        clamp_range(&mut self.rotation, 0.0, MAX_EMISSION_ROTATION);
    }

    /// True when every range satisfies `lo <= hi` and the configured bounds
    pub fn is_sanitized(&self, num_particles: i32, limits: &GuiLimits) -> bool {
        let mut copy = self.clone();
        copy.sanitize(num_particles, limits);
        copy == *self
    }

    /// Derive the center and radius of the position ranges.
    ///
    /// The radius is the mean of the half extents on both axes.
    pub fn position_radius(&self) -> PositionRadius {
        let center = Vector2f::new(
            (self.position_x.x + self.position_x.y) * 0.5,
            (self.position_y.x + self.position_y.y) * 0.5,
        );
        let radius = ((self.position_x.y - self.position_x.x)
            + (self.position_y.y - self.position_y.x))
            * 0.25;
        PositionRadius { center, radius }
    }

    /// Replace both position ranges with a square around `center`
    pub fn set_position_and_radius(&mut self, center: Vector2f, radius: f32) {
        self.position_x = Vector2f::new(center.x - radius, center.x + radius);
        self.position_y = Vector2f::new(center.y - radius, center.y + radius);
    }

    /// Derive the base velocity and scale factors of the velocity ranges.
    ///
    /// The base velocity is recovered from the lower bounds when the min
    /// scale is non-zero, otherwise from the upper bounds.
    pub fn velocity_scale(&self, scale: Vector2f) -> VelocityScale {
        let velocity = if scale.x != 0.0 {
            Vector2f::new(self.velocity_x.x / scale.x, self.velocity_y.x / scale.x)
        } else if scale.y != 0.0 {
            Vector2f::new(self.velocity_x.y / scale.y, self.velocity_y.y / scale.y)
        } else {
            Vector2f::ZERO
        };
        VelocityScale { velocity, scale }
    }

    /// Replace both velocity ranges with `velocity` scaled by `[scale.x, scale.y]`
    pub fn set_velocity_and_scale(&mut self, velocity: Vector2f, scale: Vector2f) {
        self.velocity_x = Vector2f::new(velocity.x * scale.x, velocity.x * scale.y);
        self.velocity_y = Vector2f::new(velocity.y * scale.x, velocity.y * scale.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_position_swapped() {
        let mut init = ParticleInitializer::default();
        init.position_x = Vector2f::new(50.0, -50.0);
        init.sanitize(64, &GuiLimits::default());
        assert_eq!(init.position_x, Vector2f::new(-50.0, 50.0));
    }

    #[test]
    fn test_ranges_clamped_to_limits() {
        let limits = GuiLimits::default();
        let mut init = ParticleInitializer {
            amount: Vector2i::new(500, 0),
            life: Vector2f::new(-1.0, 99.0),
            position_x: Vector2f::new(-1000.0, 1000.0),
            position_y: Vector2f::new(20.0, 10.0),
            velocity_x: Vector2f::new(-900.0, 0.0),
            velocity_y: Vector2f::new(0.0, 900.0),
            rotation: Vector2f::new(270.0, -10.0),
            emitter_rotation: false,
        };
        assert!(!init.is_sanitized(32, &limits));
        init.sanitize(32, &limits);

        assert_eq!(init.amount, Vector2i::new(1, 32));
        assert_eq!(init.life, Vector2f::new(0.0, 5.0));
        assert_eq!(init.position_x, Vector2f::new(-100.0, 100.0));
        assert_eq!(init.position_y, Vector2f::new(10.0, 20.0));
        assert_eq!(init.velocity_x, Vector2f::new(-200.0, 0.0));
        assert_eq!(init.velocity_y, Vector2f::new(0.0, 200.0));
        assert_eq!(init.rotation, Vector2f::new(0.0, 180.0));
        assert!(init.is_sanitized(32, &limits));
    }

    #[test]
    fn test_range_outside_bounds_stays_ordered() {
        let limits = GuiLimits::default();
        let mut init = ParticleInitializer::default();
        init.position_x = Vector2f::new(150.0, 200.0);
        init.velocity_y = Vector2f::new(-900.0, -500.0);
        init.life = Vector2f::new(-4.0, -2.0);
        init.sanitize(16, &limits);

        assert_eq!(init.position_x, Vector2f::new(100.0, 100.0));
        assert_eq!(init.velocity_y, Vector2f::new(-200.0, -200.0));
        assert_eq!(init.life, Vector2f::new(0.0, 0.0));
        assert!(init.is_sanitized(16, &limits));
    }

    #[test]
    fn test_amount_with_empty_pool() {
        let limits = GuiLimits::default();
        let mut init = ParticleInitializer::default();
        init.amount = Vector2i::new(3, 8);
        init.sanitize(0, &limits);
        assert_eq!(init.amount, Vector2i::new(1, 1));
        assert!(init.amount.x <= init.amount.y);
        assert!(init.is_sanitized(0, &limits));
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let limits = GuiLimits::default();
        let mut init = ParticleInitializer::default();
        init.velocity_x = Vector2f::new(300.0, -300.0);
        init.sanitize(10, &limits);
        let once = init.clone();
        init.sanitize(10, &limits);
        assert_eq!(init, once);
    }

    #[test]
    fn test_position_radius_roundtrip() {
        let mut init = ParticleInitializer::default();
        init.set_position_and_radius(Vector2f::new(10.0, -4.0), 6.0);
        assert_eq!(init.position_x, Vector2f::new(4.0, 16.0));
        assert_eq!(init.position_y, Vector2f::new(-10.0, 2.0));

        let view = init.position_radius();
        assert_eq!(view.center, Vector2f::new(10.0, -4.0));
        assert_eq!(view.radius, 6.0);
    }

    #[test]
    fn test_position_radius_of_rectangle_averages_extents() {
        let mut init = ParticleInitializer::default();
        init.position_x = Vector2f::new(-10.0, 10.0);
        init.position_y = Vector2f::new(-2.0, 2.0);
        assert_eq!(init.position_radius().radius, 6.0);
    }

    #[test]
    fn test_velocity_scale_roundtrip() {
        let mut init = ParticleInitializer::default();
        init.set_velocity_and_scale(Vector2f::new(0.0, 100.0), Vector2f::new(0.5, 2.0));
        assert_eq!(init.velocity_x, Vector2f::new(0.0, 0.0));
        assert_eq!(init.velocity_y, Vector2f::new(50.0, 200.0));

        let view = init.velocity_scale(Vector2f::new(0.5, 2.0));
        assert_eq!(view.velocity, Vector2f::new(0.0, 100.0));
    }

    #[test]
    fn test_velocity_scale_zero_min_uses_max() {
        let mut init = ParticleInitializer::default();
        init.set_velocity_and_scale(Vector2f::new(3.0, 4.0), Vector2f::new(0.0, 2.0));
        let view = init.velocity_scale(Vector2f::new(0.0, 2.0));
        assert_eq!(view.velocity, Vector2f::new(3.0, 4.0));
    }
}
