//! Emission sampling
//!
//! Turns a [`ParticleInitializer`]'s ranges into concrete particles. The
//! random source is a small deterministic generator so that previews and
//! tests are reproducible from a seed. Advancing particles over time is the
//! renderer's concern; this module only produces their initial state.

use crate::affector::Particle;
use crate::initializer::ParticleInitializer;
use crate::math::Vector2f;
use serde::Serialize;

/// A simple deterministic PRNG (xorshift64)
#[derive(Debug, Clone)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        // xorshift is stuck at zero
        Self { state: if seed == 0 { 0x12345678_9ABCDEF0 } else { seed } }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform in [0.0, 1.0)
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform in [min, max]. Bounds may come in either order.
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + (max - min) * self.next_f32()
    }

    /// Uniform integer in [min, max]
    pub fn range_i32(&mut self, min: i32, max: i32) -> i32 {
        if min >= max {
            return min;
        }
        let span = (max as i64 - min as i64 + 1) as u64;
        (min as i64 + (self.next_u64() % span) as i64) as i32
    }

    fn range_vec(&mut self, range: Vector2f) -> f32 {
        self.range(range.x, range.y)
    }
}

/// Initial state of one emitted particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmittedParticle {
    /// Lifetime in seconds
    pub life: f32,
    /// Offset from the emitter
    pub position: Vector2f,
    pub velocity: Vector2f,
    /// Rotation in degrees, ignored when `inherits_rotation` is set
    pub rotation: f32,
    pub inherits_rotation: bool,
}

impl EmittedParticle {
    /// Affector input state at age zero
    pub fn to_particle(&self, emitter_rotation: f32) -> Particle {
        Particle {
            position: self.position,
            velocity: self.velocity,
            rotation: if self.inherits_rotation { emitter_rotation } else { self.rotation },
            inherits_rotation: self.inherits_rotation,
            ..Particle::default()
        }
    }
}

/// Sample a burst from `init`.
///
/// The burst size is drawn from the amount range, then each particle draws
/// its own life, position, velocity and rotation.
pub fn emit(init: &ParticleInitializer, rng: &mut Rng) -> Vec<EmittedParticle> {
    let amount = rng.range_i32(init.amount.x, init.amount.y).max(0) as usize;
    (0..amount)
        .map(|_| {
            let life = rng.range_vec(init.life);
            let position = Vector2f::new(rng.range_vec(init.position_x), rng.range_vec(init.position_y));
            let velocity = Vector2f::new(rng.range_vec(init.velocity_x), rng.range_vec(init.velocity_y));
            let rotation = if init.emitter_rotation { 0.0 } else { rng.range_vec(init.rotation) };
            EmittedParticle {
                life,
                position,
                velocity,
                rotation,
                inherits_rotation: init.emitter_rotation,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector2i;

    #[test]
    fn test_rng_deterministic() {
        let mut a = Rng::new(42);
        let mut b = Rng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn test_rng_zero_seed() {
        let mut rng = Rng::new(0);
        assert_ne!(rng.next_u64(), 0);
    }

    #[test]
    fn test_rng_ranges() {
        let mut rng = Rng::new(99);
        for _ in 0..1000 {
            let v = rng.range(-2.0, 3.0);
            assert!((-2.0..=3.0).contains(&v));
            let i = rng.range_i32(-3, 4);
            assert!((-3..=4).contains(&i));
        }
        assert_eq!(rng.range_i32(5, 5), 5);
        assert_eq!(rng.range(1.5, 1.5), 1.5);
    }

    #[test]
    fn test_emit_respects_ranges() {
        let init = ParticleInitializer {
            amount: Vector2i::new(3, 6),
            life: Vector2f::new(0.5, 1.0),
            position_x: Vector2f::new(-10.0, 10.0),
            position_y: Vector2f::new(0.0, 0.0),
            velocity_x: Vector2f::new(1.0, 2.0),
            velocity_y: Vector2f::new(-5.0, -4.0),
            rotation: Vector2f::new(10.0, 20.0),
            emitter_rotation: false,
        };
        let mut rng = Rng::new(7);
        for _ in 0..50 {
            let burst = emit(&init, &mut rng);
            assert!((3..=6).contains(&burst.len()));
            for p in burst {
                assert!((0.5..=1.0).contains(&p.life));
                assert!((-10.0..=10.0).contains(&p.position.x));
                assert_eq!(p.position.y, 0.0);
                assert!((1.0..=2.0).contains(&p.velocity.x));
                assert!((-5.0..=-4.0).contains(&p.velocity.y));
                assert!((10.0..=20.0).contains(&p.rotation));
                assert!(!p.inherits_rotation);
            }
        }
    }

    #[test]
    fn test_emitter_rotation_is_inherited() {
        let init = ParticleInitializer {
            rotation: Vector2f::new(10.0, 20.0),
            ..ParticleInitializer::default()
        };
        let burst = emit(&init, &mut Rng::new(1));
        assert_eq!(burst.len(), 1);
        assert!(burst[0].inherits_rotation);
        let particle = burst[0].to_particle(45.0);
        assert_eq!(particle.rotation, 45.0);
        assert!(particle.inherits_rotation);
    }

    #[test]
    fn test_same_seed_same_burst() {
        let init = ParticleInitializer {
            amount: Vector2i::new(1, 10),
            velocity_x: Vector2f::new(-1.0, 1.0),
            ..ParticleInitializer::default()
        };
        assert_eq!(emit(&init, &mut Rng::new(5)), emit(&init, &mut Rng::new(5)));
    }
}
