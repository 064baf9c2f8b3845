//! Particle system descriptors
//!
//! A [`ParticleSystemDescriptor`] is the editable aggregate for one emitter:
//! identity, texture binding, placement, the five affectors and the emission
//! ranges.

use crate::affector::Affectors;
use crate::config::GuiLimits;
use crate::initializer::ParticleInitializer;
use crate::math::{Recti, Vector2f};
use crate::texture::TextureHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

/// How particle sprites are blended with what is behind them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendingPreset {
    #[default]
    Alpha,
    PremultipliedAlpha,
    Additive,
    Multiply,
}

impl BlendingPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlendingPreset::Alpha => "alpha",
            BlendingPreset::PremultipliedAlpha => "premultiplied_alpha",
            BlendingPreset::Additive => "additive",
            BlendingPreset::Multiply => "multiply",
        }
    }
}

impl fmt::Display for BlendingPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlendingPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alpha" => Ok(BlendingPreset::Alpha),
            "premultiplied_alpha" => Ok(BlendingPreset::PremultipliedAlpha),
            "additive" => Ok(BlendingPreset::Additive),
            "multiply" => Ok(BlendingPreset::Multiply),
            _ => Err(format!("unknown blending preset '{}'", s)),
        }
    }
}

/// One editable particle system
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSystemDescriptor {
    pub name: String,
    /// Size of the particle pool
    pub num_particles: i32,
    pub texture: TextureHandle,
    pub texture_rect: Recti,
    pub anchor_point: Vector2f,
    pub flipped_x: bool,
    pub flipped_y: bool,
    pub blending_preset: BlendingPreset,
    /// Position relative to the project's absolute position, in pixels
    pub position: Vector2f,
    pub layer: i32,
    pub in_local_space: bool,
    pub active: bool,
    pub affectors: Affectors,
    pub init: ParticleInitializer,
    /// Seconds between automatic emissions, 0 to emit every time
    pub emit_delay: f32,
    pub last_emission: Option<Instant>,
}

impl ParticleSystemDescriptor {
    /// A fresh system drawing the whole of `texture`
    pub fn new(texture: TextureHandle, width: u32, height: u32) -> Self {
        Self {
            name: String::new(),
            num_particles: 64,
            texture,
            texture_rect: Recti::new(0, 0, width as i32, height as i32),
            anchor_point: Vector2f::new(0.5, 0.5),
            flipped_x: false,
            flipped_y: false,
            blending_preset: BlendingPreset::default(),
            position: Vector2f::ZERO,
            layer: 1,
            in_local_space: false,
            active: true,
            affectors: Affectors::default(),
            init: ParticleInitializer::default(),
            emit_delay: 0.0,
            last_emission: None,
        }
    }

    /// Whether an emission is due at `now`.
    ///
    /// Inactive systems never emit. Otherwise a zero delay always emits and
    /// a positive delay emits once more than `emit_delay` seconds have
    /// passed since the last emission.
    pub fn can_emit(&self, now: Instant) -> bool {
        if !self.active {
            return false;
        }
        if self.emit_delay <= 0.0 {
            return true;
        }
        match self.last_emission {
            None => true,
            Some(last) => {
                let elapsed = now.saturating_duration_since(last);
                elapsed.as_secs_f32() > self.emit_delay
            }
        }
    }

    /// Record an emission at `now`
    pub fn mark_emitted(&mut self, now: Instant) {
        self.last_emission = Some(now);
    }

    /// Per-frame repair: emission delay, initializer ranges and step ages
    pub fn sanitize(&mut self, limits: &GuiLimits) {
        self.emit_delay = if self.emit_delay.is_nan() {
            0.0
        } else {
            self.emit_delay.clamp(0.0, limits.max_delay.max(0.0))
        };
        self.init.sanitize(self.num_particles, limits);
        self.affectors.repair_ages();
    }

    /// Copy for the clone operation. Emission timing is not carried over.
    pub fn duplicate(&self) -> Self {
        Self { last_emission: None, ..self.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn system() -> ParticleSystemDescriptor {
        ParticleSystemDescriptor::new(TextureHandle(0), 32, 16)
    }

    #[test]
    fn test_new_uses_whole_texture() {
        let s = system();
        assert_eq!(s.texture_rect, Recti::new(0, 0, 32, 16));
        assert_eq!(s.layer, 1);
        assert!(s.active);
        assert_eq!(s.blending_preset, BlendingPreset::Alpha);
    }

    #[test]
    fn test_can_emit_inactive() {
        let mut s = system();
        s.active = false;
        assert!(!s.can_emit(Instant::now()));
    }

    #[test]
    fn test_can_emit_zero_delay() {
        let mut s = system();
        let now = Instant::now();
        s.mark_emitted(now);
        assert!(s.can_emit(now));
    }

    #[test]
    fn test_can_emit_respects_delay() {
        let mut s = system();
        s.emit_delay = 0.5;
        let start = Instant::now();
        assert!(s.can_emit(start));
        s.mark_emitted(start);
        assert!(!s.can_emit(start + Duration::from_millis(200)));
        assert!(!s.can_emit(start + Duration::from_millis(500)));
        assert!(s.can_emit(start + Duration::from_millis(501)));
    }

    #[test]
    fn test_can_emit_huge_delay() {
        let mut s = system();
        s.emit_delay = 1e20;
        let start = Instant::now();
        s.mark_emitted(start);
        assert!(!s.can_emit(start + Duration::from_secs(60)));

        s.emit_delay = f32::NAN;
        assert!(!s.can_emit(start + Duration::from_secs(60)));
    }

    #[test]
    fn test_sanitize_clamps_delay() {
        let limits = GuiLimits::default();
        let mut s = system();
        s.emit_delay = 1e20;
        s.sanitize(&limits);
        assert_eq!(s.emit_delay, limits.max_delay);

        s.emit_delay = -3.0;
        s.sanitize(&limits);
        assert_eq!(s.emit_delay, 0.0);

        s.emit_delay = f32::NAN;
        s.sanitize(&limits);
        assert_eq!(s.emit_delay, 0.0);
    }

    #[test]
    fn test_blending_preset_parse() {
        for preset in [
            BlendingPreset::Alpha,
            BlendingPreset::PremultipliedAlpha,
            BlendingPreset::Additive,
            BlendingPreset::Multiply,
        ] {
            assert_eq!(preset.as_str().parse::<BlendingPreset>(), Ok(preset));
        }
        assert!("screen".parse::<BlendingPreset>().is_err());
    }

    #[test]
    fn test_sanitize_repairs_steps_and_ranges() {
        let mut s = system();
        s.num_particles = 10;
        s.init.amount.y = 50;
        s.affectors.rotation.steps.add_step(0.5, 10.0);
        s.affectors.rotation.steps.add_step(0.8, 20.0);
        s.affectors.rotation.steps.set_age(0, 0.9);
        s.sanitize(&GuiLimits::default());
        assert_eq!(s.init.amount.y, 10);
        assert!(s.affectors.rotation.steps.is_ordered());
    }

    #[test]
    fn test_duplicate_resets_timing() {
        let mut s = system();
        s.mark_emitted(Instant::now());
        let copy = s.duplicate();
        assert!(copy.last_emission.is_none());
        assert_eq!(copy.affectors, s.affectors);
    }
}
