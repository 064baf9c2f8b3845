//! Per-channel affectors
//!
//! Each particle system owns five affectors, one per channel. An affector
//! wraps a [`StepSequence`] and mutates a [`Particle`] according to its
//! normalized age. The channel set is closed, so the variants are plain
//! structs behind the [`Affect`] trait and gathered in [`Affectors`].

use crate::math::{Colorf, Vector2f};
use crate::steps::StepSequence;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The attribute state an affector operates on
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Particle {
    pub position: Vector2f,
    pub velocity: Vector2f,
    /// Rotation in degrees
    pub rotation: f32,
    pub scale: Vector2f,
    pub color: Colorf,
    /// Set when the particle inherited the emitter's rotation at emission
    pub inherits_rotation: bool,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vector2f::ZERO,
            velocity: Vector2f::ZERO,
            rotation: 0.0,
            scale: Vector2f::ONE,
            color: Colorf::WHITE,
            inherits_rotation: false,
        }
    }
}

/// Affector channel identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Color,
    Size,
    Rotation,
    Position,
    Velocity,
}

impl Channel {
    pub const ALL: [Channel; 5] =
        [Channel::Color, Channel::Size, Channel::Rotation, Channel::Position, Channel::Velocity];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Color => "color",
            Channel::Size => "size",
            Channel::Rotation => "rotation",
            Channel::Position => "position",
            Channel::Velocity => "velocity",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "color" => Ok(Channel::Color),
            "size" => Ok(Channel::Size),
            "rotation" => Ok(Channel::Rotation),
            "position" => Ok(Channel::Position),
            "velocity" => Ok(Channel::Velocity),
            _ => Err(format!(
                "Unknown channel '{}'. Valid: color, size, rotation, position, velocity",
                s
            )),
        }
    }
}

/// Common behavior of all affector channels.
///
/// `apply` never fails. Non-finite input is expected to be clamped before it
/// reaches a step sequence.
pub trait Affect {
    type Value: crate::math::Lerp;

    fn channel(&self) -> Channel;

    fn steps(&self) -> &StepSequence<Self::Value>;

    fn steps_mut(&mut self) -> &mut StepSequence<Self::Value>;

    /// Value used when the sequence has no steps
    fn default_value(&self) -> Self::Value;

    /// Mutate `particle` for normalized `age`. Empty sequences leave it alone.
    fn apply(&self, particle: &mut Particle, age: f32);

    /// Sampled channel value, falling back to [`Affect::default_value`]
    fn value_at(&self, age: f32) -> Self::Value {
        self.steps().sample_or(age, self.default_value())
    }
}

/// Interpolates the particle color
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorAffector {
    pub steps: StepSequence<Colorf>,
}

impl Affect for ColorAffector {
    type Value = Colorf;

    fn channel(&self) -> Channel {
        Channel::Color
    }

    fn steps(&self) -> &StepSequence<Colorf> {
        &self.steps
    }

    fn steps_mut(&mut self) -> &mut StepSequence<Colorf> {
        &mut self.steps
    }

    fn default_value(&self) -> Colorf {
        Colorf::WHITE
    }

    fn apply(&self, particle: &mut Particle, age: f32) {
        if let Some(color) = self.steps.sample(age) {
            particle.color = color;
        }
    }
}

/// Interpolates a (possibly non-uniform) scale multiplied by `base_scale`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeAffector {
    pub steps: StepSequence<Vector2f>,
    pub base_scale: Vector2f,
}

impl Default for SizeAffector {
    fn default() -> Self {
        Self { steps: StepSequence::new(), base_scale: Vector2f::ONE }
    }
}

impl SizeAffector {
    pub fn base_scale(&self) -> Vector2f {
        self.base_scale
    }

    /// Remove every step. The base scale is kept.
    pub fn clear(&mut self) {
        self.steps.clear();
    }
}

impl Affect for SizeAffector {
    type Value = Vector2f;

    fn channel(&self) -> Channel {
        Channel::Size
    }

    fn steps(&self) -> &StepSequence<Vector2f> {
        &self.steps
    }

    fn steps_mut(&mut self) -> &mut StepSequence<Vector2f> {
        &mut self.steps
    }

    fn default_value(&self) -> Vector2f {
        Vector2f::ONE
    }

    fn apply(&self, particle: &mut Particle, age: f32) {
        if let Some(scale) = self.steps.sample(age) {
            particle.scale = scale.mul(self.base_scale);
        }
    }

    fn value_at(&self, age: f32) -> Vector2f {
        self.steps.sample_or(age, Vector2f::ONE).mul(self.base_scale)
    }
}

/// Interpolates the rotation angle in degrees
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RotationAffector {
    pub steps: StepSequence<f32>,
}

impl Affect for RotationAffector {
    type Value = f32;

    fn channel(&self) -> Channel {
        Channel::Rotation
    }

    fn steps(&self) -> &StepSequence<f32> {
        &self.steps
    }

    fn steps_mut(&mut self) -> &mut StepSequence<f32> {
        &mut self.steps
    }

    fn default_value(&self) -> f32 {
        0.0
    }

    fn apply(&self, particle: &mut Particle, age: f32) {
        if particle.inherits_rotation {
            return;
        }
        if let Some(angle) = self.steps.sample(age) {
            particle.rotation = angle;
        }
    }
}

/// Adds an interpolated offset to the particle position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionAffector {
    pub steps: StepSequence<Vector2f>,
}

impl Affect for PositionAffector {
    type Value = Vector2f;

    fn channel(&self) -> Channel {
        Channel::Position
    }

    fn steps(&self) -> &StepSequence<Vector2f> {
        &self.steps
    }

    fn steps_mut(&mut self) -> &mut StepSequence<Vector2f> {
        &mut self.steps
    }

    fn default_value(&self) -> Vector2f {
        Vector2f::ZERO
    }

    fn apply(&self, particle: &mut Particle, age: f32) {
        if let Some(offset) = self.steps.sample(age) {
            particle.position += offset;
        }
    }
}

/// Adds an interpolated impulse to the particle velocity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VelocityAffector {
    pub steps: StepSequence<Vector2f>,
}

impl Affect for VelocityAffector {
    type Value = Vector2f;

    fn channel(&self) -> Channel {
        Channel::Velocity
    }

    fn steps(&self) -> &StepSequence<Vector2f> {
        &self.steps
    }

    fn steps_mut(&mut self) -> &mut StepSequence<Vector2f> {
        &mut self.steps
    }

    fn default_value(&self) -> Vector2f {
        Vector2f::ZERO
    }

    fn apply(&self, particle: &mut Particle, age: f32) {
        if let Some(impulse) = self.steps.sample(age) {
            particle.velocity += impulse;
        }
    }
}

/// A channel sample flattened to floats, for plotting and reports
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ChannelValue {
    Scalar(f32),
    Vector(Vector2f),
    Color(Colorf),
}

impl fmt::Display for ChannelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelValue::Scalar(v) => write!(f, "{:.6}", v),
            ChannelValue::Vector(v) => write!(f, "{:.6} {:.6}", v.x, v.y),
            ChannelValue::Color(c) => write!(f, "{:.6} {:.6} {:.6} {:.6}", c.r, c.g, c.b, c.a),
        }
    }
}

/// The five affectors owned by one particle system
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Affectors {
    pub color: ColorAffector,
    pub size: SizeAffector,
    pub rotation: RotationAffector,
    pub position: PositionAffector,
    pub velocity: VelocityAffector,
}

impl Affectors {
    /// Apply every channel in a fixed order
    pub fn apply(&self, particle: &mut Particle, age: f32) {
        self.color.apply(particle, age);
        self.size.apply(particle, age);
        self.rotation.apply(particle, age);
        self.position.apply(particle, age);
        self.velocity.apply(particle, age);
    }

    /// Number of steps in the given channel
    pub fn step_count(&self, channel: Channel) -> usize {
        match channel {
            Channel::Color => self.color.steps.len(),
            Channel::Size => self.size.steps.len(),
            Channel::Rotation => self.rotation.steps.len(),
            Channel::Position => self.position.steps.len(),
            Channel::Velocity => self.velocity.steps.len(),
        }
    }

    /// Sample one channel, with defaults for empty sequences
    pub fn sample(&self, channel: Channel, age: f32) -> ChannelValue {
        match channel {
            Channel::Color => ChannelValue::Color(self.color.value_at(age)),
            Channel::Size => ChannelValue::Vector(self.size.value_at(age)),
            Channel::Rotation => ChannelValue::Scalar(self.rotation.value_at(age)),
            Channel::Position => ChannelValue::Vector(self.position.value_at(age)),
            Channel::Velocity => ChannelValue::Vector(self.velocity.value_at(age)),
        }
    }

    /// Run the one-sided age repair over every channel
    pub fn repair_ages(&mut self) {
        self.color.steps.repair_ages();
        self.size.steps.repair_ages();
        self.rotation.steps.repair_ages();
        self.position.steps.repair_ages();
        self.velocity.steps.repair_ages();
    }
}
