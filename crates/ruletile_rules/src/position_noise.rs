//! Deterministic positional noise.
//!
//! Output selection must not flicker between redraws, so every random
//! choice is a pure function of the cell position, a scale and a channel.

use glam::IVec3;
use noise::{NoiseFn, Perlin};

/// Independent noise streams used by output selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoiseChannel {
    /// Picks the sprite of a `Random` rule.
    Variant,
    /// Picks the speed of an `Animation` rule.
    Animation,
    /// Picks the random transform of a `Random` rule.
    Transform,
}

impl NoiseChannel {
    /// Sample coordinate on the channel axis.
    ///
    /// Positions never move along this axis, so two channels can not sample
    /// the same point whatever the cell coordinates are.
    fn axis_offset(self) -> f64 {
        match self {
            NoiseChannel::Variant => 100_000.5,
            NoiseChannel::Animation => 200_000.5,
            NoiseChannel::Transform => 300_000.5,
        }
    }
}

/// A smooth deterministic function of position into `[0, 1]`
pub trait PositionNoise {
    fn sample(&self, position: IVec3, scale: f32, channel: NoiseChannel) -> f32;
}

/// Perlin noise over `(x, y, z, channel)`
#[derive(Debug, Clone)]
pub struct PerlinNoise {
    perlin: Perlin,
    seed: u32,
}

impl Default for PerlinNoise {
    fn default() -> Self {
        Self::new(0)
    }
}

impl PerlinNoise {
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: Perlin::new(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl PositionNoise for PerlinNoise {
    fn sample(&self, position: IVec3, scale: f32, channel: NoiseChannel) -> f32 {
        let scale = scale as f64;
        let point = [
            position.x as f64 * scale,
            position.y as f64 * scale,
            position.z as f64 * scale,
            channel.axis_offset(),
        ];
        let value = self.perlin.get(point) * 0.5 + 0.5;
        value.clamp(0.0, 1.0) as f32
    }
}
