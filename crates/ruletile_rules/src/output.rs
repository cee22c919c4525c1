//! Output selection and tile resolution.
//!
//! [`resolve_tile`] is what a renderer calls per cell: it runs the matcher,
//! falls back to the rule set defaults, and turns the matched rule into a
//! concrete sprite and transform. Random and animated outputs read the
//! positional noise, never a random number generator.

use glam::{IVec3, Mat4};
use ruletile_core::{Lattice, NeighborLookup, TileId};

use crate::conditions::ConditionEvaluator;
use crate::matcher::match_rules;
use crate::position_noise::{NoiseChannel, PositionNoise};
use crate::{ColliderKind, ObjectRef, OutputMode, Rule, RuleSet, SpriteRef, Symmetry};

/// What a cell should display
#[derive(Debug, Clone, PartialEq)]
pub struct TileOutput {
    /// Rule that produced this output, `None` for the rule set defaults.
    pub rule_id: Option<u32>,
    pub sprite: Option<SpriteRef>,
    pub transform: Mat4,
    pub object: Option<ObjectRef>,
    pub collider: ColliderKind,
}

/// Animation of a cell whose rule is in `Animation` mode
#[derive(Debug, Clone, PartialEq)]
pub struct TileAnimation {
    pub frames: Vec<SpriteRef>,
    /// Playback speed multiplier, fixed per cell.
    pub speed: f32,
}

// ─── Selection ───────────────────────────────────────────────────────────────

/// Pick the sprite and final transform of a matched rule.
///
/// `placement` is the matcher's transform. Returns `None` only for a rule
/// without sprites.
pub fn select_output<N>(
    rule: &Rule,
    lattice: Lattice,
    position: IVec3,
    placement: Mat4,
    noise: &N,
) -> Option<(SpriteRef, Mat4)>
where
    N: PositionNoise + ?Sized,
{
    let output = &rule.output;
    let first = *output.sprites.first()?;

    match output.mode {
        OutputMode::Single | OutputMode::Animation => Some((first, placement)),
        OutputMode::Random => {
            let len = output.sprites.len();
            let sample = noise.sample(position, output.noise_scale, NoiseChannel::Variant);
            let index = ((sample * len as f32).floor() as usize).min(len - 1);

            let mut transform = placement;
            if output.random_transform != Symmetry::Fixed {
                transform = placement
                    * random_transform(
                        output.random_transform,
                        lattice,
                        position,
                        output.noise_scale,
                        noise,
                    );
            }
            Some((output.sprites[index], transform))
        }
    }
}

/// Transform picked by noise for a random output.
///
/// Uses its own channel so the choice is independent of the sprite index.
pub fn random_transform<N>(
    symmetry: Symmetry,
    lattice: Lattice,
    position: IVec3,
    scale: f32,
    noise: &N,
) -> Mat4
where
    N: PositionNoise + ?Sized,
{
    let sample = noise.sample(position, scale, NoiseChannel::Transform);
    match symmetry {
        Symmetry::Fixed => Mat4::IDENTITY,
        Symmetry::MirrorX => Lattice::mirror_matrix(sample >= 0.5, false),
        Symmetry::MirrorY => Lattice::mirror_matrix(false, sample >= 0.5),
        Symmetry::MirrorXY => Lattice::mirror_matrix(sample >= 0.5, sample % 0.5 >= 0.25),
        Symmetry::Rotated => {
            let count = lattice.rotation_count();
            let steps = ((sample * count as f32).floor() as u32).min(count - 1);
            lattice.rotation_matrix(steps)
        }
    }
}

/// Animation frames and per-cell speed of a rule in `Animation` mode
pub fn select_animation<N>(rule: &Rule, position: IVec3, noise: &N) -> Option<TileAnimation>
where
    N: PositionNoise + ?Sized,
{
    let output = &rule.output;
    if output.mode != OutputMode::Animation || output.sprites.is_empty() {
        return None;
    }
    let t = noise.sample(position, 1.0, NoiseChannel::Animation);
    let speed = output.min_animation_speed
        + (output.max_animation_speed - output.min_animation_speed) * t;
    Some(TileAnimation {
        frames: output.sprites.clone(),
        speed,
    })
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Resolve what the tile `owner` at `position` displays
pub fn resolve_tile<L, E, N>(
    rule_set: &RuleSet,
    owner: TileId,
    position: IVec3,
    lookup: &L,
    evaluator: &E,
    noise: &N,
) -> TileOutput
where
    L: NeighborLookup + ?Sized,
    E: ConditionEvaluator + ?Sized,
    N: PositionNoise + ?Sized,
{
    if let Some(found) = match_rules(rule_set, owner, position, lookup, evaluator) {
        if let Some((sprite, transform)) =
            select_output(found.rule, rule_set.lattice, position, found.transform, noise)
        {
            return TileOutput {
                rule_id: Some(found.rule.id),
                sprite: Some(sprite),
                transform,
                object: found.rule.output.object,
                collider: found.rule.output.collider,
            };
        }
    }

    TileOutput {
        rule_id: None,
        sprite: rule_set.default_sprite,
        transform: Mat4::IDENTITY,
        object: rule_set.default_object,
        collider: rule_set.default_collider,
    }
}

/// Resolve the animation of the tile `owner` at `position`, if its matched
/// rule is animated
pub fn resolve_animation<L, E, N>(
    rule_set: &RuleSet,
    owner: TileId,
    position: IVec3,
    lookup: &L,
    evaluator: &E,
    noise: &N,
) -> Option<TileAnimation>
where
    L: NeighborLookup + ?Sized,
    E: ConditionEvaluator + ?Sized,
    N: PositionNoise + ?Sized,
{
    let found = match_rules(rule_set, owner, position, lookup, evaluator)?;
    select_animation(found.rule, position, noise)
}
