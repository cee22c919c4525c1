//! Data types for rule tiles.
//!
//! A [`RuleSet`] belongs to one tile identity and holds an ordered list of
//! [`Rule`]s. Each rule pairs neighbor conditions with a [`RuleOutput`].

use std::collections::HashSet;

use glam::IVec3;
use ruletile_core::Lattice;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── References ──────────────────────────────────────────────────────────────

/// Virtual tile index of a sprite in the tile atlas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteRef(pub u32);

/// Entity template instantiated alongside a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef(pub Uuid);

/// Collision shape generated for a placed tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ColliderKind {
    /// No collider.
    None,
    /// Collider follows the sprite's outline.
    #[default]
    Sprite,
    /// Collider fills the whole cell.
    Grid,
}

// ─── Conditions ──────────────────────────────────────────────────────────────

/// Requirement on the tile found at one neighbor offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NeighborCondition {
    /// Always matches, including empty cells. Implicit for unlisted offsets.
    #[default]
    Any,
    /// Neighbor must be the tile that owns the rule set.
    This,
    /// Neighbor must not be the owning tile (empty counts as "not this").
    NotThis,
    /// Interpreted by a [`ConditionEvaluator`](crate::ConditionEvaluator).
    Custom(u32),
}

/// One neighbor condition of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Offset from the evaluated cell. Never zero.
    pub offset: IVec3,
    pub condition: NeighborCondition,
}

/// Which rotated or mirrored forms of a rule's conditions are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Symmetry {
    /// Only the authored conditions.
    #[default]
    Fixed,
    /// Every rotation of the rule set's lattice (4 on square grids, 6 on hex).
    Rotated,
    /// Authored, then mirrored across the vertical axis.
    MirrorX,
    /// Authored, then mirrored across the horizontal axis.
    MirrorY,
    /// Authored, mirrored X, mirrored Y, then mirrored on both axes.
    MirrorXY,
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// How a matched rule turns its sprite list into a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Always the first sprite.
    #[default]
    Single,
    /// One sprite picked by positional noise.
    Random,
    /// All sprites played as animation frames.
    Animation,
}

/// Everything a rule produces once it matches.
///
/// This is also the unit an override replaces: conditions and symmetry are
/// never part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOutput {
    pub mode: OutputMode,
    /// Must hold at least one sprite.
    pub sprites: Vec<SpriteRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<ObjectRef>,
    #[serde(default)]
    pub collider: ColliderKind,
    #[serde(default = "default_animation_speed")]
    pub min_animation_speed: f32,
    #[serde(default = "default_animation_speed")]
    pub max_animation_speed: f32,
    /// Scale of the positional noise used by `Random` mode and by the
    /// random transform.
    #[serde(default = "default_noise_scale")]
    pub noise_scale: f32,
    /// Extra transform picked by positional noise for `Random` mode.
    #[serde(default)]
    pub random_transform: Symmetry,
}

fn default_animation_speed() -> f32 {
    1.0
}

fn default_noise_scale() -> f32 {
    0.5
}

impl RuleOutput {
    /// Output a single sprite
    pub fn single(sprite: SpriteRef) -> Self {
        Self::with_mode(OutputMode::Single, vec![sprite])
    }

    /// Output one of `sprites`, picked per position
    pub fn random(sprites: Vec<SpriteRef>) -> Self {
        Self::with_mode(OutputMode::Random, sprites)
    }

    /// Play `frames` as an animation
    pub fn animation(frames: Vec<SpriteRef>, min_speed: f32, max_speed: f32) -> Self {
        Self {
            min_animation_speed: min_speed,
            max_animation_speed: max_speed,
            ..Self::with_mode(OutputMode::Animation, frames)
        }
    }

    fn with_mode(mode: OutputMode, sprites: Vec<SpriteRef>) -> Self {
        Self {
            mode,
            sprites,
            object: None,
            collider: ColliderKind::default(),
            min_animation_speed: default_animation_speed(),
            max_animation_speed: default_animation_speed(),
            noise_scale: default_noise_scale(),
            random_transform: Symmetry::Fixed,
        }
    }

    pub fn with_object(mut self, object: ObjectRef) -> Self {
        self.object = Some(object);
        self
    }

    pub fn with_collider(mut self, collider: ColliderKind) -> Self {
        self.collider = collider;
        self
    }

    pub fn with_noise_scale(mut self, scale: f32) -> Self {
        self.noise_scale = scale;
        self
    }

    pub fn with_random_transform(mut self, symmetry: Symmetry) -> Self {
        self.random_transform = symmetry;
        self
    }
}

// ─── Rule ────────────────────────────────────────────────────────────────────

/// A single tiling rule.
///
/// The rule matches at a cell when every listed neighbor condition holds,
/// in the authored form or in one of the forms its [`Symmetry`] allows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Stable identifier, unique within the rule set. Overrides refer to it.
    pub id: u32,
    /// Authored order is the test order.
    #[serde(default)]
    pub neighbors: Vec<Neighbor>,
    #[serde(default)]
    pub symmetry: Symmetry,
    pub output: RuleOutput,
}

impl Rule {
    /// Create a rule with no conditions. The id is replaced by
    /// [`RuleSet::add_rule`].
    pub fn new(output: RuleOutput) -> Self {
        Self {
            id: 0,
            neighbors: Vec::new(),
            symmetry: Symmetry::Fixed,
            output,
        }
    }

    pub fn with_neighbor(mut self, offset: IVec3, condition: NeighborCondition) -> Self {
        self.set_neighbor(offset, condition);
        self
    }

    pub fn with_symmetry(mut self, symmetry: Symmetry) -> Self {
        self.symmetry = symmetry;
        self
    }

    /// Condition at `offset`, `Any` when unlisted
    pub fn neighbor(&self, offset: IVec3) -> NeighborCondition {
        self.neighbors
            .iter()
            .find(|n| n.offset == offset)
            .map(|n| n.condition)
            .unwrap_or_default()
    }

    /// Set the condition at `offset`.
    ///
    /// `Any` removes the entry. The zero offset is the tile itself and is
    /// refused; returns `false` in that case.
    pub fn set_neighbor(&mut self, offset: IVec3, condition: NeighborCondition) -> bool {
        if offset == IVec3::ZERO {
            return false;
        }
        let existing = self.neighbors.iter().position(|n| n.offset == offset);
        match (existing, condition) {
            (Some(idx), NeighborCondition::Any) => {
                self.neighbors.remove(idx);
            }
            (Some(idx), condition) => self.neighbors[idx].condition = condition,
            (None, NeighborCondition::Any) => {}
            (None, condition) => self.neighbors.push(Neighbor { offset, condition }),
        }
        true
    }

    /// Smallest and largest offsets this rule reaches, origin included
    pub fn bounds(&self) -> (IVec3, IVec3) {
        self.neighbors
            .iter()
            .fold((IVec3::ZERO, IVec3::ZERO), |(min, max), n| {
                (min.min(n.offset), max.max(n.offset))
            })
    }
}

// ─── RuleSet ─────────────────────────────────────────────────────────────────

/// The rules of one rule tile, in priority order, plus what to show when
/// none of them match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub lattice: Lattice,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sprite: Option<SpriteRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_object: Option<ObjectRef>,
    #[serde(default)]
    pub default_collider: ColliderKind,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new(Lattice::Square)
    }
}

impl RuleSet {
    pub fn new(lattice: Lattice) -> Self {
        Self {
            lattice,
            default_sprite: None,
            default_object: None,
            default_collider: ColliderKind::default(),
            rules: Vec::new(),
        }
    }

    pub fn with_default_sprite(mut self, sprite: SpriteRef) -> Self {
        self.default_sprite = Some(sprite);
        self
    }

    /// Id the next added rule will receive.
    ///
    /// One past the highest id in use, or the lowest free id once the highest
    /// is `u32::MAX`.
    pub fn next_rule_id(&self) -> u32 {
        let Some(highest) = self.rules.iter().map(|r| r.id).max() else {
            return 0;
        };
        if let Some(next) = highest.checked_add(1) {
            return next;
        }
        let used: HashSet<u32> = self.rules.iter().map(|r| r.id).collect();
        (0..u32::MAX).find(|id| !used.contains(id)).unwrap_or(u32::MAX)
    }

    /// Append a rule at lowest priority, assigning it a fresh id
    pub fn add_rule(&mut self, mut rule: Rule) -> u32 {
        rule.id = self.next_rule_id();
        let id = rule.id;
        self.rules.push(rule);
        id
    }

    /// Get rule by ID
    pub fn get_rule(&self, id: u32) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Get mutable rule by ID
    pub fn get_rule_mut(&mut self, id: u32) -> Option<&mut Rule> {
        self.rules.iter_mut().find(|r| r.id == id)
    }

    /// Remove rule by ID. Remaining ids are untouched.
    pub fn remove_rule(&mut self, id: u32) -> Option<Rule> {
        let pos = self.rules.iter().position(|r| r.id == id)?;
        Some(self.rules.remove(pos))
    }

    /// Move a rule to a new priority slot, keeping its id
    pub fn move_rule(&mut self, id: u32, new_index: usize) -> bool {
        let Some(pos) = self.rules.iter().position(|r| r.id == id) else {
            return false;
        };
        let rule = self.rules.remove(pos);
        let new_index = new_index.min(self.rules.len());
        self.rules.insert(new_index, rule);
        true
    }
}
