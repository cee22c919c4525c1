//! Rule tile engine for ruletile.
//!
//! The primary entry point is [`resolve_tile`], which matches a tile's
//! [`RuleSet`] against its neighborhood and picks the sprite and transform
//! the cell should show. [`TileLibrary`] maps tile identities to their rules
//! and derives override tiles, and [`NeighborCache`] finds the cells to
//! repaint after an edit.
//!
//! This crate works on plain data from `ruletile_core` and never touches a
//! renderer.

mod conditions;
mod library;
mod matcher;
mod output;
mod overrides;
mod position_noise;
mod refresh;
mod symmetry;
mod types;
mod validate;

pub use conditions::{condition_matches, AcceptCustom, ConditionEvaluator, SiblingGroups};
pub use library::{LibraryError, TileAsset, TileLibrary};
pub use matcher::{match_rules, rule_matches, RuleMatch};
pub use output::{
    random_transform, resolve_animation, resolve_tile, select_animation, select_output,
    TileAnimation, TileOutput,
};
pub use overrides::{apply_overrides, ObjectOverride, OverrideTile, RuleOverride, SpriteOverride};
pub use position_noise::{NoiseChannel, PerlinNoise, PositionNoise};
pub use refresh::{CacheState, NeighborCache, RefreshSettings};
pub use symmetry::{rule_offsets, Variant, Variants};
pub use types::{
    ColliderKind, Neighbor, NeighborCondition, ObjectRef, OutputMode, Rule, RuleOutput, RuleSet,
    SpriteRef, Symmetry,
};
pub use validate::{validate_output, validate_rule, validate_rule_set, RuleError};
