//! Neighbor condition evaluation.
//!
//! `Any`, `This` and `NotThis` are built in. `Custom(tag)` conditions are
//! handed to a caller-supplied [`ConditionEvaluator`], which keeps the
//! matcher free of any particular custom semantics.

use std::collections::HashMap;

use ruletile_core::TileId;

use crate::NeighborCondition;

/// Interprets [`NeighborCondition::Custom`] tags.
pub trait ConditionEvaluator {
    /// `neighbor` is `None` for an empty cell; `owner` is the tile whose
    /// rule set is being matched.
    fn evaluate(&self, tag: u32, neighbor: Option<TileId>, owner: TileId) -> bool;
}

/// Test one condition against the tile found at its offset
pub fn condition_matches<E>(
    condition: NeighborCondition,
    neighbor: Option<TileId>,
    owner: TileId,
    evaluator: &E,
) -> bool
where
    E: ConditionEvaluator + ?Sized,
{
    match condition {
        NeighborCondition::Any => true,
        NeighborCondition::This => neighbor == Some(owner),
        NeighborCondition::NotThis => neighbor != Some(owner),
        NeighborCondition::Custom(tag) => evaluator.evaluate(tag, neighbor, owner),
    }
}

/// Evaluator that lets every custom condition pass.
///
/// A rule authored against a richer evaluator then behaves as if those cells
/// were `Any`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptCustom;

impl ConditionEvaluator for AcceptCustom {
    fn evaluate(&self, _tag: u32, _neighbor: Option<TileId>, _owner: TileId) -> bool {
        true
    }
}

/// Evaluator for tiles that should connect to a group of related tiles.
///
/// Tiles registered under the same group name are siblings of each other; a
/// tile is always its own sibling.
#[derive(Debug, Clone, Default)]
pub struct SiblingGroups {
    groups: HashMap<TileId, String>,
}

impl SiblingGroups {
    /// Neighbor is the owner or one of its siblings.
    pub const SIBLING: u32 = 3;
    /// Neighbor is empty or not a sibling.
    pub const NOT_SIBLING: u32 = 4;
    /// Neighbor cell is empty.
    pub const EMPTY: u32 = 5;
    /// Neighbor cell holds any tile.
    pub const NOT_EMPTY: u32 = 6;

    pub fn new() -> Self {
        Self::default()
    }

    /// Put `tile` in `group`, replacing any earlier group
    pub fn insert(&mut self, tile: TileId, group: impl Into<String>) {
        self.groups.insert(tile, group.into());
    }

    pub fn remove(&mut self, tile: TileId) -> Option<String> {
        self.groups.remove(&tile)
    }

    pub fn group_of(&self, tile: TileId) -> Option<&str> {
        self.groups.get(&tile).map(String::as_str)
    }

    /// Whether two tiles are siblings
    pub fn are_siblings(&self, a: TileId, b: TileId) -> bool {
        if a == b {
            return true;
        }
        match (self.groups.get(&a), self.groups.get(&b)) {
            (Some(ga), Some(gb)) => ga == gb,
            _ => false,
        }
    }
}

impl ConditionEvaluator for SiblingGroups {
    fn evaluate(&self, tag: u32, neighbor: Option<TileId>, owner: TileId) -> bool {
        match tag {
            Self::SIBLING => neighbor.is_some_and(|n| self.are_siblings(n, owner)),
            Self::NOT_SIBLING => !neighbor.is_some_and(|n| self.are_siblings(n, owner)),
            Self::EMPTY => neighbor.is_none(),
            Self::NOT_EMPTY => neighbor.is_some(),
            // Unknown tags behave like `Any`, as with `AcceptCustom`.
            _ => true,
        }
    }
}
