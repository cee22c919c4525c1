//! The rule matcher: finds the first rule of a [`RuleSet`] that holds at a
//! cell.
//!
//! The entry point is [`match_rules`]. Rules are a priority list, so the
//! first rule with a satisfied variant wins even if a later rule is more
//! specific.

use glam::{IVec3, Mat4};
use ruletile_core::{checked_offset, Lattice, NeighborLookup, TileId};
use tracing::trace;

use crate::conditions::{condition_matches, ConditionEvaluator};
use crate::symmetry::Variant;
use crate::{Rule, RuleSet};

/// A rule that held at a cell, and the variant it held through.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch<'a> {
    pub rule: &'a Rule,
    pub variant: Variant,
    /// Placement transform for the variant.
    pub transform: Mat4,
}

// ─── Public entry point ───────────────────────────────────────────────────────

/// Find the first rule of `rule_set` that holds at `position`.
///
/// `owner` is the tile the rule set belongs to; it decides what `This` and
/// `NotThis` compare against. Returns `None` when no rule holds in any
/// variant; the caller then falls back to the rule set's defaults.
pub fn match_rules<'a, L, E>(
    rule_set: &'a RuleSet,
    owner: TileId,
    position: IVec3,
    lookup: &L,
    evaluator: &E,
) -> Option<RuleMatch<'a>>
where
    L: NeighborLookup + ?Sized,
    E: ConditionEvaluator + ?Sized,
{
    let lattice = rule_set.lattice;

    for rule in &rule_set.rules {
        if rule.output.sprites.is_empty() {
            // Malformed rule: nothing to emit, so it can never match.
            trace!(rule = rule.id, "skipping rule with no output sprites");
            continue;
        }

        for variant in rule.symmetry.variants(lattice) {
            if rule_matches(rule, lattice, variant, owner, position, lookup, evaluator) {
                return Some(RuleMatch {
                    rule,
                    variant,
                    transform: variant.placement(lattice),
                });
            }
        }
    }

    None
}

/// Test one variant of one rule at `position`.
///
/// Conditions are tested in authored order and the test stops at the first
/// one that fails. Offsets that leave the `i32` range read as empty.
pub fn rule_matches<L, E>(
    rule: &Rule,
    lattice: Lattice,
    variant: Variant,
    owner: TileId,
    position: IVec3,
    lookup: &L,
    evaluator: &E,
) -> bool
where
    L: NeighborLookup + ?Sized,
    E: ConditionEvaluator + ?Sized,
{
    rule.neighbors.iter().all(|neighbor| {
        let offset = variant.apply(lattice, neighbor.offset);
        let tile = checked_offset(position, offset).and_then(|p| lookup.tile_at(p));
        condition_matches(neighbor.condition, tile, owner, evaluator)
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::AcceptCustom;
    use crate::{NeighborCondition, RuleOutput, SpriteRef, Symmetry};
    use ruletile_core::TileGrid;
    use std::cell::RefCell;

    const NORTH: IVec3 = IVec3::new(0, 1, 0);
    const EAST: IVec3 = IVec3::new(1, 0, 0);
    const SOUTH: IVec3 = IVec3::new(0, -1, 0);
    const WEST: IVec3 = IVec3::new(-1, 0, 0);

    fn single(sprite: u32) -> RuleOutput {
        RuleOutput::single(SpriteRef(sprite))
    }

    #[test]
    fn first_matching_rule_wins() {
        let owner = TileId::new();
        let mut grid = TileGrid::new();
        grid.set_tile(IVec3::ZERO, Some(owner));
        grid.set_tile(EAST, Some(owner));

        let mut set = RuleSet::default();
        let catch_all = set.add_rule(Rule::new(single(1)));
        set.add_rule(Rule::new(single(2)).with_neighbor(EAST, NeighborCondition::This));

        let found = match_rules(&set, owner, IVec3::ZERO, &grid, &AcceptCustom).unwrap();
        assert_eq!(found.rule.id, catch_all, "earlier rule must win over a more specific one");
        assert_eq!(found.transform, Mat4::IDENTITY);
    }

    #[test]
    fn rotated_rule_matches_through_quarter_turn() {
        let owner = TileId::new();
        let mut grid = TileGrid::new();
        grid.set_tile(IVec3::ZERO, Some(owner));
        grid.set_tile(EAST, Some(owner));

        let mut set = RuleSet::default();
        set.add_rule(
            Rule::new(single(7))
                .with_neighbor(NORTH, NeighborCondition::This)
                .with_symmetry(Symmetry::Rotated),
        );

        let found = match_rules(&set, owner, IVec3::ZERO, &grid, &AcceptCustom).unwrap();
        assert_eq!(found.variant, Variant::rotated(1));
        assert!(found
            .transform
            .abs_diff_eq(Lattice::Square.rotation_matrix(1), 1e-6));
    }

    #[test]
    fn rotated_rule_prefers_unrotated_variant() {
        let owner = TileId::new();
        let mut grid = TileGrid::new();
        for p in [IVec3::ZERO, NORTH, EAST, SOUTH, WEST] {
            grid.set_tile(p, Some(owner));
        }

        let mut set = RuleSet::default();
        set.add_rule(
            Rule::new(single(7))
                .with_neighbor(NORTH, NeighborCondition::This)
                .with_symmetry(Symmetry::Rotated),
        );

        let found = match_rules(&set, owner, IVec3::ZERO, &grid, &AcceptCustom).unwrap();
        assert_eq!(found.variant, Variant::IDENTITY);
    }

    #[test]
    fn mirror_rules_try_identity_then_x_then_y() {
        let owner = TileId::new();
        let rule = Rule::new(single(3))
            .with_neighbor(IVec3::new(1, 1, 0), NeighborCondition::This)
            .with_symmetry(Symmetry::MirrorXY);
        let mut set = RuleSet::default();
        set.add_rule(rule);

        let cases = [
            (IVec3::new(1, 1, 0), Variant::IDENTITY),
            (IVec3::new(-1, 1, 0), Variant::mirrored(true, false)),
            (IVec3::new(1, -1, 0), Variant::mirrored(false, true)),
            (IVec3::new(-1, -1, 0), Variant::mirrored(true, true)),
        ];
        for (occupied, expected) in cases {
            let mut grid = TileGrid::new();
            grid.set_tile(occupied, Some(owner));
            let found = match_rules(&set, owner, IVec3::ZERO, &grid, &AcceptCustom)
                .unwrap_or_else(|| panic!("no match with neighbor at {occupied}"));
            assert_eq!(found.variant, expected, "neighbor at {occupied}");
            assert_eq!(found.transform, expected.placement(Lattice::Square));
        }
    }

    #[test]
    fn mirror_x_does_not_cover_vertical_flip() {
        let owner = TileId::new();
        let mut grid = TileGrid::new();
        grid.set_tile(IVec3::new(1, -1, 0), Some(owner));

        let mut set = RuleSet::default();
        set.add_rule(
            Rule::new(single(3))
                .with_neighbor(IVec3::new(1, 1, 0), NeighborCondition::This)
                .with_symmetry(Symmetry::MirrorX),
        );
        assert!(match_rules(&set, owner, IVec3::ZERO, &grid, &AcceptCustom).is_none());
    }

    #[test]
    fn no_match_returns_none() {
        let owner = TileId::new();
        let grid = TileGrid::new();
        let mut set = RuleSet::default();
        set.add_rule(Rule::new(single(1)).with_neighbor(NORTH, NeighborCondition::This));
        assert!(match_rules(&set, owner, IVec3::ZERO, &grid, &AcceptCustom).is_none());
    }

    #[test]
    fn rule_without_sprites_is_skipped() {
        let owner = TileId::new();
        let grid = TileGrid::new();
        let mut set = RuleSet::default();
        set.add_rule(Rule::new(RuleOutput::random(Vec::new())));
        let fallback = set.add_rule(Rule::new(single(2)));

        let found = match_rules(&set, owner, IVec3::ZERO, &grid, &AcceptCustom).unwrap();
        assert_eq!(found.rule.id, fallback);
    }

    #[test]
    fn far_out_of_bounds_cells_read_as_empty() {
        let owner = TileId::new();
        let far = IVec3::new(1 << 20, -(1 << 20), 0);
        let lookup = |_p: IVec3| -> Option<TileId> { None };
        let mut set = RuleSet::default();
        set.add_rule(Rule::new(single(1)).with_neighbor(far, NeighborCondition::NotThis));
        assert!(match_rules(&set, owner, IVec3::ZERO, &lookup, &AcceptCustom).is_some());
    }

    #[test]
    fn conditions_are_read_in_authored_order_and_stop_early() {
        let owner = TileId::new();
        let reads = RefCell::new(Vec::new());
        let lookup = |p: IVec3| -> Option<TileId> {
            reads.borrow_mut().push(p);
            None
        };

        let rule = Rule::new(single(1))
            .with_neighbor(WEST, NeighborCondition::NotThis)
            .with_neighbor(NORTH, NeighborCondition::This)
            .with_neighbor(EAST, NeighborCondition::This);
        let mut set = RuleSet::default();
        set.add_rule(rule);

        assert!(match_rules(&set, owner, IVec3::ZERO, &lookup, &AcceptCustom).is_none());
        assert_eq!(*reads.borrow(), vec![WEST, NORTH]);
    }

    #[test]
    fn hex_rotated_rule_uses_six_steps() {
        let owner = TileId::new();
        let mut set = RuleSet::new(Lattice::Hexagonal);
        set.add_rule(
            Rule::new(single(1))
                .with_neighbor(IVec3::new(1, 0, 0), NeighborCondition::This)
                .with_symmetry(Symmetry::Rotated),
        );

        for k in 0..6 {
            let neighbor = Lattice::Hexagonal.rotate_steps(IVec3::new(1, 0, 0), k);
            let mut grid = TileGrid::new();
            grid.set_tile(neighbor, Some(owner));
            let found = match_rules(&set, owner, IVec3::ZERO, &grid, &AcceptCustom).unwrap();
            assert_eq!(found.variant, Variant::rotated(k));
        }
    }

    #[test]
    fn cells_past_the_coordinate_edge_read_as_empty() {
        let owner = TileId::new();
        let everywhere = |_p: IVec3| -> Option<TileId> { Some(owner) };

        let mut east_open = RuleSet::default();
        east_open.add_rule(Rule::new(single(1)).with_neighbor(EAST, NeighborCondition::NotThis));
        let max = IVec3::new(i32::MAX, 0, 0);
        assert!(match_rules(&east_open, owner, max, &everywhere, &AcceptCustom).is_some());
        assert!(match_rules(&east_open, owner, IVec3::ZERO, &everywhere, &AcceptCustom).is_none());

        let mut west_closed = RuleSet::default();
        west_closed.add_rule(Rule::new(single(2)).with_neighbor(WEST, NeighborCondition::This));
        let min = IVec3::new(i32::MIN, 0, 0);
        assert!(match_rules(&west_closed, owner, min, &everywhere, &AcceptCustom).is_none());
    }
}
