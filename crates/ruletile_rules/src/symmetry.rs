//! Symmetry variants of a rule's conditions.
//!
//! The matcher and the neighbor cache both enumerate variants through
//! [`Symmetry::variants`], so the offsets the cache records are exactly the
//! offsets the matcher can ever read.

use std::collections::HashSet;

use glam::{IVec3, Mat4};
use ruletile_core::Lattice;

use crate::{Rule, RuleSet, Symmetry};

/// One rotated or mirrored form of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Variant {
    /// Clockwise lattice rotation steps.
    pub rotation: u32,
    pub mirror_x: bool,
    pub mirror_y: bool,
}

impl Variant {
    pub const IDENTITY: Self = Self {
        rotation: 0,
        mirror_x: false,
        mirror_y: false,
    };

    pub fn rotated(steps: u32) -> Self {
        Self {
            rotation: steps,
            ..Self::IDENTITY
        }
    }

    pub fn mirrored(mirror_x: bool, mirror_y: bool) -> Self {
        Self {
            mirror_x,
            mirror_y,
            ..Self::IDENTITY
        }
    }

    /// Map an authored offset into this variant
    pub fn apply(self, lattice: Lattice, offset: IVec3) -> IVec3 {
        let mirrored = lattice.mirror_offset(offset, self.mirror_x, self.mirror_y);
        lattice.rotate_steps(mirrored, self.rotation)
    }

    /// Placement matrix for a tile matched through this variant
    pub fn placement(self, lattice: Lattice) -> Mat4 {
        lattice.rotation_matrix(self.rotation) * Lattice::mirror_matrix(self.mirror_x, self.mirror_y)
    }
}

impl Symmetry {
    /// Variants in the order the matcher tries them. The identity always
    /// comes first.
    pub fn variants(self, lattice: Lattice) -> Variants {
        Variants {
            symmetry: self,
            rotations: lattice.rotation_count(),
            index: 0,
        }
    }
}

/// Iterator over the variants of a [`Symmetry`]
#[derive(Debug, Clone)]
pub struct Variants {
    symmetry: Symmetry,
    rotations: u32,
    index: u32,
}

impl Iterator for Variants {
    type Item = Variant;

    fn next(&mut self) -> Option<Variant> {
        let i = self.index;
        let variant = match (self.symmetry, i) {
            (_, 0) => Variant::IDENTITY,
            (Symmetry::Rotated, i) if i < self.rotations => Variant::rotated(i),
            (Symmetry::MirrorX, 1) => Variant::mirrored(true, false),
            (Symmetry::MirrorY, 1) => Variant::mirrored(false, true),
            (Symmetry::MirrorXY, 1) => Variant::mirrored(true, false),
            (Symmetry::MirrorXY, 2) => Variant::mirrored(false, true),
            (Symmetry::MirrorXY, 3) => Variant::mirrored(true, true),
            _ => return None,
        };
        self.index += 1;
        Some(variant)
    }
}

/// Every offset `rule` can read, across all of its symmetry variants
pub fn rule_offsets(rule: &Rule, lattice: Lattice) -> impl Iterator<Item = IVec3> + '_ {
    rule.symmetry.variants(lattice).flat_map(move |variant| {
        rule.neighbors
            .iter()
            .map(move |n| variant.apply(lattice, n.offset))
    })
}

impl RuleSet {
    /// Union of every offset any rule in the set can read
    pub fn neighbor_offsets(&self) -> HashSet<IVec3> {
        self.rules
            .iter()
            .flat_map(|rule| rule_offsets(rule, self.lattice))
            .collect()
    }
}
