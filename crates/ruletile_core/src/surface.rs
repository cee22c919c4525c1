//! Tile identities and the grid-surface capabilities the engine consumes

use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use glam::IVec3;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a placeable tile asset (a rule tile or an override tile)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub Uuid);

impl TileId {
    /// Create a fresh random identity
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read access to the tile identities around a cell.
///
/// Implementations must answer for every integer position: cells with no
/// tile, including anything outside the authored bounds, are `None`.
pub trait NeighborLookup {
    fn tile_at(&self, position: IVec3) -> Option<TileId>;
}

impl<F> NeighborLookup for F
where
    F: Fn(IVec3) -> Option<TileId>,
{
    fn tile_at(&self, position: IVec3) -> Option<TileId> {
        self(position)
    }
}

/// Stable identity of a grid surface (one tile layer of one map)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceId(pub Uuid);

impl SurfaceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SurfaceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owned by a surface for as long as it exists.
///
/// Caches hold the matching [`SurfaceToken`] instead of a reference to the
/// surface, so a dropped surface shows up as a dead token on the next access.
#[derive(Debug, Default)]
pub struct SurfaceLifetime(Rc<()>);

impl SurfaceLifetime {
    pub fn new() -> Self {
        Self(Rc::new(()))
    }

    /// Hand out a weak token tied to this lifetime
    pub fn token(&self) -> SurfaceToken {
        SurfaceToken(Rc::downgrade(&self.0))
    }
}

/// Weak handle telling whether a surface still exists
#[derive(Debug, Clone)]
pub struct SurfaceToken(Weak<()>);

impl SurfaceToken {
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

/// A grid surface as seen by the neighbor cache and refresh propagator
pub trait TileSurface: NeighborLookup {
    fn surface_id(&self) -> SurfaceId;

    /// Liveness token for lazy cache pruning
    fn token(&self) -> SurfaceToken;

    /// Every distinct tile identity currently placed on the surface
    fn used_tiles(&self) -> HashSet<TileId>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_act_as_neighbor_lookups() {
        let tile = TileId::new();
        let lookup = move |p: IVec3| (p == IVec3::ZERO).then_some(tile);

        assert_eq!(lookup.tile_at(IVec3::ZERO), Some(tile));
        assert_eq!(lookup.tile_at(IVec3::new(i32::MAX, i32::MIN, 0)), None);
    }

    #[test]
    fn token_dies_with_lifetime() {
        let lifetime = SurfaceLifetime::new();
        let token = lifetime.token();
        let copy = token.clone();

        assert!(token.is_alive());
        drop(lifetime);
        assert!(!token.is_alive());
        assert!(!copy.is_alive());
    }

    #[test]
    fn tile_ids_round_trip_through_display() {
        let id = TileId::new();
        assert_eq!(id.to_string(), id.0.to_string());
    }
}
