//! Sparse tile grid surface

use std::collections::{HashMap, HashSet};

use glam::IVec3;

use crate::surface::{NeighborLookup, SurfaceId, SurfaceLifetime, SurfaceToken, TileId, TileSurface};

/// A grid surface holding one tile identity per occupied cell.
///
/// Cells are stored sparsely, so any integer position is valid and reads as
/// empty until painted. Per-identity cell counts are kept alongside so that
/// the set of identities in use is available without a scan.
#[derive(Debug)]
pub struct TileGrid {
    id: SurfaceId,
    lifetime: SurfaceLifetime,
    cells: HashMap<IVec3, TileId>,
    counts: HashMap<TileId, usize>,
}

impl Default for TileGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl TileGrid {
    /// Create an empty grid with a fresh surface id
    pub fn new() -> Self {
        Self::with_id(SurfaceId::new())
    }

    /// Create an empty grid with a known surface id
    pub fn with_id(id: SurfaceId) -> Self {
        Self {
            id,
            lifetime: SurfaceLifetime::new(),
            cells: HashMap::new(),
            counts: HashMap::new(),
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Set or clear a cell, returning what was there before
    pub fn set_tile(&mut self, position: IVec3, tile: Option<TileId>) -> Option<TileId> {
        let previous = match tile {
            Some(tile) => self.cells.insert(position, tile),
            None => self.cells.remove(&position),
        };

        if let Some(old) = previous {
            if let Some(count) = self.counts.get_mut(&old) {
                *count -= 1;
                if *count == 0 {
                    self.counts.remove(&old);
                }
            }
        }
        if let Some(new) = tile {
            *self.counts.entry(new).or_insert(0) += 1;
        }

        previous
    }

    /// Get the tile at a cell
    pub fn get_tile(&self, position: IVec3) -> Option<TileId> {
        self.cells.get(&position).copied()
    }

    /// Fill every cell of the inclusive rectangle `min..=max` on layer `min.z`
    pub fn fill_rect(&mut self, min: IVec3, max: IVec3, tile: Option<TileId>) {
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                self.set_tile(IVec3::new(x, y, min.z), tile);
            }
        }
    }

    /// Number of cells holding `tile`
    pub fn count_of(&self, tile: TileId) -> usize {
        self.counts.get(&tile).copied().unwrap_or(0)
    }

    /// Number of occupied cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate occupied cells
    pub fn iter(&self) -> impl Iterator<Item = (IVec3, TileId)> + '_ {
        self.cells.iter().map(|(p, t)| (*p, *t))
    }
}

impl NeighborLookup for TileGrid {
    fn tile_at(&self, position: IVec3) -> Option<TileId> {
        self.get_tile(position)
    }
}

impl TileSurface for TileGrid {
    fn surface_id(&self) -> SurfaceId {
        self.id
    }

    fn token(&self) -> SurfaceToken {
        self.lifetime.token()
    }

    fn used_tiles(&self) -> HashSet<TileId> {
        self.counts.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_is_empty() {
        let grid = TileGrid::new();
        assert!(grid.is_empty());
        assert!(grid.used_tiles().is_empty());
        assert_eq!(grid.tile_at(IVec3::new(-1_000_000, 42, 0)), None);
    }

    #[test]
    fn test_set_tile_returns_previous() {
        let mut grid = TileGrid::new();
        let a = TileId::new();
        let b = TileId::new();
        let p = IVec3::new(3, -2, 0);

        assert_eq!(grid.set_tile(p, Some(a)), None);
        assert_eq!(grid.set_tile(p, Some(b)), Some(a));
        assert_eq!(grid.set_tile(p, None), Some(b));
        assert_eq!(grid.get_tile(p), None);
    }

    #[test]
    fn test_used_tiles_tracks_membership() {
        let mut grid = TileGrid::new();
        let a = TileId::new();
        let b = TileId::new();

        grid.fill_rect(IVec3::ZERO, IVec3::new(2, 2, 0), Some(a));
        assert_eq!(grid.len(), 9);
        assert_eq!(grid.count_of(a), 9);
        assert_eq!(grid.used_tiles(), HashSet::from([a]));

        grid.set_tile(IVec3::ZERO, Some(b));
        assert_eq!(grid.count_of(a), 8);
        assert_eq!(grid.used_tiles(), HashSet::from([a, b]));

        grid.fill_rect(IVec3::ZERO, IVec3::new(2, 2, 0), Some(b));
        assert_eq!(grid.used_tiles(), HashSet::from([b]));
        assert_eq!(grid.count_of(a), 0);
    }

    #[test]
    fn test_token_outlives_only_as_dead() {
        let grid = TileGrid::new();
        let token = grid.token();
        assert!(token.is_alive());
        drop(grid);
        assert!(!token.is_alive());
    }
}
