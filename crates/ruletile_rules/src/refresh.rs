//! Neighbor-set cache and refresh propagation.
//!
//! When a cell changes, every cell whose rules can read it may change too.
//! The cache keeps, per surface, the union of offsets that the rules of the
//! tiles placed on it can reach, so [`NeighborCache::on_cell_changed`] only
//! has to look at `position - offset` for those offsets.
//!
//! An entry is rebuilt whenever the set of tiles on its surface differs (by
//! content, not by count) from the set it was built for, or when the tile
//! library has been edited since.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

use glam::IVec3;
use ruletile_core::{checked_origin, SurfaceId, SurfaceToken, TileId, TileSurface};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::library::TileLibrary;

/// How refresh fan-out is filtered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshSettings {
    /// Only refresh a cell if its own rules read the changed direction.
    /// When off, every rule-governed cell in the fan-out is refreshed.
    pub per_tile_filter: bool,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            per_tile_filter: true,
        }
    }
}

/// Whether a surface's cache entry can be used as is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Stale,
    Built,
}

#[derive(Debug)]
struct CacheEntry {
    token: SurfaceToken,
    /// Distinct tiles on the surface when the entry was built.
    tiles: HashSet<TileId>,
    library_revision: u64,
    /// Offsets any rule on the surface can read, in a fixed order.
    union: Vec<IVec3>,
    /// Offsets per rule-governed tile. Tiles without rules are absent.
    per_tile: HashMap<TileId, HashSet<IVec3>>,
}

impl CacheEntry {
    fn build<S>(surface: &S, tiles: HashSet<TileId>, library: &TileLibrary) -> Self
    where
        S: TileSurface + ?Sized,
    {
        let mut per_tile = HashMap::new();
        let mut union = HashSet::new();
        for tile in &tiles {
            if let Some(rule_set) = library.rule_set(*tile) {
                let offsets = rule_set.neighbor_offsets();
                union.extend(offsets.iter().copied());
                per_tile.insert(*tile, offsets);
            }
        }

        let mut union: Vec<IVec3> = union.into_iter().collect();
        union.sort_by_key(|o| (o.z, o.y, o.x));

        Self {
            token: surface.token(),
            tiles,
            library_revision: library.revision(),
            union,
            per_tile,
        }
    }

    fn is_fresh(&self, tiles: &HashSet<TileId>, library: &TileLibrary) -> bool {
        self.library_revision == library.revision() && self.tiles == *tiles
    }
}

/// Per-surface neighbor-set cache, owned by whoever owns the surfaces.
#[derive(Debug, Default)]
pub struct NeighborCache {
    entries: HashMap<SurfaceId, CacheEntry>,
    settings: RefreshSettings,
}

impl NeighborCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: RefreshSettings) -> Self {
        Self {
            entries: HashMap::new(),
            settings,
        }
    }

    pub fn settings(&self) -> RefreshSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: RefreshSettings) {
        self.settings = settings;
    }

    /// Number of cached surfaces, dead ones included until pruned
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// State of `surface`'s entry against the surface and library as they
    /// are now
    pub fn state<S>(&mut self, surface: &S, library: &TileLibrary) -> CacheState
    where
        S: TileSurface + ?Sized,
    {
        self.prune();
        let tiles = surface.used_tiles();
        match self.entries.get(&surface.surface_id()) {
            Some(entry) if entry.is_fresh(&tiles, library) => CacheState::Built,
            _ => CacheState::Stale,
        }
    }

    /// Rebuild `surface`'s entry unconditionally
    pub fn build<S>(&mut self, surface: &S, library: &TileLibrary)
    where
        S: TileSurface + ?Sized,
    {
        self.prune();
        let entry = CacheEntry::build(surface, surface.used_tiles(), library);
        debug!(
            surface = %surface.surface_id(),
            tiles = entry.tiles.len(),
            offsets = entry.union.len(),
            "neighbor cache built"
        );
        self.entries.insert(surface.surface_id(), entry);
    }

    /// Union of offsets the rules on `surface` can read, rebuilding if stale
    pub fn neighbor_offsets<S>(&mut self, surface: &S, library: &TileLibrary) -> &[IVec3]
    where
        S: TileSurface + ?Sized,
    {
        self.prune();
        &self.ensure_built(surface, library).union
    }

    /// Signal `repaint` for every cell whose output may depend on the cell at
    /// `position`, which now holds `new_tile`.
    ///
    /// The surface should already hold the new tile; a mismatch is logged and
    /// propagation goes ahead. The changed cell itself is not signaled. Returns the number of cells signaled.
    pub fn on_cell_changed<S, F>(
        &mut self,
        surface: &S,
        library: &TileLibrary,
        position: IVec3,
        new_tile: Option<TileId>,
        mut repaint: F,
    ) -> usize
    where
        S: TileSurface + ?Sized,
        F: FnMut(IVec3),
    {
        if surface.tile_at(position) != new_tile {
            warn!(%position, ?new_tile, "surface does not hold the changed tile yet");
        }
        self.prune();
        let per_tile_filter = self.settings.per_tile_filter;
        let entry = self.ensure_built(surface, library);

        let mut signaled = 0;
        for offset in &entry.union {
            // Cells that look toward `position` sit at `position - offset`.
            let Some(affected) = checked_origin(position, *offset) else {
                continue;
            };
            let Some(tile) = surface.tile_at(affected) else {
                continue;
            };
            let Some(offsets) = entry.per_tile.get(&tile) else {
                continue;
            };
            if per_tile_filter && !offsets.contains(offset) {
                continue;
            }
            repaint(affected);
            signaled += 1;
        }

        trace!(%position, ?new_tile, signaled, "cell change propagated");
        signaled
    }

    /// Drop `surface`'s entry so the next access rebuilds it
    pub fn invalidate(&mut self, surface: SurfaceId) -> bool {
        self.entries.remove(&surface).is_some()
    }

    /// Drop entries whose surfaces no longer exist. Returns how many went.
    pub fn prune(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.token.is_alive());
        let pruned = before - self.entries.len();
        if pruned > 0 {
            debug!(pruned, "pruned neighbor cache entries of dropped surfaces");
        }
        pruned
    }

    fn ensure_built<S>(&mut self, surface: &S, library: &TileLibrary) -> &CacheEntry
    where
        S: TileSurface + ?Sized,
    {
        let tiles = surface.used_tiles();
        match self.entries.entry(surface.surface_id()) {
            Entry::Occupied(occupied) if occupied.get().is_fresh(&tiles, library) => {
                occupied.into_mut()
            }
            Entry::Occupied(mut occupied) => {
                debug!(surface = %surface.surface_id(), "neighbor cache stale, rebuilding");
                occupied.insert(CacheEntry::build(surface, tiles, library));
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => {
                debug!(surface = %surface.surface_id(), "neighbor cache built");
                vacant.insert(CacheEntry::build(surface, tiles, library))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NeighborCondition, Rule, RuleOutput, RuleSet, SpriteRef, Symmetry};
    use ruletile_core::TileGrid;

    const EAST: IVec3 = IVec3::new(1, 0, 0);
    const NORTH: IVec3 = IVec3::new(0, 1, 0);

    fn reads(offsets: &[IVec3]) -> RuleSet {
        let mut rule = Rule::new(RuleOutput::single(SpriteRef(1)));
        for offset in offsets {
            rule.set_neighbor(*offset, NeighborCondition::This);
        }
        let mut set = RuleSet::default();
        set.add_rule(rule);
        set
    }

    fn collect(
        cache: &mut NeighborCache,
        grid: &TileGrid,
        library: &TileLibrary,
        position: IVec3,
    ) -> Vec<IVec3> {
        let mut out = Vec::new();
        cache.on_cell_changed(grid, library, position, grid.get_tile(position), |p| out.push(p));
        out.sort_by_key(|p| (p.y, p.x));
        out
    }

    #[test]
    fn refresh_signals_only_cells_looking_at_the_change() {
        let east_reader = TileId::new();
        let mut library = TileLibrary::new();
        library.insert_rule_set(east_reader, reads(&[EAST])).unwrap();

        let mut grid = TileGrid::new();
        for x in -3..=3 {
            for y in -3..=3 {
                grid.set_tile(IVec3::new(x, y, 0), Some(east_reader));
            }
        }

        let mut cache = NeighborCache::new();
        let p = IVec3::new(0, 0, 0);
        assert_eq!(collect(&mut cache, &grid, &library, p), vec![p - EAST]);
    }

    #[test]
    fn per_tile_filter_skips_cells_that_ignore_the_direction() {
        let east_reader = TileId::new();
        let north_reader = TileId::new();
        let mut library = TileLibrary::new();
        library.insert_rule_set(east_reader, reads(&[EAST])).unwrap();
        library.insert_rule_set(north_reader, reads(&[NORTH])).unwrap();

        let mut grid = TileGrid::new();
        let p = IVec3::ZERO;
        grid.set_tile(p, Some(east_reader));
        // West of p reads north only, south of p reads east only.
        grid.set_tile(p - EAST, Some(north_reader));
        grid.set_tile(p - NORTH, Some(east_reader));

        let mut cache = NeighborCache::new();
        assert!(collect(&mut cache, &grid, &library, p).is_empty());

        cache.set_settings(RefreshSettings {
            per_tile_filter: false,
        });
        assert_eq!(
            collect(&mut cache, &grid, &library, p),
            vec![p - NORTH, p - EAST],
            "coarse filter refreshes every rule-governed cell in the fan-out"
        );
    }

    #[test]
    fn empty_and_plain_cells_are_never_signaled() {
        let reader = TileId::new();
        let plain = TileId::new();
        let mut library = TileLibrary::new();
        library.insert_rule_set(reader, reads(&[EAST, NORTH])).unwrap();

        let mut grid = TileGrid::new();
        grid.set_tile(IVec3::ZERO, Some(reader));
        grid.set_tile(-EAST, Some(plain));

        let mut cache = NeighborCache::with_settings(RefreshSettings {
            per_tile_filter: false,
        });
        assert!(collect(&mut cache, &grid, &library, IVec3::ZERO).is_empty());
    }

    #[test]
    fn symmetric_rules_widen_the_union() {
        let tile = TileId::new();
        let mut set = RuleSet::default();
        set.add_rule(
            Rule::new(RuleOutput::single(SpriteRef(1)))
                .with_neighbor(NORTH, NeighborCondition::This)
                .with_symmetry(Symmetry::Rotated),
        );
        let mut library = TileLibrary::new();
        library.insert_rule_set(tile, set).unwrap();

        let mut grid = TileGrid::new();
        grid.fill_rect(IVec3::new(-1, -1, 0), IVec3::new(1, 1, 0), Some(tile));

        let mut cache = NeighborCache::new();
        assert_eq!(cache.neighbor_offsets(&grid, &library).len(), 4);
        assert_eq!(collect(&mut cache, &grid, &library, IVec3::ZERO).len(), 4);
    }

    #[test]
    fn same_count_swap_rebuilds() {
        let a = TileId::new();
        let b = TileId::new();
        let c = TileId::new();
        let mut library = TileLibrary::new();
        library.insert_rule_set(a, reads(&[EAST])).unwrap();
        library.insert_rule_set(b, reads(&[EAST])).unwrap();
        library.insert_rule_set(c, reads(&[NORTH])).unwrap();

        let mut grid = TileGrid::new();
        grid.set_tile(IVec3::new(0, 0, 0), Some(a));
        grid.set_tile(IVec3::new(5, 0, 0), Some(b));

        let mut cache = NeighborCache::new();
        cache.build(&grid, &library);
        assert_eq!(cache.state(&grid, &library), CacheState::Built);
        assert_eq!(cache.neighbor_offsets(&grid, &library), &[EAST]);

        // Swap b for c: still two distinct tiles.
        grid.set_tile(IVec3::new(5, 0, 0), Some(c));
        assert_eq!(cache.state(&grid, &library), CacheState::Stale);
        assert_eq!(cache.neighbor_offsets(&grid, &library), &[EAST, NORTH]);
        assert_eq!(cache.state(&grid, &library), CacheState::Built);
    }

    #[test]
    fn library_edit_marks_entries_stale() {
        let tile = TileId::new();
        let mut library = TileLibrary::new();
        library.insert_rule_set(tile, reads(&[EAST])).unwrap();

        let mut grid = TileGrid::new();
        grid.set_tile(IVec3::ZERO, Some(tile));

        let mut cache = NeighborCache::new();
        cache.build(&grid, &library);
        library
            .update_rule_set(tile, |set| {
                set.rules[0].set_neighbor(NORTH, NeighborCondition::NotThis);
            })
            .unwrap();

        assert_eq!(cache.state(&grid, &library), CacheState::Stale);
        assert_eq!(cache.neighbor_offsets(&grid, &library), &[EAST, NORTH]);
    }

    #[test]
    fn dropped_surfaces_are_pruned_on_next_access() {
        let tile = TileId::new();
        let mut library = TileLibrary::new();
        library.insert_rule_set(tile, reads(&[EAST])).unwrap();

        let mut cache = NeighborCache::new();
        let kept = TileGrid::new();
        {
            let mut dropped = TileGrid::new();
            dropped.set_tile(IVec3::ZERO, Some(tile));
            cache.build(&dropped, &library);
        }
        assert_eq!(cache.len(), 1, "pruning is lazy");

        assert_eq!(cache.state(&kept, &library), CacheState::Stale);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn invalidate_forces_rebuild() {
        let tile = TileId::new();
        let mut library = TileLibrary::new();
        library.insert_rule_set(tile, reads(&[EAST])).unwrap();
        let mut grid = TileGrid::new();
        grid.set_tile(IVec3::ZERO, Some(tile));

        let mut cache = NeighborCache::new();
        cache.build(&grid, &library);
        assert!(cache.invalidate(grid.id()));
        assert!(!cache.invalidate(grid.id()));
        assert_eq!(cache.state(&grid, &library), CacheState::Stale);
    }

    #[test]
    fn override_tiles_use_their_instance_offsets() {
        let base = TileId::new();
        let over = TileId::new();
        let mut library = TileLibrary::new();
        library.insert_rule_set(base, reads(&[NORTH])).unwrap();
        library
            .insert_override(over, crate::OverrideTile::new(base))
            .unwrap();

        let mut grid = TileGrid::new();
        grid.set_tile(IVec3::ZERO, Some(over));
        grid.set_tile(NORTH, Some(over));

        let mut cache = NeighborCache::new();
        assert_eq!(collect(&mut cache, &grid, &library, NORTH), vec![IVec3::ZERO]);
    }

    #[test]
    fn changes_at_the_coordinate_edge_skip_unreachable_readers() {
        let east_reader = TileId::new();
        let mut library = TileLibrary::new();
        library.insert_rule_set(east_reader, reads(&[EAST])).unwrap();

        let mut grid = TileGrid::new();
        let min = IVec3::new(i32::MIN, 0, 0);
        let max = IVec3::new(i32::MAX, 0, 0);
        grid.set_tile(min, Some(east_reader));
        grid.set_tile(max, Some(east_reader));
        grid.set_tile(max - EAST, Some(east_reader));

        let mut cache = NeighborCache::new();
        assert!(collect(&mut cache, &grid, &library, min).is_empty());
        assert_eq!(collect(&mut cache, &grid, &library, max), vec![max - EAST]);
    }

    #[test]
    fn stale_surface_still_propagates() {
        let east_reader = TileId::new();
        let mut library = TileLibrary::new();
        library.insert_rule_set(east_reader, reads(&[EAST])).unwrap();

        let mut grid = TileGrid::new();
        grid.set_tile(IVec3::ZERO, Some(east_reader));
        grid.set_tile(-EAST, Some(east_reader));

        let mut cache = NeighborCache::new();
        let mut out = Vec::new();
        let signaled =
            cache.on_cell_changed(&grid, &library, IVec3::ZERO, Some(TileId::new()), |p| out.push(p));
        assert_eq!(signaled, 1);
        assert_eq!(out, vec![-EAST]);
    }
}
