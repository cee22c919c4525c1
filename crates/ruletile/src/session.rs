//! A painted tile layer together with everything needed to render it.

use ruletile_core::{IVec3, TileGrid, TileId};
use ruletile_rules::{
    resolve_animation, resolve_tile, NeighborCache, PerlinNoise, SiblingGroups, TileAnimation,
    TileLibrary, TileOutput,
};
use tracing::trace;

use crate::EngineConfig;

/// One tile layer being edited or played.
///
/// Painting goes through [`paint`](Self::paint), which keeps the neighbor
/// cache in step and reports every cell whose output may have changed.
#[derive(Debug)]
pub struct TileMapSession {
    grid: TileGrid,
    library: TileLibrary,
    cache: NeighborCache,
    siblings: SiblingGroups,
    noise: PerlinNoise,
}

impl TileMapSession {
    pub fn new(library: TileLibrary) -> Self {
        Self::with_config(library, &EngineConfig::default())
    }

    pub fn with_config(library: TileLibrary, config: &EngineConfig) -> Self {
        Self {
            grid: TileGrid::new(),
            library,
            cache: NeighborCache::with_settings(config.refresh),
            siblings: SiblingGroups::new(),
            noise: config.noise.noise(),
        }
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn library(&self) -> &TileLibrary {
        &self.library
    }

    /// Library edits take effect on the next paint or render; cells already
    /// on screen are not repainted automatically.
    pub fn library_mut(&mut self) -> &mut TileLibrary {
        &mut self.library
    }

    pub fn siblings(&self) -> &SiblingGroups {
        &self.siblings
    }

    pub fn siblings_mut(&mut self) -> &mut SiblingGroups {
        &mut self.siblings
    }

    /// Set or clear a cell.
    ///
    /// Returns the cells to repaint, the painted cell first. Painting a cell
    /// with the tile it already holds changes nothing and returns no cells.
    pub fn paint(&mut self, position: IVec3, tile: Option<TileId>) -> Vec<IVec3> {
        let previous = self.grid.set_tile(position, tile);
        if previous == tile {
            return Vec::new();
        }

        let mut repaint = vec![position];
        self.cache
            .on_cell_changed(&self.grid, &self.library, position, tile, |p| repaint.push(p));
        trace!(%position, repaint = repaint.len(), "painted cell");
        repaint
    }

    /// What the cell at `position` displays.
    ///
    /// `None` for empty cells and for tiles with no rules in the library.
    pub fn render(&self, position: IVec3) -> Option<TileOutput> {
        let tile = self.grid.get_tile(position)?;
        let rule_set = self.library.rule_set(tile)?;
        Some(resolve_tile(
            rule_set,
            tile,
            position,
            &self.grid,
            &self.siblings,
            &self.noise,
        ))
    }

    /// Animation of the cell at `position`, if its matched rule is animated
    pub fn animation(&self, position: IVec3) -> Option<TileAnimation> {
        let tile = self.grid.get_tile(position)?;
        let rule_set = self.library.rule_set(tile)?;
        resolve_animation(
            rule_set,
            tile,
            position,
            &self.grid,
            &self.siblings,
            &self.noise,
        )
    }
}
