//! Core data structures for ruletile
//!
//! This crate provides the plain types the rule engine works against:
//! - `TileId` - Identity of a placeable tile asset
//! - `NeighborLookup` / `TileSurface` - What the engine may ask of a grid
//! - `TileGrid` - A sparse grid surface keyed by cell position
//! - `Lattice` - Exact rotations and mirrors of neighbor offsets
//!
//! It has no knowledge of rules; see `ruletile_rules` for the engine.

mod grid;
mod lattice;
mod surface;

pub use glam::{IVec3, Mat4, Vec3};
pub use grid::TileGrid;
pub use lattice::{checked_offset, checked_origin, Lattice};
pub use surface::{
    NeighborLookup, SurfaceId, SurfaceLifetime, SurfaceToken, TileId, TileSurface,
};
