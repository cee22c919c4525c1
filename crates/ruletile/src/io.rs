//! Tile library persistence as JSON.

use std::path::Path;

use ruletile_core::TileId;
use ruletile_rules::{TileAsset, TileLibrary};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::RuleTileError;

const LIBRARY_FORMAT_VERSION: u32 = 1;

/// On-disk form of a [`TileLibrary`]
#[derive(Debug, Serialize, Deserialize)]
struct LibraryFile {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    tiles: Vec<TileEntry>,
}

fn default_version() -> u32 {
    LIBRARY_FORMAT_VERSION
}

#[derive(Debug, Serialize, Deserialize)]
struct TileEntry {
    id: TileId,
    asset: TileAsset,
}

/// Serialize a library to pretty JSON, entries sorted by tile id
pub fn library_to_json(library: &TileLibrary) -> Result<String, RuleTileError> {
    let mut tiles: Vec<TileEntry> = library
        .iter()
        .map(|(id, asset)| TileEntry {
            id,
            asset: asset.clone(),
        })
        .collect();
    tiles.sort_by_key(|entry| entry.id);

    let file = LibraryFile {
        version: LIBRARY_FORMAT_VERSION,
        tiles,
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

/// Parse a library from JSON, validating every asset and override chain
pub fn parse_library(json: &str) -> Result<TileLibrary, RuleTileError> {
    let file: LibraryFile = serde_json::from_str(json)?;
    debug!(version = file.version, tiles = file.tiles.len(), "parsed tile library");
    let library = TileLibrary::from_assets(file.tiles.into_iter().map(|e| (e.id, e.asset)))?;
    Ok(library)
}

/// Load a library from a JSON file
pub fn load_library(path: &Path) -> Result<TileLibrary, RuleTileError> {
    let content = std::fs::read_to_string(path)?;
    parse_library(&content)
}

/// Save a library to a JSON file
pub fn save_library(library: &TileLibrary, path: &Path) -> Result<(), RuleTileError> {
    let content = library_to_json(library)?;
    std::fs::write(path, content)?;
    Ok(())
}
