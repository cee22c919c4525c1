//! The tile library: which rules each tile identity owns.
//!
//! Rule tiles own a [`RuleSet`] directly. Override tiles own an
//! [`OverrideTile`], and the library keeps a derived rule set (an instance)
//! for each of them. Instances are re-derived on edits, never per lookup,
//! and only when their base or their override content actually changed.

use std::collections::{HashMap, HashSet};

use ruletile_core::TileId;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::overrides::{apply_overrides, OverrideTile};
use crate::validate::{validate_output, validate_rule_set, RuleError};
use crate::RuleSet;

/// Rules attached to one tile identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TileAsset {
    Rules(RuleSet),
    Override(OverrideTile),
}

impl TileAsset {
    fn kind(&self) -> &'static str {
        match self {
            TileAsset::Rules(_) => "rule",
            TileAsset::Override(_) => "override",
        }
    }
}

/// Errors returned by library edits
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LibraryError {
    #[error("tile {tile} has invalid rules: {source}")]
    InvalidRules { tile: TileId, source: RuleError },
    #[error("unknown tile {0}")]
    UnknownTile(TileId),
    #[error("override tile {tile} derives from unknown tile {base}")]
    UnknownBase { tile: TileId, base: TileId },
    #[error("tile {tile} is not a {expected} tile")]
    WrongAssetKind { tile: TileId, expected: &'static str },
    #[error("override cycle: {}", format_chain(.chain))]
    OverrideCycle { chain: Vec<TileId> },
}

fn format_chain(chain: &[TileId]) -> String {
    chain
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Derived rule set of an override tile, with the inputs it was built from
#[derive(Debug, Clone)]
struct Instance {
    base: RuleSet,
    overrides: OverrideTile,
    rule_set: RuleSet,
}

/// How many instances a refresh kept and how many it rebuilt
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RefreshStats {
    reused: usize,
    derived: usize,
    failed: usize,
}

/// Registry of tile identities and their rules
#[derive(Debug, Clone, Default)]
pub struct TileLibrary {
    assets: HashMap<TileId, TileAsset>,
    instances: HashMap<TileId, Instance>,
    revision: u64,
}

impl TileLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a library from stored assets.
    ///
    /// Every asset is validated and every override chain is checked for
    /// cycles. Overrides whose base is missing are kept and fail closed.
    pub fn from_assets(
        assets: impl IntoIterator<Item = (TileId, TileAsset)>,
    ) -> Result<Self, LibraryError> {
        let assets: HashMap<TileId, TileAsset> = assets.into_iter().collect();

        let mut ids: Vec<TileId> = assets.keys().copied().collect();
        ids.sort();
        for tile in ids {
            match &assets[&tile] {
                TileAsset::Rules(rule_set) => validate_rules(tile, rule_set)?,
                TileAsset::Override(over) => {
                    validate_override(tile, over)?;
                    find_cycle(&assets, tile, over)?;
                }
            }
        }

        let mut library = Self {
            assets,
            instances: HashMap::new(),
            revision: 0,
        };
        library.refresh_instances();
        Ok(library)
    }

    // ─── Lookup ──────────────────────────────────────────────────────────

    /// Counter bumped by every successful edit
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn asset(&self, tile: TileId) -> Option<&TileAsset> {
        self.assets.get(&tile)
    }

    pub fn contains(&self, tile: TileId) -> bool {
        self.assets.contains_key(&tile)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// All assets, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (TileId, &TileAsset)> + '_ {
        self.assets.iter().map(|(id, asset)| (*id, asset))
    }

    /// Rule set the matcher should run for `tile`.
    ///
    /// For an override tile this is its derived instance, or `None` when the
    /// instance could not be built.
    pub fn rule_set(&self, tile: TileId) -> Option<&RuleSet> {
        match self.assets.get(&tile)? {
            TileAsset::Rules(rule_set) => Some(rule_set),
            TileAsset::Override(_) => self.instances.get(&tile).map(|i| &i.rule_set),
        }
    }

    // ─── Edits ───────────────────────────────────────────────────────────

    /// Add or replace the rule set of a rule tile
    pub fn insert_rule_set(&mut self, tile: TileId, rule_set: RuleSet) -> Result<(), LibraryError> {
        validate_rules(tile, &rule_set)?;
        self.commit(tile, TileAsset::Rules(rule_set));
        Ok(())
    }

    /// Add or replace an override tile
    pub fn insert_override(
        &mut self,
        tile: TileId,
        overrides: OverrideTile,
    ) -> Result<(), LibraryError> {
        validate_override(tile, &overrides)?;
        if !self.assets.contains_key(&overrides.base) && overrides.base != tile {
            return Err(LibraryError::UnknownBase {
                tile,
                base: overrides.base,
            });
        }
        find_cycle(&self.assets, tile, &overrides)?;
        self.commit(tile, TileAsset::Override(overrides));
        Ok(())
    }

    /// Edit the rule set of a rule tile in place.
    ///
    /// The edit runs on a copy; if the result is invalid the library is left
    /// unchanged.
    pub fn update_rule_set<F>(&mut self, tile: TileId, edit: F) -> Result<(), LibraryError>
    where
        F: FnOnce(&mut RuleSet),
    {
        let mut rule_set = match self.assets.get(&tile) {
            Some(TileAsset::Rules(rule_set)) => rule_set.clone(),
            Some(_) => {
                return Err(LibraryError::WrongAssetKind {
                    tile,
                    expected: "rule",
                })
            }
            None => return Err(LibraryError::UnknownTile(tile)),
        };
        edit(&mut rule_set);
        self.insert_rule_set(tile, rule_set)
    }

    /// Edit an override tile in place, with the same rollback as
    /// [`update_rule_set`](Self::update_rule_set)
    pub fn update_override<F>(&mut self, tile: TileId, edit: F) -> Result<(), LibraryError>
    where
        F: FnOnce(&mut OverrideTile),
    {
        let mut overrides = match self.assets.get(&tile) {
            Some(TileAsset::Override(overrides)) => overrides.clone(),
            Some(_) => {
                return Err(LibraryError::WrongAssetKind {
                    tile,
                    expected: "override",
                })
            }
            None => return Err(LibraryError::UnknownTile(tile)),
        };
        edit(&mut overrides);
        self.insert_override(tile, overrides)
    }

    /// Remove a tile. Override tiles deriving from it stop resolving.
    pub fn remove(&mut self, tile: TileId) -> Result<TileAsset, LibraryError> {
        let removed = self
            .assets
            .remove(&tile)
            .ok_or(LibraryError::UnknownTile(tile))?;
        self.revision += 1;
        debug!(%tile, kind = removed.kind(), revision = self.revision, "removed tile");
        self.refresh_instances();
        Ok(removed)
    }

    fn commit(&mut self, tile: TileId, asset: TileAsset) {
        let kind = asset.kind();
        self.assets.insert(tile, asset);
        self.revision += 1;
        debug!(%tile, kind, revision = self.revision, "tile rules updated");
        self.refresh_instances();
    }

    // ─── Instances ───────────────────────────────────────────────────────

    /// Re-derive the instances whose base or override content changed
    fn refresh_instances(&mut self) -> RefreshStats {
        let mut previous = std::mem::take(&mut self.instances);
        let mut stats = RefreshStats::default();

        let mut ids: Vec<TileId> = self
            .assets
            .iter()
            .filter(|(_, asset)| matches!(asset, TileAsset::Override(_)))
            .map(|(id, _)| *id)
            .collect();
        ids.sort();

        let mut derived: HashMap<TileId, Instance> = HashMap::new();
        for tile in ids {
            if derived.contains_key(&tile) {
                continue;
            }

            // Walk down to the first rule set already known, collecting the
            // overrides to apply on the way back up.
            let mut chain: Vec<(TileId, &OverrideTile)> = Vec::new();
            let mut visited = HashSet::new();
            let mut current = tile;
            let base = loop {
                if let Some(done) = derived.get(&current) {
                    break Some(done.rule_set.clone());
                }
                match self.assets.get(&current) {
                    Some(TileAsset::Rules(rule_set)) => break Some(rule_set.clone()),
                    Some(TileAsset::Override(over)) => {
                        // A loop has no rule tile at its root to derive from.
                        if !visited.insert(current) {
                            warn!(%tile, "override chain loops, tile will not resolve");
                            break None;
                        }
                        chain.push((current, over));
                        current = over.base;
                    }
                    None => {
                        warn!(%tile, base = %current, "override base is missing, tile will not resolve");
                        break None;
                    }
                }
            };

            let Some(mut base) = base else {
                stats.failed += 1;
                continue;
            };

            for (id, over) in chain.into_iter().rev() {
                let instance = match previous.remove(&id) {
                    Some(prev) if prev.base == base && prev.overrides == *over => {
                        stats.reused += 1;
                        prev
                    }
                    _ => {
                        stats.derived += 1;
                        Instance {
                            rule_set: apply_overrides(&base, over),
                            base,
                            overrides: over.clone(),
                        }
                    }
                };
                base = instance.rule_set.clone();
                derived.insert(id, instance);
            }
        }

        debug!(
            reused = stats.reused,
            derived = stats.derived,
            failed = stats.failed,
            "override instances refreshed"
        );
        self.instances = derived;
        stats
    }
}

fn validate_rules(tile: TileId, rule_set: &RuleSet) -> Result<(), LibraryError> {
    validate_rule_set(rule_set).map_err(|source| LibraryError::InvalidRules { tile, source })
}

fn validate_override(tile: TileId, overrides: &OverrideTile) -> Result<(), LibraryError> {
    for rule in overrides.rules.iter().filter(|r| r.enabled) {
        validate_output(rule.rule_id, &rule.output)
            .map_err(|source| LibraryError::InvalidRules { tile, source })?;
    }
    Ok(())
}

/// Check that making `tile` an override of `overrides.base` closes no loop
fn find_cycle(
    assets: &HashMap<TileId, TileAsset>,
    tile: TileId,
    overrides: &OverrideTile,
) -> Result<(), LibraryError> {
    let mut chain = vec![tile];
    let mut current = overrides.base;
    loop {
        if chain.contains(&current) {
            chain.push(current);
            return Err(LibraryError::OverrideCycle { chain });
        }
        match assets.get(&current) {
            Some(TileAsset::Override(next)) => {
                chain.push(current);
                current = next.base;
            }
            _ => return Ok(()),
        }
    }
}
