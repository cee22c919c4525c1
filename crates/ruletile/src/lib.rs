//! Rule tile auto-tiling.
//!
//! This crate re-exports the data types from `ruletile_core` and the engine
//! from `ruletile_rules`, and adds what an editor or game needs around them:
//! - [`EngineConfig`] - Noise seed and refresh settings, read from TOML
//! - [`load_library`] / [`save_library`] - Tile libraries as JSON
//! - [`TileMapSession`] - A tile layer wired to a library, cache and resolver
//!
//! # Example
//!
//! ```
//! use ruletile::prelude::*;
//!
//! let wall = TileId::new();
//! let mut rules = RuleSet::default().with_default_sprite(SpriteRef(0));
//! rules.add_rule(
//!     Rule::new(RuleOutput::single(SpriteRef(1)))
//!         .with_neighbor(IVec3::new(1, 0, 0), NeighborCondition::This),
//! );
//!
//! let mut library = TileLibrary::new();
//! library.insert_rule_set(wall, rules).unwrap();
//!
//! let mut session = TileMapSession::new(library);
//! session.paint(IVec3::ZERO, Some(wall));
//! let repaint = session.paint(IVec3::new(1, 0, 0), Some(wall));
//! assert_eq!(repaint, vec![IVec3::new(1, 0, 0), IVec3::ZERO]);
//! assert_eq!(session.render(IVec3::ZERO).unwrap().sprite, Some(SpriteRef(1)));
//! ```

mod config;
mod error;
mod io;
mod session;

pub use config::{load_config, parse_config, EngineConfig, NoiseSettings};
pub use error::RuleTileError;
pub use io::{library_to_json, load_library, parse_library, save_library};
pub use session::TileMapSession;

pub use ruletile_core;
pub use ruletile_rules;

/// Common imports
pub mod prelude {
    pub use crate::{EngineConfig, RuleTileError, TileMapSession};
    pub use ruletile_core::{IVec3, Lattice, Mat4, NeighborLookup, TileGrid, TileId, TileSurface};
    pub use ruletile_rules::{
        AcceptCustom, ColliderKind, ConditionEvaluator, NeighborCache, NeighborCondition,
        ObjectRef, OutputMode, OverrideTile, PerlinNoise, Rule, RuleOutput, RuleSet,
        SiblingGroups, SpriteRef, Symmetry, TileAsset, TileLibrary, TileOutput,
    };
}
