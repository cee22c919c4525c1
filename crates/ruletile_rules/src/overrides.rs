//! Override tiles: rule tiles derived from another tile's rules.
//!
//! An [`OverrideTile`] never carries conditions. It swaps the outputs of
//! chosen rules and substitutes sprites and objects everywhere else, and
//! [`apply_overrides`] turns it into an ordinary [`RuleSet`] that the
//! matcher runs unchanged.

use ruletile_core::TileId;
use serde::{Deserialize, Serialize};

use crate::{ColliderKind, ObjectRef, RuleOutput, RuleSet, SpriteRef};

/// Replace one sprite wherever an inherited output uses it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteOverride {
    pub original: SpriteRef,
    pub replacement: SpriteRef,
}

/// Replace one object wherever an inherited output uses it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectOverride {
    pub original: ObjectRef,
    pub replacement: ObjectRef,
}

/// Replacement output for one base rule, keyed by rule id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOverride {
    pub rule_id: u32,
    /// Disabled overrides are kept for authoring but not applied.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub output: RuleOutput,
}

fn default_enabled() -> bool {
    true
}

/// A tile whose rules are derived from `base`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverrideTile {
    /// Rule tile or other override tile this one derives from.
    pub base: TileId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RuleOverride>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sprites: Vec<SpriteOverride>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<ObjectOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sprite: Option<SpriteRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_object: Option<ObjectRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_collider: Option<ColliderKind>,
}

impl OverrideTile {
    pub fn new(base: TileId) -> Self {
        Self {
            base,
            rules: Vec::new(),
            sprites: Vec::new(),
            objects: Vec::new(),
            default_sprite: None,
            default_object: None,
            default_collider: None,
        }
    }

    /// Replace the output of base rule `rule_id`
    pub fn with_rule_output(mut self, rule_id: u32, output: RuleOutput) -> Self {
        self.set_rule_output(rule_id, output);
        self
    }

    pub fn with_sprite(mut self, original: SpriteRef, replacement: SpriteRef) -> Self {
        self.set_sprite(original, replacement);
        self
    }

    pub fn with_object(mut self, original: ObjectRef, replacement: ObjectRef) -> Self {
        self.set_object(original, replacement);
        self
    }

    pub fn with_default_sprite(mut self, sprite: SpriteRef) -> Self {
        self.default_sprite = Some(sprite);
        self
    }

    /// Set or replace the enabled override for `rule_id`
    pub fn set_rule_output(&mut self, rule_id: u32, output: RuleOutput) {
        match self.rules.iter_mut().find(|r| r.rule_id == rule_id) {
            Some(existing) => {
                existing.enabled = true;
                existing.output = output;
            }
            None => self.rules.push(RuleOverride {
                rule_id,
                enabled: true,
                output,
            }),
        }
    }

    /// Enable or disable the override for `rule_id`. Returns `false` if
    /// there is none.
    pub fn set_rule_enabled(&mut self, rule_id: u32, enabled: bool) -> bool {
        match self.rules.iter_mut().find(|r| r.rule_id == rule_id) {
            Some(existing) => {
                existing.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn rule_override(&self, rule_id: u32) -> Option<&RuleOverride> {
        self.rules.iter().find(|r| r.rule_id == rule_id)
    }

    pub fn remove_rule_override(&mut self, rule_id: u32) -> Option<RuleOverride> {
        let pos = self.rules.iter().position(|r| r.rule_id == rule_id)?;
        Some(self.rules.remove(pos))
    }

    pub fn set_sprite(&mut self, original: SpriteRef, replacement: SpriteRef) {
        match self.sprites.iter_mut().find(|s| s.original == original) {
            Some(existing) => existing.replacement = replacement,
            None => self.sprites.push(SpriteOverride {
                original,
                replacement,
            }),
        }
    }

    pub fn set_object(&mut self, original: ObjectRef, replacement: ObjectRef) {
        match self.objects.iter_mut().find(|o| o.original == original) {
            Some(existing) => existing.replacement = replacement,
            None => self.objects.push(ObjectOverride {
                original,
                replacement,
            }),
        }
    }

    /// Enabled override output for `rule_id`
    fn enabled_output(&self, rule_id: u32) -> Option<&RuleOutput> {
        self.rules
            .iter()
            .find(|r| r.rule_id == rule_id && r.enabled)
            .map(|r| &r.output)
    }

    fn substitute_sprite(&self, sprite: SpriteRef) -> SpriteRef {
        self.sprites
            .iter()
            .find(|s| s.original == sprite)
            .map_or(sprite, |s| s.replacement)
    }

    fn substitute_object(&self, object: ObjectRef) -> ObjectRef {
        self.objects
            .iter()
            .find(|o| o.original == object)
            .map_or(object, |o| o.replacement)
    }
}

/// Derive the concrete rule set of an override tile from its base.
///
/// Every base rule is cloned in order with its id, conditions and symmetry.
/// An enabled rule override replaces the whole output; otherwise the sprite
/// and object substitutions are applied to the inherited output. Overrides
/// naming rules the base no longer has are ignored.
pub fn apply_overrides(base: &RuleSet, overrides: &OverrideTile) -> RuleSet {
    let rules = base
        .rules
        .iter()
        .map(|rule| {
            let mut derived = rule.clone();
            match overrides.enabled_output(rule.id) {
                Some(output) => derived.output = output.clone(),
                None => {
                    let output = &mut derived.output;
                    for sprite in &mut output.sprites {
                        *sprite = overrides.substitute_sprite(*sprite);
                    }
                    output.object = output.object.map(|o| overrides.substitute_object(o));
                }
            }
            derived
        })
        .collect();

    RuleSet {
        lattice: base.lattice,
        default_sprite: overrides
            .default_sprite
            .or_else(|| base.default_sprite.map(|s| overrides.substitute_sprite(s))),
        default_object: overrides
            .default_object
            .or_else(|| base.default_object.map(|o| overrides.substitute_object(o))),
        default_collider: overrides.default_collider.unwrap_or(base.default_collider),
        rules,
    }
}
