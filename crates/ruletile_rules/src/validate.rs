//! Rule set validation

use std::collections::HashSet;

use glam::IVec3;
use thiserror::Error;

use crate::{Rule, RuleOutput, RuleSet};

/// A rule set that would misbehave at match time
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleError {
    #[error("rule {rule_id} has no output sprites")]
    EmptyOutput { rule_id: u32 },
    #[error("rule {rule_id} has a condition on its own cell")]
    SelfOffset { rule_id: u32 },
    #[error("rule {rule_id} lists offset {offset} more than once")]
    DuplicateOffset { rule_id: u32, offset: IVec3 },
    #[error("rule id {0} is used more than once")]
    DuplicateId(u32),
    #[error("rule {rule_id} has animation speed range {min}..{max}")]
    AnimationRange { rule_id: u32, min: f32, max: f32 },
    #[error("rule {rule_id} has a noise scale that is not a positive number")]
    NoiseScale { rule_id: u32 },
}

/// Validate every rule of a rule set
pub fn validate_rule_set(rule_set: &RuleSet) -> Result<(), RuleError> {
    let mut ids = HashSet::new();
    for rule in &rule_set.rules {
        if !ids.insert(rule.id) {
            return Err(RuleError::DuplicateId(rule.id));
        }
        validate_rule(rule)?;
    }
    Ok(())
}

/// Validate a single rule
pub fn validate_rule(rule: &Rule) -> Result<(), RuleError> {
    let rule_id = rule.id;
    validate_output(rule_id, &rule.output)?;

    let mut offsets = HashSet::new();
    for neighbor in &rule.neighbors {
        if neighbor.offset == IVec3::ZERO {
            return Err(RuleError::SelfOffset { rule_id });
        }
        if !offsets.insert(neighbor.offset) {
            return Err(RuleError::DuplicateOffset {
                rule_id,
                offset: neighbor.offset,
            });
        }
    }

    Ok(())
}

/// Validate the output fields of rule `rule_id`.
///
/// Overrides replace only these fields, so they are checked on their own.
pub fn validate_output(rule_id: u32, output: &RuleOutput) -> Result<(), RuleError> {
    if output.sprites.is_empty() {
        return Err(RuleError::EmptyOutput { rule_id });
    }

    let (min, max) = (output.min_animation_speed, output.max_animation_speed);
    if !(min.is_finite() && max.is_finite() && min >= 0.0 && min <= max) {
        return Err(RuleError::AnimationRange { rule_id, min, max });
    }

    if !(output.noise_scale.is_finite() && output.noise_scale > 0.0) {
        return Err(RuleError::NoiseScale { rule_id });
    }

    Ok(())
}
