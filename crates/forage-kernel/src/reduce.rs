//! Generation reducer: fold one generation's trials into the successor seed.
//!
//! A pure function of (seed, trial set) -> seed. The current seed is copied,
//! the single creator trial's finalized answer supplies the new values for
//! the named social-contract fields, and every other key rides along
//! untouched. No state is held between calls.

use crate::answer::{INVALID_RESPONSE, unwrap_float};
use crate::role::TrialRole;
use crate::seed::SeedDefinition;
use serde_json::Value;
use tracing::{debug, warn};

/// The reducer's view of one trial in a generation.
///
/// The chain layer's trial record implements this; tests use lightweight
/// stand-ins.
pub trait GenerationTrial {
    /// Tagged role carried on the trial record.
    fn role(&self) -> TrialRole;

    /// The trial's finalized answer, if it has one.
    fn answer(&self) -> Option<&Value>;
}

impl<T: GenerationTrial> GenerationTrial for &T {
    fn role(&self) -> TrialRole {
        (**self).role()
    }

    fn answer(&self) -> Option<&Value> {
        (**self).answer()
    }
}

/// Errors raised while folding a generation.
///
/// All of these are structural: they indicate a malformed chain or a
/// malformed creator answer, not a condition to recover from.
#[derive(Debug, thiserror::Error)]
pub enum ReduceError {
    #[error("expected exactly one creator trial in the generation, found {count}")]
    AmbiguousCreator { count: usize },

    #[error("creator trial has no finalized answer")]
    MissingCreatorAnswer,

    #[error("creator answer is not a mapping: {0}")]
    CreatorAnswerNotAMap(Value),

    #[error("creator answer has no field named {0:?}")]
    MissingCreatorField(String),

    #[error("seed has no parameter named {0:?}; the reducer only overwrites existing keys")]
    MissingSeedKey(String),

    #[error("creator field {field:?} is not a social-contract value in [0, 1]: {value}")]
    InvalidParameter { field: String, value: Value },
}

/// Compute the successor seed for a generation.
///
/// `fields` names the social-contract parameters to fold from the creator's
/// answer; each must already be a seed key, so the output carries exactly
/// the input's key set. The input seed is never mutated.
pub fn reduce_generation<T: GenerationTrial>(
    seed: &SeedDefinition,
    trials: &[T],
    fields: &[String],
) -> Result<SeedDefinition, ReduceError> {
    let creators: Vec<&T> = trials
        .iter()
        .filter(|trial| trial.role().is_creator())
        .collect();
    if creators.len() != 1 {
        return Err(ReduceError::AmbiguousCreator {
            count: creators.len(),
        });
    }

    let answer = creators[0]
        .answer()
        .ok_or(ReduceError::MissingCreatorAnswer)?;
    let answer = answer
        .as_object()
        .ok_or_else(|| ReduceError::CreatorAnswerNotAMap(answer.clone()))?;

    let mut next = seed.clone();
    for field in fields {
        if !next.contains_key(field) {
            return Err(ReduceError::MissingSeedKey(field.clone()));
        }
        let raw = answer
            .get(field)
            .ok_or_else(|| ReduceError::MissingCreatorField(field.clone()))?;
        let folded = fold_parameter(field, raw)?;
        debug!(field = %field, value = %folded, "folded creator parameter into successor seed");
        next.overwrite(field, folded)
            .map_err(|_| ReduceError::MissingSeedKey(field.clone()))?;
    }

    Ok(next)
}

/// Policy for one social-contract value out of the creator's answer.
///
/// The invalid-answer sentinel is carried into the successor seed unchanged:
/// readers treat it exactly the way the pages do, and coercing it into a
/// valid-looking float would hide the failed submission. Everything else
/// must be a float in `[0, 1]` (a legacy one-element array wrap is
/// unwrapped); anything else fails loudly.
fn fold_parameter(field: &str, raw: &Value) -> Result<Value, ReduceError> {
    if matches!(raw, Value::String(s) if s == INVALID_RESPONSE) {
        warn!(field = %field, "creator recorded the invalid-response sentinel, propagating unchanged");
        return Ok(raw.clone());
    }

    match unwrap_float(raw) {
        Some(v) if (0.0..=1.0).contains(&v) => Ok(Value::from(v)),
        _ => Err(ReduceError::InvalidParameter {
            field: field.to_string(),
            value: raw.clone(),
        }),
    }
}
