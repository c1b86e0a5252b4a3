//! Generation summary: fold a completed generation into its successor seed.
//!
//! Runs once per generation, after every trial has reached a terminal state.
//! Sequencing is the chain engine's responsibility; the active-trial gate
//! here is a guard rail that turns a mis-sequenced call into a loud error
//! instead of a seed computed from half a generation.

use crate::node::NodeState;
use crate::store::{NodeFileError, read_node_from_path};
use crate::trial::Trial;
use forage_kernel::reduce::{ReduceError, reduce_generation};
use forage_kernel::seed::SeedDefinition;
use std::path::Path;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("generation still has {active} active trial(s); summary runs only after all trials are terminal")]
    GenerationActive { active: usize },

    #[error(transparent)]
    Reduce(#[from] ReduceError),

    #[error(transparent)]
    File(#[from] NodeFileError),
}

/// Compute the successor seed for a node already in memory.
///
/// Failed trials are excluded from the reduction: they carry no
/// authoritative answer. A failed creator therefore surfaces as
/// [`ReduceError::AmbiguousCreator`] with zero candidates.
pub fn summarize_generation(
    node: &NodeState,
    fields: &[String],
) -> Result<SeedDefinition, SummarizeError> {
    let active = node.active_trials().len();
    if active > 0 {
        return Err(SummarizeError::GenerationActive { active });
    }

    let finalized: Vec<&Trial> = node.trials().filter(|trial| trial.finalized).collect();
    let next = reduce_generation(&node.seed, &finalized, fields)?;

    info!(
        node = node.id,
        trials = finalized.len(),
        "computed successor seed for generation"
    );
    Ok(next)
}

/// Compute the successor seed for the node persisted at `path`.
pub fn summarize_generation_json(
    path: impl AsRef<Path>,
    fields: &[String],
) -> Result<SeedDefinition, SummarizeError> {
    let node = read_node_from_path(path)?;
    summarize_generation(&node, fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use forage_kernel::role::TrialRole;
    use serde_json::json;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn node_with_generation() -> NodeState {
        let mut node = NodeState::new(
            1,
            SeedDefinition::from_entries([
                ("overhead".to_string(), json!(0.5)),
                ("positions".to_string(), json!(["A", "B"])),
            ]),
        );

        let mut creator = Trial::new(10, 100, TrialRole::Creator);
        creator.finalize(json!({"overhead": 0.8, "positions": ["A", "B"]}));
        node.upsert_trial(creator);

        for (trial_id, participant_id) in [(11, 101), (12, 102)] {
            let mut rater = Trial::new(trial_id, participant_id, TrialRole::Rater);
            rater.finalize(json!(1));
            node.upsert_trial(rater);
        }
        node
    }

    #[test]
    fn a_completed_generation_folds_into_the_successor_seed() {
        let node = node_with_generation();
        let next = summarize_generation(&node, &fields(&["overhead"]))
            .expect("summary must succeed");

        assert_eq!(next.get("overhead"), Some(&json!(0.8)));
        assert_eq!(next.get("positions"), Some(&json!(["A", "B"])));
        // The input seed is untouched.
        assert_eq!(node.seed.get("overhead"), Some(&json!(0.5)));
    }

    #[test]
    fn active_trials_block_the_summary() {
        let mut node = node_with_generation();
        node.upsert_trial(Trial::new(13, 103, TrialRole::Rater));

        let err = summarize_generation(&node, &fields(&["overhead"]))
            .expect_err("active trial must block");
        assert!(matches!(
            err,
            SummarizeError::GenerationActive { active: 1 }
        ));
    }

    #[test]
    fn failed_raters_do_not_block_but_a_failed_creator_is_structural() {
        let mut node = node_with_generation();
        let mut extra = Trial::new(13, 103, TrialRole::Rater);
        extra.fail();
        node.upsert_trial(extra);

        summarize_generation(&node, &fields(&["overhead"]))
            .expect("failed rater must not block the summary");

        let mut node = node_with_generation();
        node.trial_mut(10).expect("creator exists").finalized = false;
        node.trial_mut(10).expect("creator exists").failed = true;
        assert!(matches!(
            summarize_generation(&node, &fields(&["overhead"])),
            Err(SummarizeError::Reduce(ReduceError::AmbiguousCreator { count: 0 }))
        ));
    }
}
