//! Node state: one generation's seed, vars, and trials.
//!
//! A chain node owns exactly one generation. Its `vars` map is the free-form
//! key-value store the host framework persists per node; the assignment
//! table lives there under [`ASSIGNMENTS_VAR`] and is reconstructed into its
//! typed form on every access, so a fresh node starts with a conceptually
//! empty table.

use forage_kernel::assignment::AssignmentTable;
use forage_kernel::seed::SeedDefinition;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::trial::Trial;

/// Var key holding the generation's assignment table.
pub const ASSIGNMENTS_VAR: &str = "assignments";

/// Errors raised while reading or updating node state.
#[derive(Debug, thiserror::Error)]
pub enum NodeStateError {
    #[error("node var {key:?} does not deserialize: {message}")]
    MalformedVar { key: String, message: String },

    #[error("trial not found: {0}")]
    TrialNotFound(u64),

    #[error("expected exactly one finalized creator trial, found {0}")]
    CreatorUnavailable(usize),
}

/// Persisted state of one chain node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeState {
    pub id: u64,
    pub seed: SeedDefinition,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, Value>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    trials: BTreeMap<u64, Trial>,
}

impl NodeState {
    pub fn new(id: u64, seed: SeedDefinition) -> Self {
        Self {
            id,
            seed,
            vars: BTreeMap::new(),
            trials: BTreeMap::new(),
        }
    }

    /// Lookup one trial by id.
    pub fn trial(&self, id: u64) -> Option<&Trial> {
        self.trials.get(&id)
    }

    /// Lookup one trial by id (mutable).
    pub fn trial_mut(&mut self, id: u64) -> Option<&mut Trial> {
        self.trials.get_mut(&id)
    }

    /// Insert or replace a trial by id. Returns the previous record if present.
    pub fn upsert_trial(&mut self, trial: Trial) -> Option<Trial> {
        self.trials.insert(trial.id, trial)
    }

    /// Iterate trials in deterministic id order.
    pub fn trials(&self) -> impl Iterator<Item = &Trial> {
        self.trials.values()
    }

    /// Trials that are neither finalized nor failed.
    pub fn active_trials(&self) -> Vec<&Trial> {
        self.trials().filter(|trial| trial.is_active()).collect()
    }

    /// Whether any trial in this generation is still running.
    pub fn has_active_trials(&self) -> bool {
        self.trials().any(|trial| trial.is_active())
    }

    /// The typed assignment table stored in `vars`.
    ///
    /// Absent means empty: the table is born with the node and only ever
    /// written back through [`NodeState::set_assignments`].
    pub fn assignments(&self) -> Result<AssignmentTable, NodeStateError> {
        match self.vars.get(ASSIGNMENTS_VAR) {
            None => Ok(AssignmentTable::new()),
            Some(raw) => serde_json::from_value(raw.clone()).map_err(|e| {
                NodeStateError::MalformedVar {
                    key: ASSIGNMENTS_VAR.to_string(),
                    message: e.to_string(),
                }
            }),
        }
    }

    /// Write the assignment table back into `vars`.
    pub fn set_assignments(&mut self, table: &AssignmentTable) -> Result<(), NodeStateError> {
        let raw = serde_json::to_value(table).map_err(|e| NodeStateError::MalformedVar {
            key: ASSIGNMENTS_VAR.to_string(),
            message: e.to_string(),
        })?;
        self.vars.insert(ASSIGNMENTS_VAR.to_string(), raw);
        Ok(())
    }

    /// The finalized creator trial's answer: the generation's
    /// definition-of-record.
    pub fn creator_definition(&self) -> Result<&Value, NodeStateError> {
        let finalized_creators: Vec<&Trial> = self
            .trials()
            .filter(|trial| trial.role.is_creator() && trial.finalized)
            .collect();
        match finalized_creators.as_slice() {
            [creator] => creator
                .answer
                .as_ref()
                .ok_or(NodeStateError::CreatorUnavailable(0)),
            other => Err(NodeStateError::CreatorUnavailable(other.len())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forage_kernel::assignment::ParticipantKey;
    use forage_kernel::role::TrialRole;
    use serde_json::json;

    fn seed() -> SeedDefinition {
        SeedDefinition::from_entries([
            ("overhead".to_string(), json!(0.5)),
            ("positions".to_string(), json!(["A", "B"])),
        ])
    }

    #[test]
    fn fresh_nodes_have_an_empty_assignment_table() {
        let node = NodeState::new(1, seed());
        let table = node.assignments().expect("absent var must read as empty");
        assert!(table.is_empty());
    }

    #[test]
    fn assignments_round_trip_through_vars() {
        let mut node = NodeState::new(1, seed());
        let mut table = node.assignments().expect("fresh table");
        table
            .allocate(&ParticipantKey::from_id(101), 2)
            .expect("pool has room");
        node.set_assignments(&table).expect("table must store");

        let reread = node.assignments().expect("stored table must read back");
        assert_eq!(reread, table);
        assert_eq!(node.vars.get(ASSIGNMENTS_VAR), Some(&json!({"101": 0})));
    }

    #[test]
    fn malformed_assignment_vars_fail_loudly() {
        let mut node = NodeState::new(1, seed());
        node.vars
            .insert(ASSIGNMENTS_VAR.to_string(), json!("not-a-table"));

        let err = node.assignments().expect_err("malformed var must error");
        assert!(matches!(
            err,
            NodeStateError::MalformedVar { ref key, .. } if key == ASSIGNMENTS_VAR
        ));
    }

    #[test]
    fn active_trials_drain_as_they_reach_terminal_states() {
        let mut node = NodeState::new(1, seed());
        node.upsert_trial(Trial::new(10, 100, TrialRole::Creator));
        node.upsert_trial(Trial::new(11, 101, TrialRole::Rater));
        assert!(node.has_active_trials());
        assert_eq!(node.active_trials().len(), 2);

        node.trial_mut(10)
            .expect("creator trial exists")
            .finalize(json!({"overhead": 0.8}));
        node.trial_mut(11).expect("rater trial exists").fail();
        assert!(!node.has_active_trials());
    }

    #[test]
    fn creator_definition_requires_exactly_one_finalized_creator() {
        let mut node = NodeState::new(1, seed());
        assert!(matches!(
            node.creator_definition(),
            Err(NodeStateError::CreatorUnavailable(0))
        ));

        let mut creator = Trial::new(10, 100, TrialRole::Creator);
        creator.finalize(json!({"positions": ["A", "B"]}));
        node.upsert_trial(creator);
        assert_eq!(
            node.creator_definition().expect("definition must resolve"),
            &json!({"positions": ["A", "B"]})
        );

        let mut second = Trial::new(12, 104, TrialRole::Creator);
        second.finalize(json!({"positions": ["B", "A"]}));
        node.upsert_trial(second);
        assert!(matches!(
            node.creator_definition(),
            Err(NodeStateError::CreatorUnavailable(2))
        ));
    }
}
