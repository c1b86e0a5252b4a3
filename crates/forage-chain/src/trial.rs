//! Trial record: one participant's pass through a generation.

use chrono::{DateTime, Utc};
use forage_kernel::assignment::ParticipantKey;
use forage_kernel::reduce::GenerationTrial;
use forage_kernel::role::TrialRole;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One trial inside a chain node.
///
/// A trial is *terminal* once it is finalized or failed; only terminal
/// trials count toward a generation being complete, and only finalized ones
/// carry an authoritative answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trial {
    pub id: u64,
    pub participant_id: u64,
    pub role: TrialRole,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<Value>,

    #[serde(default)]
    pub finalized: bool,
    #[serde(default)]
    pub failed: bool,

    #[serde(default = "default_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finalized_at: Option<DateTime<Utc>>,
}

fn default_timestamp() -> DateTime<Utc> {
    Utc::now()
}

impl Trial {
    pub fn new(id: u64, participant_id: u64, role: TrialRole) -> Self {
        Self {
            id,
            participant_id,
            role,
            answer: None,
            finalized: false,
            failed: false,
            created_at: Utc::now(),
            finalized_at: None,
        }
    }

    /// Canonical identity key for slot allocation.
    ///
    /// The participant id, not the trial id: reloads mint fresh trial ids
    /// for the same participant.
    pub fn participant_key(&self) -> ParticipantKey {
        ParticipantKey::from_id(self.participant_id)
    }

    pub fn is_terminal(&self) -> bool {
        self.finalized || self.failed
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Record the finalized answer and close the trial.
    pub fn finalize(&mut self, answer: Value) {
        self.answer = Some(answer);
        self.finalized = true;
        self.finalized_at = Some(Utc::now());
    }

    /// Mark the trial failed. Its slot, if any, stays assigned.
    pub fn fail(&mut self) {
        self.failed = true;
    }
}

impl GenerationTrial for Trial {
    fn role(&self) -> TrialRole {
        self.role
    }

    fn answer(&self) -> Option<&Value> {
        self.answer.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trials_start_active_and_become_terminal_once() {
        let mut trial = Trial::new(7, 101, TrialRole::Rater);
        assert!(trial.is_active());

        trial.finalize(json!(1));
        assert!(trial.is_terminal());
        assert!(trial.finalized_at.is_some());
        assert_eq!(trial.answer, Some(json!(1)));
    }

    #[test]
    fn failed_trials_are_terminal_without_an_answer() {
        let mut trial = Trial::new(8, 102, TrialRole::Rater);
        trial.fail();
        assert!(trial.is_terminal());
        assert_eq!(trial.answer, None);
    }

    #[test]
    fn identity_key_comes_from_the_participant_id() {
        let trial = Trial::new(9, 103, TrialRole::Creator);
        assert_eq!(trial.participant_key().as_str(), "103");
    }

    #[test]
    fn trial_json_defaults_fill_missing_flags() {
        let raw = r#"{"id": 1, "participant_id": 101, "role": "rater"}"#;
        let trial: Trial = serde_json::from_str(raw).expect("sparse trial must parse");
        assert!(trial.is_active());
        assert_eq!(trial.answer, None);
    }
}
