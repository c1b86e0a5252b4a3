//! Trial roles: the two parts played within one generation.

use serde::{Deserialize, Serialize};

/// Role of a trial within one generation of a chain.
///
/// Tagged on each trial record at construction time, so role lookup is an
/// enum comparison rather than runtime type inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialRole {
    /// Produces the generation's definition-of-record.
    Creator,
    /// Consumes a personalized view of the creator's definition.
    Rater,
}

impl TrialRole {
    pub fn is_creator(&self) -> bool {
        matches!(self, TrialRole::Creator)
    }

    /// String representation for vars and log fields.
    pub fn as_str(&self) -> &str {
        match self {
            TrialRole::Creator => "creator",
            TrialRole::Rater => "rater",
        }
    }
}
