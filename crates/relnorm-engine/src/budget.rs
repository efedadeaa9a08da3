//! Iteration and size caps for the fixed-point analyses.
//!
//! Every loop in the engine terminates on its own for well-formed input; the
//! caps turn a malformed or adversarial input into a flagged partial result
//! instead of a hang.

use serde::{Deserialize, Serialize};

/// Which FDs the redundant-FD pass re-checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedundancyCheck {
    /// Check every FD against the rest of the set.
    #[default]
    AllFds,
    /// Only check FDs whose right side equals another FD's right side.
    /// Faster, but can leave an FD that is derivable through a chain.
    RhsCollision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisBudget {
    /// Full passes over the FD set before the chase gives up.
    pub max_chase_passes: usize,
    /// Full passes over the decomposition per FD in Algorithm Z.
    pub max_preservation_passes: usize,
    /// Nodes in the candidate-key search tree.
    pub max_key_nodes: usize,
    pub redundancy_check: RedundancyCheck,
}

impl Default for AnalysisBudget {
    fn default() -> Self {
        Self {
            max_chase_passes: 20,
            max_preservation_passes: 20,
            max_key_nodes: 1 << 15,
            redundancy_check: RedundancyCheck::AllFds,
        }
    }
}

impl AnalysisBudget {
    /// No caps (for tests and known-small inputs).
    pub fn unlimited() -> Self {
        Self {
            max_chase_passes: usize::MAX,
            max_preservation_passes: usize::MAX,
            max_key_nodes: usize::MAX,
            redundancy_check: RedundancyCheck::AllFds,
        }
    }

    pub fn with_redundancy_check(mut self, check: RedundancyCheck) -> Self {
        self.redundancy_check = check;
        self
    }
}
