//! Dependency preservation (Algorithm Z).
//!
//! An FD `X -> Y` is preserved by a decomposition when `Y` can be derived
//! from `X` using only FDs checkable inside single relations. Algorithm Z
//! decides this without computing projections: grow `Z` from `X` by adding,
//! for every relation `R_i`, the part of `(Z ∩ R_i)⁺` that lies in `R_i`.
//!
//! The inner closure must run over the original FD set.

use crate::attrs::AttrSet;
use crate::budget::AnalysisBudget;
use crate::closure::closure_of;
use crate::fd::{Fd, RelationSchema};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// One relation visit that grew `Z`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZStep {
    pub pass: usize,
    pub relation_index: usize,
    /// `Z ∩ R_i` before the visit.
    pub v: AttrSet,
    /// `V⁺` over the original FDs.
    pub v_closure: AttrSet,
    pub added: AttrSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FdPreservation {
    pub fd: Fd,
    /// A relation holding `lhs ∪ rhs`; the FD is then preserved outright
    /// and Algorithm Z is not run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trivial_relation: Option<usize>,
    pub final_z: AttrSet,
    pub preserved: bool,
    pub passes: usize,
    pub hit_iteration_cap: bool,
    pub steps: Vec<ZStep>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreservationReport {
    pub all_preserved: bool,
    /// Some FD ran out of passes. Its `preserved: false` is inconclusive.
    pub hit_iteration_cap: bool,
    pub per_fd: Vec<FdPreservation>,
}

impl PreservationReport {
    pub fn lost(&self) -> impl Iterator<Item = &Fd> {
        self.per_fd.iter().filter(|p| !p.preserved).map(|p| &p.fd)
    }
}

pub fn check_preservation(schema: &RelationSchema, decomposition: &[AttrSet]) -> PreservationReport {
    check_preservation_with_budget(schema, decomposition, &AnalysisBudget::default())
}

pub fn check_preservation_with_budget(
    schema: &RelationSchema,
    decomposition: &[AttrSet],
    budget: &AnalysisBudget,
) -> PreservationReport {
    let per_fd: Vec<FdPreservation> = schema
        .fds
        .iter()
        .map(|fd| preserve_fd(fd, &schema.fds, decomposition, budget.max_preservation_passes))
        .collect();

    let all_preserved = per_fd.iter().all(|p| p.preserved);
    let hit_iteration_cap = per_fd.iter().any(|p| p.hit_iteration_cap);
    debug!(
        fds = per_fd.len(),
        relations = decomposition.len(),
        all_preserved,
        "dependency preservation"
    );

    PreservationReport {
        all_preserved,
        hit_iteration_cap,
        per_fd,
    }
}

/// Run Algorithm Z for a single FD against `fds`.
pub fn preserve_fd(fd: &Fd, fds: &[Fd], decomposition: &[AttrSet], max_passes: usize) -> FdPreservation {
    let attrs = fd.attributes();
    if let Some(index) = decomposition.iter().position(|r| attrs.is_subset(r)) {
        trace!(fd = %fd, relation = index, "preserved inside one relation");
        return FdPreservation {
            fd: fd.clone(),
            trivial_relation: Some(index),
            final_z: attrs,
            preserved: true,
            passes: 0,
            hit_iteration_cap: false,
            steps: Vec::new(),
        };
    }

    let mut z = fd.lhs.clone();
    let mut steps = Vec::new();
    let mut passes = 0;
    let mut hit_iteration_cap = false;

    loop {
        if passes >= max_passes {
            hit_iteration_cap = true;
            warn!(fd = %fd, passes, "algorithm z hit iteration cap");
            break;
        }
        passes += 1;

        let mut changed = false;
        for (relation_index, relation) in decomposition.iter().enumerate() {
            let v = z.intersection(relation);
            let v_closure = closure_of(&v, fds);
            let added = z.absorb(&v_closure.intersection(relation));
            if added.is_empty() {
                continue;
            }
            trace!(fd = %fd, relation = relation_index, added = %added, "z grows");
            steps.push(ZStep {
                pass: passes,
                relation_index,
                v,
                v_closure,
                added,
            });
            changed = true;
        }
        if !changed {
            break;
        }
    }

    FdPreservation {
        fd: fd.clone(),
        trivial_relation: None,
        preserved: fd.rhs.is_subset(&z),
        final_z: z,
        passes,
        hit_iteration_cap,
        steps,
    }
}
